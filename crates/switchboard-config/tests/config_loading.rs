//! Loading connection configuration from files on disk.

use std::fs;

use camino::Utf8PathBuf;
use rstest::{fixture, rstest};
use tempfile::TempDir;

use switchboard_config::{ConfigError, ConnConfig, Framing, LogFormat};

struct ConfigDir {
    _dir: TempDir,
    path: Utf8PathBuf,
}

impl ConfigDir {
    fn write(&self, contents: &str) -> Utf8PathBuf {
        let file = self.path.join("switchboard.toml");
        fs::write(&file, contents).expect("write configuration");
        file
    }
}

#[fixture]
fn config_dir() -> ConfigDir {
    let dir = TempDir::new().expect("create temporary directory");
    let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp path");
    ConfigDir { _dir: dir, path }
}

#[rstest]
fn loads_complete_file(config_dir: ConfigDir) {
    let file = config_dir.write(
        r#"
framing = "unframed"
read_unit_bytes = 4096
max_frame_bytes = 65536
write_deadline_ms = 75
max_in_flight_handlers = 8
log_filter = "switchboard=debug"
log_format = "compact"
"#,
    );

    let config = ConnConfig::load(&file).expect("load configuration");
    assert_eq!(config.framing, Framing::Unframed);
    assert_eq!(config.read_unit_bytes, 4096);
    assert_eq!(config.max_frame_bytes, 65536);
    assert_eq!(config.write_deadline_ms, 75);
    assert_eq!(config.max_in_flight_handlers, 8);
    assert_eq!(config.log_filter(), "switchboard=debug");
    assert_eq!(config.log_format(), LogFormat::Compact);
}

#[rstest]
fn missing_file_reports_path(config_dir: ConfigDir) {
    let file = config_dir.path.join("absent.toml");
    let error = ConnConfig::load(&file).expect_err("load should fail");
    assert!(matches!(error, ConfigError::Read { .. }));
    assert!(
        error.to_string().contains("absent.toml"),
        "expected path in message: {error}"
    );
}

#[rstest]
fn invalid_values_fail_fast(config_dir: ConfigDir) {
    let file = config_dir.write("max_in_flight_handlers = 0\n");
    let error = ConnConfig::load(&file).expect_err("load should fail");
    assert!(matches!(
        error,
        ConfigError::Invalid {
            field: "max_in_flight_handlers",
            ..
        }
    ));
}

#[rstest]
fn malformed_toml_is_a_parse_error(config_dir: ConfigDir) {
    let file = config_dir.write("framing = [\n");
    let error = ConnConfig::load(&file).expect_err("load should fail");
    assert!(matches!(error, ConfigError::Parse(_)));
}
