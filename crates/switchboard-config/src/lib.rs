//! Configuration shared by switchboard connections.
//!
//! [`ConnConfig`] gathers the knobs of a single connection: how envelopes are
//! framed on the wire, how large a read unit is, how long a write may block,
//! how many inbound handlers may run at once, and how the process log sink is
//! formatted. Every field has a default, so an empty TOML document yields a
//! usable configuration.
//!
//! ```toml
//! framing = "lines"
//! read_unit_bytes = 8192
//! max_frame_bytes = 1048576
//! write_deadline_ms = 50
//! max_in_flight_handlers = 64
//! log_filter = "switchboard=debug"
//! log_format = "compact"
//! ```

mod defaults;
mod error;
mod framing;
mod logging;

use std::fs;
use std::time::Duration;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

pub use self::defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_MAX_FRAME_BYTES, DEFAULT_MAX_IN_FLIGHT_HANDLERS,
    DEFAULT_READ_UNIT_BYTES, DEFAULT_WRITE_DEADLINE_MS, default_framing, default_log_filter,
    default_log_filter_string, default_log_format,
};
pub use self::error::ConfigError;
pub use self::framing::{Framing, FramingParseError};
pub use self::logging::{LogFormat, LogFormatParseError};

/// Tuning and logging configuration for a connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConnConfig {
    /// Wire framing mode.
    pub framing: Framing,
    /// Size of one transport read in bytes.
    pub read_unit_bytes: usize,
    /// Largest line accepted in [`Framing::Lines`] mode.
    pub max_frame_bytes: usize,
    /// Deadline applied to every raw write, in milliseconds.
    pub write_deadline_ms: u64,
    /// Number of inbound handlers allowed to run concurrently.
    pub max_in_flight_handlers: usize,
    /// `tracing` filter expression for the process log sink.
    pub log_filter: String,
    /// Output format of the process log sink.
    pub log_format: LogFormat,
}

impl Default for ConnConfig {
    fn default() -> Self {
        Self {
            framing: default_framing(),
            read_unit_bytes: defaults::default_read_unit_bytes(),
            max_frame_bytes: defaults::default_max_frame_bytes(),
            write_deadline_ms: defaults::default_write_deadline_ms(),
            max_in_flight_handlers: defaults::default_max_in_flight_handlers(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl ConnConfig {
    /// Parses configuration from TOML text and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys and
    /// [`ConfigError::Invalid`] when a value fails validation.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read, otherwise
    /// the errors of [`ConnConfig::from_toml_str`].
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks that every size, deadline and limit is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.read_unit_bytes == 0 {
            return Err(ConfigError::invalid("read_unit_bytes", "must be non-zero"));
        }
        if self.max_frame_bytes < self.read_unit_bytes {
            return Err(ConfigError::invalid(
                "max_frame_bytes",
                format!(
                    "{} is smaller than read_unit_bytes ({})",
                    self.max_frame_bytes, self.read_unit_bytes
                ),
            ));
        }
        if self.write_deadline_ms == 0 {
            return Err(ConfigError::invalid("write_deadline_ms", "must be non-zero"));
        }
        if self.max_in_flight_handlers == 0 {
            return Err(ConfigError::invalid(
                "max_in_flight_handlers",
                "must be non-zero",
            ));
        }
        Ok(())
    }

    /// Deadline applied to every raw write.
    #[must_use]
    pub const fn write_deadline(&self) -> Duration {
        Duration::from_millis(self.write_deadline_ms)
    }

    /// Returns the configured log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Returns the configured log format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}
