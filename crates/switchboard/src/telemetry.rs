//! Process log sink for connection events.
//!
//! Connections log through `tracing` under the `switchboard::*` targets.
//! [`initialise`] installs a `tracing_subscriber` fmt subscriber for them
//! once per process; thread names are kept so dispatcher and handler events
//! can be told apart.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::{Subscriber, debug, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use switchboard_config::{ConnConfig, LogFormat};

const TELEMETRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::telemetry");

/// Format chosen by the call that installed the subscriber.
static INSTALLED_FORMAT: OnceCell<LogFormat> = OnceCell::new();

/// Describes the process log sink after [`initialise`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryHandle {
    format: LogFormat,
    installed_now: bool,
}

impl TelemetryHandle {
    /// Returns the output format of the installed subscriber.
    ///
    /// This is the format of the first successful call, whatever later
    /// configurations asked for.
    #[must_use]
    pub const fn format(&self) -> LogFormat {
        self.format
    }

    /// Returns `true` when this call installed the subscriber.
    #[must_use]
    pub const fn installed_now(&self) -> bool {
        self.installed_now
    }
}

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured log filter expression does not parse.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Another global subscriber is already installed.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the global subscriber described by `config` on first use.
///
/// Only the first successful call installs anything; later calls report the
/// sink already in place.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] for an unparsable `log_filter` and
/// [`TelemetryError::Subscriber`] when a subscriber was installed outside
/// this crate.
///
/// # Examples
///
/// ```rust
/// use switchboard::{ConnConfig, telemetry};
///
/// # fn main() -> Result<(), telemetry::TelemetryError> {
/// let config = ConnConfig::default();
/// let first = telemetry::initialise(&config)?;
/// let second = telemetry::initialise(&config)?;
/// assert!(!second.installed_now());
/// assert_eq!(first.format(), second.format());
/// # Ok(())
/// # }
/// ```
pub fn initialise(config: &ConnConfig) -> Result<TelemetryHandle, TelemetryError> {
    let mut installed_now = false;
    let format = INSTALLED_FORMAT.get_or_try_init(|| {
        install_subscriber(config)?;
        installed_now = true;
        Ok::<_, TelemetryError>(config.log_format())
    })?;

    if installed_now {
        debug!(
            target: TELEMETRY_TARGET,
            framing = %config.framing,
            max_in_flight_handlers = config.max_in_flight_handlers,
            write_deadline_ms = config.write_deadline_ms,
            "connection telemetry initialised"
        );
    }

    Ok(TelemetryHandle {
        format: *format,
        installed_now,
    })
}

fn install_subscriber(config: &ConnConfig) -> Result<(), TelemetryError> {
    let filter = EnvFilter::try_new(config.log_filter())
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;

    let builder = |env_filter: EnvFilter| {
        fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_level(true)
            .with_thread_names(true)
            .with_writer(io::stderr)
            .with_ansi(io::stderr().is_terminal())
            .with_timer(fmt::time::UtcTime::rfc_3339())
    };

    let subscriber: Box<dyn Subscriber + Send + Sync> = match config.log_format() {
        LogFormat::Json => Box::new(builder(filter).json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder(filter).compact().finish()),
    };

    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)
}
