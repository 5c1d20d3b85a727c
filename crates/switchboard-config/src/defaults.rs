use crate::framing::Framing;
use crate::logging::LogFormat;

/// Size of a single transport read in bytes.
pub const DEFAULT_READ_UNIT_BYTES: usize = 8 * 1024;

/// Largest line accepted by the newline-delimited reader.
pub const DEFAULT_MAX_FRAME_BYTES: usize = 1024 * 1024;

/// Deadline applied to every raw write, in milliseconds.
pub const DEFAULT_WRITE_DEADLINE_MS: u64 = 50;

/// Number of handlers a single connection may run at once.
pub const DEFAULT_MAX_IN_FLIGHT_HANDLERS: usize = 64;

/// Default log filter expression.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default log filter expression.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format.
#[must_use]
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Default wire framing.
#[must_use]
pub fn default_framing() -> Framing {
    Framing::Lines
}

pub(crate) const fn default_read_unit_bytes() -> usize {
    DEFAULT_READ_UNIT_BYTES
}

pub(crate) const fn default_max_frame_bytes() -> usize {
    DEFAULT_MAX_FRAME_BYTES
}

pub(crate) const fn default_write_deadline_ms() -> u64 {
    DEFAULT_WRITE_DEADLINE_MS
}

pub(crate) const fn default_max_in_flight_handlers() -> usize {
    DEFAULT_MAX_IN_FLIGHT_HANDLERS
}
