//! Leveled logging capability handed to connections and their handlers.
//!
//! A connection never logs protocol events through a global sink directly:
//! it owns a replaceable [`ConnLogger`] and passes it to every handler it
//! invokes. The default is [`DiscardLogger`]; [`TracingLogger`] forwards to
//! `tracing` so events land in the process log sink.

use std::fmt;
use std::sync::Arc;

/// Tracing target for events forwarded by [`TracingLogger`].
pub(crate) const CONN_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::conn");

/// Leveled logging capability consumed by connections and command handlers.
///
/// # Example
///
/// ```
/// use switchboard::{ConnLogger, DiscardLogger};
///
/// let logger = DiscardLogger;
/// logger.debug(format_args!("auth.login: {}", "ok"));
/// ```
pub trait ConnLogger: Send + Sync {
    /// Records a debug-level event.
    fn debug(&self, args: fmt::Arguments<'_>);

    /// Records a warning-level event.
    fn warn(&self, args: fmt::Arguments<'_>);
}

impl<T> ConnLogger for Arc<T>
where
    T: ConnLogger + ?Sized,
{
    fn debug(&self, args: fmt::Arguments<'_>) {
        (**self).debug(args);
    }

    fn warn(&self, args: fmt::Arguments<'_>) {
        (**self).warn(args);
    }
}

/// Logger that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscardLogger;

impl ConnLogger for DiscardLogger {
    fn debug(&self, _args: fmt::Arguments<'_>) {}

    fn warn(&self, _args: fmt::Arguments<'_>) {}
}

/// Logger that forwards events to `tracing`, tagged with a connection label.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    label: String,
}

impl TracingLogger {
    /// Builds a logger whose events carry `label` in the `connection` field.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    /// Returns the connection label.
    #[must_use]
    pub fn label(&self) -> &str {
        self.label.as_str()
    }
}

impl ConnLogger for TracingLogger {
    fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(target: CONN_TARGET, connection = %self.label, "{args}");
    }

    fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(target: CONN_TARGET, connection = %self.label, "{args}");
    }
}

/// Shared handle to a logger, as stored by a connection.
pub type SharedLogger = Arc<dyn ConnLogger>;

#[cfg(test)]
mod tests;
