//! Errors surfaced by connection operations.
//!
//! Only a handful of operations report failures to their caller: direct
//! command execution, outbound encoding, and connection construction. Inbound
//! decode failures, routing misses, handler failures and transport write
//! errors are absorbed and logged so the dispatcher keeps running. I/O errors
//! are wrapped in `Arc` to keep the enum small and cheap to share.

use std::io;
use std::sync::Arc;

use switchboard_config::ConfigError;
use thiserror::Error;

/// Errors arising from connection operations.
#[derive(Debug, Error)]
pub enum ConnError {
    /// No command group with this name is registered.
    #[error("command group '{group}' is not registered")]
    GroupNotFound {
        /// Group that was looked up.
        group: String,
    },

    /// The group exists but holds no command with this name.
    #[error("command '{name}' is not registered in group '{group}'")]
    CommandNotFound {
        /// Group that was looked up.
        group: String,
        /// Command name that was looked up.
        name: String,
    },

    /// The handler itself reported a failure.
    #[error(transparent)]
    Handler(anyhow::Error),

    /// An outbound envelope could not be serialised.
    #[error("failed to encode outbound message: {0}")]
    Encode(#[source] serde_json::Error),

    /// An inbound frame is not a valid envelope.
    #[error("malformed inbound envelope: {message}")]
    Decode {
        /// Human-readable description of the parse failure.
        message: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The dispatcher or a handler thread could not be started.
    #[error("failed to spawn {what} thread: {source}")]
    Spawn {
        /// Which thread failed to start.
        what: &'static str,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },

    /// The transport could not be created.
    #[error("transport error: {source}")]
    Transport {
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },

    /// The connection configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ConnError {
    /// Creates a missing group error.
    pub fn group_not_found(group: impl Into<String>) -> Self {
        Self::GroupNotFound {
            group: group.into(),
        }
    }

    /// Creates a missing command error.
    pub fn command_not_found(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self::CommandNotFound {
            group: group.into(),
            name: name.into(),
        }
    }

    /// Creates a decode error from a serde error.
    #[must_use]
    pub fn from_json_error(source: serde_json::Error) -> Self {
        Self::Decode {
            message: source.to_string(),
            source,
        }
    }

    /// Creates a thread spawn error.
    #[must_use]
    pub fn spawn(what: &'static str, source: io::Error) -> Self {
        Self::Spawn {
            what,
            source: Arc::new(source),
        }
    }

    /// Creates a transport construction error.
    #[must_use]
    pub fn transport(source: io::Error) -> Self {
        Self::Transport {
            source: Arc::new(source),
        }
    }

    /// Returns `true` for either lookup miss of direct command execution.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::GroupNotFound { .. } | Self::CommandNotFound { .. }
        )
    }
}
