//! Message-oriented connection over a duplex transport.
//!
//! A [`Connection`] owns a command registry, a background dispatcher that
//! routes inbound envelopes to registered handlers, a synchronous write path
//! for outbound envelopes, and a set of done signals fired when the
//! connection is destroyed. Handles are cheap to clone and share one
//! underlying connection.
//!
//! ```no_run
//! use switchboard::{CommandSet, Connection, OutboundMessage};
//!
//! # fn main() -> Result<(), switchboard::ConnError> {
//! let (server, client) = Connection::<String>::pair("player-1".to_owned())?;
//! server.add_command(
//!     "auth",
//!     CommandSet::new().with("login", |log, body| {
//!         log.debug(format_args!("login body: {} bytes", body.len()));
//!         Ok(())
//!     }),
//! );
//! client.write_message(&OutboundMessage::new(
//!     "auth",
//!     "login",
//!     serde_json::json!({"user": "a"}),
//! ))?;
//! server.destroy();
//! # Ok(())
//! # }
//! ```

mod shared;

use std::fmt;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeStruct, Serializer};
use switchboard_config::ConnConfig;

use crate::dispatch::spawn_dispatcher;
use crate::error::ConnError;
use crate::lifecycle::{DoneSignal, Lifecycle};
use crate::logger::{ConnLogger, DiscardLogger, SharedLogger};
use crate::protocol::OutboundMessage;
use crate::registry::CommandSet;
use crate::transport::{Transport, pipe};

pub(crate) use self::shared::Core;

/// Handle to a message-oriented connection.
///
/// `C` is the client metadata attached at construction; the connection
/// stores it and hands it back but never interprets it.
pub struct Connection<C> {
    core: Arc<Core>,
    client: Arc<C>,
}

impl<C> Connection<C> {
    /// Builds a connection over `transport` with the default configuration
    /// and starts its dispatcher.
    ///
    /// # Errors
    ///
    /// Returns [`ConnError::Spawn`] if the dispatcher thread cannot start.
    pub fn new<T: Transport>(transport: T, client: C) -> Result<Self, ConnError> {
        Self::with_config(transport, client, ConnConfig::default())
    }

    /// Builds a connection over `transport` with `config` and starts its
    /// dispatcher.
    ///
    /// # Errors
    ///
    /// Returns [`ConnError::Config`] if `config` fails validation and
    /// [`ConnError::Spawn`] if the dispatcher thread cannot start.
    pub fn with_config<T: Transport>(
        transport: T,
        client: C,
        config: ConnConfig,
    ) -> Result<Self, ConnError> {
        Self::from_shared(Arc::new(transport), client, config)
    }

    /// Builds a connection over an already shared transport.
    ///
    /// # Errors
    ///
    /// As for [`Connection::with_config`].
    pub fn from_shared(
        transport: Arc<dyn Transport>,
        client: C,
        config: ConnConfig,
    ) -> Result<Self, ConnError> {
        config.validate()?;
        let logger: SharedLogger = Arc::new(DiscardLogger);
        let core = Arc::new(Core::new(transport, logger, config));
        spawn_dispatcher(&core)?;
        Ok(Self {
            core,
            client: Arc::new(client),
        })
    }

    /// Merges `set` into the commands of `group`, creating the group if
    /// needed. Existing names are overwritten; other names are kept.
    pub fn add_command(&self, group: impl Into<String>, set: CommandSet) {
        self.core.add_command(group.into(), set);
    }

    /// Removes `group` and all of its commands. Unknown groups are ignored.
    pub fn remove_commands_by_group(&self, group: &str) {
        self.core.remove_group(group);
    }

    /// Removes the named commands from `group`. Unknown groups and names are
    /// ignored.
    pub fn remove_commands_by_names<I, S>(&self, group: &str, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.core.remove_names(group, names);
    }

    /// Runs the handler for `group.name` on the calling thread and returns
    /// its result.
    ///
    /// # Errors
    ///
    /// Returns [`ConnError::GroupNotFound`] or [`ConnError::CommandNotFound`]
    /// when nothing is registered under the pair, or [`ConnError::Handler`]
    /// carrying the handler's own error.
    pub fn execute_command(&self, group: &str, name: &str, body: &[u8]) -> Result<(), ConnError> {
        self.core.execute(group, name, body)
    }

    /// Encodes `message` and sends it.
    ///
    /// Transport failures are not reported; the write is best effort and
    /// bounded by the configured write deadline.
    ///
    /// # Errors
    ///
    /// Returns [`ConnError::Encode`] if the envelope cannot be serialised, in
    /// which case nothing is sent.
    pub fn write_message<B: Serialize>(
        &self,
        message: &OutboundMessage<B>,
    ) -> Result<(), ConnError> {
        let bytes = message.encode()?;
        self.core.write_bytes(&bytes);
        self.core.logger().debug(format_args!(
            "sent message {}.{}",
            message.group(),
            message.name()
        ));
        Ok(())
    }

    /// Sends `payload` as one frame, best effort.
    ///
    /// Write errors and deadline expiry are logged and dropped; the caller
    /// is not told.
    pub fn write_bytes(&self, payload: &[u8]) {
        self.core.write_bytes(payload);
    }

    /// Returns a new signal that fires once the connection is destroyed.
    #[must_use]
    pub fn done(&self) -> DoneSignal {
        self.core.done()
    }

    /// Fires every done signal and closes the transport. Calling it again is
    /// a no-op.
    pub fn destroy(&self) {
        self.core.destroy();
    }

    /// Returns `true` once the connection has been destroyed.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.core.lifecycle() == Lifecycle::Destroyed
    }

    /// Returns the client metadata attached at construction.
    #[must_use]
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Returns the logger currently handed to handlers.
    #[must_use]
    pub fn logger(&self) -> SharedLogger {
        self.core.logger()
    }

    /// Replaces the logger handed to handlers launched from now on.
    pub fn set_logger(&self, logger: SharedLogger) {
        self.core.set_logger(logger);
    }

    /// Returns the configuration the connection was built with.
    #[must_use]
    pub fn config(&self) -> &ConnConfig {
        self.core.config()
    }
}

impl<C: Default> Connection<C> {
    /// Builds two connections over the two ends of an in-process pipe.
    ///
    /// The first (server) end carries `C::default()`, the second (client)
    /// end carries `client`. Both discard their logs until a logger is set.
    ///
    /// # Errors
    ///
    /// Returns [`ConnError::Transport`] if the pipe cannot be created and
    /// [`ConnError::Spawn`] if a dispatcher cannot start.
    pub fn pair(client: C) -> Result<(Self, Self), ConnError> {
        Self::pair_with_config(client, &ConnConfig::default())
    }

    /// As [`Connection::pair`], with both ends using `config`.
    ///
    /// # Errors
    ///
    /// As for [`Connection::pair`], plus [`ConnError::Config`].
    pub fn pair_with_config(client: C, config: &ConnConfig) -> Result<(Self, Self), ConnError> {
        let (server_end, client_end) = pipe().map_err(ConnError::transport)?;
        let server = Self::with_config(server_end, C::default(), config.clone())?;
        let peer = Self::with_config(client_end, client, config.clone())?;
        Ok((server, peer))
    }
}

impl<C> Clone for Connection<C> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
            client: Arc::clone(&self.client),
        }
    }
}

impl<C: fmt::Debug> fmt::Debug for Connection<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("core", &self.core)
            .field("client", &self.client)
            .finish()
    }
}

/// A connection serialises as an empty object so it can sit inside
/// serialisable records without exposing its state.
impl<C> Serialize for Connection<C> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_struct("Connection", 0)?.end()
    }
}
