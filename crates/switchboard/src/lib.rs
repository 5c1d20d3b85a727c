//! Message-oriented connections over duplex byte streams.
//!
//! `switchboard` layers a small command-dispatch protocol on top of any
//! duplex transport. Endpoints exchange JSON envelopes naming a command
//! `group`, a command `name` and a `body`:
//!
//! ```json
//! {"group":"auth","name":"login","body":{"user":"a"}}
//! ```
//!
//! Each [`Connection`] keeps a registry of [`CommandSet`]s keyed by group.
//! A background dispatcher reads frames from the transport, decodes them and
//! runs the matching handler on its own thread, passing it the connection's
//! [`ConnLogger`] and the raw body. Callers send envelopes synchronously with
//! [`Connection::write_message`], invoke handlers directly with
//! [`Connection::execute_command`], and learn about teardown through
//! [`DoneSignal`]s.
//!
//! ## Failure policy
//!
//! The inbound path is best effort: malformed envelopes, unknown groups and
//! handler failures are logged and the dispatcher keeps running. A transport
//! read failure or end of stream destroys the connection. Only outbound
//! encoding failures and lookup misses of direct execution are returned to
//! callers.
//!
//! ## Framing
//!
//! By default envelopes are newline-delimited ([`Framing::Lines`]). The
//! [`Framing::Unframed`] mode keeps the older one-read-per-envelope scheme
//! for peers that still speak it.

mod connection;
mod dispatch;
mod error;
mod framing;
mod lifecycle;
mod logger;
mod protocol;
mod registry;
pub mod telemetry;
mod transport;

pub use connection::Connection;
pub use error::ConnError;
pub use lifecycle::{DoneSignal, Lifecycle};
pub use logger::{ConnLogger, DiscardLogger, SharedLogger, TracingLogger};
pub use protocol::{InboundMessage, OutboundMessage, trim_trailing_nul};
pub use registry::{CommandHandler, CommandRegistry, CommandSet, Lookup};
pub use switchboard_config::{ConfigError, ConnConfig, Framing, LogFormat};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::{Transport, pipe};

#[cfg(test)]
mod tests;
