//! Envelope types exchanged over a connection.
//!
//! Every frame carries one JSON envelope naming a command group, a command
//! name and an opaque body:
//!
//! ```json
//! {"group":"auth","name":"login","body":{"user":"a"}}
//! ```
//!
//! Inbound bodies are kept as raw JSON so handlers decide how to parse them.
//! Outbound bodies are any `Serialize` value.

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::error::ConnError;

/// Envelope decoded from an inbound frame.
///
/// `group` and `name` default to empty strings when absent; an envelope with
/// an empty group is ignored by the dispatcher.
#[derive(Debug, Default, Deserialize)]
pub struct InboundMessage {
    #[serde(default)]
    group: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    body: Option<Box<RawValue>>,
}

impl InboundMessage {
    /// Decodes an envelope from one frame.
    ///
    /// # Errors
    ///
    /// Returns [`ConnError::Decode`] if the frame is not a JSON object matching
    /// the envelope shape.
    pub fn decode(frame: &[u8]) -> Result<Self, ConnError> {
        serde_json::from_slice(frame).map_err(ConnError::from_json_error)
    }

    /// Returns the command group.
    #[must_use]
    pub fn group(&self) -> &str {
        self.group.as_str()
    }

    /// Returns the command name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the raw JSON body, or an empty slice when none was sent.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        self.body
            .as_deref()
            .map_or(&[][..], |raw| raw.get().as_bytes())
    }

    /// Returns the fully qualified `group.name` of the envelope.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.group, self.name)
    }
}

/// Envelope built by a caller for sending.
///
/// # Example
///
/// ```
/// use switchboard::OutboundMessage;
///
/// let message = OutboundMessage::new("auth", "login", serde_json::json!({"user": "a"}));
/// let bytes = message.encode().expect("encodes");
/// assert!(bytes.starts_with(br#"{"group":"auth""#));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundMessage<B = serde_json::Value> {
    group: String,
    name: String,
    body: B,
}

impl<B> OutboundMessage<B> {
    /// Creates an envelope for `group.name` carrying `body`.
    pub fn new(group: impl Into<String>, name: impl Into<String>, body: B) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            body,
        }
    }

    /// Returns the command group.
    #[must_use]
    pub fn group(&self) -> &str {
        self.group.as_str()
    }

    /// Returns the command name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the body.
    #[must_use]
    pub const fn body(&self) -> &B {
        &self.body
    }
}

impl<B: Serialize> OutboundMessage<B> {
    /// Serialises the envelope to compact JSON.
    ///
    /// Compact output never contains a raw newline, so the result is always a
    /// single line-delimited frame.
    ///
    /// # Errors
    ///
    /// Returns [`ConnError::Encode`] if the body cannot be represented as JSON
    /// (for example a map with non-string keys).
    pub fn encode(&self) -> Result<Vec<u8>, ConnError> {
        serde_json::to_vec(self).map_err(ConnError::Encode)
    }
}

/// Strips trailing NUL bytes left over from a fixed-size read buffer.
#[must_use]
pub fn trim_trailing_nul(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|byte| *byte != 0)
        .map_or(0, |pos| pos + 1);
    bytes.get(..end).unwrap_or_default()
}
