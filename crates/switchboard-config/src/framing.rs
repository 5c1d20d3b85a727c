//! Wire framing modes understood by the connection reader and writer.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How envelopes are delimited on the transport.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Framing {
    /// Newline-delimited JSON. Envelopes may span several transport reads.
    #[default]
    Lines,
    /// One transport read is one envelope; trailing NUL bytes are trimmed.
    ///
    /// Envelopes larger than a single read unit are split and fail to decode.
    Unframed,
}

/// Errors encountered while parsing a [`Framing`] from text.
pub type FramingParseError = strum::ParseError;
