//! Error types for the protocol layer.
//!
//! Two families live here. [`ProtocolError`] covers relay envelopes
//! (JSON in, JSON out). [`CommandError`] covers digirom command strings,
//! which are parsed separately and reported with the offending text.

/// Errors that can occur while encoding or decoding relay envelopes.
///
/// `#[derive(thiserror::Error)]` generates the `std::error::Error` impl;
/// each `#[error("...")]` is the message shown in logs.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning an envelope into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (malformed JSON, missing fields, wrong types).
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The envelope decoded fine but breaks a relay rule.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

/// A digirom command string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// Nothing to parse.
    #[error("empty command")]
    Empty,

    /// The command does not start with a signal type such as `V`, `X` or `LT`.
    #[error("missing signal type in {0:?}")]
    MissingSignalType(String),

    /// The signal type is not followed by a turn digit `0`, `1` or `2`.
    #[error("bad turn in {0:?}")]
    BadTurn(String),

    /// A packet between dashes is empty or contains unsupported characters.
    #[error("bad packet {packet:?} in {command:?}")]
    BadPacket { command: String, packet: String },

    /// A plain hex packet has an odd number of digits.
    #[error("odd-length hex packet {packet:?} in {command:?}")]
    OddHex { command: String, packet: String },
}
