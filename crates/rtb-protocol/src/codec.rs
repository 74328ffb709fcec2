//! Codec trait and implementations for relay envelopes.
//!
//! A codec converts between envelope types and raw bytes. The session
//! layer only needs something implementing [`Codec`]; the relay today
//! speaks JSON, so [`JsonCodec`] is the one implementation.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Encodes envelopes to bytes and decodes bytes back.
///
/// `encode` and `decode` are generic over any serde type, so the same
/// codec handles app-feed, battle-feed and output envelopes.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or
    /// don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Behind the `json` feature (enabled by default).
///
/// ## Example
///
/// ```rust
/// use rtb_protocol::{AppFeedMessage, Codec, JsonCodec, TopicAction};
///
/// let codec = JsonCodec;
/// let msg: AppFeedMessage = codec
///     .decode(br#"{"topic_action": "unsubscribe"}"#)
///     .unwrap();
/// assert_eq!(msg.topic_action, Some(TopicAction::Unsubscribe));
///
/// let bytes = codec.encode(&msg).unwrap();
/// let back: AppFeedMessage = codec.decode(&bytes).unwrap();
/// assert_eq!(msg, back);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
