//! Wire-level types for real-time battles.
//!
//! This crate defines the two "languages" a battle device speaks:
//!
//! - **Digiroms** ([`Digirom`], [`Packet`], [`ResultSegment`]): the
//!   command strings executed against a toy, and the per-packet results
//!   the transceiver reports back. [`parse_command`] turns a string such
//!   as `"X2-0069-2169-8009"` into a [`Digirom`].
//! - **Relay envelopes** ([`AppFeedMessage`], [`BattleFeedMessage`], …):
//!   the JSON documents exchanged with the cloud relay.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how envelopes are
//!   converted to and from bytes.
//!
//! # Architecture
//!
//! ```text
//! Relay (bytes) → Protocol (envelopes, digiroms) → Session → Engine
//! ```
//!
//! Nothing in here knows about timers, roles, or state machines.

mod codec;
mod digirom;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use digirom::{parse_command, Digirom, Direction, Packet, ResultSegment};
pub use error::{CommandError, ProtocolError};
pub use types::{
    AckMessage, AppFeedMessage, ApplicationId, BattleFeedMessage,
    DeviceOutput, TopicAction, RTB_APPLICATION_ID,
};
