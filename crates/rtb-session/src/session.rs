//! Session types: what a device knows about the battle it is in.
//!
//! A session records:
//! - WHICH game is being played (`battle_type`, as the app sent it)
//! - WHICH side we are on ([`Role`])
//! - WHERE the two devices meet (`host` and `topic` on the relay)

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::SessionError;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Per-device settings the session layer stamps onto outbound envelopes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// This device's identifier on the relay.
    pub device_uuid: String,

    /// Battle outputs this short or shorter are not forwarded: they are
    /// the echo of a loaded digirom, not a toy result.
    ///
    /// Default: 8 characters.
    pub min_output_len: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            device_uuid: String::new(),
            min_output_len: 8,
        }
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// The two sides of a battle.
///
/// On the wire this is the `user_type` field: `"host"` or `"guest"`.
/// Each side only consumes messages stamped with the other side's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Host,
    Guest,
}

impl Role {
    /// Parses the relay's `user_type` string.
    ///
    /// # Errors
    /// [`SessionError::UnknownRole`] for anything but `host` / `guest`.
    pub fn from_wire(user_type: &str) -> Result<Self, SessionError> {
        match user_type {
            "host" => Ok(Self::Host),
            "guest" => Ok(Self::Guest),
            other => Err(SessionError::UnknownRole(other.to_string())),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::Guest => "guest",
        }
    }

    /// The role of the peer.
    pub fn opposite(self) -> Self {
        match self {
            Self::Host => Self::Guest,
            Self::Guest => Self::Host,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One real-time battle this device has joined.
///
/// Created by [`SessionManager`](crate::SessionManager) on a `subscribe`
/// message and handed by value to whoever builds the battle engine.
/// Lives until the app unsubscribes, sends a new command, or the user
/// exits locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// Game identifier as sent by the app, e.g. `"legendz"`.
    pub battle_type: String,
    /// Our side of the battle.
    pub role: Role,
    /// Relay account that owns the battle topic.
    pub host: String,
    /// Battle topic name.
    pub topic: String,
}

impl Session {
    /// The relay feed both devices publish to: `{host}/f/{topic}`.
    pub fn feed_topic(&self) -> String {
        format!("{}/f/{}", self.host, self.topic)
    }
}
