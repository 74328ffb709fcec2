//! Engine configuration and the status reported to the UI.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// Settings shared by every battle machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// How long an unconsumed peer message stays usable.
    pub message_expiry: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            message_expiry: Duration::from_secs(30),
        }
    }
}

// ---------------------------------------------------------------------------
// HostTiming
// ---------------------------------------------------------------------------

/// Round timing for the scan / wait / retry machine.
///
/// ```text
/// scan ok ──┬── < wait_min ──────── replies ignored (kept)
///           ├── wait_min..wait_max ─ replies processed
///           └── > wait_max ──────── round abandoned, rescan
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostTiming {
    /// A reply is not acted on before this much time has passed.
    pub wait_min: Duration,
    /// With no reply by now, the round is dropped.
    pub wait_max: Duration,
    /// Attempts at replaying the peer's data before giving up.
    pub max_attempts: u32,
    /// Pause between replay attempts.
    pub retry_delay: Duration,
}

impl HostTiming {
    pub const fn from_secs(
        wait_min: u64,
        wait_max: u64,
        max_attempts: u32,
        retry_delay: u64,
    ) -> Self {
        Self {
            wait_min: Duration::from_secs(wait_min),
            wait_max: Duration::from_secs(wait_max),
            max_attempts,
            retry_delay: Duration::from_secs(retry_delay),
        }
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// What the user should be doing right now. Drives the LED and beeper.
///
/// Purely observational: nothing in the engine branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Idle,
    /// Waiting on the peer.
    Wait,
    /// Press the toy's button now.
    Push,
    /// Hold the toy in place while it syncs.
    PushSync,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Wait => write!(f, "Wait"),
            Self::Push => write!(f, "Push"),
            Self::PushSync => write!(f, "PushSync"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_default_expiry() {
        assert_eq!(EngineConfig::default().message_expiry, Duration::from_secs(30));
    }

    #[test]
    fn test_host_timing_from_secs() {
        let t = HostTiming::from_secs(9, 25, 4, 5);
        assert_eq!(t.wait_min, Duration::from_secs(9));
        assert_eq!(t.wait_max, Duration::from_secs(25));
        assert_eq!(t.max_attempts, 4);
        assert_eq!(t.retry_delay, Duration::from_secs(5));
    }

    #[test]
    fn test_status_default_and_display() {
        assert_eq!(Status::default(), Status::Idle);
        assert_eq!(Status::PushSync.to_string(), "PushSync");
    }
}
