//! Legendz battle through a Talis.
//!
//! A scan (`LT2`) returns one packet of at least 20 bytes describing the
//! local creature. That payload is sent to the peer as
//! `LT1-<hex>-AA590003-AA590003-AA590003`, which replays it to the
//! peer's toy followed by three acknowledgement packets.
//!
//! The host additionally stamps its own session bytes into the guest's
//! payload before replaying it, so both toys agree on the fight.

use rtb_protocol::{Digirom, Packet, ResultSegment};
use rtb_session::Role;

use crate::strategy::hex_at;
use crate::{Exchange, HostTiming, Scan, Status};

/// Shortest payload a Talis scan or replay may carry.
const MIN_PAYLOAD: usize = 20;

const NONCE: usize = 14;
const SESSION_ID: usize = 15;
const TERRAIN: usize = 17;

/// Legendz Talis strategy for either side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Talis {
    role: Role,
}

impl Talis {
    pub const SCAN: &'static str = "LT2";
    pub const TIMING: HostTiming = HostTiming::from_secs(9, 25, 4, 5);

    pub fn new(role: Role) -> Self {
        Self { role }
    }

    pub fn host() -> Self {
        Self::new(Role::Host)
    }

    pub fn guest() -> Self {
        Self::new(Role::Guest)
    }

    pub fn role(&self) -> Role {
        self.role
    }
}

/// Sum of `bytes` modulo 256.
pub fn talis_checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b))
}

impl Exchange for Talis {
    fn message(&self, result: &[ResultSegment]) -> String {
        format!("LT1-{}{}", hex_at(result, 0), "-AA590003".repeat(3))
    }

    fn matched(&self, rom: &str) -> bool {
        rom.starts_with("LT1-")
    }

    fn modify_received_digirom(&self, sent: &[ResultSegment], received: &mut Digirom) -> bool {
        if self.role != Role::Host {
            return true;
        }
        let Some(sent) = sent.first().and_then(|s| s.data.as_deref()) else {
            return false;
        };
        let Some(data) = received.packets_mut().first_mut().and_then(Packet::data_mut) else {
            return false;
        };
        if data.len() < MIN_PAYLOAD || sent.len() < MIN_PAYLOAD {
            return false;
        }

        for index in [NONCE, SESSION_ID, TERRAIN] {
            data[index] = sent[index];
        }
        let last = data.len() - 1;
        data[last] = talis_checksum(&data[..last]);
        true
    }

    fn comm_successful(&self, result: &[ResultSegment]) -> bool {
        result.len() >= 4
    }
}

impl Scan for Talis {
    fn scan_command(&self) -> &str {
        Self::SCAN
    }

    fn scan_successful(&self, result: &[ResultSegment]) -> bool {
        matches!(result, [only] if only.data.as_ref().is_some_and(|d| d.len() >= MIN_PAYLOAD))
    }

    fn timing(&self) -> HostTiming {
        Self::TIMING
    }

    fn scan_status(&self) -> Status {
        Status::PushSync
    }
}
