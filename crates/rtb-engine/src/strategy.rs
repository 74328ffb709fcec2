//! The hooks a game variant implements.
//!
//! The machines own timing, retries and I/O; a variant only decides what
//! the messages look like and when a toy interaction counts as a success.
//! Every hook sees the result of the most recent execute.

use rtb_protocol::{Digirom, ResultSegment};

use crate::{HostTiming, Status};

/// Message format and success checks, needed by both machines.
pub trait Exchange: Send {
    /// The message to send the peer, built from the last result.
    fn message(&self, result: &[ResultSegment]) -> String;

    /// Whether a peer message has the shape this side expects.
    fn matched(&self, rom: &str) -> bool;

    /// Adjusts a received digirom before it is replayed to the toy.
    ///
    /// `sent` is the result of our own last execute. Returns `false` if
    /// the received payload is unusable. Default: leave it alone.
    fn modify_received_digirom(&self, _sent: &[ResultSegment], _received: &mut Digirom) -> bool {
        true
    }

    /// Whether the replay of the peer's data reached the toy.
    fn comm_successful(&self, result: &[ResultSegment]) -> bool;
}

/// Extra hooks for the side that scans the toy and drives the rounds.
pub trait Scan: Exchange {
    /// Digirom that reads the toy at the start of a round.
    fn scan_command(&self) -> &str;

    /// Whether the scan got enough from the toy to start a round.
    fn scan_successful(&self, result: &[ResultSegment]) -> bool;

    fn timing(&self) -> HostTiming;

    /// Status shown while scanning.
    fn scan_status(&self) -> Status {
        Status::Push
    }
}

/// Hex of result segment `index`, empty if it is missing or a timeout.
pub(crate) fn hex_at(result: &[ResultSegment], index: usize) -> String {
    result.get(index).map(ResultSegment::hex).unwrap_or_default()
}
