//! The scan / wait / retry machine.
//!
//! One round looks like this:
//!
//! ```text
//!  Scanning ──scan ok, message sent──→ WaitingMin ──wait_min──→ WaitingForReply
//!     ↑                                                          │        │
//!     │                                        > wait_max, no reply       reply
//!     ├──────────────────────────────────────────────────────────┘        ↓
//!     └──── replay ok, or max_attempts failed ──── AttemptingSecondComm ←─┘
//! ```
//!
//! Each [`Initiator::tick`] does at most one toy interaction and returns.

use rtb_protocol::{parse_command, Digirom};
use tokio::time::Instant;

use crate::{EngineConfig, EngineError, HostTiming, Peripherals, RealTime, Scan, Status};

/// Where the machine is in its round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No round: the next tick scans the toy.
    Scanning,
    /// Round started; too early to act on a reply.
    WaitingMin,
    /// Round started; the next reply is replayed at once.
    WaitingForReply,
    /// Holding the peer's digirom, replaying it until it sticks.
    AttemptingSecondComm,
}

/// Drives rounds: scans the toy, sends the result, waits for the peer's
/// answer, and replays that answer to the toy with bounded retries.
///
/// Used by the host side of every game, and by both sides of symmetric
/// games where each device scans its own toy.
pub struct Initiator<S> {
    strategy: S,
    timing: HostTiming,
    core: RealTime,
    /// Start of the current round, or of the current retry wait.
    round_start: Option<Instant>,
    /// Received digirom not yet successfully replayed.
    pending: Option<Digirom>,
    attempts: u32,
}

impl<S: Scan> Initiator<S> {
    pub fn new(strategy: S, io: Peripherals, config: &EngineConfig) -> Self {
        let timing = strategy.timing();
        Self {
            strategy,
            timing,
            core: RealTime::new(io, config),
            round_start: None,
            pending: None,
            attempts: 0,
        }
    }

    /// Replaces the variant's default timing.
    pub fn with_timing(mut self, timing: HostTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Advances the machine by one step.
    ///
    /// # Errors
    /// A peer message that fails to match or parse. The round carries on.
    pub fn tick(&mut self) -> Result<(), EngineError> {
        self.core.receive_message();

        let elapsed = self
            .round_start
            .map(|start| Instant::now().saturating_duration_since(start));

        if self.pending.is_some() {
            if elapsed.is_none_or(|e| e >= self.timing.retry_delay) {
                self.attempt_second_comm();
            }
            return Ok(());
        }

        match elapsed {
            None => self.scan()?,
            Some(e) if e < self.timing.wait_min => {
                self.core.update_status(Status::Wait);
            }
            Some(e) if e > self.timing.wait_max => {
                tracing::debug!(waited_ms = e.as_millis() as u64, "no reply, abandoning round");
                self.round_start = None;
            }
            Some(_) => {
                self.core.update_status(Status::Wait);
                if let Some(digirom) = self.core.receive_digirom(&self.strategy)? {
                    self.pending = Some(digirom);
                    self.attempts = 0;
                    self.attempt_second_comm();
                }
            }
        }
        Ok(())
    }

    fn scan(&mut self) -> Result<(), EngineError> {
        self.core.update_status(self.strategy.scan_status());
        let mut digirom = parse_command(self.strategy.scan_command())?;
        self.core.execute(&mut digirom, false);
        if self.strategy.scan_successful(self.core.result()) {
            self.core.send_message(&self.strategy);
            self.round_start = Some(Instant::now());
            self.core.update_status(Status::Wait);
            tracing::debug!("scan ok, round started");
        }
        Ok(())
    }

    fn attempt_second_comm(&mut self) {
        let Some(mut digirom) = self.pending.take() else {
            return;
        };
        self.core.execute(&mut digirom, true);
        if self.strategy.comm_successful(self.core.result()) {
            tracing::info!("round complete");
            self.round_start = None;
            return;
        }

        self.attempts += 1;
        if self.attempts >= self.timing.max_attempts {
            tracing::warn!(attempts = self.attempts, "replay failed, giving up on round");
            self.round_start = None;
        } else {
            tracing::debug!(attempts = self.attempts, "replay failed, will retry");
            self.round_start = Some(Instant::now());
            self.pending = Some(digirom);
        }
    }

    pub fn phase(&self) -> Phase {
        if self.pending.is_some() {
            return Phase::AttemptingSecondComm;
        }
        match self.round_start {
            None => Phase::Scanning,
            Some(start) if start.elapsed() < self.timing.wait_min => Phase::WaitingMin,
            Some(_) => Phase::WaitingForReply,
        }
    }

    /// Replay attempts made on the current received digirom.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn timing(&self) -> HostTiming {
        self.timing
    }

    pub fn core(&self) -> &RealTime {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut RealTime {
        &mut self.core
    }
}
