//! Behaviour shared by both battle machines.

use rtb_protocol::{parse_command, Digirom, ResultSegment};
use tokio::time::Instant;

use crate::{EngineConfig, EngineError, Exchange, MessageSlot, Peripherals, Status};

/// The I/O half of a battle machine.
///
/// Owns the collaborators, the result of the last execute, the last
/// reported status and the inbound message slot. [`Initiator`] and
/// [`Responder`] each hold one and add their own control flow on top.
///
/// [`Initiator`]: crate::Initiator
/// [`Responder`]: crate::Responder
pub struct RealTime {
    io: Peripherals,
    result: Vec<ResultSegment>,
    status: Status,
    slot: MessageSlot,
}

impl RealTime {
    pub fn new(io: Peripherals, config: &EngineConfig) -> Self {
        Self {
            io,
            result: Vec::new(),
            status: Status::Idle,
            slot: MessageSlot::new(config.message_expiry),
        }
    }

    /// Runs `digirom` on the toy and keeps its result.
    pub fn execute(&mut self, digirom: &mut Digirom, show_feedback: bool) {
        self.io.controller.execute(digirom, show_feedback);
        self.result = digirom.result.clone();
        tracing::trace!(%digirom, segments = self.result.len(), "executed");
    }

    /// Sends the variant's message for the current result to the peer.
    pub fn send_message<X: Exchange + ?Sized>(&mut self, exchange: &X) {
        let message = exchange.message(&self.result);
        tracing::debug!(%message, "sending to peer");
        self.io.relay.send(&message);
    }

    /// Polls the relay into the slot, expiring a stale message first.
    pub fn receive_message(&mut self) {
        let now = Instant::now();
        self.slot.expire(now);
        if let Some(message) = self.io.relay.receive() {
            tracing::debug!(%message, "received from peer");
            self.slot.store(now, message);
        }
    }

    /// Consumes the slot and turns it into a digirom ready to replay.
    ///
    /// Returns `Ok(None)` when the slot is empty.
    ///
    /// # Errors
    /// [`EngineError::ProtocolMismatch`] if the message does not match the
    /// variant or fails its payload check; [`EngineError::Command`] if it
    /// does not parse. The message is gone either way.
    pub fn receive_digirom<X: Exchange + ?Sized>(
        &mut self,
        exchange: &X,
    ) -> Result<Option<Digirom>, EngineError> {
        let Some(message) = self.slot.take() else {
            return Ok(None);
        };
        if !exchange.matched(&message) {
            return Err(EngineError::ProtocolMismatch {
                message,
                reason: "unexpected message type",
            });
        }
        let mut digirom = parse_command(&message)?;
        if !exchange.modify_received_digirom(&self.result, &mut digirom) {
            return Err(EngineError::ProtocolMismatch {
                message,
                reason: "unexpected message contents",
            });
        }
        Ok(Some(digirom))
    }

    /// Reports `status`, flagging whether it differs from the last one.
    pub fn update_status(&mut self, status: Status) {
        let changed = status != self.status;
        self.io.status.report(status, changed);
        self.status = status;
    }

    /// Re-reports the current status as a change, e.g. right after a
    /// machine is created so the LED matches it.
    pub fn announce_status(&mut self) {
        self.io.status.report(self.status, true);
    }

    pub fn result(&self) -> &[ResultSegment] {
        &self.result
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// The stored, not yet consumed peer message.
    pub fn pending_message(&self) -> Option<&str> {
        self.slot.peek()
    }
}
