//! The reactive machine.

use crate::{EngineConfig, EngineError, Exchange, Peripherals, RealTime, Status};

/// Answers the peer: whenever a message arrives, replay it to the toy
/// and, if the toy responded, send the toy's answer back.
///
/// No timers and no retries. The scanning side owns robustness, so this
/// side can always be ready.
pub struct Responder<X> {
    exchange: X,
    core: RealTime,
}

impl<X: Exchange> Responder<X> {
    pub fn new(exchange: X, io: Peripherals, config: &EngineConfig) -> Self {
        Self {
            exchange,
            core: RealTime::new(io, config),
        }
    }

    /// Advances the machine by one step. A no-op when nothing arrived.
    ///
    /// # Errors
    /// A peer message that fails to match or parse.
    pub fn tick(&mut self) -> Result<(), EngineError> {
        self.core.receive_message();
        let Some(mut digirom) = self.core.receive_digirom(&self.exchange)? else {
            return Ok(());
        };

        self.core.update_status(Status::Push);
        self.core.execute(&mut digirom, false);
        self.core.update_status(Status::Wait);
        if self.exchange.comm_successful(self.core.result()) {
            self.core.send_message(&self.exchange);
        } else {
            tracing::debug!(segments = self.core.result().len(), "toy did not answer");
        }
        Ok(())
    }

    pub fn core(&self) -> &RealTime {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut RealTime {
        &mut self.core
    }
}
