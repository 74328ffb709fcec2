//! The outside world, as the engine sees it.
//!
//! A battle machine talks to three collaborators:
//!
//! - [`Controller`]: runs a digirom against the toy (blocking, bounded)
//! - [`Relay`]: sends to and polls the peer (never blocks)
//! - [`StatusSink`]: LED / beeper feedback
//!
//! They are traits so the firmware, the async runner and the tests can
//! each plug in their own. Shared hardware is usually wrapped in
//! `Arc<Mutex<_>>`; a shared controller implements the trait by locking.

use std::sync::{Arc, Mutex, PoisonError};

use rtb_protocol::Digirom;

use crate::Status;

/// Executes digiroms against the toy transceiver.
pub trait Controller: Send {
    /// Runs `digirom` and fills `digirom.result`.
    ///
    /// Must not fail: transceiver faults are recorded in the result
    /// (usually as missing segments) for the success checks to see.
    fn execute(&mut self, digirom: &mut Digirom, show_feedback: bool);
}

/// Best-effort link to the peer device.
pub trait Relay: Send {
    /// Publishes `message` to the peer. Fire-and-forget.
    fn send(&mut self, message: &str);

    /// Returns the peer's next message if one has arrived. Non-blocking;
    /// a given message is returned at most once.
    fn receive(&mut self) -> Option<String>;
}

/// Receives status changes for user feedback.
pub trait StatusSink: Send {
    /// `changed` is false when the same status is reported again, so the
    /// sink can avoid re-beeping.
    fn report(&mut self, status: Status, changed: bool);
}

impl<F> StatusSink for F
where
    F: FnMut(Status, bool) + Send,
{
    fn report(&mut self, status: Status, changed: bool) {
        self(status, changed)
    }
}

impl<T: Controller + ?Sized> Controller for Arc<Mutex<T>> {
    fn execute(&mut self, digirom: &mut Digirom, show_feedback: bool) {
        self.lock()
            .unwrap_or_else(PoisonError::into_inner)
            .execute(digirom, show_feedback)
    }
}

/// The three collaborators, bundled for a machine constructor.
pub struct Peripherals {
    pub controller: Box<dyn Controller>,
    pub relay: Box<dyn Relay>,
    pub status: Box<dyn StatusSink>,
}

impl Peripherals {
    pub fn new(
        controller: impl Controller + 'static,
        relay: impl Relay + 'static,
        status: impl StatusSink + 'static,
    ) -> Self {
        Self {
            controller: Box::new(controller),
            relay: Box::new(relay),
            status: Box::new(status),
        }
    }
}
