//! Single-message inbox with expiry.

use std::time::Duration;

use tokio::time::Instant;

/// Holds at most one peer message and when it arrived.
///
/// There is no queue: a newer message replaces an older one, and a
/// message nobody consumed within the expiry window is dropped. The
/// engine only ever wants the latest word from the peer.
#[derive(Debug, Clone)]
pub struct MessageSlot {
    expiry: Duration,
    stored: Option<(Instant, String)>,
}

impl MessageSlot {
    pub fn new(expiry: Duration) -> Self {
        Self {
            expiry,
            stored: None,
        }
    }

    /// Drops the stored message if it is older than the expiry window.
    pub fn expire(&mut self, now: Instant) {
        if let Some((arrived, _)) = &self.stored {
            if now.saturating_duration_since(*arrived) > self.expiry {
                tracing::debug!("stored battle message expired");
                self.stored = None;
            }
        }
    }

    /// Stores `message`, replacing whatever was there.
    pub fn store(&mut self, now: Instant, message: String) {
        self.stored = Some((now, message));
    }

    /// Removes and returns the stored message.
    pub fn take(&mut self) -> Option<String> {
        self.stored.take().map(|(_, message)| message)
    }

    pub fn peek(&self) -> Option<&str> {
        self.stored.as_ref().map(|(_, message)| message.as_str())
    }
}
