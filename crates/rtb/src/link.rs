//! The device's side of the relay: what goes out, and the engine's view
//! of the battle feed.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rtb_engine::Relay;
use rtb_protocol::{AckMessage, BattleFeedMessage, DeviceOutput};
use rtb_session::SessionManager;
use tokio::sync::mpsc;

/// Everything the device asks the relay client to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Start listening on a battle feed topic.
    Subscribe(String),
    /// Stop listening on a battle feed topic.
    Unsubscribe(String),
    /// Publish a battle reply on the shared topic.
    Battle {
        topic: String,
        message: BattleFeedMessage,
    },
    /// Publish on the device's own output feed.
    Output(DeviceOutput),
    /// Acknowledge an app-feed message on the output feed.
    Ack(AckMessage),
}

/// Hands outbound traffic to whatever talks to the relay.
///
/// Must not block: the engine calls it from inside a battle step.
pub trait Publisher: Send + Sync {
    fn publish(&self, outbound: Outbound);
}

impl Publisher for mpsc::UnboundedSender<Outbound> {
    fn publish(&self, outbound: Outbound) {
        if self.send(outbound).is_err() {
            tracing::debug!("relay client gone, dropping outbound message");
        }
    }
}

/// Session manager shared by the driver and the engine's relay.
pub(crate) type SharedSessions = Arc<Mutex<SessionManager>>;

pub(crate) fn lock(sessions: &SharedSessions) -> MutexGuard<'_, SessionManager> {
    sessions.lock().unwrap_or_else(PoisonError::into_inner)
}

/// [`Relay`] for a battle machine, backed by the session manager.
///
/// `receive` drains the session's inbound slot; `send` wraps the reply
/// in a battle-feed envelope for the session's topic. Sends with no
/// active session, or too short to be a toy result, are dropped.
pub struct BattleLink {
    sessions: SharedSessions,
    publisher: Arc<dyn Publisher>,
}

impl BattleLink {
    pub(crate) fn new(sessions: SharedSessions, publisher: Arc<dyn Publisher>) -> Self {
        Self {
            sessions,
            publisher,
        }
    }
}

impl Relay for BattleLink {
    fn send(&mut self, message: &str) {
        let outbound = {
            let sessions = lock(&self.sessions);
            let Some(session) = sessions.active() else {
                tracing::debug!("no active battle, not sending");
                return;
            };
            let Some(envelope) = sessions.battle_output(message) else {
                tracing::debug!(%message, "output too short, not sending");
                return;
            };
            Outbound::Battle {
                topic: session.feed_topic(),
                message: envelope,
            }
        };
        self.publisher.publish(outbound);
    }

    fn receive(&mut self) -> Option<String> {
        lock(&self.sessions).take_battle_digirom()
    }
}
