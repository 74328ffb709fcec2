//! The session manager: the relay-facing half of a battle device.
//!
//! It's responsible for:
//! - Starting and ending battle sessions from app-feed messages
//! - Acknowledging app-feed messages that ask for it
//! - Filtering the battle feed and holding the latest peer message
//! - Building outbound envelopes stamped with this device's identity
//!
//! # Concurrency note
//!
//! `SessionManager` is plain data with `&mut self` methods. It is owned by
//! the single task that drives the device, like the battle engine itself.

use rtb_protocol::{
    AckMessage, AppFeedMessage, ApplicationId, BattleFeedMessage, DeviceOutput,
    TopicAction, RTB_APPLICATION_ID,
};

use crate::{Role, Session, SessionConfig, SessionError};

/// What an app-feed message did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppFeedOutcome {
    /// The battle that this message ended, if one was running.
    pub left: Option<Session>,
    /// The battle that this message started.
    pub joined: Option<Session>,
    /// A battle that was requested but turned down by the caller's
    /// check. It was never stored as the active session.
    pub declined: Option<Session>,
    /// A plain digirom to run outside of a battle.
    pub digirom: Option<String>,
    /// Acknowledgement to publish on the device output feed.
    pub ack: Option<AckMessage>,
}

/// Tracks the current battle session and its inbound message slot.
///
/// ## Lifecycle
///
/// ```text
/// app feed: subscribe ──→ [active] ──→ battle feed messages → slot
///                           │
///        unsubscribe / other topic action / new digirom / quit()
///                           ▼
///                        [idle]
/// ```
pub struct SessionManager {
    config: SessionConfig,

    /// At most one battle at a time.
    session: Option<Session>,

    /// Latest digirom string from the peer. Overwritten by newer
    /// arrivals, consumed by [`take_battle_digirom`](Self::take_battle_digirom).
    battle_digirom: Option<String>,

    /// Echoed back on acknowledgements and device outputs.
    last_application_id: Option<ApplicationId>,

    /// Whether the app asked us not to print digirom text.
    api_response: bool,
}

impl SessionManager {
    /// Creates an idle session manager.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            session: None,
            battle_digirom: None,
            last_application_id: None,
            api_response: false,
        }
    }

    /// Processes a message from the device's app feed.
    ///
    /// Any topic action, or a non-null digirom, ends the current battle
    /// first. A `subscribe` then starts a new one; everything else is
    /// ordinary digirom traffic.
    ///
    /// # Errors
    /// A `subscribe` missing `topic`, `host`, `user_type` or `battle_type`
    /// gives [`SessionError::MissingField`]; an unrecognised `user_type`
    /// gives [`SessionError::UnknownRole`]. In both cases the previous
    /// battle has already been ended.
    pub fn handle_app_feed(
        &mut self,
        msg: &AppFeedMessage,
    ) -> Result<AppFeedOutcome, SessionError> {
        self.handle_app_feed_checked(msg, |_| true)
    }

    /// Like [`handle_app_feed`](Self::handle_app_feed), but a `subscribe`
    /// only becomes the active session when `accepts` returns true for
    /// it. A declined session is reported in
    /// [`AppFeedOutcome::declined`]; the previous battle is still ended.
    ///
    /// # Errors
    /// Same as [`handle_app_feed`](Self::handle_app_feed).
    pub fn handle_app_feed_checked<F>(
        &mut self,
        msg: &AppFeedMessage,
        accepts: F,
    ) -> Result<AppFeedOutcome, SessionError>
    where
        F: FnOnce(&Session) -> bool,
    {
        let mut outcome = AppFeedOutcome {
            ack: self.acknowledge(msg),
            ..AppFeedOutcome::default()
        };

        if msg.topic_action.is_some() || msg.digirom.is_some() {
            outcome.left = self.quit();
        }

        if msg.topic_action == Some(TopicAction::Subscribe) {
            let session = session_from(msg)?;
            if !accepts(&session) {
                outcome.declined = Some(session);
                return Ok(outcome);
            }
            tracing::info!(
                battle_type = %session.battle_type,
                role = %session.role,
                topic = %session.feed_topic(),
                "joined real-time battle"
            );
            self.session = Some(session.clone());
            outcome.joined = Some(session);
        } else {
            self.api_response = msg.api_response;
            if msg.application_id.is_some() {
                self.last_application_id = msg.application_id.clone();
            }
            if let Some(digirom) = &msg.digirom {
                if self.api_response {
                    tracing::info!("received new digirom");
                } else {
                    tracing::info!(%digirom, "received new digirom");
                }
            }
            outcome.digirom = msg.digirom.clone();
        }

        Ok(outcome)
    }

    /// The acknowledgement owed for `msg`, if it carries an `ack_id`.
    ///
    /// Stamped with the application id seen before `msg`.
    pub fn acknowledge(&self, msg: &AppFeedMessage) -> Option<AckMessage> {
        msg.ack_id.map(|ack_id| AckMessage {
            application_uuid: self.last_application_id.clone(),
            device_uuid: self.config.device_uuid.clone(),
            ack_id,
        })
    }

    /// Processes a message from the shared battle feed.
    ///
    /// Returns `true` if the message was stored for the engine. Messages
    /// arriving with no active battle, and our own echoes, are dropped.
    pub fn handle_battle_feed(&mut self, msg: &BattleFeedMessage) -> bool {
        let Some(session) = &self.session else {
            tracing::debug!("battle message while no battle is active, ignoring");
            return false;
        };

        let from_peer = matches!(
            msg.user_type.as_deref().map(Role::from_wire),
            Some(Ok(role)) if role != session.role
        );
        if !from_peer {
            tracing::trace!(role = %session.role, "ignoring message from self");
            return false;
        }

        tracing::debug!(output = %msg.output, "battle message stored");
        self.last_application_id = Some(msg.application_id.clone());
        self.battle_digirom = Some(msg.output.clone());
        true
    }

    /// Removes and returns the peer's latest digirom string.
    pub fn take_battle_digirom(&mut self) -> Option<String> {
        self.battle_digirom.take()
    }

    /// Wraps a battle reply for the shared topic.
    ///
    /// Returns `None` when no battle is active or the output is too short
    /// to be a toy result.
    pub fn battle_output(&self, output: &str) -> Option<BattleFeedMessage> {
        let session = self.session.as_ref()?;
        if output.len() <= self.config.min_output_len {
            return None;
        }
        Some(BattleFeedMessage {
            application_id: ApplicationId::Number(RTB_APPLICATION_ID),
            device_uuid: Some(self.config.device_uuid.clone()),
            output: output.to_string(),
            user_type: Some(session.role.as_str().to_string()),
        })
    }

    /// Wraps output for the device's own output feed (heartbeats,
    /// plain digirom results).
    pub fn device_output(&self, output: &str) -> DeviceOutput {
        DeviceOutput {
            application_uuid: self.last_application_id.clone(),
            device_uuid: self.config.device_uuid.clone(),
            output: output.to_string(),
        }
    }

    /// Ends the current battle, if any, and clears the inbound slot.
    ///
    /// Returns the session that was ended so the caller can unsubscribe
    /// from its feed topic.
    pub fn quit(&mut self) -> Option<Session> {
        self.battle_digirom = None;
        let ended = self.session.take();
        if let Some(session) = &ended {
            tracing::info!(topic = %session.feed_topic(), "left real-time battle");
        }
        ended
    }

    /// The current battle, if any.
    pub fn active(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Whether the app asked for digirom text to be hidden.
    pub fn api_response(&self) -> bool {
        self.api_response
    }
}

fn session_from(msg: &AppFeedMessage) -> Result<Session, SessionError> {
    let topic = msg.topic.clone().ok_or(SessionError::MissingField("topic"))?;
    let host = msg.host.clone().ok_or(SessionError::MissingField("host"))?;
    let user_type = msg
        .user_type
        .as_deref()
        .ok_or(SessionError::MissingField("user_type"))?;
    let battle_type = msg
        .battle_type
        .clone()
        .ok_or(SessionError::MissingField("battle_type"))?;
    Ok(Session {
        battle_type,
        role: Role::from_wire(user_type)?,
        host,
        topic,
    })
}

// =========================================================================
// Tests
// =========================================================================
