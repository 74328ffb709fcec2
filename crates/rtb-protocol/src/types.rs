//! Relay envelope types.
//!
//! Every message that crosses the relay is a small JSON document. There
//! are two feeds:
//!
//! - the **app feed**: per-device input from the companion app. It carries
//!   either a plain digirom to run on a loop, or a `topic_action` telling
//!   the device to join or leave a real-time battle topic.
//! - the **battle feed**: the shared `{host}/f/{topic}` topic two devices
//!   use to exchange digirom strings during a battle.
//!
//! Optional fields are `Option`s with `#[serde(default)]`, because the app
//! omits whatever a given message does not need.

use std::fmt;

use serde::{Deserialize, Serialize};

/// `application_id` used on every battle-feed message.
pub const RTB_APPLICATION_ID: u64 = 1;

// ---------------------------------------------------------------------------
// ApplicationId
// ---------------------------------------------------------------------------

/// The app identifies itself with either a number or a UUID string.
///
/// `#[serde(untagged)]` tries each variant in order, so `1` becomes
/// `Number(1)` and `"5f0c…"` becomes `Text("5f0c…")`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApplicationId {
    Number(u64),
    Text(String),
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

// ---------------------------------------------------------------------------
// App feed
// ---------------------------------------------------------------------------

/// What the app wants the device to do with a battle topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopicAction {
    Subscribe,
    Unsubscribe,
    /// Any action this firmware does not know. Still ends the current battle.
    #[serde(other)]
    Other,
}

/// A message on the device's app feed.
///
/// ```json
/// {
///   "application_id": "…",
///   "api_response": false,
///   "topic_action": "subscribe",
///   "topic": "…",
///   "host": "BrassBolt",
///   "user_type": "guest",
///   "battle_type": "legendz",
///   "digirom": null,
///   "ack_id": 111111
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppFeedMessage {
    #[serde(default)]
    pub application_id: Option<ApplicationId>,
    /// When true the app does not want the device to echo digirom text.
    #[serde(default)]
    pub api_response: bool,
    #[serde(default)]
    pub topic_action: Option<TopicAction>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub user_type: Option<String>,
    #[serde(default)]
    pub battle_type: Option<String>,
    #[serde(default)]
    pub digirom: Option<String>,
    #[serde(default)]
    pub ack_id: Option<u64>,
}

/// Acknowledgement for an app-feed message that carried an `ack_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckMessage {
    pub application_uuid: Option<ApplicationId>,
    pub device_uuid: String,
    pub ack_id: u64,
}

/// Device output: the result of a plain digirom, or the `"RTB"` heartbeat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceOutput {
    pub application_uuid: Option<ApplicationId>,
    pub device_uuid: String,
    pub output: String,
}

// ---------------------------------------------------------------------------
// Battle feed
// ---------------------------------------------------------------------------

/// A message on a shared battle topic.
///
/// Both devices publish to the same topic, so each one sees its own
/// messages echoed back; `user_type` tells them apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleFeedMessage {
    pub application_id: ApplicationId,
    #[serde(default)]
    pub device_uuid: Option<String>,
    pub output: String,
    #[serde(default)]
    pub user_type: Option<String>,
}
