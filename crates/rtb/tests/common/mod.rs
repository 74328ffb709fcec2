//! Shared fixtures for the driver and runner tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use rtb::prelude::*;
use rtb::protocol::ApplicationId;
use tokio::sync::mpsc;
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

// =========================================================================
// Toy
// =========================================================================

#[derive(Default)]
struct ToyState {
    script: VecDeque<Vec<ResultSegment>>,
    executed: Vec<(String, bool)>,
}

/// Answers executes from a script; silent once the script runs out.
#[derive(Clone, Default)]
pub struct ScriptedToy(Arc<Mutex<ToyState>>);

impl ScriptedToy {
    pub fn answer(&self, result: Vec<ResultSegment>) {
        self.0.lock().unwrap().script.push_back(result);
    }

    pub fn commands(&self) -> Vec<String> {
        self.0.lock().unwrap().executed.iter().map(|(c, _)| c.clone()).collect()
    }

    pub fn replays(&self) -> Vec<String> {
        self.0
            .lock()
            .unwrap()
            .executed
            .iter()
            .filter(|(_, feedback)| *feedback)
            .map(|(c, _)| c.clone())
            .collect()
    }
}

impl Controller for ScriptedToy {
    fn execute(&mut self, digirom: &mut Digirom, show_feedback: bool) {
        let mut state = self.0.lock().unwrap();
        state.executed.push((digirom.to_string(), show_feedback));
        digirom.result = state.script.pop_front().unwrap_or_default();
    }
}

// =========================================================================
// Status
// =========================================================================

#[derive(Clone, Default)]
pub struct StatusLog(Arc<Mutex<Vec<(Status, bool)>>>);

impl StatusLog {
    pub fn sink(&self) -> impl FnMut(Status, bool) + Send + use<> {
        let log = self.0.clone();
        move |status, changed| log.lock().unwrap().push((status, changed))
    }

    pub fn take(&self) -> Vec<(Status, bool)> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

// =========================================================================
// Device
// =========================================================================

pub const TOPIC: &str = "BrassBolt/f/t1";

pub struct Device {
    pub driver: Driver,
    pub toy: ScriptedToy,
    pub status: StatusLog,
    pub outbound: mpsc::UnboundedReceiver<Outbound>,
}

impl Device {
    pub fn new(device_uuid: &str) -> Self {
        let toy = ScriptedToy::default();
        let status = StatusLog::default();
        let (tx, outbound) = mpsc::unbounded_channel();
        let driver = Driver::new(
            DriverConfig::for_device(device_uuid),
            toy.clone(),
            status.sink(),
            tx,
        );
        Self {
            driver,
            toy,
            status,
            outbound,
        }
    }

    /// Everything published since the last call.
    pub fn published(&mut self) -> Vec<Outbound> {
        let mut out = Vec::new();
        while let Ok(item) = self.outbound.try_recv() {
            out.push(item);
        }
        out
    }

    /// Outputs of battle envelopes published since the last call.
    pub fn battle_outputs(&mut self) -> Vec<String> {
        self.published()
            .into_iter()
            .filter_map(|o| match o {
                Outbound::Battle { message, .. } => Some(message.output),
                _ => None,
            })
            .collect()
    }
}

// =========================================================================
// Messages
// =========================================================================

pub fn subscribe(battle_type: &str, role: &str) -> AppFeedMessage {
    AppFeedMessage {
        topic_action: Some(TopicAction::Subscribe),
        topic: Some("t1".into()),
        host: Some("BrassBolt".into()),
        user_type: Some(role.into()),
        battle_type: Some(battle_type.into()),
        ..AppFeedMessage::default()
    }
}

/// An app-feed message that loads `digirom` outside of a battle.
pub fn load(digirom: &str) -> AppFeedMessage {
    AppFeedMessage {
        digirom: Some(digirom.into()),
        application_id: Some(ApplicationId::Number(7)),
        ..AppFeedMessage::default()
    }
}

pub fn unsubscribe() -> AppFeedMessage {
    AppFeedMessage {
        topic_action: Some(TopicAction::Unsubscribe),
        ..AppFeedMessage::default()
    }
}

pub fn from_peer(role: &str, output: &str) -> BattleFeedMessage {
    BattleFeedMessage {
        application_id: ApplicationId::Number(1),
        device_uuid: Some("peer".into()),
        output: output.into(),
        user_type: Some(role.into()),
    }
}

pub fn words(n: u16) -> Vec<ResultSegment> {
    (0..n)
        .map(|i| {
            if i % 2 == 0 {
                ResultSegment::received((0x1000 + i).to_be_bytes())
            } else {
                ResultSegment::sent((0x2000 + i).to_be_bytes())
            }
        })
        .collect()
}

pub fn talis_payload(seed: u8) -> Vec<u8> {
    (0..20).map(|i| seed.wrapping_add(i)).collect()
}

pub fn talis_message(payload: &[u8]) -> String {
    let hex: String = payload.iter().map(|b| format!("{b:02X}")).collect();
    format!("LT1-{hex}-AA590003-AA590003-AA590003")
}

// =========================================================================
// Diagnostics
// =========================================================================

/// Collects every event as `"message field=value ..."`, with its level.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<(tracing::Level, String)>>>);

impl LogCapture {
    /// Installs a collecting subscriber for the current thread.
    pub fn install() -> (Self, tracing::subscriber::DefaultGuard) {
        let capture = Self::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        let guard = tracing::subscriber::set_default(subscriber);
        (capture, guard)
    }

    pub fn warnings(&self) -> Vec<String> {
        self.at(tracing::Level::WARN)
    }

    pub fn infos(&self) -> Vec<String> {
        self.at(tracing::Level::INFO)
    }

    fn at(&self, level: tracing::Level) -> Vec<String> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, text)| text.clone())
            .collect()
    }
}

struct FieldText(String);

impl Visit for FieldText {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if !self.0.is_empty() {
            self.0.push(' ');
        }
        if field.name() == "message" {
            self.0.push_str(&format!("{value:?}"));
        } else {
            self.0.push_str(&format!("{}={value:?}", field.name()));
        }
    }
}

impl<S: tracing::Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut text = FieldText(String::new());
        event.record(&mut text);
        self.0
            .lock()
            .unwrap()
            .push((*event.metadata().level(), text.0));
    }
}
