//! The device loop body: joins and leaves battles, feeds the engine,
//! keeps the relay informed. Outside of a battle it runs the digirom
//! the app last loaded.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rtb_engine::{
    Battle, Controller, EngineConfig, EngineError, Peripherals, Status, StatusSink, VariantTable,
};
use rtb_protocol::{parse_command, AppFeedMessage, BattleFeedMessage, Digirom, TopicAction};
use rtb_session::{Session, SessionConfig, SessionManager};
use rtb_tick::PacerConfig;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::link::{lock, BattleLink, Outbound, Publisher, SharedSessions};
use crate::RtbError;

/// Output sent on the device feed while a battle is running.
pub const HEARTBEAT: &str = "RTB";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Everything a device needs to take part in battles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    pub session: SessionConfig,
    pub engine: EngineConfig,
    pub pacer: PacerConfig,
    /// How often [`HEARTBEAT`] is published during a battle.
    pub heartbeat_interval: Duration,
    /// How often the loaded digirom runs outside of a battle. Each run
    /// publishes its result, which doubles as a ping.
    pub digirom_interval: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            engine: EngineConfig::default(),
            pacer: PacerConfig::default(),
            heartbeat_interval: Duration::from_secs(10),
            digirom_interval: Duration::from_secs(5),
        }
    }
}

impl DriverConfig {
    pub fn for_device(device_uuid: impl Into<String>) -> Self {
        Self {
            session: SessionConfig {
                device_uuid: device_uuid.into(),
                ..SessionConfig::default()
            },
            ..Self::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

type SharedStatus = Arc<Mutex<Box<dyn StatusSink>>>;

/// Owns the session manager and the running battle machine.
///
/// Feed it relay messages with [`handle_app_feed`](Self::handle_app_feed)
/// and [`handle_battle_feed`](Self::handle_battle_feed), and call
/// [`tick`](Self::tick) repeatedly. Nothing here blocks except the
/// toy interaction inside a battle step.
pub struct Driver {
    config: DriverConfig,
    sessions: SharedSessions,
    publisher: Arc<dyn Publisher>,
    table: VariantTable,
    controller: Arc<Mutex<dyn Controller>>,
    status: SharedStatus,
    battle: Option<Box<dyn Battle>>,
    last_heartbeat: Option<Instant>,
    digirom: Option<Digirom>,
    last_digirom_run: Option<Instant>,
}

impl Driver {
    pub fn new(
        config: DriverConfig,
        controller: impl Controller + 'static,
        status: impl StatusSink + 'static,
        publisher: impl Publisher + 'static,
    ) -> Self {
        let controller: Arc<Mutex<dyn Controller>> = Arc::new(Mutex::new(controller));
        let status: Box<dyn StatusSink> = Box::new(status);
        Self {
            sessions: Arc::new(Mutex::new(SessionManager::new(config.session.clone()))),
            config,
            publisher: Arc::new(publisher),
            table: VariantTable::standard(),
            controller,
            status: Arc::new(Mutex::new(status)),
            battle: None,
            last_heartbeat: None,
            digirom: None,
            last_digirom_run: None,
        }
    }

    /// Replaces the built-in variant table.
    pub fn with_table(mut self, table: VariantTable) -> Self {
        self.table = table;
        self
    }

    /// Processes an app-feed message.
    ///
    /// A `subscribe` unloads the current digirom; a new digirom is parsed
    /// and loaded, or its parse error is published on the output feed.
    ///
    /// # Errors
    /// [`RtbError::Session`] for a `subscribe` that cannot start a
    /// session. The previous battle has been ended regardless.
    pub fn handle_app_feed(&mut self, msg: &AppFeedMessage) -> Result<(), RtbError> {
        if msg.topic_action == Some(TopicAction::Subscribe) {
            self.digirom = None;
        }
        let previous = lock(&self.sessions).active().cloned();
        let table = &self.table;
        let result = lock(&self.sessions)
            .handle_app_feed_checked(msg, |s| table.supports(&s.battle_type, s.role));

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                let ack = lock(&self.sessions).acknowledge(msg);
                if let Some(ack) = ack {
                    self.publisher.publish(Outbound::Ack(ack));
                }
                if let Some(previous) = previous {
                    self.end_battle(&previous);
                }
                return Err(err.into());
            }
        };

        if let Some(ack) = outcome.ack {
            self.publisher.publish(Outbound::Ack(ack));
        }
        if let Some(left) = &outcome.left {
            self.end_battle(left);
        }
        if let Some(declined) = &outcome.declined {
            let err = EngineError::UnrecognizedVariant {
                battle_type: declined.battle_type.clone(),
                role: declined.role,
            };
            tracing::warn!(error = %err, "cannot start battle");
        }
        if let Some(joined) = &outcome.joined {
            self.start_battle(joined);
        }
        if let Some(command) = &outcome.digirom {
            self.load_digirom(command);
        }
        Ok(())
    }

    /// Processes a battle-feed message. Returns whether it was kept.
    pub fn handle_battle_feed(&mut self, msg: &BattleFeedMessage) -> bool {
        lock(&self.sessions).handle_battle_feed(msg)
    }

    /// One step of the device loop.
    ///
    /// While a battle runs: publishes the heartbeat when due, then runs
    /// one battle step. Step errors are logged, never returned.
    ///
    /// Otherwise runs the loaded digirom once per `digirom_interval` and
    /// publishes its result.
    pub fn tick(&mut self) {
        if self.battle.is_none() {
            self.run_digirom();
            return;
        }

        let now = Instant::now();
        if is_due(self.last_heartbeat, now, self.config.heartbeat_interval) {
            let output = lock(&self.sessions).device_output(HEARTBEAT);
            self.publisher.publish(Outbound::Output(output));
            self.last_heartbeat = Some(now);
        }

        if let Some(Err(err)) = self.battle.as_mut().map(|b| b.tick()) {
            tracing::warn!(error = %err, "battle step failed");
        }
    }

    /// Leaves the current battle at the user's request.
    pub fn exit(&mut self) {
        let ended = lock(&self.sessions).quit();
        if let Some(session) = ended {
            self.end_battle(&session);
        }
    }

    pub fn is_battle_active(&self) -> bool {
        self.battle.is_some()
    }

    /// True when [`tick`](Self::tick) has nothing to do: no battle and no
    /// digirom loaded.
    pub fn is_idle(&self) -> bool {
        self.battle.is_none() && self.digirom.is_none()
    }

    /// The digirom run outside of battles, with its latest result.
    pub fn digirom(&self) -> Option<&Digirom> {
        self.digirom.as_ref()
    }

    /// Status of the running battle, `Idle` when there is none.
    pub fn status(&self) -> Status {
        self.battle.as_ref().map_or(Status::Idle, |b| b.status())
    }

    /// The session the relay side knows about.
    pub fn session(&self) -> Option<Session> {
        lock(&self.sessions).active().cloned()
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    fn start_battle(&mut self, session: &Session) {
        let io = Peripherals::new(
            self.controller.clone(),
            BattleLink::new(self.sessions.clone(), self.publisher.clone()),
            forward_status(self.status.clone()),
        );
        match self
            .table
            .build(&session.battle_type, session.role, io, &self.config.engine)
        {
            Ok(mut battle) => {
                self.publisher
                    .publish(Outbound::Subscribe(session.feed_topic()));
                battle.announce_status();
                tracing::info!(
                    battle_type = %session.battle_type,
                    role = %session.role,
                    "battle started"
                );
                self.battle = Some(battle);
            }
            Err(err) => {
                tracing::warn!(error = %err, "cannot start battle");
                lock(&self.sessions).quit();
            }
        }
    }

    fn load_digirom(&mut self, command: &str) {
        self.last_digirom_run = None;
        match parse_command(command) {
            Ok(digirom) => {
                tracing::debug!(%digirom, "digirom loaded");
                self.digirom = Some(digirom);
            }
            Err(err) => {
                tracing::warn!(error = %err, "cannot load digirom");
                self.digirom = None;
                let output = lock(&self.sessions).device_output(&err.to_string());
                self.publisher.publish(Outbound::Output(output));
            }
        }
    }

    fn run_digirom(&mut self) {
        let Some(digirom) = self.digirom.as_mut() else {
            return;
        };
        let now = Instant::now();
        if !is_due(self.last_digirom_run, now, self.config.digirom_interval) {
            return;
        }
        self.last_digirom_run = Some(now);

        self.controller.execute(digirom, true);
        let result = digirom.result_text();
        tracing::debug!(%digirom, %result, "digirom executed");
        let output = lock(&self.sessions).device_output(&result);
        self.publisher.publish(Outbound::Output(output));
    }

    fn end_battle(&mut self, session: &Session) {
        let last = self.battle.take().map(|b| b.status());
        self.publisher
            .publish(Outbound::Unsubscribe(session.feed_topic()));
        let changed = last.is_some_and(|s| s != Status::Idle);
        report(&self.status, Status::Idle, changed);
    }
}

fn is_due(last: Option<Instant>, now: Instant, interval: Duration) -> bool {
    last.is_none_or(|last| now.saturating_duration_since(last) >= interval)
}

fn report(status: &SharedStatus, value: Status, changed: bool) {
    status
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .report(value, changed);
}

fn forward_status(status: SharedStatus) -> impl FnMut(Status, bool) + Send + 'static {
    move |value, changed| report(&status, value, changed)
}
