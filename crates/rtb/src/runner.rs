//! Async host for a [`Driver`].
//!
//! The runner owns the driver on a single task. Relay traffic arrives as
//! raw payloads on an `mpsc` channel and is decoded with a [`Codec`];
//! between messages the driver is ticked by a [`LoopPacer`]. Steps and
//! message handling never overlap. The pacer is paused while the driver
//! has neither a battle nor a digirom to run.

use rtb_protocol::{AppFeedMessage, BattleFeedMessage, Codec, JsonCodec};
use rtb_tick::LoopPacer;
use tokio::sync::mpsc;

use crate::{Driver, RtbError};

/// Something the relay client or the UI hands to the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A payload from the device's app feed.
    AppFeed(Vec<u8>),
    /// A payload from the subscribed battle feed.
    BattleFeed(Vec<u8>),
    /// The user left battle mode.
    Exit,
}

/// Drives a [`Driver`] from a channel until the channel closes.
pub struct Runner<C: Codec = JsonCodec> {
    driver: Driver,
    codec: C,
    pacer: LoopPacer,
}

impl Runner<JsonCodec> {
    /// A runner that decodes JSON and paces at the driver's configured rate.
    pub fn new(driver: Driver) -> Self {
        Self::with_codec(driver, JsonCodec)
    }
}

impl<C: Codec> Runner<C> {
    pub fn with_codec(driver: Driver, codec: C) -> Self {
        let pacer = LoopPacer::new(driver.config().pacer.clone());
        let mut runner = Self {
            driver,
            codec,
            pacer,
        };
        runner.sync_pacer();
        runner
    }

    /// Handles one inbound item.
    ///
    /// # Errors
    /// Undecodable payloads and app-feed messages that cannot start a
    /// session. The driver stays usable either way.
    pub fn handle(&mut self, inbound: Inbound) -> Result<(), RtbError> {
        let result = self.dispatch(inbound);
        self.sync_pacer();
        result
    }

    fn dispatch(&mut self, inbound: Inbound) -> Result<(), RtbError> {
        match inbound {
            Inbound::AppFeed(payload) => {
                let msg: AppFeedMessage = self.codec.decode(&payload)?;
                self.driver.handle_app_feed(&msg)?;
            }
            Inbound::BattleFeed(payload) => {
                let msg: BattleFeedMessage = self.codec.decode(&payload)?;
                self.driver.handle_battle_feed(&msg);
            }
            Inbound::Exit => self.driver.exit(),
        }
        Ok(())
    }

    fn sync_pacer(&mut self) {
        if self.driver.is_idle() {
            self.pacer.pause();
        } else {
            self.pacer.resume();
        }
    }

    /// Whether the driver is currently being ticked.
    pub fn is_ticking(&self) -> bool {
        !self.pacer.is_paused()
    }

    /// Runs until `inbound` closes, then leaves any battle and returns
    /// the driver.
    pub async fn run(mut self, mut inbound: mpsc::Receiver<Inbound>) -> Driver {
        tracing::info!("battle runner started");
        loop {
            tokio::select! {
                item = inbound.recv() => match item {
                    Some(item) => {
                        if let Err(err) = self.handle(item) {
                            tracing::warn!(error = %err, "inbound message rejected");
                        }
                    }
                    None => break,
                },
                _ = self.pacer.wait_for_tick() => {
                    self.driver.tick();
                    self.pacer.record_tick_end();
                }
            }
        }
        self.driver.exit();
        let metrics = self.pacer.metrics();
        tracing::info!(
            ticks = self.pacer.tick_count(),
            overruns = metrics.total_overruns,
            max_step_ms = metrics.max_step_time.as_millis() as u64,
            "battle runner stopped"
        );
        self.driver
    }

    pub fn driver(&self) -> &Driver {
        &self.driver
    }

    /// Direct access to the driver. The pacer only notices a change in
    /// its activity on the next [`handle`](Self::handle).
    pub fn driver_mut(&mut self) -> &mut Driver {
        &mut self.driver
    }
}
