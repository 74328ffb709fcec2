//! Fixed-rate loop pacer for battle devices.
//!
//! A battle machine is stepped by calling its `tick()` over and over. On
//! a microcontroller that is a bare `loop {}`; inside a tokio task it
//! needs a pacer so the task yields between steps and other branches of
//! a `select!` (incoming relay messages) get a turn.
//!
//! # Overruns
//!
//! A step may block for a long time while the toy is being talked to.
//! The pacer never tries to catch up: missed ticks are counted and the
//! next tick is scheduled one period after the late one.
//!
//! # Integration
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(msg) = feed_rx.recv() => driver.handle(msg),
//!         _ = pacer.wait_for_tick() => {
//!             driver.tick();
//!             pacer.record_tick_end();
//!         }
//!     }
//! }
//! ```

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Pacer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PacerConfig {
    /// Ticks per second. 0 disables the pacer (it never fires).
    pub rate_hz: u32,
    /// Warn when a step uses more than this fraction of its period.
    pub budget_warn_threshold: f64,
    /// Random delay (0..max µs) added to the first tick only.
    pub initial_jitter_us: u64,
}

impl Default for PacerConfig {
    fn default() -> Self {
        Self {
            rate_hz: 20,
            budget_warn_threshold: 1.0,
            initial_jitter_us: 2_000,
        }
    }
}

impl PacerConfig {
    pub const MAX_RATE_HZ: u32 = 100;

    pub fn with_rate(rate_hz: u32) -> Self {
        Self {
            rate_hz,
            ..Default::default()
        }
    }

    /// Clamps out-of-range values. Called by [`LoopPacer::new`].
    pub fn validated(mut self) -> Self {
        if self.rate_hz > Self::MAX_RATE_HZ {
            warn!(rate = self.rate_hz, max = Self::MAX_RATE_HZ, "rate_hz too high, clamping");
            self.rate_hz = Self::MAX_RATE_HZ;
        }
        if self.budget_warn_threshold.is_nan() || self.budget_warn_threshold <= 0.0 {
            self.budget_warn_threshold = 1.0;
        }
        self
    }

    /// One tick period, `None` when disabled.
    pub fn period(&self) -> Option<Duration> {
        (self.rate_hz > 0).then(|| Duration::from_secs_f64(1.0 / f64::from(self.rate_hz)))
    }
}

// ---------------------------------------------------------------------------
// Tick info and metrics
// ---------------------------------------------------------------------------

/// Returned by [`LoopPacer::wait_for_tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickInfo {
    /// Tick number, starting at 1.
    pub tick: u64,
    /// Whole periods missed since the scheduled deadline.
    pub ticks_skipped: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PacerMetrics {
    pub total_ticks: u64,
    pub total_overruns: u64,
    pub total_skipped: u64,
    /// Longest step reported through [`LoopPacer::record_tick_end`].
    pub max_step_time: Duration,
}

// ---------------------------------------------------------------------------
// Pacer
// ---------------------------------------------------------------------------

pub struct LoopPacer {
    config: PacerConfig,
    period: Option<Duration>,
    tick_count: u64,
    next_tick: Option<Instant>,
    step_start: Option<Instant>,
    paused: bool,
    metrics: PacerMetrics,
}

impl LoopPacer {
    /// Creates a pacer whose first tick is one period (plus jitter) away.
    pub fn new(config: PacerConfig) -> Self {
        let config = config.validated();
        let period = config.period();

        let next_tick = period.map(|p| {
            let jitter = match config.initial_jitter_us {
                0 => Duration::ZERO,
                max => Duration::from_micros(rand::rng().random_range(0..max)),
            };
            Instant::now() + p + jitter
        });

        debug!(rate_hz = config.rate_hz, "loop pacer created");

        Self {
            config,
            period,
            tick_count: 0,
            next_tick,
            step_start: None,
            paused: false,
            metrics: PacerMetrics::default(),
        }
    }


    /// Waits for the next tick.
    ///
    /// Pends forever when paused or when the rate is 0, so a `select!`
    /// keeps serving its other branches.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let (deadline, period) = match (self.next_tick, self.period) {
            (Some(deadline), Some(period)) if !self.paused => (deadline, period),
            _ => std::future::pending().await,
        };

        time::sleep_until(deadline).await;

        let now = Instant::now();
        let late_by = now.saturating_duration_since(deadline);
        let ticks_skipped = (late_by.as_nanos() / period.as_nanos()) as u64;

        self.tick_count += 1;
        self.step_start = Some(now);
        self.next_tick = Some(now + period);

        self.metrics.total_ticks += 1;
        if ticks_skipped > 0 {
            self.metrics.total_overruns += 1;
            self.metrics.total_skipped += ticks_skipped;
            debug!(tick = self.tick_count, skipped = ticks_skipped, "tick late, skipping ahead");
        }
        trace!(tick = self.tick_count, "tick");

        TickInfo {
            tick: self.tick_count,
            ticks_skipped,
        }
    }

    /// Marks the end of the step started by the last tick.
    ///
    /// Without this call no budget warning or step time is recorded.
    pub fn record_tick_end(&mut self) {
        let Some(start) = self.step_start.take() else {
            return;
        };
        let elapsed = start.elapsed();
        self.metrics.max_step_time = self.metrics.max_step_time.max(elapsed);

        if let Some(period) = self.period {
            let utilization = elapsed.as_secs_f64() / period.as_secs_f64();
            if utilization >= self.config.budget_warn_threshold {
                warn!(
                    tick = self.tick_count,
                    elapsed_ms = elapsed.as_millis() as u64,
                    period_ms = period.as_millis() as u64,
                    "step exceeded tick period"
                );
            }
        }
    }

    /// Stops ticking until [`resume`](Self::resume). Idempotent.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!(tick = self.tick_count, "loop pacer paused");
        }
    }

    /// Resumes one period from now, without a burst for the paused time.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.next_tick = self.period.map(|p| Instant::now() + p);
            debug!(tick = self.tick_count, "loop pacer resumed");
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn metrics(&self) -> &PacerMetrics {
        &self.metrics
    }
}
