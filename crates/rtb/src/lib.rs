//! # RTB
//!
//! Real-time battles between two toys on two devices, through a relay.
//!
//! Each device wires a toy transceiver to a battle machine and talks to
//! its peer through a publish/subscribe relay. This crate ties the
//! layers together:
//!
//! ```text
//! relay payloads ─→ Runner ─→ Driver ─→ SessionManager (rtb-session)
//!                     │          └──→ Battle machine (rtb-engine) ─→ toy
//!                     └─ LoopPacer (rtb-tick)
//! ```
//!
//! Embedders implement [`Controller`] for their transceiver and
//! [`Publisher`] for their relay client, then either call
//! [`Driver::tick`] from their own loop or hand the driver to a
//! [`Runner`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rtb::prelude::*;
//!
//! # fn demo(toy: impl Controller + 'static) {
//! let (out_tx, _out_rx) = tokio::sync::mpsc::unbounded_channel::<Outbound>();
//! let driver = Driver::new(
//!     DriverConfig::for_device("device-1"),
//!     toy,
//!     |status: Status, _changed: bool| println!("{status}"),
//!     out_tx,
//! );
//! let (_in_tx, in_rx) = tokio::sync::mpsc::channel(16);
//! let _task = tokio::spawn(Runner::new(driver).run(in_rx));
//! # }
//! ```

mod driver;
mod error;
mod link;
mod runner;

pub use driver::{Driver, DriverConfig, HEARTBEAT};
pub use error::RtbError;
pub use link::{BattleLink, Outbound, Publisher};
pub use runner::{Inbound, Runner};

pub use rtb_engine as engine;
pub use rtb_protocol as protocol;
pub use rtb_session as session;
pub use rtb_tick as tick;

/// The types most embedders need.
pub mod prelude {
    pub use crate::{Driver, DriverConfig, Inbound, Outbound, Publisher, RtbError, Runner};
    pub use rtb_engine::{Controller, EngineConfig, Status, StatusSink};
    pub use rtb_protocol::{
        AppFeedMessage, BattleFeedMessage, Codec, Digirom, JsonCodec, ResultSegment, TopicAction,
    };
    pub use rtb_session::{Role, SessionConfig};
    pub use rtb_tick::PacerConfig;
}
