//! Real-time battle engine.
//!
//! Two devices, each wired to a toy, play one battle through a relay that
//! is slow, lossy and occasionally repeats itself. This crate holds the
//! per-device state machines that keep the two sides in step.
//!
//! # Key types
//!
//! - [`RealTime`]: behaviour shared by both roles: execute, send,
//!   receive (with a 30 s expiring slot), status reporting
//! - [`Initiator`]: scan / wait / retry machine used by hosts, and by
//!   both sides of symmetric games
//! - [`Responder`]: purely reactive machine: answer what arrives
//! - [`Exchange`], [`Scan`]: the hooks a game variant implements
//! - [`variants`]: Legendz Talis and PenX battle
//! - [`VariantTable`]: `(battle type, role)` → machine constructor
//!
//! The engine never blocks on the network. The only slow call a step can
//! make is [`Controller::execute`], which talks to the toy.

mod collab;
mod config;
mod error;
mod guest;
mod host;
mod realtime;
mod slot;
mod strategy;
mod table;
pub mod variants;

pub use collab::{Controller, Peripherals, Relay, StatusSink};
pub use config::{EngineConfig, HostTiming, Status};
pub use error::EngineError;
pub use guest::Responder;
pub use host::{Initiator, Phase};
pub use realtime::RealTime;
pub use slot::MessageSlot;
pub use strategy::{Exchange, Scan};
pub use table::{Battle, BattleKind, VariantTable};
