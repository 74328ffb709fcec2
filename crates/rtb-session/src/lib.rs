//! Relay-side session management for real-time battles.
//!
//! This crate turns relay envelopes into battle sessions:
//!
//! 1. **Lifecycle**: an app-feed `subscribe` starts a [`Session`], an
//!    `unsubscribe` (or any new command) ends it ([`SessionManager`]).
//! 2. **Battle feed**: messages on the shared topic are filtered (own
//!    echoes dropped) and parked in a single last-write-wins slot the
//!    engine polls.
//! 3. **Outbound**: battle replies, heartbeats and acknowledgements are
//!    wrapped in the envelopes the relay expects.
//!
//! # How it fits in the stack
//!
//! ```text
//! Engine (above)   ← polls the battle slot, sends replies through here
//!     ↕
//! Session (this crate)  ← who we are in the battle, which topic
//!     ↕
//! Protocol (below) ← envelope types
//! ```

mod error;
mod manager;
mod session;

pub use error::SessionError;
pub use manager::{AppFeedOutcome, SessionManager};
pub use session::{Role, Session, SessionConfig};
