//! Game variants.
//!
//! - [`Talis`]: Legendz. Symmetric, both sides scan their own toy and
//!   run the [`Initiator`](crate::Initiator); only the host patches the
//!   peer's payload before replay.
//! - [`PenXHost`] / [`PenXGuest`]: Digimon PenX battle. Asymmetric, the
//!   host scans and drives and the guest answers with a
//!   [`Responder`](crate::Responder).

mod penx;
mod talis;

pub use penx::{PenXGuest, PenXHost};
pub use talis::{talis_checksum, Talis};
