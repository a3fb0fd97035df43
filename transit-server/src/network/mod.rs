//! Network snapshots.
//!
//! A [`NetworkDescription`] is read from disk and built into an immutable
//! [`TransitNetwork`]: stops, the transfer index, constrained transfers and
//! the trip versions active at build time. [`NetworkHandle`] owns the current
//! snapshot and hands out shared references to it.

mod description;
mod snapshot;

pub use description::{NetworkDescription, ScheduledTrip};
pub use snapshot::{NetworkError, NetworkHandle, NetworkSummary, TransitNetwork};
