//! Realtime updates to the live schedule.
//!
//! A realtime feed processor submits batches of [`TripMutation`]s. Each
//! mutation succeeds or fails on its own; one failure never stops the rest
//! of the batch. The per-mutation outcomes are folded into an
//! [`UpdateResult`], which is what operators see.

mod error;
mod manager;
mod mutation;
mod result;
mod success;
mod timetable;

pub use error::{UpdateError, UpdateErrorType};
pub use manager::{UpdateHandle, UpdateManager, UpdateManagerError, UpdateRequest};
pub use mutation::TripMutation;
pub use result::UpdateResult;
pub use success::{UpdateSuccess, WarningType};
pub use timetable::{LiveTrip, Timetable};
