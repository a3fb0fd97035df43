//! Constrained transfers.
//!
//! Static rule feeds can override the default transfer logic between two
//! specific trips: guarantee the connection, stay seated on a through
//! service, demand a longer minimum transfer time, or forbid the transfer.
//! The search asks this module, per candidate boarding, whether such a rule
//! applies.

mod boarding;
mod constraint;
mod index;

pub use boarding::ConstrainedTransferBoarding;
pub use constraint::{ConstraintError, MAX_CONSTRAINT_SECS, TransferConstraint, TransferPriority};
pub use index::{ConstrainedTransfer, ConstrainedTransferIndex, TripStopPosition};
