//! Transfer index construction.
//!
//! Street routing hands over raw candidate transfers per stop. This module
//! prices them with a [`TransferCostModel`], keeps the cheapest edge per stop
//! pair, and materializes both traversal directions into an immutable
//! [`TransferIndex`] that searches query without locking.

mod candidate;
mod cost;
mod edge;
mod index;

pub use candidate::CandidateTransfer;
pub use cost::{TransferCostModel, WalkCostModel};
pub use edge::{SearchDirection, TransferCost, TransferEdge};
pub use index::{TransferIndex, TransferIndexError};
