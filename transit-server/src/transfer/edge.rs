//! Indexed transfer edges.

use serde::{Deserialize, Serialize};

use crate::domain::StopIndex;

/// Direction a search traverses the network in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchDirection {
    /// Depart-after search
    #[default]
    Forward,
    /// Arrive-by search
    Reverse,
}

/// Time and generalized cost of traversing one candidate transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferCost {
    pub duration_secs: u32,
    /// Generalized cost in centi-seconds
    pub c1: i32,
}

/// A directed transfer as seen by the search.
///
/// In the forward index `stop` is the destination; in the reverse index it
/// is the origin of the original transfer and `reversed` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TransferEdge {
    pub stop: StopIndex,
    pub duration_secs: u32,
    pub c1: i32,
    pub reversed: bool,
}

impl TransferEdge {
    pub fn new(stop: StopIndex, cost: TransferCost) -> Self {
        Self {
            stop,
            duration_secs: cost.duration_secs,
            c1: cost.c1,
            reversed: false,
        }
    }

    /// The reverse-direction twin of a forward edge leaving `from`.
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_server::domain::StopIndex;
    /// use transit_server::transfer::{TransferCost, TransferEdge};
    ///
    /// let forward = TransferEdge::new(StopIndex(5), TransferCost { duration_secs: 60, c1: 12_000 });
    /// let reverse = TransferEdge::reverse_of(StopIndex(2), &forward);
    /// assert_eq!(reverse.stop, StopIndex(2));
    /// assert_eq!(reverse.c1, 12_000);
    /// assert!(reverse.reversed);
    /// ```
    pub fn reverse_of(from: StopIndex, edge: &TransferEdge) -> Self {
        Self {
            stop: from,
            duration_secs: edge.duration_secs,
            c1: edge.c1,
            reversed: !edge.reversed,
        }
    }
}
