//! Constrained transfer lookup by source trip and stop position.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{FeedScopedId, ServiceTime};

use super::{ConstrainedTransferBoarding, TransferConstraint};

/// A stop position within a specific trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TripStopPosition {
    pub trip: FeedScopedId,
    /// Index of the stop in the trip's pattern
    pub stop_pos: usize,
}

impl TripStopPosition {
    pub fn new(trip: FeedScopedId, stop_pos: usize) -> Self {
        Self { trip, stop_pos }
    }
}

/// A transfer between two specific trips, carrying its constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstrainedTransfer {
    pub source: TripStopPosition,
    pub target: TripStopPosition,
    /// Index of the target trip within its pattern's timetable
    pub target_trip_index: usize,
    /// Departure of the target trip at `target.stop_pos`
    pub target_time: ServiceTime,
    pub constraint: TransferConstraint,
}

impl ConstrainedTransfer {
    /// Whether this transfer can be made after alighting at `alight_time`.
    ///
    /// Facilitated transfers only need the target to leave no earlier than
    /// the rider arrives. Otherwise the target must leave at or after both
    /// `earliest_board_time` and the constraint's own minimum transfer time.
    /// A maximum wait time caps how long after alighting the target may
    /// leave.
    pub fn can_board(&self, alight_time: ServiceTime, earliest_board_time: ServiceTime) -> bool {
        let required = if self.constraint.is_facilitated() {
            alight_time
        } else {
            match self.constraint.min_transfer_time {
                Some(min) => earliest_board_time.max(alight_time + min),
                None => earliest_board_time,
            }
        };

        if self.target_time < required {
            return false;
        }

        self.constraint
            .max_wait_time
            .is_none_or(|max_wait| self.target_time.seconds_since(alight_time) <= max_wait)
    }

    /// The boarding event for this transfer.
    pub fn boarding_event(&self, earliest_board_time: ServiceTime) -> ConstrainedTransferBoarding<'_> {
        ConstrainedTransferBoarding::new(self, earliest_board_time)
    }
}

/// Constrained transfers keyed by `(source trip, source stop position)`.
///
/// Forbidden transfers are dropped while building, so a lookup never offers
/// them as candidates.
#[derive(Debug, Clone, Default)]
pub struct ConstrainedTransferIndex {
    by_source: HashMap<FeedScopedId, HashMap<usize, Vec<ConstrainedTransfer>>>,
    len: usize,
    forbidden: usize,
}

impl ConstrainedTransferIndex {
    pub fn new(transfers: impl IntoIterator<Item = ConstrainedTransfer>) -> Self {
        let mut index = Self::default();

        for transfer in transfers {
            if transfer.constraint.is_not_allowed() {
                index.forbidden += 1;
                continue;
            }

            index
                .by_source
                .entry(transfer.source.trip.clone())
                .or_default()
                .entry(transfer.source.stop_pos)
                .or_default()
                .push(transfer);
            index.len += 1;
        }

        debug!(
            transfers = index.len,
            forbidden = index.forbidden,
            "Constrained transfer index built"
        );

        index
    }

    /// Constrained transfers leaving `trip` at `stop_pos`.
    ///
    /// Empty when no rule is registered; default transfer logic then applies.
    pub fn lookup(&self, trip: &FeedScopedId, stop_pos: usize) -> &[ConstrainedTransfer] {
        self.by_source
            .get(trip)
            .and_then(|by_pos| by_pos.get(&stop_pos))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Pick the constrained boarding after alighting `source_trip` at
    /// `source_pos`.
    ///
    /// Among the transfers that can be made, the earliest departing target
    /// wins; on a tie the first registered one.
    pub fn find_boarding(
        &self,
        source_trip: &FeedScopedId,
        source_pos: usize,
        alight_time: ServiceTime,
        earliest_board_time: ServiceTime,
    ) -> Option<ConstrainedTransferBoarding<'_>> {
        let mut best: Option<&ConstrainedTransfer> = None;

        for transfer in self.lookup(source_trip, source_pos) {
            if !transfer.can_board(alight_time, earliest_board_time) {
                continue;
            }
            if best.is_none_or(|b| transfer.target_time < b.target_time) {
                best = Some(transfer);
            }
        }

        best.map(|t| t.boarding_event(earliest_board_time))
    }

    /// Number of usable constrained transfers.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of forbidden transfers dropped while building.
    pub fn forbidden_count(&self) -> usize {
        self.forbidden
    }
}
