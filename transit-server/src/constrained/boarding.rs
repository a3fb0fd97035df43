//! Boarding decisions produced from constrained transfers.

use std::fmt;

use crate::domain::{FeedScopedId, ServiceTime};

use super::{ConstrainedTransfer, TransferConstraint};

/// The decision to board a target trip through a constrained transfer.
///
/// Carries the resolved trip, stop position and boarding time, plus the
/// earliest board time the search asked for. When the transfer is
/// facilitated the boarding time may be earlier than that.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstrainedTransferBoarding<'a> {
    transfer: &'a ConstrainedTransfer,
    earliest_board_time: ServiceTime,
}

impl<'a> ConstrainedTransferBoarding<'a> {
    pub fn new(transfer: &'a ConstrainedTransfer, earliest_board_time: ServiceTime) -> Self {
        Self {
            transfer,
            earliest_board_time,
        }
    }

    pub fn trip(&self) -> &'a FeedScopedId {
        &self.transfer.target.trip
    }

    pub fn trip_index(&self) -> usize {
        self.transfer.target_trip_index
    }

    pub fn stop_pos(&self) -> usize {
        self.transfer.target.stop_pos
    }

    /// Boarding time at the target stop.
    pub fn time(&self) -> ServiceTime {
        self.transfer.target_time
    }

    pub fn earliest_board_time(&self) -> ServiceTime {
        self.earliest_board_time
    }

    pub fn constraint(&self) -> &'a TransferConstraint {
        &self.transfer.constraint
    }

    /// Whether the default minimum transfer time was waived.
    pub fn is_facilitated(&self) -> bool {
        self.transfer.constraint.is_facilitated()
    }
}

impl fmt::Display for ConstrainedTransferBoarding<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "board {} at pos {} {} (earliest {}{})",
            self.trip(),
            self.stop_pos(),
            self.time(),
            self.earliest_board_time,
            if self.is_facilitated() { ", facilitated" } else { "" }
        )
    }
}
