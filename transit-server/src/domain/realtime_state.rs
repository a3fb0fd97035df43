//! Realtime state of a trip.

use std::fmt;

use serde::{Deserialize, Serialize};

/// How realtime updates have changed a trip relative to the static schedule.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RealTimeState {
    /// No realtime update has been applied.
    #[default]
    Scheduled,
    /// Times changed, but the stop pattern is the scheduled one.
    Updated,
    /// Cancelled by a realtime update.
    Canceled,
    /// Not in the static schedule; added by a realtime update.
    Added,
    /// The update changed the stop pattern.
    Modified,
    /// Hidden from riders, either deleted by the feed or replaced by
    /// another trip.
    Deleted,
}

impl RealTimeState {
    /// Whether riders can board this trip.
    pub fn is_boardable(&self) -> bool {
        !matches!(self, RealTimeState::Canceled | RealTimeState::Deleted)
    }
}

impl fmt::Display for RealTimeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RealTimeState::Scheduled => "SCHEDULED",
            RealTimeState::Updated => "UPDATED",
            RealTimeState::Canceled => "CANCELED",
            RealTimeState::Added => "ADDED",
            RealTimeState::Modified => "MODIFIED",
            RealTimeState::Deleted => "DELETED",
        };
        f.write_str(s)
    }
}
