//! Realtime trip mutations.

use serde::{Deserialize, Serialize};

use crate::domain::{FeedScopedId, StopTime, Trip};

/// One realtime change to the live schedule.
///
/// Serialized with a `type` tag:
///
/// ```json
/// {"type": "cancel", "trip_id": "F:T1"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TripMutation {
    /// The trip does not run; riders still see it as cancelled.
    Cancel { trip_id: FeedScopedId },

    /// The trip is removed from what riders see.
    Delete { trip_id: FeedScopedId },

    /// New calls for an existing trip.
    Reroute {
        trip_id: FeedScopedId,
        stop_times: Vec<StopTime>,
    },

    /// A trip that is not in the static schedule.
    AddTrip {
        trip: Trip,
        stop_times: Vec<StopTime>,
    },
}

impl TripMutation {
    /// The trip this mutation addresses.
    pub fn trip_id(&self) -> &FeedScopedId {
        match self {
            TripMutation::Cancel { trip_id }
            | TripMutation::Delete { trip_id }
            | TripMutation::Reroute { trip_id, .. } => trip_id,
            TripMutation::AddTrip { trip, .. } => &trip.id,
        }
    }
}
