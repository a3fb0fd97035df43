//! Trips and stop times.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{DomainError, FeedScopedId, ServiceTime, StopIndex};

/// A scheduled trip.
///
/// `realtime_trip_id` and `long_name` are optional feed extensions; realtime
/// feeds sometimes reference trips by an id different from the static one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    /// Static feed identity
    pub id: FeedScopedId,
    /// Route the trip belongs to
    pub route_id: FeedScopedId,
    /// Id used by realtime feeds, if different from the static id
    #[serde(default)]
    pub realtime_trip_id: Option<String>,
    /// Human-readable trip name
    #[serde(default)]
    pub long_name: Option<String>,
}

impl Trip {
    pub fn new(id: FeedScopedId, route_id: FeedScopedId) -> Self {
        Self {
            id,
            route_id,
            realtime_trip_id: None,
            long_name: None,
        }
    }

    /// The id realtime updates use to refer to this trip.
    ///
    /// # Examples
    ///
    /// ```
    /// use transit_server::domain::{FeedScopedId, Trip};
    ///
    /// let id = FeedScopedId::parse("F:T1").unwrap();
    /// let route = FeedScopedId::parse("F:R1").unwrap();
    /// let mut trip = Trip::new(id, route);
    /// assert_eq!(trip.realtime_id(), "T1");
    ///
    /// trip.realtime_trip_id = Some("RT-99".into());
    /// assert_eq!(trip.realtime_id(), "RT-99");
    /// ```
    pub fn realtime_id(&self) -> &str {
        self.realtime_trip_id.as_deref().unwrap_or(self.id.id())
    }
}

/// One call of a trip at a stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopTime {
    /// Stop served
    pub stop: StopIndex,
    /// Feed stop sequence number (strictly increasing along the trip)
    pub stop_sequence: u32,
    pub arrival: ServiceTime,
    pub departure: ServiceTime,
}

impl StopTime {
    pub fn new(
        stop: StopIndex,
        stop_sequence: u32,
        arrival: ServiceTime,
        departure: ServiceTime,
    ) -> Self {
        Self {
            stop,
            stop_sequence,
            arrival,
            departure,
        }
    }

    /// Seconds spent at the stop.
    pub fn dwell_seconds(&self) -> i32 {
        self.departure.seconds_since(self.arrival)
    }
}

/// Reference to a single stop time: a trip plus a stop sequence number.
///
/// Stop times are not entities of their own, but notices and realtime
/// messages need to point at them.
///
/// # Examples
///
/// ```
/// use transit_server::domain::{FeedScopedId, StopTimeKey};
///
/// let trip = FeedScopedId::parse("F:T1").unwrap();
/// let key = StopTimeKey::new(trip, 3);
/// assert_eq!(key.to_string(), "F:T1_#3");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StopTimeKey {
    trip: FeedScopedId,
    stop_sequence: u32,
}

impl StopTimeKey {
    pub fn new(trip: FeedScopedId, stop_sequence: u32) -> Self {
        Self {
            trip,
            stop_sequence,
        }
    }

    pub fn trip(&self) -> &FeedScopedId {
        &self.trip
    }

    pub fn stop_sequence(&self) -> u32 {
        self.stop_sequence
    }

    /// The key as a feed-scoped id (`FEED:TRIP_#SEQ`).
    pub fn as_feed_scoped_id(&self) -> Result<FeedScopedId, DomainError> {
        FeedScopedId::new(
            self.trip.feed_id(),
            format!("{}_#{}", self.trip.id(), self.stop_sequence),
        )
        .map_err(DomainError::from)
    }
}

impl fmt::Display for StopTimeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_#{}", self.trip, self.stop_sequence)
    }
}
