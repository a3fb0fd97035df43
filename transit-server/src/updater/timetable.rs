//! The live schedule that realtime mutations are applied to.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::domain::{FeedScopedId, RealTimeState, StopIndex, StopTime, Trip};

use super::{
    TripMutation, UpdateError, UpdateErrorType, UpdateResult, UpdateSuccess, WarningType,
};

/// A trip as riders currently see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveTrip {
    pub trip: Trip,
    pub stop_times: Vec<StopTime>,
    pub state: RealTimeState,
}

impl LiveTrip {
    fn stops(&self) -> impl Iterator<Item = StopIndex> + '_ {
        self.stop_times.iter().map(|st| st.stop)
    }
}

/// Trip times by trip id, plus the stop count used to reject unknown stops.
///
/// [`Timetable::apply`] validates a mutation completely before touching any
/// state, so a failed mutation leaves the timetable as it was.
#[derive(Debug, Clone, Default)]
pub struct Timetable {
    trips: BTreeMap<FeedScopedId, LiveTrip>,
    stop_count: usize,
    updated_at: Option<DateTime<Utc>>,
}

impl Timetable {
    pub fn new(stop_count: usize) -> Self {
        Self {
            trips: BTreeMap::new(),
            stop_count,
            updated_at: None,
        }
    }

    /// Add a trip from the static schedule, replacing any previous one with
    /// the same id.
    pub fn insert_scheduled(&mut self, trip: Trip, stop_times: Vec<StopTime>) -> Option<LiveTrip> {
        self.trips.insert(
            trip.id.clone(),
            LiveTrip {
                trip,
                stop_times,
                state: RealTimeState::Scheduled,
            },
        )
    }

    pub fn trip(&self, id: &FeedScopedId) -> Option<&LiveTrip> {
        self.trips.get(id)
    }

    pub fn trips(&self) -> impl Iterator<Item = &LiveTrip> {
        self.trips.values()
    }

    pub fn len(&self) -> usize {
        self.trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }

    pub fn stop_count(&self) -> usize {
        self.stop_count
    }

    /// When a batch last changed anything.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Number of trips in each realtime state.
    pub fn state_counts(&self) -> BTreeMap<RealTimeState, usize> {
        let mut counts = BTreeMap::new();
        for live in self.trips.values() {
            *counts.entry(live.state).or_insert(0) += 1;
        }
        counts
    }

    /// Find the key of the trip a realtime message refers to.
    ///
    /// Realtime feeds may use the static id or the trip's realtime id.
    fn resolve_key(&self, id: &FeedScopedId) -> Option<FeedScopedId> {
        if self.trips.contains_key(id) {
            return Some(id.clone());
        }
        self.trips
            .iter()
            .find(|(key, live)| {
                key.feed_id() == id.feed_id()
                    && live.trip.realtime_trip_id.as_deref() == Some(id.id())
            })
            .map(|(key, _)| key.clone())
    }

    /// Apply one mutation.
    pub fn apply(&mut self, mutation: &TripMutation) -> Result<UpdateSuccess, UpdateError> {
        match mutation {
            TripMutation::Cancel { trip_id } => self.cancel(trip_id, RealTimeState::Canceled),
            TripMutation::Delete { trip_id } => self.cancel(trip_id, RealTimeState::Deleted),
            TripMutation::Reroute {
                trip_id,
                stop_times,
            } => self.reroute(trip_id, stop_times),
            TripMutation::AddTrip { trip, stop_times } => self.add_trip(trip, stop_times),
        }
    }

    /// Apply a batch of independent mutations.
    ///
    /// A failing mutation does not stop the rest of the batch.
    pub fn apply_batch(&mut self, mutations: &[TripMutation], at: DateTime<Utc>) -> UpdateResult {
        let outcomes: Vec<_> = mutations.iter().map(|m| self.apply(m)).collect();
        let result = UpdateResult::of_results(outcomes);
        if result.successful > 0 {
            self.updated_at = Some(at);
        }
        result
    }

    fn cancel(
        &mut self,
        trip_id: &FeedScopedId,
        state: RealTimeState,
    ) -> Result<UpdateSuccess, UpdateError> {
        let key = self.resolve_key(trip_id).ok_or_else(|| {
            UpdateError::for_trip(trip_id.clone(), UpdateErrorType::NoTripForCancellationFound)
        })?;
        let Some(live) = self.trips.get_mut(&key) else {
            return Err(UpdateError::for_trip(
                trip_id.clone(),
                UpdateErrorType::NoTripForCancellationFound,
            ));
        };

        // Deleting a cancelled trip still hides it
        if live.state == state || live.state == RealTimeState::Deleted {
            debug!(trip = %key, %state, "Trip already removed");
            return Ok(UpdateSuccess::of_warnings([WarningType::NoOpCancellation]));
        }

        live.state = state;
        Ok(UpdateSuccess::no_warnings())
    }

    fn reroute(
        &mut self,
        trip_id: &FeedScopedId,
        stop_times: &[StopTime],
    ) -> Result<UpdateSuccess, UpdateError> {
        let key = self
            .resolve_key(trip_id)
            .ok_or_else(|| UpdateError::for_trip(trip_id.clone(), UpdateErrorType::TripNotFound))?;

        if let Some(pos) = stop_times
            .iter()
            .position(|st| st.stop.0 >= self.stop_count)
        {
            return Err(UpdateError::at_stop(key, UpdateErrorType::UnknownStop, pos));
        }
        validate_stop_times(&key, stop_times)?;

        let Some(live) = self.trips.get_mut(&key) else {
            return Err(UpdateError::for_trip(key, UpdateErrorType::TripNotFound));
        };

        let same_pattern = live.stops().eq(stop_times.iter().map(|st| st.stop));
        live.state = if same_pattern {
            RealTimeState::Updated
        } else {
            RealTimeState::Modified
        };
        live.stop_times = stop_times.to_vec();
        Ok(UpdateSuccess::no_warnings())
    }

    fn add_trip(
        &mut self,
        trip: &Trip,
        stop_times: &[StopTime],
    ) -> Result<UpdateSuccess, UpdateError> {
        if self.trips.contains_key(&trip.id) {
            return Err(UpdateError::for_trip(
                trip.id.clone(),
                UpdateErrorType::TripAlreadyExists,
            ));
        }

        let known: Vec<StopTime> = stop_times
            .iter()
            .filter(|st| st.stop.0 < self.stop_count)
            .cloned()
            .collect();
        let removed = stop_times.len() - known.len();

        if !stop_times.is_empty() && known.is_empty() {
            return Err(UpdateError::for_trip(
                trip.id.clone(),
                UpdateErrorType::NoValidStops,
            ));
        }
        validate_stop_times(&trip.id, &known)?;

        if removed > 0 {
            debug!(trip = %trip.id, removed, "Dropped unknown stops from added trip");
        }

        self.trips.insert(
            trip.id.clone(),
            LiveTrip {
                trip: trip.clone(),
                stop_times: known,
                state: RealTimeState::Added,
            },
        );

        let mut success = UpdateSuccess::no_warnings();
        if removed > 0 {
            success = success.add_warnings([WarningType::UnknownStopsRemovedFromAddedTrip]);
        }
        Ok(success)
    }
}

/// Check that a trip's calls make sense on their own.
fn validate_stop_times(trip_id: &FeedScopedId, stop_times: &[StopTime]) -> Result<(), UpdateError> {
    let fail = |kind, pos| Err(UpdateError::at_stop(trip_id.clone(), kind, pos));

    if stop_times.is_empty() {
        return Err(UpdateError::for_trip(trip_id.clone(), UpdateErrorType::NoUpdates));
    }
    if stop_times.len() < 2 {
        return Err(UpdateError::for_trip(trip_id.clone(), UpdateErrorType::TooFewStops));
    }

    for (pos, st) in stop_times.iter().enumerate() {
        if st.arrival.seconds() < 0 {
            return fail(UpdateErrorType::InvalidArrivalTime, pos);
        }
        if st.departure.seconds() < 0 {
            return fail(UpdateErrorType::InvalidDepartureTime, pos);
        }
        if st.dwell_seconds() < 0 {
            return fail(UpdateErrorType::NegativeDwellTime, pos);
        }
        if pos > 0 {
            let prev = &stop_times[pos - 1];
            if st.stop_sequence <= prev.stop_sequence {
                return fail(UpdateErrorType::InvalidStopSequence, pos);
            }
            if st.arrival < prev.departure {
                return fail(UpdateErrorType::NegativeHopTime, pos);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ServiceTime;

    fn id(s: &str) -> FeedScopedId {
        FeedScopedId::parse(s).unwrap()
    }

    fn call(stop: usize, seq: u32, arr: &str, dep: &str) -> StopTime {
        StopTime::new(
            StopIndex(stop),
            seq,
            ServiceTime::parse(arr).unwrap(),
            ServiceTime::parse(dep).unwrap(),
        )
    }

    fn timetable() -> Timetable {
        let mut tt = Timetable::new(5);
        let mut t1 = Trip::new(id("F:T1"), id("F:R1"));
        t1.realtime_trip_id = Some("RT1".into());
        tt.insert_scheduled(
            t1,
            vec![
                call(0, 1, "10:00", "10:00"),
                call(1, 2, "10:10", "10:11"),
                call(2, 3, "10:20", "10:20"),
            ],
        );
        tt.insert_scheduled(
            Trip::new(id("F:T2"), id("F:R1")),
            vec![call(2, 1, "11:00", "11:00"), call(3, 2, "11:15", "11:15")],
        );
        tt
    }

    fn at() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn cancel_trip() {
        let mut tt = timetable();
        let result = tt.apply(&TripMutation::Cancel { trip_id: id("F:T1") }).unwrap();

        assert!(result.warnings.is_empty());
        assert_eq!(tt.trip(&id("F:T1")).unwrap().state, RealTimeState::Canceled);
    }

    #[test]
    fn cancel_twice_warns() {
        let mut tt = timetable();
        tt.apply(&TripMutation::Cancel { trip_id: id("F:T1") }).unwrap();
        let result = tt.apply(&TripMutation::Cancel { trip_id: id("F:T1") }).unwrap();

        assert_eq!(result.warnings, vec![WarningType::NoOpCancellation]);
    }

    #[test]
    fn delete_after_cancel_hides_trip() {
        let mut tt = timetable();
        tt.apply(&TripMutation::Cancel { trip_id: id("F:T1") }).unwrap();
        let result = tt.apply(&TripMutation::Delete { trip_id: id("F:T1") }).unwrap();

        assert!(result.warnings.is_empty());
        assert_eq!(tt.trip(&id("F:T1")).unwrap().state, RealTimeState::Deleted);

        let result = tt.apply(&TripMutation::Cancel { trip_id: id("F:T1") }).unwrap();
        assert_eq!(result.warnings, vec![WarningType::NoOpCancellation]);
        assert_eq!(tt.trip(&id("F:T1")).unwrap().state, RealTimeState::Deleted);
    }

    #[test]
    fn cancel_unknown_trip() {
        let mut tt = timetable();
        let err = tt.apply(&TripMutation::Cancel { trip_id: id("F:NOPE") }).unwrap_err();

        assert_eq!(err.error_type, UpdateErrorType::NoTripForCancellationFound);
        assert_eq!(err.trip_id, Some(id("F:NOPE")));
    }

    #[test]
    fn realtime_id_resolves_trip() {
        let mut tt = timetable();
        tt.apply(&TripMutation::Cancel { trip_id: id("F:RT1") }).unwrap();

        assert_eq!(tt.trip(&id("F:T1")).unwrap().state, RealTimeState::Canceled);
    }

    #[test]
    fn reroute_same_pattern_is_update() {
        let mut tt = timetable();
        let delayed = vec![call(2, 1, "11:05", "11:05"), call(3, 2, "11:20", "11:20")];
        tt.apply(&TripMutation::Reroute {
            trip_id: id("F:T2"),
            stop_times: delayed.clone(),
        })
        .unwrap();

        let live = tt.trip(&id("F:T2")).unwrap();
        assert_eq!(live.state, RealTimeState::Updated);
        assert_eq!(live.stop_times, delayed);
    }

    #[test]
    fn reroute_new_pattern_is_modified() {
        let mut tt = timetable();
        tt.apply(&TripMutation::Reroute {
            trip_id: id("F:T2"),
            stop_times: vec![call(2, 1, "11:00", "11:00"), call(4, 2, "11:30", "11:30")],
        })
        .unwrap();

        assert_eq!(tt.trip(&id("F:T2")).unwrap().state, RealTimeState::Modified);
    }

    #[test]
    fn failed_reroute_leaves_trip_unchanged() {
        let mut tt = timetable();
        let before = tt.trip(&id("F:T1")).unwrap().clone();

        let err = tt
            .apply(&TripMutation::Reroute {
                trip_id: id("F:T1"),
                stop_times: vec![
                    call(0, 1, "10:00", "10:00"),
                    call(1, 2, "09:50", "09:55"),
                ],
            })
            .unwrap_err();

        assert_eq!(err.error_type, UpdateErrorType::NegativeHopTime);
        assert_eq!(err.stop_index, Some(1));
        assert_eq!(tt.trip(&id("F:T1")).unwrap(), &before);
    }

    #[test]
    fn reroute_validation_errors() {
        let mut tt = timetable();
        let reroute = |stop_times| TripMutation::Reroute {
            trip_id: id("F:T1"),
            stop_times,
        };

        let cases = [
            (vec![], UpdateErrorType::NoUpdates),
            (vec![call(0, 1, "10:00", "10:00")], UpdateErrorType::TooFewStops),
            (
                vec![call(0, 1, "10:00", "10:00"), call(9, 2, "10:10", "10:10")],
                UpdateErrorType::UnknownStop,
            ),
            (
                vec![call(0, 2, "10:00", "10:00"), call(1, 2, "10:10", "10:10")],
                UpdateErrorType::InvalidStopSequence,
            ),
            (
                vec![call(0, 1, "10:00", "09:59"), call(1, 2, "10:10", "10:10")],
                UpdateErrorType::NegativeDwellTime,
            ),
        ];

        for (stop_times, expected) in cases {
            let err = tt.apply(&reroute(stop_times)).unwrap_err();
            assert_eq!(err.error_type, expected);
        }
        assert_eq!(tt.trip(&id("F:T1")).unwrap().state, RealTimeState::Scheduled);
    }

    #[test]
    fn reroute_unknown_trip() {
        let mut tt = timetable();
        let err = tt
            .apply(&TripMutation::Reroute {
                trip_id: id("F:NOPE"),
                stop_times: vec![],
            })
            .unwrap_err();
        assert_eq!(err.error_type, UpdateErrorType::TripNotFound);
    }

    #[test]
    fn add_trip() {
        let mut tt = timetable();
        let trip = Trip::new(id("F:X1"), id("F:R2"));
        let result = tt
            .apply(&TripMutation::AddTrip {
                trip,
                stop_times: vec![call(3, 1, "12:00", "12:00"), call(4, 2, "12:10", "12:10")],
            })
            .unwrap();

        assert!(result.warnings.is_empty());
        assert_eq!(tt.trip(&id("F:X1")).unwrap().state, RealTimeState::Added);
        assert_eq!(tt.len(), 3);
    }

    #[test]
    fn add_trip_drops_unknown_stops() {
        let mut tt = timetable();
        let result = tt
            .apply(&TripMutation::AddTrip {
                trip: Trip::new(id("F:X1"), id("F:R2")),
                stop_times: vec![
                    call(3, 1, "12:00", "12:00"),
                    call(42, 2, "12:05", "12:05"),
                    call(4, 3, "12:10", "12:10"),
                ],
            })
            .unwrap();

        assert_eq!(result.warnings, vec![WarningType::UnknownStopsRemovedFromAddedTrip]);
        assert_eq!(tt.trip(&id("F:X1")).unwrap().stop_times.len(), 2);
    }

    #[test]
    fn add_trip_failures() {
        let mut tt = timetable();

        let err = tt
            .apply(&TripMutation::AddTrip {
                trip: Trip::new(id("F:T1"), id("F:R1")),
                stop_times: vec![call(0, 1, "10:00", "10:00"), call(1, 2, "10:10", "10:10")],
            })
            .unwrap_err();
        assert_eq!(err.error_type, UpdateErrorType::TripAlreadyExists);

        let err = tt
            .apply(&TripMutation::AddTrip {
                trip: Trip::new(id("F:X2"), id("F:R1")),
                stop_times: vec![call(40, 1, "10:00", "10:00"), call(41, 2, "10:10", "10:10")],
            })
            .unwrap_err();
        assert_eq!(err.error_type, UpdateErrorType::NoValidStops);
        assert!(tt.trip(&id("F:X2")).is_none());
    }

    #[test]
    fn batch_continues_after_failure() {
        let mut tt = timetable();
        let result = tt.apply_batch(
            &[
                TripMutation::Cancel { trip_id: id("F:NOPE") },
                TripMutation::Cancel { trip_id: id("F:T1") },
                TripMutation::Delete { trip_id: id("F:T2") },
            ],
            at(),
        );

        assert_eq!(result.successful, 2);
        assert_eq!(result.failed, 1);
        assert_eq!(tt.updated_at(), Some(at()));
        let counts = tt.state_counts();
        assert_eq!(counts[&RealTimeState::Canceled], 1);
        assert_eq!(counts[&RealTimeState::Deleted], 1);
    }

    #[test]
    fn all_failed_batch_keeps_timestamp() {
        let mut tt = timetable();
        let result = tt.apply_batch(&[TripMutation::Cancel { trip_id: id("F:NOPE") }], at());

        assert_eq!(result.failed, 1);
        assert_eq!(tt.updated_at(), None);
    }
}
