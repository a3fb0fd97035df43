//! Realtime update failures.

use std::fmt;

use serde::Serialize;

use crate::domain::FeedScopedId;

/// Why a realtime mutation could not be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpdateErrorType {
    Unknown,
    InvalidInputStructure,
    TripNotFound,
    TripNotFoundInPattern,
    NoTripForCancellationFound,
    TripAlreadyExists,
    NoStartDate,
    NoUpdates,
    NoTripId,
    TooFewStops,
    NoValidStops,
    NoServiceOnDate,
    InvalidArrivalTime,
    InvalidDepartureTime,
    NegativeDwellTime,
    NegativeHopTime,
    InvalidStopSequence,
    UnknownStop,
    NotImplementedUnscheduled,
    NotImplementedDuplicated,
    NotMonitored,
}

impl UpdateErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateErrorType::Unknown => "UNKNOWN",
            UpdateErrorType::InvalidInputStructure => "INVALID_INPUT_STRUCTURE",
            UpdateErrorType::TripNotFound => "TRIP_NOT_FOUND",
            UpdateErrorType::TripNotFoundInPattern => "TRIP_NOT_FOUND_IN_PATTERN",
            UpdateErrorType::NoTripForCancellationFound => "NO_TRIP_FOR_CANCELLATION_FOUND",
            UpdateErrorType::TripAlreadyExists => "TRIP_ALREADY_EXISTS",
            UpdateErrorType::NoStartDate => "NO_START_DATE",
            UpdateErrorType::NoUpdates => "NO_UPDATES",
            UpdateErrorType::NoTripId => "NO_TRIP_ID",
            UpdateErrorType::TooFewStops => "TOO_FEW_STOPS",
            UpdateErrorType::NoValidStops => "NO_VALID_STOPS",
            UpdateErrorType::NoServiceOnDate => "NO_SERVICE_ON_DATE",
            UpdateErrorType::InvalidArrivalTime => "INVALID_ARRIVAL_TIME",
            UpdateErrorType::InvalidDepartureTime => "INVALID_DEPARTURE_TIME",
            UpdateErrorType::NegativeDwellTime => "NEGATIVE_DWELL_TIME",
            UpdateErrorType::NegativeHopTime => "NEGATIVE_HOP_TIME",
            UpdateErrorType::InvalidStopSequence => "INVALID_STOP_SEQUENCE",
            UpdateErrorType::UnknownStop => "UNKNOWN_STOP",
            UpdateErrorType::NotImplementedUnscheduled => "NOT_IMPLEMENTED_UNSCHEDULED",
            UpdateErrorType::NotImplementedDuplicated => "NOT_IMPLEMENTED_DUPLICATED",
            UpdateErrorType::NotMonitored => "NOT_MONITORED",
        }
    }
}

impl fmt::Display for UpdateErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed realtime mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{error_type}{}", location(.trip_id, .stop_index))]
pub struct UpdateError {
    /// Trip the mutation addressed, when it named one
    pub trip_id: Option<FeedScopedId>,
    pub error_type: UpdateErrorType,
    /// Position in the mutation's stop list that caused the failure
    pub stop_index: Option<usize>,
}

impl UpdateError {
    pub fn new(
        trip_id: Option<FeedScopedId>,
        error_type: UpdateErrorType,
        stop_index: Option<usize>,
    ) -> Self {
        Self {
            trip_id,
            error_type,
            stop_index,
        }
    }

    pub fn no_trip_id(error_type: UpdateErrorType) -> Self {
        Self::new(None, error_type, None)
    }

    pub fn for_trip(trip_id: FeedScopedId, error_type: UpdateErrorType) -> Self {
        Self::new(Some(trip_id), error_type, None)
    }

    pub fn at_stop(trip_id: FeedScopedId, error_type: UpdateErrorType, stop_index: usize) -> Self {
        Self::new(Some(trip_id), error_type, Some(stop_index))
    }
}

fn location(trip_id: &Option<FeedScopedId>, stop_index: &Option<usize>) -> String {
    match (trip_id, stop_index) {
        (Some(trip), Some(idx)) => format!(" (trip {trip}, stop {idx})"),
        (Some(trip), None) => format!(" (trip {trip})"),
        (None, Some(idx)) => format!(" (stop {idx})"),
        (None, None) => String::new(),
    }
}
