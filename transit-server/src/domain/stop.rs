//! Stops and their coordinates.
//!
//! A `Stop` is immutable once the network is built. The transfer index and
//! the search address stops by their dense `StopIndex` rather than by id.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{DomainError, FeedScopedId};

/// Dense index of a stop within one network build.
///
/// # Examples
///
/// ```
/// use transit_server::domain::StopIndex;
///
/// let idx = StopIndex(3);
/// assert_eq!(usize::from(idx), 3);
/// assert_eq!(idx.to_string(), "3");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct StopIndex(pub usize);

impl fmt::Display for StopIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for StopIndex {
    fn from(value: usize) -> Self {
        StopIndex(value)
    }
}

impl From<StopIndex> for usize {
    fn from(value: StopIndex) -> Self {
        value.0
    }
}

/// Number of decimals kept on coordinates (about 1cm at the equator).
const COORDINATE_DECIMALS: f64 = 1e7;

/// Mean earth radius in meters.
const EARTH_RADIUS_M: f64 = 6_371_010.0;

/// A WGS84 coordinate.
///
/// Construction validates the ranges and rounds both axes to 7 decimals so
/// that equal positions from different feeds compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WgsCoordinate {
    latitude: f64,
    longitude: f64,
}

impl WgsCoordinate {
    /// Create a coordinate, rejecting out-of-range values.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, DomainError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(DomainError::InvalidCoordinate("latitude must be in -90..=90"));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(DomainError::InvalidCoordinate(
                "longitude must be in -180..=180",
            ));
        }

        Ok(Self {
            latitude: round(latitude),
            longitude: round(longitude),
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Latitude difference in degrees that alone covers `meters`.
    ///
    /// Two coordinates further apart in latitude than this are further
    /// apart than `meters` by [`distance_meters`](Self::distance_meters).
    pub fn latitude_span_degrees(meters: f64) -> f64 {
        (meters / EARTH_RADIUS_M).to_degrees()
    }

    /// Approximate distance in meters (equirectangular projection).
    ///
    /// Accurate enough for the short distances a footpath transfer covers.
    pub fn distance_meters(&self, other: &WgsCoordinate) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let x = (other.longitude - self.longitude).to_radians() * ((lat1 + lat2) / 2.0).cos();
        let y = lat2 - lat1;
        (x * x + y * y).sqrt() * EARTH_RADIUS_M
    }
}

impl<'de> Deserialize<'de> for WgsCoordinate {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            latitude: f64,
            longitude: f64,
        }

        let raw = Raw::deserialize(deserializer)?;
        WgsCoordinate::new(raw.latitude, raw.longitude).map_err(serde::de::Error::custom)
    }
}

fn round(value: f64) -> f64 {
    (value * COORDINATE_DECIMALS).round() / COORDINATE_DECIMALS
}

/// A boardable/alightable location in the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    /// Feed identity
    pub id: FeedScopedId,
    /// Display name
    pub name: String,
    /// Position
    pub coordinate: WgsCoordinate,
}

impl Stop {
    pub fn new(id: FeedScopedId, name: impl Into<String>, coordinate: WgsCoordinate) -> Self {
        Self {
            id,
            name: name.into(),
            coordinate,
        }
    }
}
