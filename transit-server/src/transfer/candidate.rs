//! Raw candidate transfers produced by street routing.

use serde::{Deserialize, Serialize};

use crate::domain::StopIndex;

/// One possible physical transfer away from a stop.
///
/// The source stop is implied by the list the candidate is stored in. Several
/// candidates may lead to the same destination (different paths); only the
/// cheapest survives indexing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateTransfer {
    /// Destination stop
    pub to: StopIndex,
    /// Length of the path in meters
    pub distance_meters: f64,
    /// Explicit traversal time, overriding the distance-based estimate
    #[serde(default)]
    pub duration_secs: Option<u32>,
    /// Net height climbed walking towards `to`; negative when descending
    #[serde(default)]
    pub elevation_gain_meters: f64,
    /// Whether the path is step-free
    #[serde(default = "default_true")]
    pub wheelchair_accessible: bool,
}

fn default_true() -> bool {
    true
}

impl CandidateTransfer {
    /// A flat, step-free candidate of the given length.
    pub fn walk(to: StopIndex, distance_meters: f64) -> Self {
        Self {
            to,
            distance_meters,
            duration_secs: None,
            elevation_gain_meters: 0.0,
            wheelchair_accessible: true,
        }
    }

    pub fn with_duration(mut self, duration_secs: u32) -> Self {
        self.duration_secs = Some(duration_secs);
        self
    }

    pub fn with_elevation_gain(mut self, meters: f64) -> Self {
        self.elevation_gain_meters = meters;
        self
    }

    pub fn inaccessible(mut self) -> Self {
        self.wheelchair_accessible = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_defaults() {
        let c: CandidateTransfer =
            serde_json::from_str(r#"{"to": 4, "distance_meters": 120.5}"#).unwrap();
        assert_eq!(c, CandidateTransfer::walk(StopIndex(4), 120.5));
        assert!(c.wheelchair_accessible);
    }

    #[test]
    fn builder_methods() {
        let c = CandidateTransfer::walk(StopIndex(1), 10.0)
            .with_duration(30)
            .with_elevation_gain(-2.0)
            .inaccessible();
        assert_eq!(c.duration_secs, Some(30));
        assert_eq!(c.elevation_gain_meters, -2.0);
        assert!(!c.wheelchair_accessible);
    }
}
