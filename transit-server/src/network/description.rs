//! Serialized network input.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::constrained::ConstrainedTransfer;
use crate::domain::{FeedScopedId, Stop, StopIndex, StopTime, Trip, WgsCoordinate};
use crate::transfer::CandidateTransfer;
use crate::version::{VersionedEntity, resolve_active_set};

use super::NetworkError;

/// A trip with its scheduled calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTrip {
    pub trip: Trip,
    pub stop_times: Vec<StopTime>,
}

/// Everything needed to build a [`TransitNetwork`](super::TransitNetwork).
///
/// `transfers[i]` lists the candidate transfers leaving `stops[i]`; it may
/// be shorter than `stops`, in which case the remaining stops have none.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkDescription {
    pub stops: Vec<Stop>,
    pub transfers: Vec<Vec<CandidateTransfer>>,
    /// Add straight-line walking candidates between stops closer than this
    /// many meters.
    pub max_walk_meters: Option<f64>,
    pub constrained_transfers: Vec<ConstrainedTransfer>,
    pub trips: Vec<VersionedEntity<ScheduledTrip>>,
}

impl NetworkDescription {
    pub fn from_json_str(json: &str) -> Result<Self, NetworkError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a network description from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, NetworkError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| NetworkError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Candidate transfers for every stop, including proximity candidates.
    pub fn candidates_by_stop(&self) -> Result<Vec<Vec<CandidateTransfer>>, NetworkError> {
        let stop_count = self.stops.len();
        if self.transfers.len() > stop_count {
            return Err(NetworkError::TransferListMismatch {
                lists: self.transfers.len(),
                stops: stop_count,
            });
        }

        let mut candidates = self.transfers.clone();
        candidates.resize_with(stop_count, Vec::new);

        if let Some(max_meters) = self.max_walk_meters {
            for (from, to, distance) in nearby_stop_pairs(&self.stops, max_meters) {
                candidates[from].push(CandidateTransfer::walk(StopIndex(to), distance));
                candidates[to].push(CandidateTransfer::walk(StopIndex(from), distance));
            }
        }

        Ok(candidates)
    }

    /// The version of each trip that is active at `timestamp`, by trip id.
    pub fn active_trips(&self, timestamp: NaiveDateTime) -> BTreeMap<FeedScopedId, &ScheduledTrip> {
        resolve_active_set(&self.trips, timestamp, |e| e.value.trip.id.clone())
            .into_iter()
            .map(|(id, entity)| (id, &entity.value))
            .collect()
    }
}

/// Pairs of distinct stops within `max_meters` of each other, each pair once
/// as `(lower index, higher index, distance)`, ordered by index.
///
/// Sweeps the stops in latitude order and stops comparing once the latitude
/// gap alone exceeds `max_meters`.
fn nearby_stop_pairs(stops: &[Stop], max_meters: f64) -> Vec<(usize, usize, f64)> {
    let band = WgsCoordinate::latitude_span_degrees(max_meters);
    let latitude = |i: usize| stops[i].coordinate.latitude();

    let mut by_latitude: Vec<usize> = (0..stops.len()).collect();
    by_latitude.sort_by(|&a, &b| latitude(a).total_cmp(&latitude(b)));

    let mut pairs = Vec::new();
    for (k, &i) in by_latitude.iter().enumerate() {
        for &j in &by_latitude[k + 1..] {
            if latitude(j) - latitude(i) > band {
                break;
            }
            let distance = stops[i].coordinate.distance_meters(&stops[j].coordinate);
            if distance <= max_meters {
                pairs.push((i.min(j), i.max(j), distance));
            }
        }
    }

    pairs.sort_by_key(|&(i, j, _)| (i, j));
    pairs
}
