//! Turning candidate transfers into costed edges.

use super::{CandidateTransfer, SearchDirection, TransferCost};

/// Prices a candidate transfer for a search direction.
///
/// Returning `None` drops the candidate, e.g. a path with steps when the
/// model is configured for wheelchair users. Implementations are shared by
/// all build workers.
pub trait TransferCostModel: Sync {
    fn cost(&self, candidate: &CandidateTransfer, direction: SearchDirection)
    -> Option<TransferCost>;
}

impl<F> TransferCostModel for F
where
    F: Fn(&CandidateTransfer, SearchDirection) -> Option<TransferCost> + Sync,
{
    fn cost(
        &self,
        candidate: &CandidateTransfer,
        direction: SearchDirection,
    ) -> Option<TransferCost> {
        self(candidate, direction)
    }
}

/// Flat-ground meters equivalent to one meter of climb (Naismith's rule).
const CLIMB_DISTANCE_FACTOR: f64 = 8.0;

/// Walking cost model.
///
/// Duration is the candidate's explicit duration if it has one, otherwise
/// the climb-adjusted distance at `walk_speed_mps`. Cost is the duration
/// scaled by `walk_reluctance`.
#[derive(Debug, Clone, PartialEq)]
pub struct WalkCostModel {
    pub walk_speed_mps: f64,
    pub walk_reluctance: f64,
    pub wheelchair: bool,
}

impl WalkCostModel {
    pub fn new(walk_speed_mps: f64, walk_reluctance: f64) -> Self {
        Self {
            walk_speed_mps,
            walk_reluctance,
            wheelchair: false,
        }
    }

    pub fn for_wheelchair(mut self) -> Self {
        self.wheelchair = true;
        self
    }

    fn duration_secs(&self, candidate: &CandidateTransfer, direction: SearchDirection) -> u32 {
        if let Some(duration) = candidate.duration_secs {
            return duration;
        }

        // Traversing the path backwards turns a climb into a descent
        let climb = match direction {
            SearchDirection::Forward => candidate.elevation_gain_meters,
            SearchDirection::Reverse => -candidate.elevation_gain_meters,
        };
        let distance = candidate.distance_meters + climb.max(0.0) * CLIMB_DISTANCE_FACTOR;

        (distance / self.walk_speed_mps).ceil().max(0.0) as u32
    }
}

impl Default for WalkCostModel {
    fn default() -> Self {
        Self::new(1.33, 2.0)
    }
}

impl TransferCostModel for WalkCostModel {
    fn cost(
        &self,
        candidate: &CandidateTransfer,
        direction: SearchDirection,
    ) -> Option<TransferCost> {
        if self.wheelchair && !candidate.wheelchair_accessible {
            return None;
        }

        let duration_secs = self.duration_secs(candidate, direction);
        let c1 = (f64::from(duration_secs) * self.walk_reluctance * 100.0).round() as i32;

        Some(TransferCost { duration_secs, c1 })
    }
}
