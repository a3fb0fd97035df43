//! Data transfer objects for web requests and responses.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constrained::{ConstrainedTransferBoarding, TransferPriority};
use crate::domain::{RealTimeState, ServiceTime, StopIndex};
use crate::network::NetworkSummary;
use crate::transfer::{SearchDirection, TransferEdge};

/// Query for a stop's transfers.
#[derive(Debug, Default, Deserialize)]
pub struct TransfersQuery {
    /// Defaults to forward
    #[serde(default)]
    pub direction: SearchDirection,
}

/// Transfers at one stop in one direction.
#[derive(Debug, Serialize)]
pub struct StopTransfersResponse {
    pub stop: StopIndex,
    pub stop_id: String,
    pub stop_name: String,
    pub direction: SearchDirection,
    pub edges: Vec<TransferEdgeResult>,
}

/// One transfer edge, with the name of the stop at its far end.
#[derive(Debug, Serialize)]
pub struct TransferEdgeResult {
    pub stop: StopIndex,
    pub stop_name: Option<String>,
    pub duration_secs: u32,
    pub c1: i32,
    pub reversed: bool,
}

impl TransferEdgeResult {
    pub fn new(edge: &TransferEdge, stop_name: Option<String>) -> Self {
        Self {
            stop: edge.stop,
            stop_name,
            duration_secs: edge.duration_secs,
            c1: edge.c1,
            reversed: edge.reversed,
        }
    }
}

/// Where and when a rider leaves a trip.
#[derive(Debug, Deserialize)]
pub struct BoardingQuery {
    pub stop_pos: usize,
    pub alight: ServiceTime,
}

/// A constrained boarding onto another trip.
#[derive(Debug, Serialize)]
pub struct BoardingResponse {
    pub trip: String,
    pub trip_index: usize,
    pub stop_pos: usize,
    pub time: ServiceTime,
    pub earliest_board_time: ServiceTime,
    pub facilitated: bool,
    pub priority: TransferPriority,
}

impl From<ConstrainedTransferBoarding<'_>> for BoardingResponse {
    fn from(boarding: ConstrainedTransferBoarding<'_>) -> Self {
        Self {
            trip: boarding.trip().to_string(),
            trip_index: boarding.trip_index(),
            stop_pos: boarding.stop_pos(),
            time: boarding.time(),
            earliest_board_time: boarding.earliest_board_time(),
            facilitated: boarding.is_facilitated(),
            priority: boarding.constraint().priority,
        }
    }
}

/// Network and live timetable overview.
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub feed_id: String,
    pub network: NetworkSummary,
    pub live_trips: usize,
    pub trips_by_state: BTreeMap<RealTimeState, usize>,
    pub timetable_updated_at: Option<DateTime<Utc>>,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
