//! Built network snapshots and their owner.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use tokio::sync::watch;
use tracing::info;

use crate::config::{BoardingConfig, RouterConfig};
use crate::constrained::{ConstrainedTransferBoarding, ConstrainedTransferIndex, ConstraintError};
use crate::domain::{FeedScopedId, ServiceTime, Stop, StopIndex};
use crate::transfer::{TransferIndex, TransferIndexError};
use crate::updater::Timetable;

use super::{NetworkDescription, ScheduledTrip};

/// Errors from loading or building a network.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    /// Network file could not be read
    #[error("failed to read network {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Network file is not valid JSON for this schema
    #[error("invalid network JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// More transfer lists than stops
    #[error("{lists} transfer lists for {stops} stops")]
    TransferListMismatch { lists: usize, stops: usize },

    /// A candidate transfer broke the transfer index's input contract
    #[error(transparent)]
    TransferIndex(#[from] TransferIndexError),

    /// A scheduled trip calls at a stop the network does not have
    #[error("trip {trip} calls at stop {stop}, but the network has {stop_count} stops")]
    UnknownTripStop {
        trip: FeedScopedId,
        stop: StopIndex,
        stop_count: usize,
    },

    /// A constrained transfer carries an out-of-range duration
    #[error("constrained transfer from {trip} at position {stop_pos}: {source}")]
    InvalidConstraint {
        trip: FeedScopedId,
        stop_pos: usize,
        source: ConstraintError,
    },

    /// The blocking build task panicked or was cancelled
    #[error("network build task failed: {0}")]
    BuildTask(#[from] tokio::task::JoinError),
}

/// Counts describing a built network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkSummary {
    pub stops: usize,
    pub transfer_edges: usize,
    pub constrained_transfers: usize,
    pub forbidden_transfers: usize,
    pub trips: usize,
    pub built_at: NaiveDateTime,
}

/// An immutable, fully built network.
///
/// Shared read-only between all queries; a rebuild produces a new one.
#[derive(Debug)]
pub struct TransitNetwork {
    stops: Vec<Stop>,
    transfers: TransferIndex,
    constrained: ConstrainedTransferIndex,
    trips: Vec<ScheduledTrip>,
    built_at: NaiveDateTime,
}

impl TransitNetwork {
    /// Build a network, resolving trip versions active at `at`.
    pub fn build(
        description: NetworkDescription,
        config: &RouterConfig,
        at: NaiveDateTime,
    ) -> Result<Self, NetworkError> {
        let started = Instant::now();

        let candidates = description.candidates_by_stop()?;
        let transfers =
            TransferIndex::build(&candidates, &config.walk.cost_model(), &config.transfers)?;

        let trips: Vec<ScheduledTrip> = description
            .active_trips(at)
            .into_values()
            .cloned()
            .collect();
        check_trip_stops(&trips, description.stops.len())?;

        for transfer in &description.constrained_transfers {
            transfer
                .constraint
                .validate()
                .map_err(|source| NetworkError::InvalidConstraint {
                    trip: transfer.source.trip.clone(),
                    stop_pos: transfer.source.stop_pos,
                    source,
                })?;
        }

        let NetworkDescription {
            stops,
            constrained_transfers,
            ..
        } = description;
        let constrained = ConstrainedTransferIndex::new(constrained_transfers);

        let network = Self {
            stops,
            transfers,
            constrained,
            trips,
            built_at: at,
        };

        info!(
            feed_id = %config.feed_id,
            stops = network.stops.len(),
            trips = network.trips.len(),
            constrained = network.constrained.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Network built"
        );

        Ok(network)
    }

    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    pub fn stop(&self, index: StopIndex) -> Option<&Stop> {
        self.stops.get(index.0)
    }

    pub fn transfers(&self) -> &TransferIndex {
        &self.transfers
    }

    pub fn constrained_transfers(&self) -> &ConstrainedTransferIndex {
        &self.constrained
    }

    /// The constrained boarding after alighting `trip` at `stop_pos`.
    ///
    /// Regular constrained transfers must also respect the default slack in
    /// `boarding`; facilitated ones do not.
    pub fn constrained_boarding(
        &self,
        trip: &FeedScopedId,
        stop_pos: usize,
        alight_time: ServiceTime,
        boarding: &BoardingConfig,
    ) -> Option<ConstrainedTransferBoarding<'_>> {
        self.constrained.find_boarding(
            trip,
            stop_pos,
            alight_time,
            boarding.earliest_board_time(alight_time),
        )
    }

    /// Trips active when the network was built.
    pub fn trips(&self) -> &[ScheduledTrip] {
        &self.trips
    }

    pub fn built_at(&self) -> NaiveDateTime {
        self.built_at
    }

    /// A live timetable seeded with this network's scheduled trips.
    pub fn timetable(&self) -> Timetable {
        let mut timetable = Timetable::new(self.stops.len());
        for scheduled in &self.trips {
            timetable.insert_scheduled(scheduled.trip.clone(), scheduled.stop_times.clone());
        }
        timetable
    }

    pub fn summary(&self) -> NetworkSummary {
        NetworkSummary {
            stops: self.stops.len(),
            transfer_edges: self.transfers.edge_count(),
            constrained_transfers: self.constrained.len(),
            forbidden_transfers: self.constrained.forbidden_count(),
            trips: self.trips.len(),
            built_at: self.built_at,
        }
    }
}

fn check_trip_stops(trips: &[ScheduledTrip], stop_count: usize) -> Result<(), NetworkError> {
    for scheduled in trips {
        if let Some(st) = scheduled.stop_times.iter().find(|st| st.stop.0 >= stop_count) {
            return Err(NetworkError::UnknownTripStop {
                trip: scheduled.trip.id.clone(),
                stop: st.stop,
                stop_count,
            });
        }
    }
    Ok(())
}

/// Owner of the current network snapshot.
///
/// Readers get an `Arc` to an immutable network; a rebuild swaps in the new
/// one for later readers while earlier readers keep the old one.
#[derive(Debug, Clone)]
pub struct NetworkHandle {
    current: Arc<watch::Sender<Arc<TransitNetwork>>>,
}

impl NetworkHandle {
    pub fn new(network: TransitNetwork) -> Self {
        let (sender, _) = watch::channel(Arc::new(network));
        Self {
            current: Arc::new(sender),
        }
    }

    /// The network queries should run against now.
    pub fn current(&self) -> Arc<TransitNetwork> {
        self.current.borrow().clone()
    }

    /// Swap in a new network, returning the previous one.
    pub fn replace(&self, network: TransitNetwork) -> Arc<TransitNetwork> {
        self.current.send_replace(Arc::new(network))
    }

    /// Watch for network swaps.
    pub fn subscribe(&self) -> watch::Receiver<Arc<TransitNetwork>> {
        self.current.subscribe()
    }

    /// Build a new network off the async runtime and swap it in.
    ///
    /// On failure the current network stays in place.
    pub async fn rebuild(
        &self,
        description: NetworkDescription,
        config: RouterConfig,
    ) -> Result<Arc<TransitNetwork>, NetworkError> {
        let at = Local::now().naive_local();
        let network = tokio::task::spawn_blocking(move || {
            TransitNetwork::build(description, &config, at)
        })
        .await??;

        self.replace(network);
        Ok(self.current())
    }
}
