//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::RouterConfig;
use crate::domain::{FeedScopedId, StopIndex};
use crate::network::{NetworkDescription, NetworkError, NetworkSummary};
use crate::transfer::SearchDirection;
use crate::updater::{LiveTrip, TripMutation, UpdateManagerError, UpdateResult};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/network", put(replace_network))
        .route("/network/summary", get(network_summary))
        .route("/stops/:index/transfers", get(stop_transfers))
        .route("/trips/:trip_id", get(live_trip))
        .route("/trips/:trip_id/boarding", get(constrained_boarding))
        .route("/updates", post(submit_updates))
        .route("/updates/latest", get(latest_update))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Counts for the current network and live timetable.
async fn network_summary(State(state): State<AppState>) -> Json<SummaryResponse> {
    let network = state.network.current();
    let timetable = state.updates.timetable();

    Json(SummaryResponse {
        feed_id: state.config.feed_id.clone(),
        network: network.summary(),
        live_trips: timetable.len(),
        trips_by_state: timetable.state_counts(),
        timetable_updated_at: timetable.updated_at(),
    })
}

/// Rebuild the network from a new description and reseed the live
/// timetable from it.
async fn replace_network(
    State(state): State<AppState>,
    Json(description): Json<NetworkDescription>,
) -> Result<Json<NetworkSummary>, AppError> {
    let _reload = state.reload.lock().await;

    let network = state
        .network
        .rebuild(description, RouterConfig::clone(&state.config))
        .await?;
    state.updates.reset(network.timetable()).await?;

    let summary = network.summary();
    info!(stops = summary.stops, trips = summary.trips, "Network replaced");
    Ok(Json(summary))
}

/// Transfers at a stop, forward (leaving) or reverse (arriving).
async fn stop_transfers(
    State(state): State<AppState>,
    Path(index): Path<usize>,
    Query(query): Query<TransfersQuery>,
) -> Result<Json<StopTransfersResponse>, AppError> {
    let network = state.network.current();
    let stop_index = StopIndex(index);
    let stop = network.stop(stop_index).ok_or_else(|| AppError::NotFound {
        message: format!("Unknown stop index: {index}"),
    })?;

    let edges = match query.direction {
        SearchDirection::Forward => network.transfers().forward_edges(stop_index),
        SearchDirection::Reverse => network.transfers().reverse_edges(stop_index),
    };

    let edges = edges
        .iter()
        .map(|edge| {
            let name = network.stop(edge.stop).map(|s| s.name.clone());
            TransferEdgeResult::new(edge, name)
        })
        .collect();

    Ok(Json(StopTransfersResponse {
        stop: stop_index,
        stop_id: stop.id.to_string(),
        stop_name: stop.name.clone(),
        direction: query.direction,
        edges,
    }))
}

/// A trip as the live timetable currently has it.
async fn live_trip(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
) -> Result<Json<LiveTrip>, AppError> {
    let id = parse_trip_id(&trip_id)?;

    state
        .updates
        .timetable()
        .trip(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound {
            message: format!("Unknown trip: {id}"),
        })
}

/// The constrained boarding after alighting a trip, if a rule applies.
async fn constrained_boarding(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
    Query(query): Query<BoardingQuery>,
) -> Result<Json<BoardingResponse>, AppError> {
    let id = parse_trip_id(&trip_id)?;
    let network = state.network.current();

    let boarding = network
        .constrained_boarding(&id, query.stop_pos, query.alight, &state.config.boarding)
        .map(BoardingResponse::from);

    boarding.map(Json).ok_or_else(|| AppError::NotFound {
        message: format!(
            "No constrained transfer from {id} at position {} after {}",
            query.stop_pos, query.alight
        ),
    })
}

fn parse_trip_id(trip_id: &str) -> Result<FeedScopedId, AppError> {
    FeedScopedId::parse(trip_id).map_err(|e| AppError::BadRequest {
        message: format!("Invalid trip id {trip_id}: {e}"),
    })
}

/// Apply a batch of realtime mutations.
async fn submit_updates(
    State(state): State<AppState>,
    Json(mutations): Json<Vec<TripMutation>>,
) -> Result<Json<UpdateResult>, AppError> {
    let result = state.updates.submit(mutations).await?;
    Ok(Json(UpdateResult::clone(&result)))
}

/// Result of the most recent realtime batch.
async fn latest_update(State(state): State<AppState>) -> Result<Json<UpdateResult>, AppError> {
    state
        .updates
        .latest_result()
        .map(|result| Json(UpdateResult::clone(&result)))
        .ok_or_else(|| AppError::NotFound {
            message: "No realtime update applied yet".to_string(),
        })
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Internal { message: String },
}

impl From<UpdateManagerError> for AppError {
    fn from(e: UpdateManagerError) -> Self {
        AppError::Internal {
            message: e.to_string(),
        }
    }
}

impl From<NetworkError> for AppError {
    fn from(e: NetworkError) -> Self {
        match e {
            NetworkError::Io { .. } | NetworkError::BuildTask(_) => AppError::Internal {
                message: e.to_string(),
            },
            _ => AppError::BadRequest {
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        warn!(%status, %message, "Request failed");

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransferIndexConfig;
    use crate::constrained::{ConstrainedTransfer, TransferConstraint, TripStopPosition};
    use crate::domain::{RealTimeState, ServiceTime, Stop, StopTime, Trip, WgsCoordinate};
    use crate::network::{NetworkHandle, ScheduledTrip, TransitNetwork};
    use crate::transfer::CandidateTransfer;
    use crate::updater::{UpdateErrorType, UpdateManager};
    use crate::version::VersionedEntity;
    use chrono::NaiveDate;

    fn id(s: &str) -> FeedScopedId {
        FeedScopedId::parse(s).unwrap()
    }

    fn description() -> NetworkDescription {
        let stops = ["Harbour", "Square", "Station"]
            .iter()
            .enumerate()
            .map(|(n, name)| {
                Stop::new(
                    id(&format!("F:S{n}")),
                    *name,
                    WgsCoordinate::new(59.9, 10.7 + n as f64 * 0.001).unwrap(),
                )
            })
            .collect();

        NetworkDescription {
            stops,
            transfers: vec![
                vec![CandidateTransfer::walk(StopIndex(1), 120.0)],
                vec![CandidateTransfer::walk(StopIndex(2), 80.0)],
            ],
            trips: vec![VersionedEntity::new(
                "3",
                ScheduledTrip {
                    trip: Trip::new(id("F:T1"), id("F:R1")),
                    stop_times: vec![
                        StopTime::new(StopIndex(0), 1, ServiceTime::hms(7, 0, 0), ServiceTime::hms(7, 0, 0)),
                        StopTime::new(StopIndex(2), 2, ServiceTime::hms(7, 9, 0), ServiceTime::hms(7, 9, 0)),
                    ],
                },
            )],
            ..NetworkDescription::default()
        }
    }

    fn app_state() -> AppState {
        app_state_with(description())
    }

    fn app_state_with(description: NetworkDescription) -> AppState {
        let config = RouterConfig {
            feed_id: "F".to_string(),
            transfers: TransferIndexConfig::serial(),
            ..RouterConfig::default()
        };
        let at = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(5, 0, 0)
            .unwrap();
        let network = TransitNetwork::build(description, &config, at).unwrap();
        let (manager, updates) = UpdateManager::new(network.timetable(), "F", 4);
        manager.spawn();

        AppState::new(NetworkHandle::new(network), updates, config)
    }

    #[tokio::test]
    async fn health_check() {
        assert_eq!(health().await, "ok");
    }

    #[tokio::test]
    async fn forward_and_reverse_transfers() {
        let state = app_state();

        let Json(forward) = stop_transfers(
            State(state.clone()),
            Path(1),
            Query(TransfersQuery::default()),
        )
        .await
        .unwrap();
        assert_eq!(forward.stop_name, "Square");
        assert_eq!(forward.direction, SearchDirection::Forward);
        assert_eq!(forward.edges.len(), 1);
        assert_eq!(forward.edges[0].stop, StopIndex(2));
        assert_eq!(forward.edges[0].stop_name.as_deref(), Some("Station"));
        assert!(!forward.edges[0].reversed);

        let Json(reverse) = stop_transfers(
            State(state),
            Path(1),
            Query(TransfersQuery {
                direction: SearchDirection::Reverse,
            }),
        )
        .await
        .unwrap();
        assert_eq!(reverse.edges.len(), 1);
        assert_eq!(reverse.edges[0].stop, StopIndex(0));
        assert!(reverse.edges[0].reversed);
    }

    #[tokio::test]
    async fn unknown_stop_is_not_found() {
        let err = stop_transfers(State(app_state()), Path(99), Query(TransfersQuery::default()))
            .await
            .unwrap_err();

        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn updates_flow_through_to_summary() {
        let state = app_state();

        let err = latest_update(State(state.clone())).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));

        let Json(result) = submit_updates(
            State(state.clone()),
            Json(vec![
                TripMutation::Cancel { trip_id: id("F:T1") },
                TripMutation::Delete { trip_id: id("F:T7") },
            ]),
        )
        .await
        .unwrap();
        assert_eq!(result.successful, 1);
        assert_eq!(result.failure_count(UpdateErrorType::NoTripForCancellationFound), 1);

        let Json(latest) = latest_update(State(state.clone())).await.unwrap();
        assert_eq!(latest, result);

        let Json(trip) = live_trip(State(state.clone()), Path("F:T1".to_string()))
            .await
            .unwrap();
        assert_eq!(trip.state, RealTimeState::Canceled);

        let Json(summary) = network_summary(State(state)).await;
        assert_eq!(summary.feed_id, "F");
        assert_eq!(summary.network.stops, 3);
        assert_eq!(summary.network.transfer_edges, 2);
        assert_eq!(summary.live_trips, 1);
        assert_eq!(summary.trips_by_state[&RealTimeState::Canceled], 1);
        assert!(summary.timetable_updated_at.is_some());
    }

    #[tokio::test]
    async fn invalid_trip_id_is_bad_request() {
        let err = live_trip(State(app_state()), Path("no-feed".to_string()))
            .await
            .unwrap_err();

        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    fn reroute_onto_stop_3() -> Vec<TripMutation> {
        vec![TripMutation::Reroute {
            trip_id: id("F:T1"),
            stop_times: vec![
                StopTime::new(StopIndex(0), 1, ServiceTime::hms(7, 0, 0), ServiceTime::hms(7, 0, 0)),
                StopTime::new(StopIndex(3), 2, ServiceTime::hms(7, 12, 0), ServiceTime::hms(7, 12, 0)),
            ],
        }]
    }

    #[tokio::test]
    async fn replacing_network_reseeds_live_timetable() {
        let state = app_state();

        let Json(result) = submit_updates(State(state.clone()), Json(reroute_onto_stop_3()))
            .await
            .unwrap();
        assert_eq!(result.failure_count(UpdateErrorType::UnknownStop), 1);

        let mut bigger = description();
        bigger.stops.push(Stop::new(
            id("F:S3"),
            "Depot",
            WgsCoordinate::new(59.91, 10.71).unwrap(),
        ));
        let Json(summary) = replace_network(State(state.clone()), Json(bigger))
            .await
            .unwrap();
        assert_eq!(summary.stops, 4);
        assert_eq!(state.network.current().stops().len(), 4);
        assert_eq!(state.updates.timetable().stop_count(), 4);

        let Json(result) = submit_updates(State(state.clone()), Json(reroute_onto_stop_3()))
            .await
            .unwrap();
        assert_eq!(result.successful, 1);

        let Json(trip) = live_trip(State(state), Path("F:T1".to_string()))
            .await
            .unwrap();
        assert_eq!(trip.state, RealTimeState::Modified);
        assert_eq!(trip.stop_times[1].stop, StopIndex(3));
    }

    #[tokio::test]
    async fn broken_replacement_keeps_network() {
        let state = app_state();

        let mut broken = description();
        broken.transfers = vec![Vec::new(); 9];
        let err = replace_network(State(state.clone()), Json(broken))
            .await
            .unwrap_err();

        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(state.network.current().stops().len(), 3);
        assert_eq!(state.updates.timetable().stop_count(), 3);
    }

    #[tokio::test]
    async fn boarding_uses_configured_slack() {
        let mut description = description();
        description.constrained_transfers = vec![ConstrainedTransfer {
            source: TripStopPosition::new(id("F:T1"), 1),
            target: TripStopPosition::new(id("F:T2"), 0),
            target_trip_index: 4,
            target_time: ServiceTime::hms(7, 11, 0),
            constraint: TransferConstraint::regular(),
        }];
        let state = app_state_with(description);

        let Json(boarding) = constrained_boarding(
            State(state.clone()),
            Path("F:T1".to_string()),
            Query(BoardingQuery {
                stop_pos: 1,
                alight: ServiceTime::hms(7, 9, 0),
            }),
        )
        .await
        .unwrap();
        assert_eq!(boarding.trip, "F:T2");
        assert_eq!(boarding.trip_index, 4);
        assert_eq!(boarding.earliest_board_time, ServiceTime::hms(7, 11, 0));
        assert!(!boarding.facilitated);

        // Two minutes of slack after 07:10 misses the 07:11 departure
        let err = constrained_boarding(
            State(state),
            Path("F:T1".to_string()),
            Query(BoardingQuery {
                stop_pos: 1,
                alight: ServiceTime::hms(7, 10, 0),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }
}
