use std::process::ExitCode;

use chrono::Local;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use transit_server::config::RouterConfig;
use transit_server::network::{NetworkDescription, NetworkHandle, TransitNetwork};
use transit_server::updater::UpdateManager;
use transit_server::web::{AppState, create_router};

/// Env var naming the JSON config file.
const CONFIG_ENV: &str = "TRANSIT_CONFIG";

/// Env var naming the JSON network description.
const NETWORK_ENV: &str = "TRANSIT_NETWORK";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("transit_server=info,tower_http=info")),
        )
        .init();

    let config = match std::env::var(CONFIG_ENV) {
        Ok(path) => match RouterConfig::load(&path) {
            Ok(config) => config,
            Err(e) => {
                error!(%path, error = %e, "Failed to load config");
                return ExitCode::FAILURE;
            }
        },
        Err(_) => {
            info!("{CONFIG_ENV} not set, using default config");
            RouterConfig::default()
        }
    };

    let description = match std::env::var(NETWORK_ENV) {
        Ok(path) => match NetworkDescription::load(&path) {
            Ok(description) => description,
            Err(e) => {
                error!(%path, error = %e, "Failed to load network");
                return ExitCode::FAILURE;
            }
        },
        Err(_) => {
            warn!("{NETWORK_ENV} not set, starting with an empty network");
            NetworkDescription::default()
        }
    };

    let at = Local::now().naive_local();
    let build_config = config.clone();
    let network = match tokio::task::spawn_blocking(move || {
        TransitNetwork::build(description, &build_config, at)
    })
    .await
    {
        Ok(Ok(network)) => network,
        Ok(Err(e)) => {
            error!(error = %e, "Failed to build network");
            return ExitCode::FAILURE;
        }
        Err(e) => {
            error!(error = %e, "Network build task failed");
            return ExitCode::FAILURE;
        }
    };

    let (manager, updates) =
        UpdateManager::new(network.timetable(), config.feed_id.clone(), config.updates.queue_size);
    manager.spawn();

    let addr = config.server.bind;
    let state = AppState::new(NetworkHandle::new(network), updates, config);
    let app = create_router(state);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(%addr, error = %e, "Failed to bind");
            return ExitCode::FAILURE;
        }
    };

    info!(%addr, "Transit server listening");
    info!("  GET  /health                  - Health check");
    info!("  PUT  /network                 - Replace the network and reseed the timetable");
    info!("  GET  /network/summary         - Network and timetable counts");
    info!("  GET  /stops/:index/transfers  - Transfers at a stop (?direction=reverse)");
    info!("  GET  /trips/:trip_id          - Live trip");
    info!("  GET  /trips/:trip_id/boarding - Constrained boarding (?stop_pos=&alight=)");
    info!("  POST /updates                 - Apply realtime mutations");
    info!("  GET  /updates/latest          - Last update result");

    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "Server error");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
