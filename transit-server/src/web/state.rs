//! Application state for the web layer.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::RouterConfig;
use crate::network::NetworkHandle;
use crate::updater::UpdateHandle;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Current network snapshot
    pub network: NetworkHandle,

    /// Live timetable and realtime updates
    pub updates: UpdateHandle,

    pub config: Arc<RouterConfig>,

    /// Held while a network replacement rebuilds and reseeds the timetable
    pub reload: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(network: NetworkHandle, updates: UpdateHandle, config: RouterConfig) -> Self {
        Self {
            network,
            updates,
            config: Arc::new(config),
            reload: Arc::new(Mutex::new(())),
        }
    }
}
