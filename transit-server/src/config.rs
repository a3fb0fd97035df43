//! Router configuration.
//!
//! Every section has defaults, so a config file only needs to name the
//! values it changes.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::thread;

use serde::{Deserialize, Serialize};

use crate::constrained::MAX_CONSTRAINT_SECS;
use crate::domain::ServiceTime;
use crate::transfer::WalkCostModel;

/// Errors from loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Config file is not valid JSON for this schema
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A value is out of range
    #[error("invalid config value: {0}")]
    Invalid(&'static str),
}

/// Transfer index build settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferIndexConfig {
    /// Fan the forward pass out over worker threads.
    pub parallel: bool,

    /// Number of worker threads when `parallel` is set.
    pub worker_threads: usize,
}

impl TransferIndexConfig {
    pub fn new(parallel: bool, worker_threads: usize) -> Self {
        Self {
            parallel,
            worker_threads,
        }
    }

    /// Single-threaded build.
    pub fn serial() -> Self {
        Self::new(false, 1)
    }

    /// Workers actually used for a network of `stop_count` stops.
    ///
    /// Never more workers than stops, and 1 when running serially.
    pub fn effective_workers(&self, stop_count: usize) -> usize {
        if !self.parallel {
            return 1;
        }
        self.worker_threads.min(stop_count).max(1)
    }
}

impl Default for TransferIndexConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            worker_threads: thread::available_parallelism().map_or(1, |n| n.get()),
        }
    }
}

/// Walking settings used to price transfers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    /// Walking speed in meters per second.
    pub speed_mps: f64,

    /// Multiplier applied to walking time to get generalized cost.
    pub reluctance: f64,

    /// Drop transfers that are not step-free.
    pub wheelchair: bool,
}

impl WalkConfig {
    /// The transfer cost model for these settings.
    pub fn cost_model(&self) -> WalkCostModel {
        let model = WalkCostModel::new(self.speed_mps, self.reluctance);
        if self.wheelchair {
            model.for_wheelchair()
        } else {
            model
        }
    }
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            speed_mps: 1.33,
            reluctance: 2.0,
            wheelchair: false,
        }
    }
}

/// Boarding settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardingConfig {
    /// Slack required between alighting and boarding when no transfer
    /// constraint applies (seconds).
    pub default_min_transfer_secs: i32,
}

impl BoardingConfig {
    /// Earliest time a rider alighting at `alight_time` may board another
    /// trip under the default transfer rules.
    pub fn earliest_board_time(&self, alight_time: ServiceTime) -> ServiceTime {
        alight_time + self.default_min_transfer_secs
    }
}

impl Default for BoardingConfig {
    fn default() -> Self {
        Self {
            default_min_transfer_secs: 120,
        }
    }
}

/// Realtime updater settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdaterConfig {
    /// Batches that may queue before submitters wait.
    pub queue_size: usize,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self { queue_size: 16 }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Feed namespace used in logs and for realtime updates
    pub feed_id: String,
    pub transfers: TransferIndexConfig,
    pub walk: WalkConfig,
    pub boarding: BoardingConfig,
    pub updates: UpdaterConfig,
    pub server: ServerConfig,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            feed_id: "default".to_string(),
            transfers: TransferIndexConfig::default(),
            walk: WalkConfig::default(),
            boarding: BoardingConfig::default(),
            updates: UpdaterConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl RouterConfig {
    /// Parse and validate a JSON config document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: RouterConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Check that values are in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feed_id.is_empty() || self.feed_id.contains(':') {
            return Err(ConfigError::Invalid("feed_id must be non-empty without ':'"));
        }
        if self.transfers.worker_threads == 0 {
            return Err(ConfigError::Invalid("transfers.worker_threads must be at least 1"));
        }
        if self.walk.speed_mps.is_nan() || self.walk.speed_mps <= 0.0 {
            return Err(ConfigError::Invalid("walk.speed_mps must be positive"));
        }
        if self.walk.reluctance.is_nan() || self.walk.reluctance <= 0.0 {
            return Err(ConfigError::Invalid("walk.reluctance must be positive"));
        }
        if !(0..=MAX_CONSTRAINT_SECS).contains(&self.boarding.default_min_transfer_secs) {
            return Err(ConfigError::Invalid(
                "boarding.default_min_transfer_secs must be between 0 and one day",
            ));
        }
        if self.updates.queue_size == 0 {
            return Err(ConfigError::Invalid("updates.queue_size must be at least 1"));
        }
        Ok(())
    }
}
