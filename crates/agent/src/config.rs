//! Monitor configuration
//!
//! Values come from an optional `component-monitor.toml` in the working
//! directory, overridden by `MONITOR_*` environment variables. Anything not
//! set falls back to its default.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use monitor_lib::anomaly::Baseline;
use monitor_lib::root_cause::DiskCorrelation;
use monitor_lib::store::StoreConfig;
use serde::Deserialize;

const CONFIG_FILE: &str = "component-monitor";
const ENV_PREFIX: &str = "MONITOR";

/// Monitor configuration
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// Name reported in structured logs
    #[serde(default = "default_node_name")]
    pub node_name: String,

    /// Port of the analysis API, health and metrics endpoints
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Host collection interval in seconds
    #[serde(default = "default_collection_interval")]
    pub collection_interval_secs: u64,

    /// Upper bound of the random delay added to each interval
    #[serde(default = "default_collection_jitter")]
    pub collection_jitter_ms: u64,

    /// History window used by store-backed diagnosis when none is requested
    #[serde(default = "default_history_window")]
    pub history_window_secs: u64,

    /// Maximum age of a stored sample
    #[serde(default = "default_store_retention")]
    pub store_retention_secs: u64,

    /// Maximum number of stored samples
    #[serde(default = "default_store_capacity")]
    pub store_capacity: usize,

    /// `baseline_only` or `observed`
    #[serde(default)]
    pub disk_correlation: DiskCorrelation,

    /// Baselines installed before the first check, keyed by entity
    #[serde(default)]
    pub baselines: HashMap<String, Baseline>,
}

fn default_node_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_collection_interval() -> u64 {
    10
}

fn default_collection_jitter() -> u64 {
    1000
}

fn default_history_window() -> u64 {
    3600
}

fn default_store_retention() -> u64 {
    24 * 60 * 60
}

fn default_store_capacity() -> usize {
    100_000
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            node_name: default_node_name(),
            api_port: default_api_port(),
            collection_interval_secs: default_collection_interval(),
            collection_jitter_ms: default_collection_jitter(),
            history_window_secs: default_history_window(),
            store_retention_secs: default_store_retention(),
            store_capacity: default_store_capacity(),
            disk_correlation: DiskCorrelation::default(),
            baselines: HashMap::new(),
        }
    }
}

impl MonitorConfig {
    /// Load configuration from `component-monitor.toml` and the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()
            .context("failed to read configuration")?;

        config
            .try_deserialize()
            .context("invalid monitor configuration")
    }

    /// Load configuration from an explicit file, without environment overrides
    pub fn load_from(path: &Path) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from(path))
            .build()
            .with_context(|| format!("failed to read configuration from {}", path.display()))?;

        config
            .try_deserialize()
            .context("invalid monitor configuration")
    }

    pub fn collection_interval(&self) -> Duration {
        Duration::from_secs(self.collection_interval_secs)
    }

    pub fn collection_jitter(&self) -> Duration {
        Duration::from_millis(self.collection_jitter_ms)
    }

    pub fn history_window(&self) -> Duration {
        Duration::from_secs(self.history_window_secs)
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            max_retention: Duration::from_secs(self.store_retention_secs),
            max_size: self.store_capacity,
        }
    }
}
