//! Configuration structures
//!
//! Every section carries defaults so partial JSON/TOML files are accepted.

use serde::{Deserialize, Serialize};

use crate::constants::{
    CALL_TIMEOUT_SECS, DEFAULT_BATCH_SIZE, HEALTH_CHECK_INTERVAL_SECS, LATENCY_THRESHOLD_MS,
    MAX_RETRIES, PROBE_TIMEOUT_SECS, RETRY_DELAY_MS,
};
use crate::types::{ConnectorConfig, SyncDirection};

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub erp: ErpClientConfig,
    pub sync: SyncConfig,
    pub health: HealthConfig,
    /// Connectors seeded into the connector table at startup.
    pub connectors: Vec<ConnectorConfig>,
}

/// SQLite file and pool size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "matsync.db".to_string(), pool_size: 4 }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_addr: "127.0.0.1:8080".to_string() }
    }
}

/// Which ERP client implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErpClientMode {
    /// Deterministic in-memory material master.
    #[default]
    Simulated,
    /// REST/JSON material-master gateway.
    Http,
}

/// Which ERP client backs the connectors, and how to reach it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErpClientConfig {
    pub mode: ErpClientMode,
    pub base_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_secs: u64,
    /// Seed the simulated material master with demo materials.
    pub seed_demo_data: bool,
}

impl Default for ErpClientConfig {
    fn default() -> Self {
        Self {
            mode: ErpClientMode::Simulated,
            base_url: "http://localhost:8000/material-master".to_string(),
            username: None,
            password: None,
            timeout_secs: CALL_TIMEOUT_SECS,
            seed_demo_data: true,
        }
    }
}

/// Cron-triggered sync for one connector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSchedule {
    pub connector_id: String,
    /// Six-field cron expression (seconds first).
    pub cron: String,
    pub direction: SyncDirection,
    #[serde(default)]
    pub batch_size: Option<usize>,
}

/// Orchestrator defaults and cron schedules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub default_batch_size: usize,
    /// Timeout applied to every ERP/store call made during a run.
    pub call_timeout_secs: u64,
    /// Reject runs for connectors whose latest health is unhealthy.
    pub require_healthy: bool,
    pub schedules: Vec<SyncSchedule>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            default_batch_size: DEFAULT_BATCH_SIZE,
            call_timeout_secs: CALL_TIMEOUT_SECS,
            require_healthy: false,
            schedules: Vec::new(),
        }
    }
}

/// Connection probe tuning and the background sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub enabled: bool,
    pub interval_secs: u64,
    pub latency_threshold_ms: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub probe_timeout_secs: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: HEALTH_CHECK_INTERVAL_SECS,
            latency_threshold_ms: LATENCY_THRESHOLD_MS,
            max_retries: MAX_RETRIES,
            retry_delay_ms: RETRY_DELAY_MS,
            probe_timeout_secs: PROBE_TIMEOUT_SECS,
        }
    }
}
