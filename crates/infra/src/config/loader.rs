//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `MATSYNC_DB_PATH` is unset, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//! 5. With no file anywhere, runs on built-in defaults
//!
//! ## Environment Variables
//! - `MATSYNC_DB_PATH` (required for env loading), `MATSYNC_DB_POOL_SIZE`
//! - `MATSYNC_BIND_ADDR`
//! - `MATSYNC_ERP_MODE` (`simulated` | `http`), `MATSYNC_ERP_BASE_URL`,
//!   `MATSYNC_ERP_USERNAME`, `MATSYNC_ERP_PASSWORD`,
//!   `MATSYNC_ERP_TIMEOUT_SECS`, `MATSYNC_ERP_SEED_DEMO_DATA`
//! - `MATSYNC_SYNC_BATCH_SIZE`, `MATSYNC_SYNC_CALL_TIMEOUT_SECS`,
//!   `MATSYNC_SYNC_REQUIRE_HEALTHY`
//! - `MATSYNC_HEALTH_ENABLED`, `MATSYNC_HEALTH_INTERVAL_SECS`,
//!   `MATSYNC_HEALTH_LATENCY_THRESHOLD_MS`, `MATSYNC_HEALTH_MAX_RETRIES`,
//!   `MATSYNC_HEALTH_RETRY_DELAY_MS`, `MATSYNC_HEALTH_PROBE_TIMEOUT_SECS`
//! - `MATSYNC_CONNECTORS`: JSON array of connector configurations
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./matsync.json` or `./matsync.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. Relative to executable location

use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use matsync_domain::{
    Config, ConnectorConfig, DatabaseConfig, ErpClientConfig, ErpClientMode, HealthConfig,
    MatSyncError, Result, ServerConfig, SyncConfig,
};

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `MatSyncError::Config` if a source exists but is invalid.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) if std::env::var("MATSYNC_DB_PATH").is_ok() => Err(e),
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            match probe_config_paths() {
                Some(path) => load_from_file(Some(path)),
                None => {
                    tracing::warn!("No configuration found, using defaults");
                    Ok(Config::default())
                }
            }
        }
    }
}

/// Load configuration from environment variables
///
/// `MATSYNC_DB_PATH` must be present; every other variable falls back to
/// its section default.
///
/// # Errors
/// Returns `MatSyncError::Config` if the database path is missing or a
/// variable has an invalid value.
pub fn load_from_env() -> Result<Config> {
    let db_defaults = DatabaseConfig::default();
    let erp_defaults = ErpClientConfig::default();
    let sync_defaults = SyncConfig::default();
    let health_defaults = HealthConfig::default();

    let connectors = match std::env::var("MATSYNC_CONNECTORS") {
        Ok(raw) => serde_json::from_str::<Vec<ConnectorConfig>>(&raw)
            .map_err(|e| MatSyncError::Config(format!("Invalid MATSYNC_CONNECTORS: {e}")))?,
        Err(_) => Vec::new(),
    };

    Ok(Config {
        database: DatabaseConfig {
            path: env_var("MATSYNC_DB_PATH")?,
            pool_size: env_parse("MATSYNC_DB_POOL_SIZE", db_defaults.pool_size)?,
        },
        server: ServerConfig {
            bind_addr: std::env::var("MATSYNC_BIND_ADDR")
                .unwrap_or_else(|_| ServerConfig::default().bind_addr),
        },
        erp: ErpClientConfig {
            mode: env_mode("MATSYNC_ERP_MODE", erp_defaults.mode)?,
            base_url: std::env::var("MATSYNC_ERP_BASE_URL").unwrap_or(erp_defaults.base_url),
            username: std::env::var("MATSYNC_ERP_USERNAME").ok(),
            password: std::env::var("MATSYNC_ERP_PASSWORD").ok(),
            timeout_secs: env_parse("MATSYNC_ERP_TIMEOUT_SECS", erp_defaults.timeout_secs)?,
            seed_demo_data: env_bool("MATSYNC_ERP_SEED_DEMO_DATA", erp_defaults.seed_demo_data),
        },
        sync: SyncConfig {
            default_batch_size: env_parse(
                "MATSYNC_SYNC_BATCH_SIZE",
                sync_defaults.default_batch_size,
            )?,
            call_timeout_secs: env_parse(
                "MATSYNC_SYNC_CALL_TIMEOUT_SECS",
                sync_defaults.call_timeout_secs,
            )?,
            require_healthy: env_bool("MATSYNC_SYNC_REQUIRE_HEALTHY", sync_defaults.require_healthy),
            schedules: Vec::new(),
        },
        health: HealthConfig {
            enabled: env_bool("MATSYNC_HEALTH_ENABLED", health_defaults.enabled),
            interval_secs: env_parse("MATSYNC_HEALTH_INTERVAL_SECS", health_defaults.interval_secs)?,
            latency_threshold_ms: env_parse(
                "MATSYNC_HEALTH_LATENCY_THRESHOLD_MS",
                health_defaults.latency_threshold_ms,
            )?,
            max_retries: env_parse("MATSYNC_HEALTH_MAX_RETRIES", health_defaults.max_retries)?,
            retry_delay_ms: env_parse(
                "MATSYNC_HEALTH_RETRY_DELAY_MS",
                health_defaults.retry_delay_ms,
            )?,
            probe_timeout_secs: env_parse(
                "MATSYNC_HEALTH_PROBE_TIMEOUT_SECS",
                health_defaults.probe_timeout_secs,
            )?,
        },
        connectors,
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `MatSyncError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(MatSyncError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            MatSyncError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| MatSyncError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| MatSyncError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| MatSyncError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(MatSyncError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    const NAMES: [&str; 6] = [
        "config.json",
        "config.toml",
        "matsync.json",
        "matsync.toml",
        "../config.json",
        "../config.toml",
    ];

    let mut roots = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd);
    }
    if let Some(exe_dir) =
        std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        roots.push(exe_dir);
    }

    roots
        .iter()
        .flat_map(|root| NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| MatSyncError::Config(format!("Missing required environment variable: {key}")))
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| MatSyncError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(default),
    }
}

fn env_mode(key: &str, default: ErpClientMode) -> Result<ErpClientMode> {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "simulated" => Ok(ErpClientMode::Simulated),
            "http" => Ok(ErpClientMode::Http),
            other => Err(MatSyncError::Config(format!("Invalid value for {key}: {other}"))),
        },
        Err(_) => Ok(default),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
