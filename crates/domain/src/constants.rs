//! Domain constants
//!
//! Defaults shared by the health monitor, the orchestrator and the config
//! loader.

// Health monitoring
pub const HEALTH_CHECK_INTERVAL_SECS: u64 = 300;
pub const LATENCY_THRESHOLD_MS: u64 = 5_000;
pub const MAX_RETRIES: u32 = 3;
pub const RETRY_DELAY_MS: u64 = 1_000;
pub const PROBE_TIMEOUT_SECS: u64 = 10;
pub const PERSISTENT_FAILURE_THRESHOLD: u32 = 3;

// Sync runs
pub const DEFAULT_BATCH_SIZE: usize = 100;
pub const MAX_BATCH_SIZE: usize = 1_000;
pub const CALL_TIMEOUT_SECS: u64 = 30;

/// Record identifier used for inbound fetch failures in a run's error list.
pub const INBOUND_FETCH_SENTINEL: &str = "__inbound_fetch__";
/// Record identifier used for outbound listing failures in a run's error list.
pub const OUTBOUND_FETCH_SENTINEL: &str = "__outbound_fetch__";

/// Delimiter used by the ERP for multi-valued text fields (certifications).
pub const LIST_DELIMITER: char = ';';
