use std::time::Duration;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// `RUST_LOG` drives filtering (default `info`). JSON lines are emitted when
/// `MATSYNC_LOG_JSON` is `true` or `1`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("MATSYNC_LOG_JSON")
        .map(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "true" | "1"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let result = if json { builder.json().try_init() } else { builder.try_init() };
    if let Err(err) = result {
        warn!(error = %err, "Tracing subscriber already installed");
    }
}

/// Log the outcome of a command execution with structured fields.
///
/// `command` is a stable identifier such as `"sync::trigger_sync"`; callers
/// must not forward request payloads through it.
#[inline]
pub fn log_command_execution(command: &str, connector_id: &str, elapsed: Duration, success: bool) {
    let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

    if success {
        info!(command, connector_id, duration_ms, "command_execution_success");
    } else {
        warn!(command, connector_id, duration_ms, "command_execution_failure");
    }
}
