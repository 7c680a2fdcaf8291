//! At most one sync run per connector

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

/// Set of connectors with a run in flight.
#[derive(Debug, Clone, Default)]
pub struct ConnectorRunLocks {
    running: Arc<Mutex<HashSet<String>>>,
}

impl ConnectorRunLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the connector, or `None` if a run is already in progress.
    pub fn try_acquire(&self, connector_id: &str) -> Option<ConnectorRunGuard> {
        let mut running = self.running.lock();
        if !running.insert(connector_id.to_string()) {
            return None;
        }
        Some(ConnectorRunGuard {
            running: Arc::clone(&self.running),
            connector_id: connector_id.to_string(),
        })
    }

    pub fn is_running(&self, connector_id: &str) -> bool {
        self.running.lock().contains(connector_id)
    }
}

/// Releases the connector when dropped, including on panic or cancellation.
#[derive(Debug)]
pub struct ConnectorRunGuard {
    running: Arc<Mutex<HashSet<String>>>,
    connector_id: String,
}

impl Drop for ConnectorRunGuard {
    fn drop(&mut self) {
        self.running.lock().remove(&self.connector_id);
    }
}
