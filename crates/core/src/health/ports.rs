//! Port interfaces for connector health

use async_trait::async_trait;
use matsync_domain::{ConnectorHealth, Result};

/// Latest-state store for connector health (one row per connector).
#[async_trait]
pub trait HealthRepository: Send + Sync {
    async fn get(&self, connector_id: &str) -> Result<Option<ConnectorHealth>>;

    /// Insert or replace the connector's health row
    async fn upsert(&self, health: &ConnectorHealth) -> Result<()>;

    async fn list(&self) -> Result<Vec<ConnectorHealth>>;
}
