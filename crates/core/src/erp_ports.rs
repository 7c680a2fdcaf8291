//! ERP integration port interfaces
//!
//! The material master is reached only through [`MaterialClient`]. Which
//! implementation backs a connector (simulated or HTTP) is decided by the
//! [`ErpClientProvider`] wired in by the application.

use std::sync::Arc;

use async_trait::async_trait;
use matsync_domain::{
    ConnectionProbe, ConnectorConfig, ExternalRecord, MaterialDraft, MaterialPage, MaterialQuery,
    Result,
};

/// Client for the ERP material master.
#[async_trait]
pub trait MaterialClient: Send + Sync {
    /// Fetch a page of materials.
    async fn get_records(&self, query: &MaterialQuery) -> Result<MaterialPage>;

    /// Fetch one material by business key. `Ok(None)` when it does not exist.
    async fn get_record(&self, business_key: &str) -> Result<Option<ExternalRecord>>;

    /// Create a material.
    async fn create_record(&self, draft: &MaterialDraft) -> Result<ExternalRecord>;

    /// Update the material with the given business key.
    async fn update_record(&self, business_key: &str, draft: &MaterialDraft)
        -> Result<ExternalRecord>;

    /// Delete a material. Returns whether a material was removed.
    async fn delete_record(&self, business_key: &str) -> Result<bool>;

    /// Connectivity probe used by the health monitor.
    async fn test_connection(&self) -> Result<ConnectionProbe>;
}

/// Resolves the ERP client serving a connector.
pub trait ErpClientProvider: Send + Sync {
    fn client_for(&self, connector: &ConnectorConfig) -> Result<Arc<dyn MaterialClient>>;
}

/// Read access to connector configuration (writes come from configuration
/// management).
#[async_trait]
pub trait ConnectorRepository: Send + Sync {
    async fn get(&self, connector_id: &str) -> Result<Option<ConnectorConfig>>;

    async fn list(&self) -> Result<Vec<ConnectorConfig>>;

    /// Insert or replace a connector (used when seeding from config).
    async fn upsert(&self, connector: &ConnectorConfig) -> Result<()>;
}
