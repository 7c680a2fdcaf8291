//! Port interfaces for sync operations

use async_trait::async_trait;
use matsync_domain::{
    CanonicalRecord, NewProduct, ProductFields, ProductQuery, Result, SyncLogEntry,
    SyncRunResult, SyncStatistics,
};
use uuid::Uuid;

/// Trait for the canonical product store
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Get a product by id
    async fn get(&self, id: Uuid) -> Result<Option<CanonicalRecord>>;

    /// Look up a product by business key (exact match)
    async fn find_by_sku(&self, sku: &str) -> Result<Option<CanonicalRecord>>;

    /// List products ordered by SKU
    async fn list(&self, query: ProductQuery) -> Result<Vec<CanonicalRecord>>;

    /// Create a product. The store assigns the id and `last_modified`.
    async fn create(&self, product: &NewProduct) -> Result<CanonicalRecord>;

    /// Replace a product's fields and bump `last_modified`
    async fn update(&self, id: Uuid, fields: &ProductFields) -> Result<CanonicalRecord>;
}

/// Downstream provisioning triggered for every newly created product
/// (identity, QR payload, trace event).
#[async_trait]
pub trait ProductProvisioner: Send + Sync {
    async fn provision(&self, product: &CanonicalRecord) -> Result<()>;
}

/// Trait for persisting sync run logs
#[async_trait]
pub trait SyncLogRepository: Send + Sync {
    /// Record a run as started
    async fn start_run(&self, run: &SyncRunResult) -> Result<()>;

    /// Store the final counters, errors and conflicts of a run
    async fn finish_run(&self, run: &SyncRunResult) -> Result<()>;

    /// Most recent runs for a connector, newest first
    async fn recent(&self, connector_id: &str, limit: usize) -> Result<Vec<SyncLogEntry>>;

    /// Aggregated statistics over a connector's run history
    async fn statistics(&self, connector_id: &str) -> Result<SyncStatistics>;
}
