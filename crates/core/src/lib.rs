//! # MatSync Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The field mapper and conflict resolver (pure functions)
//! - The connection health monitor
//! - The sync orchestrator
//! - Port/adapter interfaces (traits) for the ERP, the canonical store and
//!   persistence
//!
//! ## Architecture Principles
//! - Only depends on `matsync-common` and `matsync-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits
//! - Collaborators are constructed explicitly and injected

pub mod conflict;
pub mod erp_ports;
pub mod health;
pub mod mapping;
pub mod sync;

#[cfg(test)]
pub(crate) mod test_support;

pub use conflict::ConflictResolver;
pub use erp_ports::{ConnectorRepository, ErpClientProvider, MaterialClient};
pub use health::ports::HealthRepository;
pub use health::{ConnectionHealthMonitor, HealthMonitorConfig};
pub use mapping::{FieldMapper, MappedProduct, MappingError};
pub use sync::ports::{ProductProvisioner, ProductStore, SyncLogRepository};
pub use sync::{OrchestratorConfig, SyncError, SyncOrchestrator, SyncPorts, SyncRequest};
