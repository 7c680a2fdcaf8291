//! Bidirectional sync between the ERP material master and the canonical
//! product store

mod error;
mod lock;
mod orchestrator;
pub mod ports;

pub use error::SyncError;
pub use lock::{ConnectorRunGuard, ConnectorRunLocks};
pub use orchestrator::{OrchestratorConfig, SyncOrchestrator, SyncPorts, SyncRequest};
