//! SQLite persistence

mod columns;
pub mod connector_repository;
pub mod health_repository;
pub mod manager;
pub mod product_repository;
pub mod provisioning_repository;
pub mod sync_log_repository;

pub use connector_repository::SqliteConnectorRepository;
pub use health_repository::SqliteHealthRepository;
pub use manager::{DbManager, SqliteConnection, SqlitePool};
pub use product_repository::SqliteProductStore;
pub use provisioning_repository::{ProductIdentity, SqliteProductProvisioner, TraceEvent};
pub use sync_log_repository::SqliteSyncLogRepository;
