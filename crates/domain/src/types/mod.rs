//! Domain types and models

pub mod connector;
pub mod health;
pub mod material;
pub mod product;
pub mod sync;

pub use connector::{
    ConnectorConfig, ConnectorKind, ConnectorStatus, FieldMappingRule, SyncDirection,
    Transformation,
};
pub use health::{ConnectorHealth, HealthStatus, HealthSummary};
pub use material::{
    codes, ConnectionProbe, ExternalRecord, FieldMap, MaterialDraft, MaterialPage, MaterialQuery,
};
pub use product::{
    CanonicalField, CanonicalRecord, FieldValueError, NewProduct, ProductFields, ProductQuery,
};
pub use sync::{
    ConflictOutcome, ConflictWinner, SyncConflictEntry, SyncLogEntry, SyncRecordError,
    SyncRunResult, SyncRunStatus, SyncStatistics,
};
