use matsync_domain::{MatSyncError, SyncDirection};
use thiserror::Error;

/// Reasons a sync run is refused or aborted before producing a result.
///
/// Per-record problems never surface here; they are collected in the run
/// result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyncError {
    #[error("connector not found: {0}")]
    ConnectorNotFound(String),

    #[error("connector {0} is inactive")]
    ConnectorInactive(String),

    #[error("connector {connector_id} does not permit {requested} sync (configured: {configured})")]
    DirectionNotAllowed {
        connector_id: String,
        requested: SyncDirection,
        configured: SyncDirection,
    },

    #[error("a sync run is already in progress for connector {0}")]
    AlreadyRunning(String),

    #[error("connector {connector_id} is unhealthy: {reason}")]
    Unhealthy { connector_id: String, reason: String },

    #[error("invalid sync request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Repository(#[from] MatSyncError),
}

impl SyncError {
    /// Stable snake_case tag used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConnectorNotFound(_) => "connector_not_found",
            Self::ConnectorInactive(_) => "connector_inactive",
            Self::DirectionNotAllowed { .. } => "direction_not_allowed",
            Self::AlreadyRunning(_) => "already_running",
            Self::Unhealthy { .. } => "connector_unhealthy",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Repository(err) => err.kind(),
        }
    }
}

impl From<SyncError> for MatSyncError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::ConnectorNotFound(id) => MatSyncError::ConnectorNotFound(id),
            SyncError::Repository(inner) => inner,
            other => MatSyncError::InvalidInput(other.to_string()),
        }
    }
}
