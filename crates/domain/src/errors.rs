//! Error types used throughout the synchronization engine

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for MatSync
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum MatSyncError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Mapping error: {0}")]
    Mapping(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Connector not found: {0}")]
    ConnectorNotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MatSyncError {
    /// Network, authentication and timeout failures raised while talking to
    /// the external system.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Auth(_) | Self::Timeout(_))
    }

    /// Short machine-readable kind, used in sync logs and HTTP payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Database(_) => "database",
            Self::Config(_) => "config",
            Self::Network(_) => "network",
            Self::Auth(_) => "auth",
            Self::Timeout(_) => "timeout",
            Self::NotFound(_) => "not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::Mapping(_) => "mapping",
            Self::Persistence(_) => "persistence",
            Self::ConnectorNotFound(_) => "connector_not_found",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result type alias for MatSync operations
pub type Result<T> = std::result::Result<T, MatSyncError>;
