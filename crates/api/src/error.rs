//! HTTP error mapping

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use matsync_core::SyncError;
use matsync_domain::MatSyncError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Errors returned by the management API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Domain(#[from] MatSyncError),

    #[error("{0}")]
    NotFound(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Sync(err) => match err {
                SyncError::ConnectorNotFound(_) => StatusCode::NOT_FOUND,
                SyncError::AlreadyRunning(_) => StatusCode::CONFLICT,
                SyncError::ConnectorInactive(_)
                | SyncError::DirectionNotAllowed { .. }
                | SyncError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
                SyncError::Unhealthy { .. } => StatusCode::SERVICE_UNAVAILABLE,
                SyncError::Repository(inner) => domain_status(inner),
            },
            Self::Domain(err) => domain_status(err),
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Stable label for logs and the `error` field of the body.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Sync(err) => err.kind(),
            Self::Domain(err) => err.kind(),
            Self::NotFound(_) => "not_found",
        }
    }
}

fn domain_status(err: &MatSyncError) -> StatusCode {
    match err {
        MatSyncError::NotFound(_) | MatSyncError::ConnectorNotFound(_) => StatusCode::NOT_FOUND,
        MatSyncError::InvalidInput(_) | MatSyncError::Mapping(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        MatSyncError::Network(_) | MatSyncError::Auth(_) => StatusCode::BAD_GATEWAY,
        MatSyncError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), kind = self.kind(), error = %self, "Request failed");
        }
        let body = ErrorResponse { error: self.kind().to_string(), message: self.to_string() };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use matsync_domain::SyncDirection;

    use super::*;

    #[test]
    fn sync_errors_map_to_statuses() {
        let cases = [
            (SyncError::ConnectorNotFound("x".into()), StatusCode::NOT_FOUND),
            (SyncError::AlreadyRunning("x".into()), StatusCode::CONFLICT),
            (SyncError::ConnectorInactive("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (
                SyncError::DirectionNotAllowed {
                    connector_id: "x".into(),
                    requested: SyncDirection::Outbound,
                    configured: SyncDirection::Inbound,
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                SyncError::Unhealthy { connector_id: "x".into(), reason: "down".into() },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                SyncError::Repository(MatSyncError::Database("locked".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }

    #[test]
    fn kind_follows_wrapped_error() {
        assert_eq!(ApiError::from(SyncError::AlreadyRunning("x".into())).kind(), "already_running");
        assert_eq!(ApiError::from(MatSyncError::Timeout("slow".into())).kind(), "timeout");
        assert_eq!(ApiError::NotFound("health".into()).kind(), "not_found");
    }
}
