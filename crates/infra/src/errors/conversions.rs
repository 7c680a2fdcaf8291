//! Conversions from external infrastructure errors into domain errors.

use matsync_domain::MatSyncError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub MatSyncError);

impl From<InfraError> for MatSyncError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<MatSyncError> for InfraError {
    fn from(value: MatSyncError) -> Self {
        InfraError(value)
    }
}

trait IntoMatSyncError {
    fn into_matsync(self) -> MatSyncError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → MatSyncError */
/* -------------------------------------------------------------------------- */

impl IntoMatSyncError for SqlError {
    fn into_matsync(self) -> MatSyncError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => {
                        MatSyncError::Database("database is busy".into())
                    }
                    (ErrorCode::DatabaseLocked, _) => {
                        MatSyncError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067 | 1555) => {
                        MatSyncError::Database(format!("unique constraint violation: {message}"))
                    }
                    (ErrorCode::ConstraintViolation, 787) => {
                        MatSyncError::Database("foreign key constraint violation".into())
                    }
                    _ => MatSyncError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => MatSyncError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                MatSyncError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, name, ty) => {
                MatSyncError::Database(format!("invalid column type for {name}: {ty}"))
            }
            RE::InvalidPath(path) => MatSyncError::Config(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            other => MatSyncError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_matsync())
    }
}

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(MatSyncError::Database(format!("connection pool error: {value}")))
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(MatSyncError::Internal(format!("JSON serialization failed: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → MatSyncError */
/* -------------------------------------------------------------------------- */

impl IntoMatSyncError for HttpError {
    fn into_matsync(self) -> MatSyncError {
        if self.is_timeout() {
            return MatSyncError::Timeout("HTTP request timed out".into());
        }

        if self.is_connect() {
            return MatSyncError::Network(format!("connection refused or host unreachable: {self}"));
        }

        if let Some(status) = self.status() {
            return status_error(status, None);
        }

        if self.is_decode() {
            return MatSyncError::Internal(format!("unexpected response body: {self}"));
        }

        MatSyncError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_matsync())
    }
}

/// Classify a non-success HTTP status, keeping the response body for context.
pub(crate) fn status_error(status: reqwest::StatusCode, body: Option<&str>) -> MatSyncError {
    let code = status.as_u16();
    let mut message =
        format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));
    if let Some(body) = body.map(str::trim).filter(|b| !b.is_empty()) {
        message.push_str(": ");
        message.push_str(&body.chars().take(200).collect::<String>());
    }

    match code {
        401 | 403 => MatSyncError::Auth(message),
        404 => MatSyncError::NotFound(message),
        408 | 504 => MatSyncError::Timeout(message),
        400..=499 if code != 429 => MatSyncError::InvalidInput(message),
        _ => MatSyncError::Network(message),
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
