//! ERP error classification
//!
//! Gateway failures are categorized so callers (and the health
//! recommendations built from the messages) can tell an offline system from
//! rejected credentials or bad data.

use std::fmt;

use matsync_domain::MatSyncError;
use reqwest::StatusCode;

/// ERP error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErpErrorCategory {
    /// Gateway unreachable (connection refused, DNS, routing)
    NetworkOffline,
    /// Request timed out
    NetworkTimeout,
    /// 5xx from the gateway
    ServerUnavailable,
    /// 401, 403
    Authentication,
    /// 429
    RateLimited,
    /// Rejected payload or query (4xx other than the above)
    Validation,
    /// 404
    NotFound,
    Unknown,
}

impl ErpErrorCategory {
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            Self::NetworkOffline | Self::NetworkTimeout | Self::ServerUnavailable | Self::RateLimited
        )
    }

    pub fn from_status(status: StatusCode) -> Self {
        match status.as_u16() {
            401 | 403 => Self::Authentication,
            404 => Self::NotFound,
            408 | 504 => Self::NetworkTimeout,
            429 => Self::RateLimited,
            400..=499 => Self::Validation,
            500..=599 => Self::ServerUnavailable,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for ErpErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NetworkOffline => "connection refused or host unreachable",
            Self::NetworkTimeout => "request timed out",
            Self::ServerUnavailable => "ERP gateway unavailable",
            Self::Authentication => "authentication failed",
            Self::RateLimited => "rate limited",
            Self::Validation => "request rejected",
            Self::NotFound => "not found",
            Self::Unknown => "unexpected ERP error",
        };
        f.write_str(label)
    }
}

/// ERP gateway error with category and optional response detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErpError {
    category: ErpErrorCategory,
    message: String,
}

impl ErpError {
    pub fn new(category: ErpErrorCategory, message: impl Into<String>) -> Self {
        Self { category, message: message.into() }
    }

    /// Classify a non-success response. The body is kept (truncated) for
    /// diagnostics; gateways usually explain validation failures there.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let mut message =
            format!("HTTP {} {}", status.as_u16(), status.canonical_reason().unwrap_or("Unknown"));
        let body = body.trim();
        if !body.is_empty() {
            message.push_str(": ");
            message.extend(body.chars().take(200));
        }
        Self::new(ErpErrorCategory::from_status(status), message)
    }

    pub fn category(&self) -> ErpErrorCategory {
        self.category
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ErpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.category, self.message)
    }
}

impl std::error::Error for ErpError {}

impl From<reqwest::Error> for ErpError {
    fn from(err: reqwest::Error) -> Self {
        let category = if err.is_timeout() {
            ErpErrorCategory::NetworkTimeout
        } else if err.is_connect() {
            ErpErrorCategory::NetworkOffline
        } else if let Some(status) = err.status() {
            ErpErrorCategory::from_status(status)
        } else if err.is_decode() {
            ErpErrorCategory::Validation
        } else {
            ErpErrorCategory::Unknown
        };
        Self::new(category, err.to_string())
    }
}

impl From<ErpError> for MatSyncError {
    fn from(err: ErpError) -> Self {
        let text = err.to_string();
        match err.category {
            ErpErrorCategory::Authentication => MatSyncError::Auth(text),
            ErpErrorCategory::Validation => MatSyncError::InvalidInput(text),
            ErpErrorCategory::NotFound => MatSyncError::NotFound(text),
            ErpErrorCategory::NetworkTimeout => MatSyncError::Timeout(text),
            ErpErrorCategory::NetworkOffline
            | ErpErrorCategory::ServerUnavailable
            | ErpErrorCategory::RateLimited => MatSyncError::Network(text),
            ErpErrorCategory::Unknown => MatSyncError::Internal(text),
        }
    }
}
