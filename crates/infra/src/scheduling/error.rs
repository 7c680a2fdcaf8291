//! Scheduler error types

use std::time::Duration;

use matsync_domain::MatSyncError;
use thiserror::Error;
use tokio_cron_scheduler::JobSchedulerError;

use crate::errors::InfraError;

/// Scheduler-specific errors
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Scheduler already running")]
    AlreadyRunning,

    #[error("Scheduler not running")]
    NotRunning,

    #[error("Failed to create scheduler: {source}")]
    CreationFailed { source: JobSchedulerError },

    #[error("Failed to start scheduler: {source}")]
    StartFailed { source: JobSchedulerError },

    #[error("Failed to stop scheduler: {source}")]
    StopFailed { source: JobSchedulerError },

    #[error("Failed to register job '{cron}': {source}")]
    JobRegistrationFailed { cron: String, source: JobSchedulerError },

    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration, source: tokio::time::error::Elapsed },

    #[error("Task join failed: {0}")]
    TaskJoinFailed(#[from] tokio::task::JoinError),
}

impl From<SchedulerError> for InfraError {
    fn from(err: SchedulerError) -> Self {
        let matsync_err = match err {
            SchedulerError::AlreadyRunning | SchedulerError::NotRunning => {
                MatSyncError::InvalidInput(err.to_string())
            }
            SchedulerError::JobRegistrationFailed { .. } => MatSyncError::Config(err.to_string()),
            SchedulerError::Timeout { .. } => MatSyncError::Timeout(err.to_string()),
            _ => MatSyncError::Internal(err.to_string()),
        };
        InfraError(matsync_err)
    }
}

impl From<SchedulerError> for MatSyncError {
    fn from(err: SchedulerError) -> Self {
        InfraError::from(err).into()
    }
}

/// Convenience type alias for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;
