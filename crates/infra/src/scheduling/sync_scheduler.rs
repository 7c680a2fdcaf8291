//! Cron-triggered sync runs.
//!
//! Each configured [`SyncSchedule`] becomes a `tokio-cron-scheduler` job that
//! calls [`SyncOrchestrator::execute_sync`]. Each run is bounded by the
//! orchestrator's per-call timeout and always finalizes its log row. A
//! trigger that overlaps a run still in flight is rejected by the
//! orchestrator and logged.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use matsync_core::SyncOrchestrator;
//! use matsync_domain::{SyncDirection, SyncSchedule};
//! use matsync_infra::scheduling::{SchedulerResult, SyncScheduler, SyncSchedulerConfig};
//!
//! # async fn example(orchestrator: Arc<SyncOrchestrator>) -> SchedulerResult<()> {
//! let schedules = vec![SyncSchedule {
//!     connector_id: "sap-main".into(),
//!     cron: "0 */15 * * * *".into(),
//!     direction: SyncDirection::Inbound,
//!     batch_size: None,
//! }];
//! let mut scheduler =
//!     SyncScheduler::new(orchestrator, schedules, SyncSchedulerConfig::default()).await?;
//!
//! scheduler.start().await?;
//! // ... application runs ...
//! scheduler.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use matsync_core::{SyncOrchestrator, SyncRequest};
use matsync_domain::{SyncRunResult, SyncSchedule};
use tokio::sync::RwLock;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// Lifecycle timeouts for [`SyncScheduler`].
#[derive(Debug, Clone)]
pub struct SyncSchedulerConfig {
    pub start_timeout: Duration,
    pub stop_timeout: Duration,
}

impl Default for SyncSchedulerConfig {
    fn default() -> Self {
        Self {
            start_timeout: Duration::from_secs(5),
            stop_timeout: Duration::from_secs(5),
        }
    }
}

/// Cron scheduler with explicit lifecycle management.
pub struct SyncScheduler {
    scheduler: Arc<RwLock<JobScheduler>>,
    orchestrator: Arc<SyncOrchestrator>,
    config: SyncSchedulerConfig,
    job_ids: Vec<Uuid>,
    running: bool,
}

impl SyncScheduler {
    /// Create the scheduler and register one job per schedule.
    ///
    /// # Errors
    /// Fails when the scheduler cannot be created or a cron expression is
    /// invalid.
    pub async fn new(
        orchestrator: Arc<SyncOrchestrator>,
        schedules: Vec<SyncSchedule>,
        config: SyncSchedulerConfig,
    ) -> SchedulerResult<Self> {
        let raw_scheduler =
            JobScheduler::new().await.map_err(|source| SchedulerError::CreationFailed { source })?;

        let mut scheduler = Self {
            scheduler: Arc::new(RwLock::new(raw_scheduler)),
            orchestrator,
            config,
            job_ids: Vec::with_capacity(schedules.len()),
            running: false,
        };

        for schedule in schedules {
            let job_id = scheduler.register_job(schedule).await?;
            scheduler.job_ids.push(job_id);
        }
        Ok(scheduler)
    }

    /// Number of registered cron jobs.
    pub fn job_count(&self) -> usize {
        self.job_ids.len()
    }

    /// Start firing the registered jobs.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.running {
            return Err(SchedulerError::AlreadyRunning);
        }

        let scheduler = self.scheduler.clone();
        let start_timeout = self.config.start_timeout;
        tokio::time::timeout(start_timeout, async move {
            let guard = scheduler.write().await;
            guard.start().await
        })
        .await
        .map_err(|source| SchedulerError::Timeout { duration: start_timeout, source })?
        .map_err(|source| SchedulerError::StartFailed { source })?;

        self.running = true;
        info!(jobs = self.job_ids.len(), "Sync scheduler started");
        Ok(())
    }

    /// Shut the job scheduler down.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.running {
            return Err(SchedulerError::NotRunning);
        }

        let scheduler = self.scheduler.clone();
        let stop_timeout = self.config.stop_timeout;
        tokio::time::timeout(stop_timeout, async move {
            let mut guard = scheduler.write().await;
            guard.shutdown().await
        })
        .await
        .map_err(|source| SchedulerError::Timeout { duration: stop_timeout, source })?
        .map_err(|source| SchedulerError::StopFailed { source })?;

        self.running = false;
        info!("Sync scheduler stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    async fn register_job(&mut self, schedule: SyncSchedule) -> SchedulerResult<Uuid> {
        let orchestrator = Arc::clone(&self.orchestrator);
        let cron = schedule.cron.clone();
        let schedule = Arc::new(schedule);

        let job = Job::new_async(cron.as_str(), move |_id, _lock| {
            let orchestrator = Arc::clone(&orchestrator);
            let schedule = Arc::clone(&schedule);
            Box::pin(async move {
                run_scheduled_sync(&orchestrator, &schedule).await;
            })
        })
        .map_err(|source| SchedulerError::JobRegistrationFailed { cron: cron.clone(), source })?;

        let job_id = job.guid();
        self.scheduler
            .write()
            .await
            .add(job)
            .await
            .map_err(|source| SchedulerError::JobRegistrationFailed { cron: cron.clone(), source })?;

        debug!(cron = %cron, job_id = %job_id, "Registered scheduled sync");
        Ok(job_id)
    }
}

/// Run one scheduled sync. Failures are logged, never propagated.
///
/// Returns `None` only when the orchestrator refuses the run before it
/// starts; a started run always yields its finalized result.
pub async fn run_scheduled_sync(
    orchestrator: &SyncOrchestrator,
    schedule: &SyncSchedule,
) -> Option<SyncRunResult> {
    let request = SyncRequest {
        direction: Some(schedule.direction),
        batch_size: schedule.batch_size,
        ..SyncRequest::default()
    };
    let started = Instant::now();

    match orchestrator.execute_sync(&schedule.connector_id, request).await {
        Ok(result) => {
            info!(
                connector_id = %schedule.connector_id,
                run_id = %result.run_id,
                status = %result.status,
                processed = result.records_processed,
                elapsed_ms = started.elapsed().as_millis(),
                "Scheduled sync finished"
            );
            Some(result)
        }
        Err(err) => {
            error!(connector_id = %schedule.connector_id, error = %err, "Scheduled sync rejected");
            None
        }
    }
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        if self.running {
            warn!(jobs = self.job_ids.len(), "SyncScheduler dropped while running");
        }
    }
}
