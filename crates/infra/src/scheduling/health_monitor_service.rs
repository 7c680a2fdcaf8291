//! Periodic connector health checks.
//!
//! Runs `check_all_connections` on a fixed interval in a background task and
//! reports overall status transitions to a [`HealthStatusListener`]. The task
//! is owned through a join handle and stopped through a cancellation token.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use matsync_core::ConnectionHealthMonitor;
use matsync_domain::{HealthConfig, HealthStatus, HealthSummary};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// Receives overall health transitions.
#[async_trait]
pub trait HealthStatusListener: Send + Sync {
    /// `previous` is `None` for the first completed sweep.
    async fn on_status_change(&self, previous: Option<HealthStatus>, summary: &HealthSummary);
}

/// Listener that only logs transitions.
#[derive(Debug, Default)]
pub struct LoggingHealthListener;

#[async_trait]
impl HealthStatusListener for LoggingHealthListener {
    async fn on_status_change(&self, previous: Option<HealthStatus>, summary: &HealthSummary) {
        let unhealthy: Vec<&str> = summary
            .connectors
            .iter()
            .filter(|c| c.status == HealthStatus::Unhealthy)
            .map(|c| c.connector_id.as_str())
            .collect();

        match summary.overall {
            HealthStatus::Healthy => {
                info!(previous = ?previous, "All ERP connectors healthy");
            }
            status => {
                warn!(previous = ?previous, status = %status, unhealthy = ?unhealthy, "ERP connector health changed");
            }
        }
    }
}

/// Sweep interval and lifecycle timeouts.
#[derive(Debug, Clone)]
pub struct HealthMonitorServiceConfig {
    pub interval: Duration,
    /// Upper bound for one sweep over every connector.
    pub sweep_timeout: Duration,
    pub join_timeout: Duration,
}

impl Default for HealthMonitorServiceConfig {
    fn default() -> Self {
        Self::from(&HealthConfig::default())
    }
}

impl From<&HealthConfig> for HealthMonitorServiceConfig {
    fn from(config: &HealthConfig) -> Self {
        let interval = Duration::from_secs(config.interval_secs.max(1));
        Self { interval, sweep_timeout: interval, join_timeout: Duration::from_secs(5) }
    }
}

/// Periodic `check_all_connections` sweep owned by a background task.
pub struct HealthMonitorService {
    monitor: Arc<ConnectionHealthMonitor>,
    listener: Arc<dyn HealthStatusListener>,
    config: HealthMonitorServiceConfig,
    cancellation: CancellationToken,
    task_handle: Option<JoinHandle<()>>,
}

impl HealthMonitorService {
    pub fn new(monitor: Arc<ConnectionHealthMonitor>, config: HealthMonitorServiceConfig) -> Self {
        Self {
            monitor,
            listener: Arc::new(LoggingHealthListener),
            config,
            cancellation: CancellationToken::new(),
            task_handle: None,
        }
    }

    pub fn with_listener(mut self, listener: Arc<dyn HealthStatusListener>) -> Self {
        self.listener = listener;
        self
    }

    /// Spawn the background loop. The first sweep runs immediately.
    #[instrument(skip(self))]
    pub fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        self.cancellation = CancellationToken::new();
        let monitor = Arc::clone(&self.monitor);
        let listener = Arc::clone(&self.listener);
        let config = self.config.clone();
        let cancel = self.cancellation.clone();

        self.task_handle = Some(tokio::spawn(async move {
            Self::monitor_loop(monitor, listener, config, cancel).await;
        }));

        info!(interval_secs = self.config.interval.as_secs(), "Health monitor service started");
        Ok(())
    }

    /// Cancel the loop and wait for it to finish.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        self.cancellation.cancel();

        if let Some(handle) = self.task_handle.take() {
            let join_timeout = self.config.join_timeout;
            tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|source| SchedulerError::Timeout { duration: join_timeout, source })??;
        }

        info!("Health monitor service stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.task_handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    async fn monitor_loop(
        monitor: Arc<ConnectionHealthMonitor>,
        listener: Arc<dyn HealthStatusListener>,
        config: HealthMonitorServiceConfig,
        cancel: CancellationToken,
    ) {
        let mut ticker = tokio::time::interval(config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_overall: Option<HealthStatus> = None;

        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    debug!("Health monitor loop cancelled");
                    break;
                }
                _ = ticker.tick() => {
                    let sweep = tokio::select! {
                        () = cancel.cancelled() => break,
                        result = tokio::time::timeout(config.sweep_timeout, monitor.check_all_connections()) => result,
                    };

                    match sweep {
                        Ok(summary) => {
                            debug!(overall = %summary.overall, connectors = summary.connectors.len(), "Health sweep finished");
                            if last_overall != Some(summary.overall) {
                                listener.on_status_change(last_overall, &summary).await;
                                last_overall = Some(summary.overall);
                            }
                        }
                        Err(_) => {
                            warn!(timeout_secs = config.sweep_timeout.as_secs(), "Health sweep timed out");
                        }
                    }
                }
            }
        }
    }
}

impl Drop for HealthMonitorService {
    fn drop(&mut self) {
        if self.is_running() {
            warn!("HealthMonitorService dropped while running; cancelling task");
            self.cancellation.cancel();
        }
    }
}
