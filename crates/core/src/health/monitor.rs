//! Connector health checks with retry and latency classification

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures::future::join_all;
use matsync_common::resilience::BackoffStrategy;
use matsync_common::time::{Clock, Sleeper};
use matsync_domain::{
    ConnectorHealth, ConnectorKind, HealthConfig, HealthStatus, HealthSummary, MatSyncError,
    Result,
};
use tracing::{debug, info, instrument, warn};

use super::ports::HealthRepository;
use super::recommendation::{
    persistent_failure_recommendation, recommendation_for_error, slow_response_recommendation,
};
use crate::erp_ports::{ConnectorRepository, ErpClientProvider, MaterialClient};

/// Tunables for [`ConnectionHealthMonitor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthMonitorConfig {
    /// Successful probes slower than this are classified as degraded.
    pub latency_threshold: Duration,
    /// Total probe attempts per check.
    pub max_attempts: u32,
    /// Backoff step; attempt `n` waits `n * retry_delay` before retrying.
    pub retry_delay: Duration,
    pub probe_timeout: Duration,
}

impl Default for HealthMonitorConfig {
    fn default() -> Self {
        Self::from(&HealthConfig::default())
    }
}

impl From<&HealthConfig> for HealthMonitorConfig {
    fn from(config: &HealthConfig) -> Self {
        Self {
            latency_threshold: Duration::from_millis(config.latency_threshold_ms),
            max_attempts: config.max_retries.max(1),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            probe_timeout: Duration::from_secs(config.probe_timeout_secs),
        }
    }
}

enum ProbeOutcome {
    Reachable { elapsed: Duration },
    Failed { error: String, elapsed: Duration },
}

/// Probes ERP connectors and keeps their latest health record.
pub struct ConnectionHealthMonitor {
    connectors: Arc<dyn ConnectorRepository>,
    clients: Arc<dyn ErpClientProvider>,
    health: Arc<dyn HealthRepository>,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
    config: HealthMonitorConfig,
    backoff: BackoffStrategy,
    // Serializes the read-modify-write of consecutive_failures per connector.
    check_locks: DashMap<String, Arc<tokio::sync::Mutex<()>>>,
}

impl ConnectionHealthMonitor {
    pub fn new(
        connectors: Arc<dyn ConnectorRepository>,
        clients: Arc<dyn ErpClientProvider>,
        health: Arc<dyn HealthRepository>,
        clock: Arc<dyn Clock>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        let config = HealthMonitorConfig::default();
        Self {
            connectors,
            clients,
            health,
            clock,
            sleeper,
            backoff: BackoffStrategy::linear(config.retry_delay),
            config,
            check_locks: DashMap::new(),
        }
    }

    /// Replace the tunables; the backoff step follows `retry_delay`.
    pub fn with_config(mut self, config: HealthMonitorConfig) -> Self {
        self.backoff = BackoffStrategy::linear(config.retry_delay);
        self.config = config;
        self
    }

    pub fn config(&self) -> &HealthMonitorConfig {
        &self.config
    }

    /// Check one connector and persist the result.
    ///
    /// Never fails: unknown connectors and unreachable systems are reported
    /// as unhealthy.
    #[instrument(skip(self))]
    pub async fn check_connection(&self, connector_id: &str) -> ConnectorHealth {
        let lock = self
            .check_locks
            .entry(connector_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone();
        let guard = lock.lock().await;
        let health = self.check_exclusive(connector_id).await;
        drop(guard);

        // Drop the entry once no other check holds or awaits it.
        self.check_locks.remove_if(connector_id, |_, held| Arc::strong_count(held) <= 2);

        health
    }

    async fn check_exclusive(&self, connector_id: &str) -> ConnectorHealth {
        let previous_failures = match self.health.get(connector_id).await {
            Ok(previous) => previous.map_or(0, |h| h.consecutive_failures),
            Err(err) => {
                warn!(error = %err, "Failed to load previous health; assuming no prior failures");
                0
            }
        };

        let outcome = match self.resolve_client(connector_id).await {
            Ok(client) => self.probe_with_retries(client.as_ref()).await,
            Err(err) => ProbeOutcome::Failed { error: err.to_string(), elapsed: Duration::ZERO },
        };

        let health = self.classify(connector_id, outcome, previous_failures);

        if let Err(err) = self.health.upsert(&health).await {
            warn!(error = %err, "Failed to persist connector health");
        }

        match health.status {
            HealthStatus::Healthy => {
                debug!(response_time_ms = health.response_time_ms, "Connector healthy")
            }
            status => warn!(
                %status,
                response_time_ms = health.response_time_ms,
                consecutive_failures = health.consecutive_failures,
                error = health.error.as_deref().unwrap_or(""),
                "Connector health degraded"
            ),
        }

        health
    }

    /// Check every ERP connector concurrently.
    #[instrument(skip(self))]
    pub async fn check_all_connections(&self) -> HealthSummary {
        let connectors = match self.connectors.list().await {
            Ok(connectors) => connectors,
            Err(err) => {
                warn!(error = %err, "Failed to list connectors for health check");
                return HealthSummary {
                    overall: HealthStatus::Unhealthy,
                    checked_at: self.clock.utc_now(),
                    connectors: Vec::new(),
                };
            }
        };

        let checks = connectors
            .iter()
            .filter(|c| c.kind == ConnectorKind::Erp)
            .map(|c| self.check_connection(&c.id));
        let results = join_all(checks).await;

        let overall = HealthStatus::overall(results.iter().map(|h| h.status));
        info!(%overall, connectors = results.len(), "Health check cycle finished");

        HealthSummary { overall, checked_at: self.clock.utc_now(), connectors: results }
    }

    /// Latest stored health, `None` before the first check.
    pub async fn latest(&self, connector_id: &str) -> Result<Option<ConnectorHealth>> {
        self.health.get(connector_id).await
    }

    async fn resolve_client(&self, connector_id: &str) -> Result<Arc<dyn MaterialClient>> {
        let connector = self
            .connectors
            .get(connector_id)
            .await?
            .ok_or_else(|| MatSyncError::ConnectorNotFound(connector_id.to_string()))?;
        self.clients.client_for(&connector)
    }

    async fn probe_with_retries(&self, client: &dyn MaterialClient) -> ProbeOutcome {
        let max_attempts = self.config.max_attempts.max(1);
        let mut last_error = String::new();
        let mut last_elapsed = Duration::ZERO;

        for attempt in 1..=max_attempts {
            let started = self.clock.now();
            let result = tokio::time::timeout(self.config.probe_timeout, client.test_connection())
                .await;
            let elapsed = self.clock.now().saturating_duration_since(started);

            match result {
                Ok(Ok(probe)) if probe.success => return ProbeOutcome::Reachable { elapsed },
                Ok(Ok(probe)) => {
                    last_error =
                        probe.message.unwrap_or_else(|| "connection test failed".to_string());
                }
                Ok(Err(err)) => last_error = err.to_string(),
                Err(_) => {
                    last_error = format!(
                        "connection test timed out after {}s",
                        self.config.probe_timeout.as_secs()
                    );
                }
            }
            last_elapsed = elapsed;

            debug!(attempt, max_attempts, error = %last_error, "Connection probe failed");

            if attempt < max_attempts {
                self.sleeper.sleep(self.backoff.calculate_delay(attempt)).await;
            }
        }

        ProbeOutcome::Failed { error: last_error, elapsed: last_elapsed }
    }

    fn classify(
        &self,
        connector_id: &str,
        outcome: ProbeOutcome,
        previous_failures: u32,
    ) -> ConnectorHealth {
        let last_check = self.clock.utc_now();
        match outcome {
            ProbeOutcome::Reachable { elapsed } => {
                let response_time_ms = millis(elapsed);
                let threshold_ms = millis(self.config.latency_threshold);
                let slow = elapsed >= self.config.latency_threshold;
                ConnectorHealth {
                    connector_id: connector_id.to_string(),
                    status: if slow { HealthStatus::Degraded } else { HealthStatus::Healthy },
                    last_check,
                    response_time_ms,
                    error: None,
                    consecutive_failures: 0,
                    recommendation: slow
                        .then(|| slow_response_recommendation(response_time_ms, threshold_ms)),
                }
            }
            ProbeOutcome::Failed { error, elapsed } => {
                let consecutive_failures = previous_failures.saturating_add(1);
                let recommendation = persistent_failure_recommendation(consecutive_failures)
                    .unwrap_or_else(|| recommendation_for_error(&error));
                ConnectorHealth {
                    connector_id: connector_id.to_string(),
                    status: HealthStatus::Unhealthy,
                    last_check,
                    response_time_ms: millis(elapsed),
                    error: Some(error),
                    consecutive_failures,
                    recommendation: Some(recommendation),
                }
            }
        }
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use matsync_common::time::{MockClock, RecordingSleeper};
    use matsync_domain::{ConnectorKind, SyncDirection};

    use super::*;
    use crate::test_support::{
        connector, ts, FakeMaterialClient, InMemoryConnectors, InMemoryHealth, StaticClients,
    };

    struct Harness {
        monitor: ConnectionHealthMonitor,
        client: Arc<FakeMaterialClient>,
        clock: MockClock,
        sleeper: RecordingSleeper,
    }

    fn harness(connectors: Vec<matsync_domain::ConnectorConfig>) -> Harness {
        let clock = MockClock::starting_at(ts(2024, 6, 1));
        let sleeper = RecordingSleeper::advancing(clock.clone());
        let client = FakeMaterialClient::with([]);
        let monitor = ConnectionHealthMonitor::new(
            InMemoryConnectors::with(connectors),
            Arc::new(StaticClients(client.clone())),
            Arc::new(InMemoryHealth::default()),
            Arc::new(clock.clone()),
            Arc::new(sleeper.clone()),
        );
        Harness { monitor, client, clock, sleeper }
    }

    #[tokio::test]
    async fn fast_probe_is_healthy() {
        let h = harness(vec![connector("sap", SyncDirection::Inbound)]);
        h.client.probe_latency(h.clock.clone(), Duration::from_millis(120));

        let health = h.monitor.check_connection("sap").await;

        assert_eq!(health.status, HealthStatus::Healthy);
        assert_eq!(health.response_time_ms, 120);
        assert_eq!(health.consecutive_failures, 0);
        assert!(health.recommendation.is_none());
        assert_eq!(h.monitor.latest("sap").await.unwrap(), Some(health));
    }

    #[tokio::test]
    async fn slow_probe_is_degraded() {
        let h = harness(vec![connector("sap", SyncDirection::Inbound)]);
        h.client.probe_latency(h.clock.clone(), Duration::from_millis(6_000));

        let health = h.monitor.check_connection("sap").await;

        assert_eq!(health.status, HealthStatus::Degraded);
        assert_eq!(health.response_time_ms, 6_000);
        assert!(health.recommendation.unwrap().contains("5000 ms"));
    }

    #[tokio::test]
    async fn exhausted_retries_are_unhealthy_with_linear_backoff() {
        let h = harness(vec![connector("sap", SyncDirection::Inbound)]);
        h.client.fail_probes(3, "connection refused");

        let health = h.monitor.check_connection("sap").await;

        assert_eq!(health.status, HealthStatus::Unhealthy);
        assert_eq!(health.consecutive_failures, 1);
        assert!(health.error.unwrap().contains("connection refused"));
        assert!(health.recommendation.unwrap().contains("hostname"));
        assert_eq!(h.client.probes.load(Ordering::SeqCst), 3);
        assert_eq!(
            h.sleeper.delays(),
            vec![Duration::from_millis(1_000), Duration::from_millis(2_000)]
        );
    }

    #[tokio::test]
    async fn retry_success_resets_failures() {
        let h = harness(vec![connector("sap", SyncDirection::Inbound)]);
        h.client.fail_probes(3, "connection refused");
        h.monitor.check_connection("sap").await;

        h.client.fail_probes(2, "connection refused");
        let health = h.monitor.check_connection("sap").await;

        assert_eq!(health.status, HealthStatus::Healthy);
        assert_eq!(health.consecutive_failures, 0);
    }

    #[tokio::test]
    async fn persistent_failures_escalate_recommendation() {
        let h = harness(vec![connector("sap", SyncDirection::Inbound)]);
        h.client.fail_probes(9, "HTTP 401 Unauthorized");

        h.monitor.check_connection("sap").await;
        let second = h.monitor.check_connection("sap").await;
        assert!(second.recommendation.unwrap().contains("credentials"));
        let third = h.monitor.check_connection("sap").await;

        assert_eq!(third.consecutive_failures, 3);
        assert!(third.recommendation.unwrap().contains("3 consecutive"));
    }

    #[tokio::test]
    async fn unknown_connector_is_unhealthy_without_probing() {
        let h = harness(vec![]);

        let health = h.monitor.check_connection("ghost").await;

        assert_eq!(health.status, HealthStatus::Unhealthy);
        assert!(health.error.unwrap().contains("ghost"));
        assert_eq!(h.client.probes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn check_all_covers_erp_connectors_only() {
        let mut crm = connector("crm", SyncDirection::Inbound);
        crm.kind = ConnectorKind::Crm;
        let h = harness(vec![
            connector("sap-a", SyncDirection::Inbound),
            connector("sap-b", SyncDirection::Outbound),
            crm,
        ]);
        h.client.probe_latency(h.clock.clone(), Duration::from_millis(10));

        let summary = h.monitor.check_all_connections().await;

        assert_eq!(summary.overall, HealthStatus::Healthy);
        let mut ids: Vec<_> = summary.connectors.iter().map(|c| c.connector_id.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["sap-a", "sap-b"]);
    }

    #[tokio::test]
    async fn overall_reflects_worst_connector() {
        let h = harness(vec![
            connector("sap-a", SyncDirection::Inbound),
            connector("sap-b", SyncDirection::Inbound),
        ]);
        let monitor = h.monitor.with_config(HealthMonitorConfig {
            max_attempts: 1,
            ..HealthMonitorConfig::default()
        });
        h.client.fail_probes(1, "connection refused");

        let summary = monitor.check_all_connections().await;

        assert_eq!(summary.overall, HealthStatus::Unhealthy);
        assert_eq!(summary.connectors.len(), 2);
    }

    #[tokio::test]
    async fn overlapping_checks_count_every_failure() {
        let h = harness(vec![connector("sap", SyncDirection::Inbound)]);
        let monitor = h.monitor.with_config(HealthMonitorConfig {
            max_attempts: 1,
            ..HealthMonitorConfig::default()
        });
        h.client.delay_connection_tests(Duration::from_millis(50));
        h.client.fail_probes(2, "connection refused");

        let (first, second) =
            tokio::join!(monitor.check_connection("sap"), monitor.check_connection("sap"));

        let mut counts = vec![first.consecutive_failures, second.consecutive_failures];
        counts.sort_unstable();
        assert_eq!(counts, vec![1, 2]);
        let stored = monitor.latest("sap").await.unwrap().expect("health stored");
        assert_eq!(stored.consecutive_failures, 2);
        assert_eq!(h.client.probes.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn check_locks_are_released_after_checks() {
        let h = harness(vec![connector("sap", SyncDirection::Inbound)]);
        h.client.delay_connection_tests(Duration::from_millis(10));

        h.monitor.check_connection("sap").await;
        h.monitor.check_connection("ghost").await;
        assert!(h.monitor.check_locks.is_empty());

        tokio::join!(h.monitor.check_connection("sap"), h.monitor.check_connection("sap"));
        assert!(h.monitor.check_locks.is_empty());
    }
}
