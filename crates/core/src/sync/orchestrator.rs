//! Sync orchestrator
//!
//! Runs the inbound (ERP -> canonical) and outbound (canonical -> ERP) phases
//! for one connector. Per-record failures are isolated and collected in the
//! run result; only precondition failures abort a run.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use matsync_common::time::{Clock, SystemClock};
use matsync_domain::constants::{
    CALL_TIMEOUT_SECS, DEFAULT_BATCH_SIZE, INBOUND_FETCH_SENTINEL, MAX_BATCH_SIZE,
    OUTBOUND_FETCH_SENTINEL,
};
use matsync_domain::{
    CanonicalRecord, ConflictWinner, ConnectorConfig, ConnectorStatus, ExternalRecord,
    HealthStatus, MatSyncError, MaterialQuery, NewProduct, ProductQuery, Result,
    SyncConfig, SyncConflictEntry, SyncDirection, SyncRunResult, SyncRunStatus,
};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use super::error::SyncError;
use super::lock::ConnectorRunLocks;
use super::ports::{ProductProvisioner, ProductStore, SyncLogRepository};
use crate::conflict::ConflictResolver;
use crate::erp_ports::{ConnectorRepository, ErpClientProvider, MaterialClient};
use crate::health::ports::HealthRepository;
use crate::mapping::FieldMapper;

/// Options for one sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncRequest {
    /// Defaults to the connector's configured direction.
    pub direction: Option<SyncDirection>,
    /// ERP page size, 1 to `MAX_BATCH_SIZE`. Defaults to the configured size.
    pub batch_size: Option<usize>,
    /// Evaluate everything, write nothing.
    pub dry_run: bool,
    /// Passed through to the ERP page query.
    pub filter: Option<String>,
    /// Free-text search, passed through like `filter`.
    pub search: Option<String>,
}

/// Timeouts and defaults applied to every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Upper bound for every ERP, store and provisioning call.
    pub call_timeout: Duration,
    /// Refuse runs when the connector's latest health is unhealthy.
    pub require_healthy: bool,
    /// Page size when the request does not set one.
    pub default_batch_size: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(CALL_TIMEOUT_SECS),
            require_healthy: false,
            default_batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl From<&SyncConfig> for OrchestratorConfig {
    fn from(config: &SyncConfig) -> Self {
        Self {
            call_timeout: Duration::from_secs(config.call_timeout_secs.max(1)),
            require_healthy: config.require_healthy,
            default_batch_size: config.default_batch_size.clamp(1, MAX_BATCH_SIZE),
        }
    }
}

/// Ports the orchestrator drives during a run.
///
/// Every member is a trait object; adapters and in-memory fakes plug in the
/// same way.
#[derive(Clone)]
pub struct SyncPorts {
    pub connectors: Arc<dyn ConnectorRepository>,
    pub clients: Arc<dyn ErpClientProvider>,
    pub products: Arc<dyn ProductStore>,
    pub provisioner: Arc<dyn ProductProvisioner>,
    pub sync_logs: Arc<dyn SyncLogRepository>,
    pub health: Arc<dyn HealthRepository>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RecordOutcome {
    Created,
    Updated,
    Skipped,
}

struct RunContext<'a> {
    run_id: Uuid,
    connector: &'a ConnectorConfig,
    client: Arc<dyn MaterialClient>,
    direction: SyncDirection,
    batch_size: usize,
    dry_run: bool,
    filter: Option<String>,
    search: Option<String>,
}

/// Runs bidirectional syncs between one ERP connector and the product
/// catalogue.
///
/// Runs on one connector are exclusive; different connectors run
/// concurrently. Every started run writes exactly one sync log row and
/// returns a [`SyncRunResult`].
pub struct SyncOrchestrator {
    ports: SyncPorts,
    mapper: FieldMapper,
    resolver: ConflictResolver,
    clock: Arc<dyn Clock>,
    locks: ConnectorRunLocks,
    config: OrchestratorConfig,
}

impl SyncOrchestrator {
    /// Orchestrator with default settings and the system clock.
    pub fn new(ports: SyncPorts) -> Self {
        Self {
            ports,
            mapper: FieldMapper::new(),
            resolver: ConflictResolver::new(),
            clock: Arc::new(SystemClock),
            locks: ConnectorRunLocks::new(),
            config: OrchestratorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    /// Clock used for run timestamps.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Whether a run is currently in flight for the connector.
    pub fn is_running(&self, connector_id: &str) -> bool {
        self.locks.is_running(connector_id)
    }

    /// Execute one sync run.
    ///
    /// Returns `Err` only when the run cannot start (unknown or inactive
    /// connector, disallowed direction, concurrent run, failed health gate).
    /// Everything that goes wrong afterwards is reported in the result.
    #[instrument(skip(self, request), fields(dry_run = request.dry_run))]
    pub async fn execute_sync(
        &self,
        connector_id: &str,
        request: SyncRequest,
    ) -> std::result::Result<SyncRunResult, SyncError> {
        let connector = self
            .ports
            .connectors
            .get(connector_id)
            .await?
            .ok_or_else(|| SyncError::ConnectorNotFound(connector_id.to_string()))?;

        if connector.status == ConnectorStatus::Inactive {
            return Err(SyncError::ConnectorInactive(connector.id));
        }

        let direction = request.direction.unwrap_or(connector.direction);
        if !connector.direction.permits(direction) {
            return Err(SyncError::DirectionNotAllowed {
                connector_id: connector.id,
                requested: direction,
                configured: connector.direction,
            });
        }

        let batch_size = self.batch_size(request.batch_size)?;
        self.check_health_gate(&connector).await?;

        let _guard = self
            .locks
            .try_acquire(&connector.id)
            .ok_or_else(|| SyncError::AlreadyRunning(connector.id.clone()))?;

        let client = self.ports.clients.client_for(&connector)?;
        let ctx = RunContext {
            run_id: Uuid::new_v4(),
            connector: &connector,
            client,
            direction,
            batch_size,
            dry_run: request.dry_run,
            filter: request.filter,
            search: request.search,
        };

        let mut run = self.phase_result(&ctx);
        run.status = SyncRunStatus::Running;
        if let Err(err) = self.ports.sync_logs.start_run(&run).await {
            warn!(run_id = %ctx.run_id, error = %err, "Failed to record sync run start");
        }
        info!(run_id = %ctx.run_id, %direction, batch_size, dry_run = ctx.dry_run, "Sync run started");

        // Canonical records created or updated in this run, by business key.
        let mut touched: HashMap<String, CanonicalRecord> = HashMap::new();

        if direction.includes_inbound() {
            let phase = self.run_inbound(&ctx, &mut touched).await;
            run.merge(phase);
        }
        if direction.includes_outbound() {
            let phase = self.run_outbound(&ctx).await;
            run.merge(phase);
        }

        run.finish(self.clock.utc_now());
        if let Err(err) = self.ports.sync_logs.finish_run(&run).await {
            warn!(run_id = %ctx.run_id, error = %err, "Failed to record sync run result");
        }

        info!(
            run_id = %run.run_id,
            status = %run.status,
            processed = run.records_processed,
            created = run.records_created,
            updated = run.records_updated,
            skipped = run.records_skipped,
            failed = run.records_failed,
            conflicts = run.conflicts.len(),
            "Sync run finished"
        );

        Ok(run)
    }

    fn batch_size(&self, requested: Option<usize>) -> std::result::Result<usize, SyncError> {
        match requested {
            None => Ok(self.config.default_batch_size),
            Some(0) => Err(SyncError::InvalidRequest("batchSize must be at least 1".into())),
            Some(size) if size > MAX_BATCH_SIZE => {
                warn!(requested = size, max = MAX_BATCH_SIZE, "Batch size capped");
                Ok(MAX_BATCH_SIZE)
            }
            Some(size) => Ok(size),
        }
    }

    async fn check_health_gate(
        &self,
        connector: &ConnectorConfig,
    ) -> std::result::Result<(), SyncError> {
        let latest = match self.ports.health.get(&connector.id).await {
            Ok(latest) => latest,
            Err(err) => {
                warn!(error = %err, "Could not read connector health; continuing");
                return Ok(());
            }
        };

        match latest {
            Some(health) if health.status == HealthStatus::Unhealthy => {
                let reason = health.error.unwrap_or_else(|| "last health check failed".into());
                if self.config.require_healthy {
                    return Err(SyncError::Unhealthy { connector_id: connector.id.clone(), reason });
                }
                warn!(%reason, "Connector is unhealthy; attempting sync anyway");
                Ok(())
            }
            _ => Ok(()),
        }
    }

    async fn run_inbound(
        &self,
        ctx: &RunContext<'_>,
        touched: &mut HashMap<String, CanonicalRecord>,
    ) -> SyncRunResult {
        let mut phase = self.phase_result(ctx);
        let query = MaterialQuery {
            skip: 0,
            top: ctx.batch_size,
            filter: ctx.filter.clone(),
            search: ctx.search.clone(),
        };

        let page = match self.call(ctx.client.get_records(&query)).await {
            Ok(page) => page,
            Err(err) => {
                warn!(run_id = %ctx.run_id, error = %err, "Inbound fetch failed; phase aborted");
                phase.record_phase_error(INBOUND_FETCH_SENTINEL, &err);
                return phase;
            }
        };
        debug!(fetched = page.results.len(), total = page.total_count, "Inbound page fetched");

        for external in page.results.iter().take(ctx.batch_size) {
            let label = record_label(external);
            let outcome =
                self.sync_inbound_record(ctx, external, touched, &mut phase.conflicts).await;
            tally(&mut phase, label, outcome);
        }

        phase
    }

    async fn sync_inbound_record(
        &self,
        ctx: &RunContext<'_>,
        external: &ExternalRecord,
        touched: &mut HashMap<String, CanonicalRecord>,
        conflicts: &mut Vec<SyncConflictEntry>,
    ) -> Result<RecordOutcome> {
        let mapped = self.mapper.map_external_to_canonical(external, &ctx.connector.mapping_rules)?;
        let key = mapped.business_key.clone();

        let existing = match touched.get(&key) {
            Some(record) => Some(record.clone()),
            None => self.call(self.ports.products.find_by_sku(&key)).await?,
        };

        let Some(current) = existing else {
            let created = if ctx.dry_run {
                CanonicalRecord {
                    id: Uuid::nil(),
                    sku: key.clone(),
                    fields: mapped.fields,
                    last_modified: self.clock.utc_now(),
                }
            } else {
                let product = NewProduct { sku: key.clone(), fields: mapped.fields };
                let created =
                    self.call(self.ports.products.create(&product)).await.map_err(persistence)?;
                self.provision(&created).await;
                created
            };
            debug!(sku = %key, dry_run = ctx.dry_run, "Canonical product created");
            touched.insert(key, created);
            return Ok(RecordOutcome::Created);
        };

        let Some(resolution) = self.resolver.resolve(&current, external, &mapped.fields) else {
            return Ok(RecordOutcome::Skipped);
        };
        let winner = resolution.winner;
        debug!(sku = %key, %winner, rationale = %resolution.rationale, "Conflict resolved");
        conflicts.push(SyncConflictEntry { record: key.clone(), resolution });

        if winner == ConflictWinner::Canonical {
            return Ok(RecordOutcome::Skipped);
        }

        let mut merged = current.fields.clone();
        merged.merge_from(&mapped.fields);
        let updated = if ctx.dry_run {
            CanonicalRecord { fields: merged, last_modified: self.clock.utc_now(), ..current }
        } else {
            self.call(self.ports.products.update(current.id, &merged)).await.map_err(persistence)?
        };
        touched.insert(key, updated);
        Ok(RecordOutcome::Updated)
    }

    async fn run_outbound(&self, ctx: &RunContext<'_>) -> SyncRunResult {
        let mut phase = self.phase_result(ctx);
        let query = ProductQuery { offset: 0, limit: ctx.batch_size };

        let products = match self.call(self.ports.products.list(query)).await {
            Ok(products) => products,
            Err(err) => {
                warn!(run_id = %ctx.run_id, error = %err, "Outbound fetch failed; phase aborted");
                phase.record_phase_error(OUTBOUND_FETCH_SENTINEL, &err);
                return phase;
            }
        };
        debug!(fetched = products.len(), "Outbound products listed");

        for product in &products {
            let outcome = self.sync_outbound_record(ctx, product, &mut phase.conflicts).await;
            tally(&mut phase, product.sku.clone(), outcome);
        }

        phase
    }

    async fn sync_outbound_record(
        &self,
        ctx: &RunContext<'_>,
        product: &CanonicalRecord,
        conflicts: &mut Vec<SyncConflictEntry>,
    ) -> Result<RecordOutcome> {
        let rules = &ctx.connector.mapping_rules;
        let draft = self.mapper.map_canonical_to_external(product, rules)?;

        let Some(external) = self.call(ctx.client.get_record(&draft.business_key)).await? else {
            if !ctx.dry_run {
                self.call(ctx.client.create_record(&draft)).await.map_err(persistence)?;
            }
            return Ok(RecordOutcome::Created);
        };

        let mapped = self.mapper.map_external_to_canonical(&external, rules)?;
        let Some(resolution) = self.resolver.resolve_outbound(product, &external, &mapped.fields)
        else {
            return Ok(RecordOutcome::Skipped);
        };
        let winner = resolution.winner;
        conflicts.push(SyncConflictEntry { record: product.sku.clone(), resolution });

        if winner == ConflictWinner::External {
            return Ok(RecordOutcome::Skipped);
        }

        if !ctx.dry_run {
            self.call(ctx.client.update_record(&draft.business_key, &draft))
                .await
                .map_err(persistence)?;
        }
        Ok(RecordOutcome::Updated)
    }

    /// Provisioning failures are logged only; the product stays created.
    async fn provision(&self, product: &CanonicalRecord) {
        match self.call(self.ports.provisioner.provision(product)).await {
            Ok(()) => debug!(sku = %product.sku, "Product provisioned"),
            Err(err) => {
                warn!(sku = %product.sku, error = %err, "Downstream provisioning failed")
            }
        }
    }

    async fn call<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.config.call_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(MatSyncError::Timeout(format!(
                "call exceeded {} ms",
                self.config.call_timeout.as_millis()
            ))),
        }
    }

    fn phase_result(&self, ctx: &RunContext<'_>) -> SyncRunResult {
        SyncRunResult::new(
            ctx.run_id,
            ctx.connector.id.clone(),
            ctx.direction,
            ctx.dry_run,
            self.clock.utc_now(),
        )
    }
}

fn tally(phase: &mut SyncRunResult, label: String, outcome: Result<RecordOutcome>) {
    phase.records_processed += 1;
    match outcome {
        Ok(RecordOutcome::Created) => phase.records_created += 1,
        Ok(RecordOutcome::Updated) => phase.records_updated += 1,
        Ok(RecordOutcome::Skipped) => phase.records_skipped += 1,
        Err(err) => {
            warn!(record = %label, error = %err, "Record failed");
            phase.record_failure(label, &err);
        }
    }
}

fn record_label(external: &ExternalRecord) -> String {
    if external.business_key.trim().is_empty() {
        external.material_number.clone()
    } else {
        external.business_key.clone()
    }
}

fn persistence(err: MatSyncError) -> MatSyncError {
    match err {
        MatSyncError::Timeout(_) | MatSyncError::Persistence(_) => err,
        other => MatSyncError::Persistence(other.to_string()),
    }
}
