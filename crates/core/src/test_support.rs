//! In-memory port implementations shared by the core unit tests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use matsync_common::time::MockClock;
use matsync_domain::{
    CanonicalRecord, ConnectionProbe, ConnectorConfig, ConnectorHealth, ExternalRecord,
    MatSyncError, MaterialDraft, MaterialPage, MaterialQuery, NewProduct, ProductFields,
    ProductQuery, Result, SyncDirection, SyncLogEntry, SyncRunResult, SyncStatistics,
};
use parking_lot::Mutex;
use uuid::Uuid;

use crate::erp_ports::{ConnectorRepository, ErpClientProvider, MaterialClient};
use crate::health::ports::HealthRepository;
use crate::sync::ports::{ProductProvisioner, ProductStore, SyncLogRepository};

pub fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

pub fn connector(id: &str, direction: SyncDirection) -> ConnectorConfig {
    serde_json::from_value(serde_json::json!({ "id": id, "direction": direction })).unwrap()
}

pub fn material(key: &str, last_changed: &str, fields: &[(&str, &str)]) -> ExternalRecord {
    ExternalRecord {
        material_number: format!("MAT-{key}"),
        business_key: key.to_string(),
        last_changed: last_changed.to_string(),
        fields: fields.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
    }
}

#[derive(Default)]
pub struct InMemoryConnectors {
    connectors: Mutex<HashMap<String, ConnectorConfig>>,
}

impl InMemoryConnectors {
    pub fn with(connectors: impl IntoIterator<Item = ConnectorConfig>) -> Arc<Self> {
        let repo = Self::default();
        for connector in connectors {
            repo.connectors.lock().insert(connector.id.clone(), connector);
        }
        Arc::new(repo)
    }
}

#[async_trait]
impl ConnectorRepository for InMemoryConnectors {
    async fn get(&self, connector_id: &str) -> Result<Option<ConnectorConfig>> {
        Ok(self.connectors.lock().get(connector_id).cloned())
    }

    async fn list(&self) -> Result<Vec<ConnectorConfig>> {
        let mut all: Vec<_> = self.connectors.lock().values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }

    async fn upsert(&self, connector: &ConnectorConfig) -> Result<()> {
        self.connectors.lock().insert(connector.id.clone(), connector.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryHealth {
    rows: Mutex<HashMap<String, ConnectorHealth>>,
}

#[async_trait]
impl HealthRepository for InMemoryHealth {
    async fn get(&self, connector_id: &str) -> Result<Option<ConnectorHealth>> {
        Ok(self.rows.lock().get(connector_id).cloned())
    }

    async fn upsert(&self, health: &ConnectorHealth) -> Result<()> {
        self.rows.lock().insert(health.connector_id.clone(), health.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ConnectorHealth>> {
        Ok(self.rows.lock().values().cloned().collect())
    }
}

pub struct InMemoryProducts {
    records: Mutex<BTreeMap<String, CanonicalRecord>>,
    now: DateTime<Utc>,
    failing_skus: Mutex<HashSet<String>>,
}

impl InMemoryProducts {
    pub fn new(now: DateTime<Utc>) -> Arc<Self> {
        Arc::new(Self {
            records: Mutex::new(BTreeMap::new()),
            now,
            failing_skus: Mutex::new(HashSet::new()),
        })
    }

    pub fn seed(&self, sku: &str, fields: ProductFields, last_modified: DateTime<Utc>) {
        let record = CanonicalRecord { id: Uuid::new_v4(), sku: sku.into(), fields, last_modified };
        self.records.lock().insert(sku.to_string(), record);
    }

    pub fn fail_writes_for(&self, sku: &str) {
        self.failing_skus.lock().insert(sku.to_string());
    }

    pub fn snapshot(&self) -> BTreeMap<String, CanonicalRecord> {
        self.records.lock().clone()
    }

    fn check_writable(&self, sku: &str) -> Result<()> {
        if self.failing_skus.lock().contains(sku) {
            return Err(MatSyncError::Database(format!("write rejected for {sku}")));
        }
        Ok(())
    }
}

#[async_trait]
impl ProductStore for InMemoryProducts {
    async fn get(&self, id: Uuid) -> Result<Option<CanonicalRecord>> {
        Ok(self.records.lock().values().find(|r| r.id == id).cloned())
    }

    async fn find_by_sku(&self, sku: &str) -> Result<Option<CanonicalRecord>> {
        Ok(self.records.lock().get(sku).cloned())
    }

    async fn list(&self, query: ProductQuery) -> Result<Vec<CanonicalRecord>> {
        Ok(self.records.lock().values().skip(query.offset).take(query.limit).cloned().collect())
    }

    async fn create(&self, product: &NewProduct) -> Result<CanonicalRecord> {
        self.check_writable(&product.sku)?;
        let record = CanonicalRecord {
            id: Uuid::new_v4(),
            sku: product.sku.clone(),
            fields: product.fields.clone(),
            last_modified: self.now,
        };
        self.records.lock().insert(product.sku.clone(), record.clone());
        Ok(record)
    }

    async fn update(&self, id: Uuid, fields: &ProductFields) -> Result<CanonicalRecord> {
        let mut records = self.records.lock();
        let record = records
            .values_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| MatSyncError::NotFound(id.to_string()))?;
        if self.failing_skus.lock().contains(&record.sku) {
            return Err(MatSyncError::Database(format!("write rejected for {}", record.sku)));
        }
        record.fields = fields.clone();
        record.last_modified = self.now;
        Ok(record.clone())
    }
}

/// Scriptable ERP client. Records are keyed by material number, so a page
/// may carry the same business key twice.
#[derive(Default)]
pub struct FakeMaterialClient {
    records: Mutex<BTreeMap<String, ExternalRecord>>,
    fetch_error: Mutex<Option<MatSyncError>>,
    fetch_delay: Mutex<Option<Duration>>,
    probe_failures: AtomicU32,
    probe_error: Mutex<Option<String>>,
    probe_latency: Mutex<Option<(MockClock, Duration)>>,
    connection_test_delay: Mutex<Option<Duration>>,
    pub probes: AtomicU32,
    pub created: Mutex<Vec<MaterialDraft>>,
    pub updated: Mutex<Vec<MaterialDraft>>,
}

impl FakeMaterialClient {
    pub fn with(records: impl IntoIterator<Item = ExternalRecord>) -> Arc<Self> {
        let client = Self::default();
        for record in records {
            client.records.lock().insert(record.material_number.clone(), record);
        }
        Arc::new(client)
    }

    pub fn fail_fetch(&self, error: MatSyncError) {
        *self.fetch_error.lock() = Some(error);
    }

    pub fn delay_fetch(&self, delay: Duration) {
        *self.fetch_delay.lock() = Some(delay);
    }

    /// Fail the next `count` probes with `error`.
    pub fn fail_probes(&self, count: u32, error: &str) {
        self.probe_failures.store(count, Ordering::SeqCst);
        *self.probe_error.lock() = Some(error.to_string());
    }

    /// Advance `clock` by `latency` on every probe.
    pub fn probe_latency(&self, clock: MockClock, latency: Duration) {
        *self.probe_latency.lock() = Some((clock, latency));
    }

    /// Hold every connection test for `delay` of real time so concurrent checks overlap.
    pub fn delay_connection_tests(&self, delay: Duration) {
        *self.connection_test_delay.lock() = Some(delay);
    }

    pub fn record(&self, key: &str) -> Option<ExternalRecord> {
        self.records.lock().values().find(|r| r.business_key == key).cloned()
    }

    fn store_draft(&self, draft: &MaterialDraft) -> ExternalRecord {
        let record = ExternalRecord {
            material_number: format!("MAT-{}", draft.business_key),
            business_key: draft.business_key.clone(),
            last_changed: "20240301".into(),
            fields: draft.fields.clone(),
        };
        self.records.lock().insert(record.material_number.clone(), record.clone());
        record
    }
}

#[async_trait]
impl MaterialClient for FakeMaterialClient {
    async fn get_records(&self, query: &MaterialQuery) -> Result<MaterialPage> {
        let delay = *self.fetch_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = self.fetch_error.lock().clone() {
            return Err(err);
        }
        let records = self.records.lock();
        Ok(MaterialPage {
            results: records.values().skip(query.skip).take(query.top).cloned().collect(),
            total_count: records.len(),
        })
    }

    async fn get_record(&self, business_key: &str) -> Result<Option<ExternalRecord>> {
        Ok(self.record(business_key))
    }

    async fn create_record(&self, draft: &MaterialDraft) -> Result<ExternalRecord> {
        self.created.lock().push(draft.clone());
        Ok(self.store_draft(draft))
    }

    async fn update_record(
        &self,
        _business_key: &str,
        draft: &MaterialDraft,
    ) -> Result<ExternalRecord> {
        self.updated.lock().push(draft.clone());
        Ok(self.store_draft(draft))
    }

    async fn delete_record(&self, business_key: &str) -> Result<bool> {
        let mut records = self.records.lock();
        let before = records.len();
        records.retain(|_, r| r.business_key != business_key);
        Ok(records.len() < before)
    }

    async fn test_connection(&self) -> Result<ConnectionProbe> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if let Some((clock, latency)) = self.probe_latency.lock().clone() {
            clock.advance(latency);
        }
        let delay = *self.connection_test_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let remaining = self.probe_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.probe_failures.store(remaining - 1, Ordering::SeqCst);
            let message = self.probe_error.lock().clone().unwrap_or_default();
            return Err(MatSyncError::Network(message));
        }
        Ok(ConnectionProbe::ok("FAKE ERP"))
    }
}

pub struct StaticClients(pub Arc<FakeMaterialClient>);

impl ErpClientProvider for StaticClients {
    fn client_for(&self, _connector: &ConnectorConfig) -> Result<Arc<dyn MaterialClient>> {
        Ok(self.0.clone())
    }
}

#[derive(Default)]
pub struct InMemorySyncLogs {
    pub started: Mutex<Vec<SyncRunResult>>,
    pub finished: Mutex<Vec<SyncRunResult>>,
}

#[async_trait]
impl SyncLogRepository for InMemorySyncLogs {
    async fn start_run(&self, run: &SyncRunResult) -> Result<()> {
        self.started.lock().push(run.clone());
        Ok(())
    }

    async fn finish_run(&self, run: &SyncRunResult) -> Result<()> {
        self.finished.lock().push(run.clone());
        Ok(())
    }

    async fn recent(&self, connector_id: &str, limit: usize) -> Result<Vec<SyncLogEntry>> {
        Ok(self
            .finished
            .lock()
            .iter()
            .rev()
            .filter(|run| run.connector_id == connector_id)
            .take(limit)
            .cloned()
            .map(SyncLogEntry::from)
            .collect())
    }

    async fn statistics(&self, connector_id: &str) -> Result<SyncStatistics> {
        Ok(SyncStatistics { connector_id: connector_id.to_string(), ..SyncStatistics::default() })
    }
}

#[derive(Default)]
pub struct RecordingProvisioner {
    pub provisioned: Mutex<Vec<String>>,
    pub fail: bool,
}

#[async_trait]
impl ProductProvisioner for RecordingProvisioner {
    async fn provision(&self, product: &CanonicalRecord) -> Result<()> {
        if self.fail {
            return Err(MatSyncError::Internal("identity service unavailable".into()));
        }
        self.provisioned.lock().push(product.sku.clone());
        Ok(())
    }
}

pub fn fields(entries: &[(matsync_domain::CanonicalField, &str)]) -> ProductFields {
    let mut fields = ProductFields::default();
    for (field, value) in entries {
        fields.write(*field, value).unwrap();
    }
    fields
}

