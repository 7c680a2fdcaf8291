//! Deterministic in-memory material master
//!
//! Stands in for the ERP in demos and tests. Latency and failures can be
//! injected to exercise health classification and retry paths.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use matsync_common::time::{Clock, Sleeper, SystemClock, TokioSleeper};
use matsync_core::MaterialClient;
use matsync_domain::utils::erp_date::format_erp_date;
use matsync_domain::{
    codes, ConnectionProbe, ExternalRecord, FieldMap, MatSyncError, MaterialDraft, MaterialPage,
    MaterialQuery, Result,
};
use parking_lot::{Mutex, RwLock};
use tracing::debug;

const SYSTEM_INFO: &str = "Simulated ERP material master";

/// Simulated ERP client keyed by material number.
pub struct SimulatedMaterialClient {
    materials: RwLock<BTreeMap<String, ExternalRecord>>,
    next_number: AtomicU64,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
    latency: Mutex<Duration>,
    failures: Mutex<FailurePlan>,
}

#[derive(Default)]
struct FailurePlan {
    remaining: u32,
    error: Option<MatSyncError>,
    offline: bool,
}

impl Default for SimulatedMaterialClient {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock), Arc::new(TokioSleeper))
    }
}

impl SimulatedMaterialClient {
    pub fn new(clock: Arc<dyn Clock>, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            materials: RwLock::new(BTreeMap::new()),
            next_number: AtomicU64::new(1000),
            clock,
            sleeper,
            latency: Mutex::new(Duration::ZERO),
            failures: Mutex::new(FailurePlan::default()),
        }
    }

    /// Populate the demo catalogue.
    pub fn with_demo_data(self) -> Self {
        for record in demo_materials() {
            self.insert(record);
        }
        self
    }

    /// Insert or replace a material as-is.
    pub fn insert(&self, record: ExternalRecord) {
        self.materials.write().insert(record.material_number.clone(), record);
    }

    pub fn len(&self) -> usize {
        self.materials.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.read().is_empty()
    }

    /// Delay applied to every call.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = latency;
    }

    /// Fail the next `count` calls with `error`.
    pub fn fail_next(&self, count: u32, error: MatSyncError) {
        let mut plan = self.failures.lock();
        plan.remaining = count;
        plan.error = Some(error);
    }

    /// Refuse every call until switched back on.
    pub fn set_offline(&self, offline: bool) {
        self.failures.lock().offline = offline;
    }

    async fn simulate_call(&self) -> Result<()> {
        let latency = *self.latency.lock();
        if !latency.is_zero() {
            self.sleeper.sleep(latency).await;
        }

        let mut plan = self.failures.lock();
        if plan.offline {
            return Err(MatSyncError::Network("connection refused (simulated ERP offline)".into()));
        }
        if plan.remaining > 0 {
            plan.remaining -= 1;
            return Err(plan
                .error
                .clone()
                .unwrap_or_else(|| MatSyncError::Network("simulated failure".into())));
        }
        Ok(())
    }

    fn find_by_key(&self, business_key: &str) -> Option<ExternalRecord> {
        self.materials.read().values().find(|r| r.business_key == business_key).cloned()
    }

    fn today(&self) -> String {
        format_erp_date(self.clock.utc_now())
    }
}

/// `CODE eq 'value'` exact-match filter. Anything else is rejected.
fn parse_filter(filter: &str) -> Result<(String, String)> {
    let invalid = || MatSyncError::InvalidInput(format!("unsupported filter: {filter}"));
    let (code, value) = filter.split_once(" eq ").ok_or_else(invalid)?;
    let value = value.trim().strip_prefix('\'').and_then(|v| v.strip_suffix('\'')).ok_or_else(invalid)?;
    Ok((code.trim().to_string(), value.to_string()))
}

fn matches_search(record: &ExternalRecord, search: &str) -> bool {
    let needle = search.to_lowercase();
    record.business_key.to_lowercase().contains(&needle)
        || record
            .field(codes::DESCRIPTION)
            .is_some_and(|d| d.to_lowercase().contains(&needle))
}

#[async_trait]
impl MaterialClient for SimulatedMaterialClient {
    async fn get_records(&self, query: &MaterialQuery) -> Result<MaterialPage> {
        self.simulate_call().await?;
        let filter = query.filter.as_deref().map(parse_filter).transpose()?;

        let materials = self.materials.read();
        let matching: Vec<&ExternalRecord> = materials
            .values()
            .filter(|r| {
                filter.as_ref().map_or(true, |(code, value)| r.field(code) == Some(value.as_str()))
            })
            .filter(|r| query.search.as_deref().map_or(true, |s| matches_search(r, s)))
            .collect();

        Ok(MaterialPage {
            total_count: matching.len(),
            results: matching.into_iter().skip(query.skip).take(query.top).cloned().collect(),
        })
    }

    async fn get_record(&self, business_key: &str) -> Result<Option<ExternalRecord>> {
        self.simulate_call().await?;
        Ok(self.find_by_key(business_key))
    }

    async fn create_record(&self, draft: &MaterialDraft) -> Result<ExternalRecord> {
        self.simulate_call().await?;
        if draft.business_key.trim().is_empty() {
            return Err(MatSyncError::InvalidInput("BISMT is required".into()));
        }
        if self.find_by_key(&draft.business_key).is_some() {
            return Err(MatSyncError::InvalidInput(format!(
                "material with BISMT {} already exists",
                draft.business_key
            )));
        }

        let number = self.next_number.fetch_add(1, Ordering::SeqCst);
        let record = ExternalRecord {
            material_number: format!("{number:018}"),
            business_key: draft.business_key.clone(),
            last_changed: self.today(),
            fields: draft.fields.clone(),
        };
        debug!(material = %record.material_number, business_key = %record.business_key, "Simulated material created");
        self.insert(record.clone());
        Ok(record)
    }

    async fn update_record(
        &self,
        business_key: &str,
        draft: &MaterialDraft,
    ) -> Result<ExternalRecord> {
        self.simulate_call().await?;
        let today = self.today();
        let mut materials = self.materials.write();
        let record = materials
            .values_mut()
            .find(|r| r.business_key == business_key)
            .ok_or_else(|| MatSyncError::NotFound(format!("material {business_key}")))?;

        record.fields.extend(draft.fields.clone());
        record.last_changed = today;
        Ok(record.clone())
    }

    async fn delete_record(&self, business_key: &str) -> Result<bool> {
        self.simulate_call().await?;
        let mut materials = self.materials.write();
        let before = materials.len();
        materials.retain(|_, r| r.business_key != business_key);
        Ok(materials.len() < before)
    }

    async fn test_connection(&self) -> Result<ConnectionProbe> {
        self.simulate_call().await?;
        Ok(ConnectionProbe::ok(SYSTEM_INFO))
    }
}

fn demo_material(number: u64, key: &str, changed: &str, fields: &[(&str, &str)]) -> ExternalRecord {
    let fields: FieldMap = fields.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    ExternalRecord {
        material_number: format!("{number:018}"),
        business_key: key.to_string(),
        last_changed: changed.to_string(),
        fields,
    }
}

fn demo_materials() -> Vec<ExternalRecord> {
    vec![
        demo_material(
            100,
            "DPP-CHAIR-001",
            "20240115",
            &[
                (codes::DESCRIPTION, "Oak dining chair"),
                (codes::MATERIAL_GROUP, "FURNITURE"),
                (codes::MANUFACTURER, "Nordwood AB"),
                (codes::MATERIALS, "FSC oak, linseed oil"),
                (codes::CARBON_FOOTPRINT, "18.4"),
                (codes::RECYCLABILITY, "85"),
                (codes::REPAIRABILITY, "8.5"),
                (codes::WARRANTY, "5 years"),
                (codes::ORIGIN, "SE"),
                (codes::CERTIFICATIONS, "FSC;EU Ecolabel"),
                (codes::MANUFACTURE_DATE, "20231120"),
            ],
        ),
        demo_material(
            101,
            "DPP-LAMP-002",
            "20240203",
            &[
                (codes::DESCRIPTION, "Aluminium desk lamp"),
                (codes::MATERIAL_GROUP, "LIGHTING"),
                (codes::MANUFACTURER, "Lumen GmbH"),
                (codes::MATERIALS, "recycled aluminium, glass"),
                (codes::CARBON_FOOTPRINT, "6.2"),
                (codes::RECYCLABILITY, "92"),
                (codes::REPAIRABILITY, "7"),
                (codes::WARRANTY, "2 years"),
                (codes::ORIGIN, "DE"),
                (codes::CERTIFICATIONS, "CE;RoHS"),
            ],
        ),
        demo_material(
            102,
            "DPP-JACKET-003",
            "20240310",
            &[
                (codes::DESCRIPTION, "Recycled shell jacket"),
                (codes::MATERIAL_GROUP, "APPAREL"),
                (codes::MANUFACTURER, "Fjellwear AS"),
                (codes::MATERIALS, "recycled polyester"),
                (codes::CARBON_FOOTPRINT, "11.9"),
                (codes::RECYCLABILITY, "60"),
                (codes::REPAIRABILITY, "6.5"),
                (codes::ORIGIN, "PT"),
                (codes::CERTIFICATIONS, "GRS;bluesign"),
            ],
        ),
    ]
}
