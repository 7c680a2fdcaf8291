#![allow(dead_code)]

use std::sync::{Arc, Once};

use matsync_common::time::{SystemClock, TokioSleeper};
use matsync_core::{
    ConnectionHealthMonitor, ConnectorRepository, HealthMonitorConfig, OrchestratorConfig,
    SyncOrchestrator, SyncPorts,
};
use matsync_domain::{
    ConnectorConfig, ConnectorKind, ConnectorStatus, ErpClientConfig, SyncDirection,
};
use matsync_infra::database::{
    DbManager, SqliteConnectorRepository, SqliteHealthRepository, SqliteProductProvisioner,
    SqliteProductStore, SqliteSyncLogRepository,
};
use matsync_infra::integrations::erp::{ConfiguredClientProvider, SimulatedMaterialClient};
use tempfile::TempDir;

pub const CONNECTOR_ID: &str = "sap-main";

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("matsync=debug"))
            .with_test_writer()
            .try_init();
    });
}

/// Temporary database wrapper that keeps the underlying file alive for the
/// duration of a test run.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    _temp_dir: TempDir,
}

impl TestDatabase {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let manager = DbManager::open(temp_dir.path().join("test.db"), 4)
            .expect("db manager should be created");
        Self { manager, _temp_dir: temp_dir }
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

pub fn connector(direction: SyncDirection) -> ConnectorConfig {
    ConnectorConfig {
        id: CONNECTOR_ID.to_string(),
        name: "Main ERP".to_string(),
        kind: ConnectorKind::Erp,
        direction,
        mapping_rules: Vec::new(),
        status: ConnectorStatus::Active,
        endpoint: None,
        updated_at: None,
    }
}

/// SQLite adapters and the seeded simulated ERP wired into the core services.
pub struct Stack {
    pub db: TestDatabase,
    pub connectors: Arc<SqliteConnectorRepository>,
    pub products: Arc<SqliteProductStore>,
    pub provisioner: Arc<SqliteProductProvisioner>,
    pub sync_logs: Arc<SqliteSyncLogRepository>,
    pub health: Arc<SqliteHealthRepository>,
    pub erp: Arc<SimulatedMaterialClient>,
    pub clients: Arc<ConfiguredClientProvider>,
    pub orchestrator: Arc<SyncOrchestrator>,
    pub monitor: Arc<ConnectionHealthMonitor>,
}

impl Stack {
    pub async fn new(direction: SyncDirection) -> Self {
        init_tracing();
        let db = TestDatabase::new();
        let manager = Arc::clone(&db.manager);

        let connectors = Arc::new(SqliteConnectorRepository::new(Arc::clone(&manager)));
        connectors.upsert(&connector(direction)).await.expect("connector seeded");
        let products = Arc::new(SqliteProductStore::new(Arc::clone(&manager)));
        let provisioner = Arc::new(SqliteProductProvisioner::new(Arc::clone(&manager)));
        let sync_logs = Arc::new(SqliteSyncLogRepository::new(Arc::clone(&manager)));
        let health = Arc::new(SqliteHealthRepository::new(manager));

        let erp = Arc::new(SimulatedMaterialClient::default().with_demo_data());
        let clients =
            Arc::new(ConfiguredClientProvider::new(ErpClientConfig::default(), Arc::clone(&erp)));

        let orchestrator = Arc::new(SyncOrchestrator::new(SyncPorts {
            connectors: connectors.clone(),
            clients: clients.clone(),
            products: products.clone(),
            provisioner: provisioner.clone(),
            sync_logs: sync_logs.clone(),
            health: health.clone(),
        }));
        let monitor = Arc::new(
            ConnectionHealthMonitor::new(
                connectors.clone(),
                clients.clone(),
                health.clone(),
                Arc::new(SystemClock),
                Arc::new(TokioSleeper),
            )
            .with_config(HealthMonitorConfig {
                max_attempts: 1,
                ..HealthMonitorConfig::default()
            }),
        );

        Self {
            db,
            connectors,
            products,
            provisioner,
            sync_logs,
            health,
            erp,
            clients,
            orchestrator,
            monitor,
        }
    }

    /// A second orchestrator over the same adapters with its own settings.
    pub fn orchestrator_with(&self, config: OrchestratorConfig) -> Arc<SyncOrchestrator> {
        Arc::new(
            SyncOrchestrator::new(SyncPorts {
                connectors: self.connectors.clone(),
                clients: self.clients.clone(),
                products: self.products.clone(),
                provisioner: self.provisioner.clone(),
                sync_logs: self.sync_logs.clone(),
                health: self.health.clone(),
            })
            .with_config(config),
        )
    }
}
