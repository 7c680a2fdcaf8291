//! Application context - dependency injection container

use std::sync::Arc;

use matsync_common::time::{SystemClock, TokioSleeper};
use matsync_core::{
    ConnectionHealthMonitor, ConnectorRepository, HealthMonitorConfig, HealthRepository,
    OrchestratorConfig, SyncLogRepository, SyncOrchestrator, SyncPorts,
};
use matsync_domain::{Config, Result};
use matsync_infra::scheduling::{
    HealthMonitorService, HealthMonitorServiceConfig, SyncScheduler, SyncSchedulerConfig,
};
use matsync_infra::{
    ConfiguredClientProvider, DbManager, SqliteConnectorRepository, SqliteHealthRepository,
    SqliteProductProvisioner, SqliteProductStore, SqliteSyncLogRepository,
};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub config: Config,
    pub db: Arc<DbManager>,
    pub connectors: Arc<dyn ConnectorRepository>,
    pub products: Arc<SqliteProductStore>,
    pub sync_logs: Arc<dyn SyncLogRepository>,
    pub health: Arc<dyn HealthRepository>,
    pub clients: Arc<ConfiguredClientProvider>,
    pub orchestrator: Arc<SyncOrchestrator>,
    pub monitor: Arc<ConnectionHealthMonitor>,

    // Background tasks, started explicitly by the binary
    health_service: Mutex<Option<HealthMonitorService>>,
    sync_scheduler: Mutex<Option<SyncScheduler>>,
}

impl AppContext {
    /// Open the database, seed configured connectors and wire the services.
    ///
    /// Background tasks are not started; see [`AppContext::start_background`].
    pub async fn new(config: Config) -> Result<Self> {
        let db = DbManager::open(&config.database.path, config.database.pool_size)?;

        let connector_repo = Arc::new(SqliteConnectorRepository::new(Arc::clone(&db)));
        let seeded = connector_repo.seed(&config.connectors).await?;
        info!(seeded, "Connectors seeded from configuration");

        let products = Arc::new(SqliteProductStore::new(Arc::clone(&db)));
        let provisioner = Arc::new(SqliteProductProvisioner::new(Arc::clone(&db)));
        let sync_logs: Arc<dyn SyncLogRepository> =
            Arc::new(SqliteSyncLogRepository::new(Arc::clone(&db)));
        let health: Arc<dyn HealthRepository> =
            Arc::new(SqliteHealthRepository::new(Arc::clone(&db)));
        let connectors: Arc<dyn ConnectorRepository> = connector_repo;

        let clients = Arc::new(ConfiguredClientProvider::from_config(config.erp.clone()));
        info!(mode = ?clients.mode(), "ERP client provider ready");

        let orchestrator = Arc::new(
            SyncOrchestrator::new(SyncPorts {
                connectors: Arc::clone(&connectors),
                clients: clients.clone(),
                products: products.clone(),
                provisioner,
                sync_logs: Arc::clone(&sync_logs),
                health: Arc::clone(&health),
            })
            .with_config(OrchestratorConfig::from(&config.sync)),
        );

        let monitor = Arc::new(
            ConnectionHealthMonitor::new(
                Arc::clone(&connectors),
                clients.clone(),
                Arc::clone(&health),
                Arc::new(SystemClock),
                Arc::new(TokioSleeper),
            )
            .with_config(HealthMonitorConfig::from(&config.health)),
        );

        Ok(Self {
            config,
            db,
            connectors,
            products,
            sync_logs,
            health,
            clients,
            orchestrator,
            monitor,
            health_service: Mutex::new(None),
            sync_scheduler: Mutex::new(None),
        })
    }

    /// Start the health sweep and the cron schedules enabled in the config.
    pub async fn start_background(&self) -> Result<()> {
        if self.config.health.enabled {
            let mut slot = self.health_service.lock().await;
            if slot.is_none() {
                let mut service = HealthMonitorService::new(
                    Arc::clone(&self.monitor),
                    HealthMonitorServiceConfig::from(&self.config.health),
                );
                service.start()?;
                *slot = Some(service);
            }
        }

        let schedules = self.config.sync.schedules.clone();
        if !schedules.is_empty() {
            let mut slot = self.sync_scheduler.lock().await;
            if slot.is_none() {
                let mut scheduler = SyncScheduler::new(
                    Arc::clone(&self.orchestrator),
                    schedules,
                    SyncSchedulerConfig::default(),
                )
                .await?;
                scheduler.start().await?;
                *slot = Some(scheduler);
            }
        }
        Ok(())
    }

    /// Stop background tasks. Errors are logged; shutdown always proceeds.
    pub async fn shutdown(&self) {
        if let Some(mut service) = self.health_service.lock().await.take() {
            if let Err(err) = service.stop().await {
                warn!(error = %err, "Health monitor service did not stop cleanly");
            }
        }
        if let Some(mut scheduler) = self.sync_scheduler.lock().await.take() {
            if let Err(err) = scheduler.stop().await {
                warn!(error = %err, "Sync scheduler did not stop cleanly");
            }
        }
        info!("Background tasks stopped");
    }

    /// Whether the background health sweep is running.
    pub async fn health_service_running(&self) -> bool {
        self.health_service.lock().await.as_ref().is_some_and(HealthMonitorService::is_running)
    }

    /// Database round-trip used by the liveness endpoint.
    pub async fn database_ok(&self) -> bool {
        let db = Arc::clone(&self.db);
        match tokio::task::spawn_blocking(move || db.health_check()).await {
            Ok(Ok(())) => true,
            Ok(Err(err)) => {
                warn!(error = %err, "Database health check failed");
                false
            }
            Err(err) => {
                warn!(error = %err, "Database health check task failed");
                false
            }
        }
    }
}
