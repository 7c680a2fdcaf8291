//! Connector-to-client resolution

use std::sync::Arc;

use dashmap::DashMap;
use matsync_core::{ErpClientProvider, MaterialClient};
use matsync_domain::{ConnectorConfig, ErpClientConfig, ErpClientMode, Result};
use tracing::debug;

use super::client::HttpMaterialClient;
use super::simulated::SimulatedMaterialClient;

/// Hands out the material client for a connector according to `erp.mode`.
///
/// Simulated mode shares one in-memory material master between all
/// connectors. HTTP mode caches one client per resolved base URL.
pub struct ConfiguredClientProvider {
    config: ErpClientConfig,
    simulated: Arc<SimulatedMaterialClient>,
    http_clients: DashMap<String, Arc<HttpMaterialClient>>,
}

impl ConfiguredClientProvider {
    pub fn new(config: ErpClientConfig, simulated: Arc<SimulatedMaterialClient>) -> Self {
        Self { config, simulated, http_clients: DashMap::new() }
    }

    /// Provider with a fresh simulated master, seeded when configured.
    pub fn from_config(config: ErpClientConfig) -> Self {
        let mut simulated = SimulatedMaterialClient::default();
        if config.seed_demo_data {
            simulated = simulated.with_demo_data();
        }
        Self::new(config, Arc::new(simulated))
    }

    pub fn mode(&self) -> ErpClientMode {
        self.config.mode
    }

    /// The shared simulated master, for seeding and fault injection.
    pub fn simulated(&self) -> Arc<SimulatedMaterialClient> {
        Arc::clone(&self.simulated)
    }

    fn http_client(&self, base_url: &str) -> Result<Arc<HttpMaterialClient>> {
        if let Some(client) = self.http_clients.get(base_url) {
            return Ok(Arc::clone(client.value()));
        }

        let client = Arc::new(HttpMaterialClient::new(base_url, &self.config)?);
        debug!(base_url, "Created ERP HTTP client");
        Ok(Arc::clone(
            self.http_clients.entry(base_url.to_string()).or_insert(client).value(),
        ))
    }
}

impl ErpClientProvider for ConfiguredClientProvider {
    fn client_for(&self, connector: &ConnectorConfig) -> Result<Arc<dyn MaterialClient>> {
        match self.config.mode {
            ErpClientMode::Simulated => Ok(self.simulated.clone()),
            ErpClientMode::Http => {
                let base_url = connector
                    .endpoint
                    .as_deref()
                    .filter(|endpoint| !endpoint.trim().is_empty())
                    .unwrap_or(&self.config.base_url);
                Ok(self.http_client(base_url)?)
            }
        }
    }
}
