#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use matsync_domain::{
    Config, ConnectorConfig, ConnectorKind, ConnectorStatus, DatabaseConfig, SyncDirection,
};
use matsync_server::{build_router, AppContext};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

/// Context plus router over a throwaway database.
pub struct TestApp {
    pub ctx: Arc<AppContext>,
    pub router: Router,
    _temp_dir: TempDir,
}

fn connector(id: &str, direction: SyncDirection, status: ConnectorStatus) -> ConnectorConfig {
    ConnectorConfig {
        id: id.to_string(),
        name: id.to_string(),
        kind: ConnectorKind::Erp,
        direction,
        mapping_rules: Vec::new(),
        status,
        endpoint: None,
        updated_at: None,
    }
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(|_| {}).await
}

pub async fn setup_test_app_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    let temp_dir = TempDir::new().expect("failed to create temporary database directory");
    let mut config = Config {
        database: DatabaseConfig {
            path: temp_dir.path().join("matsync.db").to_string_lossy().into_owned(),
            pool_size: 4,
        },
        connectors: vec![
            connector("sap-main", SyncDirection::Bidirectional, ConnectorStatus::Active),
            connector("sap-inbound", SyncDirection::Inbound, ConnectorStatus::Active),
            connector("sap-legacy", SyncDirection::Bidirectional, ConnectorStatus::Inactive),
        ],
        ..Config::default()
    };
    config.health.enabled = false;
    config.health.max_retries = 1;
    configure(&mut config);

    let ctx = Arc::new(AppContext::new(config).await.expect("context should initialise"));
    let router = build_router(Arc::clone(&ctx));
    TestApp { ctx, router, _temp_dir: temp_dir }
}

impl TestApp {
    pub async fn request(&self, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .expect("request should build");

        let response = self.router.clone().oneshot(request).await.expect("router should respond");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body should read");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("body should be JSON")
        };
        (status, json)
    }
}
