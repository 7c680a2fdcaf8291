//! Route table

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::commands::{
    check_all_health, check_connector_health, get_connector_health, get_sync_logs,
    get_sync_stats, list_connectors, service_status, trigger_sync,
};
use crate::context::AppContext;

/// Build the `/api` router.
///
/// - `GET  /api/connectors`
/// - `POST /api/connectors/{id}/sync`
/// - `GET  /api/connectors/{id}/sync-logs?limit=`
/// - `GET  /api/connectors/{id}/sync-stats`
/// - `POST /api/connectors/{id}/health-check`
/// - `GET  /api/connectors/{id}/health`
/// - `GET  /api/health`
/// - `GET  /api/status`
pub fn build_router(ctx: Arc<AppContext>) -> Router {
    let api = Router::new()
        .route("/connectors", get(list_connectors))
        .route("/connectors/{id}/sync", post(trigger_sync))
        .route("/connectors/{id}/sync-logs", get(get_sync_logs))
        .route("/connectors/{id}/sync-stats", get(get_sync_stats))
        .route("/connectors/{id}/health-check", post(check_connector_health))
        .route("/connectors/{id}/health", get(get_connector_health))
        .route("/health", get(check_all_health))
        .route("/status", get(service_status));

    Router::new().nest("/api", api).with_state(ctx)
}
