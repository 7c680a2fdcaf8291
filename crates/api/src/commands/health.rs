//! Connector health endpoints

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::Json;
use matsync_domain::{ConnectorHealth, HealthSummary};
use serde::Serialize;

use super::connectors::require_connector;
use crate::context::AppContext;
use crate::error::{ApiError, ApiResult};
use crate::utils::logging::log_command_execution;

/// Liveness of the service itself, independent of any connector.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceStatus {
    pub database: bool,
    pub health_monitor_running: bool,
}

/// `POST /api/connectors/{id}/health-check`
pub async fn check_connector_health(
    State(ctx): State<Arc<AppContext>>,
    Path(connector_id): Path<String>,
) -> ApiResult<Json<ConnectorHealth>> {
    require_connector(&ctx, &connector_id).await?;
    let started = Instant::now();
    let health = ctx.monitor.check_connection(&connector_id).await;
    log_command_execution("health::check_connector", &connector_id, started.elapsed(), true);
    Ok(Json(health))
}

/// `GET /api/connectors/{id}/health`
pub async fn get_connector_health(
    State(ctx): State<Arc<AppContext>>,
    Path(connector_id): Path<String>,
) -> ApiResult<Json<ConnectorHealth>> {
    ctx.monitor
        .latest(&connector_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("no health recorded for {connector_id}")))
}

/// `GET /api/health`
pub async fn check_all_health(State(ctx): State<Arc<AppContext>>) -> Json<HealthSummary> {
    Json(ctx.monitor.check_all_connections().await)
}

/// `GET /api/status`
pub async fn service_status(State(ctx): State<Arc<AppContext>>) -> Json<ServiceStatus> {
    Json(ServiceStatus {
        database: ctx.database_ok().await,
        health_monitor_running: ctx.health_service_running().await,
    })
}
