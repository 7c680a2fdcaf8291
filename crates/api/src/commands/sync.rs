//! Sync trigger and run history

use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::Json;
use matsync_core::{SyncError, SyncLogRepository, SyncRequest};
use matsync_domain::{SyncLogEntry, SyncRunResult, SyncStatistics};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::connectors::require_connector;
use crate::context::AppContext;
use crate::error::ApiResult;
use crate::utils::logging::log_command_execution;

const DEFAULT_LOG_LIMIT: usize = 20;
const MAX_LOG_LIMIT: usize = 200;

/// Body of a sync trigger response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResponse {
    pub log_id: Uuid,
    pub result: SyncRunResult,
}

/// `?limit=` for the sync log listing.
#[derive(Debug, Default, Deserialize)]
pub struct LogQuery {
    pub limit: Option<usize>,
}

/// `POST /api/connectors/{id}/sync`
///
/// The body is optional; an empty body runs with the connector's defaults.
pub async fn trigger_sync(
    State(ctx): State<Arc<AppContext>>,
    Path(connector_id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<SyncResponse>> {
    let request = parse_request(&body)?;
    let started = Instant::now();

    let outcome = ctx.orchestrator.execute_sync(&connector_id, request).await;
    log_command_execution("sync::trigger_sync", &connector_id, started.elapsed(), outcome.is_ok());

    let result = outcome?;
    Ok(Json(SyncResponse { log_id: result.run_id, result }))
}

/// `GET /api/connectors/{id}/sync-logs?limit=`
pub async fn get_sync_logs(
    State(ctx): State<Arc<AppContext>>,
    Path(connector_id): Path<String>,
    Query(query): Query<LogQuery>,
) -> ApiResult<Json<Vec<SyncLogEntry>>> {
    require_connector(&ctx, &connector_id).await?;
    let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT).clamp(1, MAX_LOG_LIMIT);
    Ok(Json(ctx.sync_logs.recent(&connector_id, limit).await?))
}

/// `GET /api/connectors/{id}/sync-stats`
pub async fn get_sync_stats(
    State(ctx): State<Arc<AppContext>>,
    Path(connector_id): Path<String>,
) -> ApiResult<Json<SyncStatistics>> {
    require_connector(&ctx, &connector_id).await?;
    Ok(Json(ctx.sync_logs.statistics(&connector_id).await?))
}

fn parse_request(body: &[u8]) -> Result<SyncRequest, SyncError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(SyncRequest::default());
    }
    serde_json::from_slice(body).map_err(|err| SyncError::InvalidRequest(err.to_string()))
}
