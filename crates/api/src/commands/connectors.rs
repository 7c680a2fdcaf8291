use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use matsync_core::ConnectorRepository;
use matsync_domain::ConnectorConfig;

use crate::context::AppContext;
use crate::error::{ApiError, ApiResult};

/// `GET /api/connectors`
pub async fn list_connectors(
    State(ctx): State<Arc<AppContext>>,
) -> ApiResult<Json<Vec<ConnectorConfig>>> {
    Ok(Json(ctx.connectors.list().await?))
}

/// Load a connector or fail with 404.
pub(crate) async fn require_connector(
    ctx: &AppContext,
    connector_id: &str,
) -> ApiResult<ConnectorConfig> {
    ctx.connectors
        .get(connector_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("connector not found: {connector_id}")))
}
