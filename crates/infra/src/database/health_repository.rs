//! SQLite-backed latest-health-per-connector repository.

use std::sync::Arc;

use async_trait::async_trait;
use matsync_core::HealthRepository;
use matsync_domain::{ConnectorHealth, Result};
use rusqlite::{params, OptionalExtension, Row};

use super::columns::{decode_enum, decode_time, encode_time};
use super::manager::{DbManager, SqliteConnection};
use crate::errors::InfraError;

const SELECT_HEALTH: &str = "SELECT connector_id, status, last_check, response_time_ms, error,
            consecutive_failures, recommendation
     FROM connector_health";

/// One row per connector, overwritten by every check.
pub struct SqliteHealthRepository {
    db: Arc<DbManager>,
}

impl SqliteHealthRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl HealthRepository for SqliteHealthRepository {
    async fn get(&self, connector_id: &str) -> Result<Option<ConnectorHealth>> {
        let connector_id = connector_id.to_string();
        self.db
            .run_blocking(move |conn| {
                let row = conn
                    .query_row(
                        &format!("{SELECT_HEALTH} WHERE connector_id = ?1"),
                        params![connector_id],
                        raw_row,
                    )
                    .optional()?;
                row.map(RawHealth::into_health).transpose()
            })
            .await
    }

    async fn upsert(&self, health: &ConnectorHealth) -> Result<()> {
        let health = health.clone();
        self.db.run_blocking(move |conn| upsert_health(conn, &health)).await
    }

    async fn list(&self) -> Result<Vec<ConnectorHealth>> {
        self.db
            .run_blocking(|conn| {
                let mut stmt = conn.prepare(&format!("{SELECT_HEALTH} ORDER BY connector_id"))?;
                let rows = stmt.query_map([], raw_row)?.collect::<rusqlite::Result<Vec<_>>>()?;
                rows.into_iter().map(RawHealth::into_health).collect()
            })
            .await
    }
}

fn upsert_health(
    conn: &SqliteConnection,
    health: &ConnectorHealth,
) -> std::result::Result<(), InfraError> {
    conn.execute(
        "INSERT INTO connector_health
            (connector_id, status, last_check, response_time_ms, error, consecutive_failures, recommendation)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(connector_id) DO UPDATE SET
            status = excluded.status,
            last_check = excluded.last_check,
            response_time_ms = excluded.response_time_ms,
            error = excluded.error,
            consecutive_failures = excluded.consecutive_failures,
            recommendation = excluded.recommendation",
        params![
            health.connector_id,
            health.status.to_string(),
            encode_time(health.last_check),
            i64::try_from(health.response_time_ms).unwrap_or(i64::MAX),
            health.error,
            health.consecutive_failures,
            health.recommendation,
        ],
    )?;
    Ok(())
}

struct RawHealth {
    connector_id: String,
    status: String,
    last_check: String,
    response_time_ms: i64,
    error: Option<String>,
    consecutive_failures: u32,
    recommendation: Option<String>,
}

fn raw_row(row: &Row<'_>) -> rusqlite::Result<RawHealth> {
    Ok(RawHealth {
        connector_id: row.get(0)?,
        status: row.get(1)?,
        last_check: row.get(2)?,
        response_time_ms: row.get(3)?,
        error: row.get(4)?,
        consecutive_failures: row.get(5)?,
        recommendation: row.get(6)?,
    })
}

impl RawHealth {
    fn into_health(self) -> std::result::Result<ConnectorHealth, InfraError> {
        Ok(ConnectorHealth {
            connector_id: self.connector_id,
            status: decode_enum(&self.status)?,
            last_check: decode_time(&self.last_check)?,
            response_time_ms: u64::try_from(self.response_time_ms).unwrap_or_default(),
            error: self.error,
            consecutive_failures: self.consecutive_failures,
            recommendation: self.recommendation,
        })
    }
}
