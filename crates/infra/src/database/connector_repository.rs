//! SQLite-backed connector configuration repository.

use std::sync::Arc;

use async_trait::async_trait;
use matsync_core::ConnectorRepository;
use matsync_domain::{ConnectorConfig, Result};
use rusqlite::{params, OptionalExtension, Row};

use super::columns::{decode_enum, decode_json, decode_time, encode_json, encode_time, now};
use super::manager::{DbManager, SqliteConnection};
use crate::errors::InfraError;

const SELECT_CONNECTOR: &str = "SELECT id, name, kind, direction, status, endpoint, mapping_rules, updated_at
     FROM connectors";

/// Connector configurations keyed by id.
pub struct SqliteConnectorRepository {
    db: Arc<DbManager>,
}

impl SqliteConnectorRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Upsert every connector in `connectors`. Used to seed from config.
    pub async fn seed(&self, connectors: &[ConnectorConfig]) -> Result<usize> {
        for connector in connectors {
            self.upsert(connector).await?;
        }
        Ok(connectors.len())
    }
}

#[async_trait]
impl ConnectorRepository for SqliteConnectorRepository {
    async fn get(&self, connector_id: &str) -> Result<Option<ConnectorConfig>> {
        let connector_id = connector_id.to_string();
        self.db.run_blocking(move |conn| query_connector(conn, &connector_id)).await
    }

    async fn list(&self) -> Result<Vec<ConnectorConfig>> {
        self.db.run_blocking(query_all_connectors).await
    }

    async fn upsert(&self, connector: &ConnectorConfig) -> Result<()> {
        let connector = connector.clone();
        self.db.run_blocking(move |conn| upsert_connector(conn, &connector)).await
    }
}

fn query_connector(
    conn: &SqliteConnection,
    connector_id: &str,
) -> std::result::Result<Option<ConnectorConfig>, InfraError> {
    let row = conn
        .query_row(&format!("{SELECT_CONNECTOR} WHERE id = ?1"), params![connector_id], raw_row)
        .optional()?;
    row.map(RawConnector::into_config).transpose()
}

fn query_all_connectors(
    conn: &SqliteConnection,
) -> std::result::Result<Vec<ConnectorConfig>, InfraError> {
    let mut stmt = conn.prepare(&format!("{SELECT_CONNECTOR} ORDER BY id"))?;
    let rows = stmt.query_map([], raw_row)?.collect::<rusqlite::Result<Vec<_>>>()?;
    rows.into_iter().map(RawConnector::into_config).collect()
}

fn upsert_connector(
    conn: &SqliteConnection,
    connector: &ConnectorConfig,
) -> std::result::Result<(), InfraError> {
    let updated_at = connector.updated_at.unwrap_or_else(now);
    conn.execute(
        "INSERT INTO connectors (id, name, kind, direction, status, endpoint, mapping_rules, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            kind = excluded.kind,
            direction = excluded.direction,
            status = excluded.status,
            endpoint = excluded.endpoint,
            mapping_rules = excluded.mapping_rules,
            updated_at = excluded.updated_at",
        params![
            connector.id,
            connector.name,
            connector.kind.to_string(),
            connector.direction.to_string(),
            connector.status.to_string(),
            connector.endpoint,
            encode_json(&connector.mapping_rules)?,
            encode_time(updated_at),
        ],
    )?;
    Ok(())
}

struct RawConnector {
    id: String,
    name: String,
    kind: String,
    direction: String,
    status: String,
    endpoint: Option<String>,
    mapping_rules: String,
    updated_at: String,
}

fn raw_row(row: &Row<'_>) -> rusqlite::Result<RawConnector> {
    Ok(RawConnector {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: row.get(2)?,
        direction: row.get(3)?,
        status: row.get(4)?,
        endpoint: row.get(5)?,
        mapping_rules: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

impl RawConnector {
    fn into_config(self) -> std::result::Result<ConnectorConfig, InfraError> {
        Ok(ConnectorConfig {
            id: self.id,
            name: self.name,
            kind: decode_enum(&self.kind)?,
            direction: decode_enum(&self.direction)?,
            mapping_rules: decode_json(&self.mapping_rules)?,
            status: decode_enum(&self.status)?,
            endpoint: self.endpoint,
            updated_at: Some(decode_time(&self.updated_at)?),
        })
    }
}
