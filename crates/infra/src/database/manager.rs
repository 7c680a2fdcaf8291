//! Database connection manager backed by an r2d2 SQLite pool.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use matsync_domain::{MatSyncError, Result};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use tokio::task;
use tracing::info;

use crate::errors::InfraError;

pub type SqlitePool = Pool<SqliteConnectionManager>;
pub type SqliteConnection = PooledConnection<SqliteConnectionManager>;

const SCHEMA_VERSION: i32 = 1;
const SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS schema_version (
    version     INTEGER PRIMARY KEY,
    applied_at  INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS connectors (
    id             TEXT PRIMARY KEY,
    name           TEXT NOT NULL,
    kind           TEXT NOT NULL,
    direction      TEXT NOT NULL,
    status         TEXT NOT NULL,
    endpoint       TEXT,
    mapping_rules  TEXT NOT NULL DEFAULT '[]',
    updated_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS products (
    id             TEXT PRIMARY KEY,
    sku            TEXT NOT NULL UNIQUE,
    fields         TEXT NOT NULL,
    created_at     TEXT NOT NULL,
    last_modified  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS product_identities (
    product_id  TEXT PRIMARY KEY REFERENCES products(id),
    identifier  TEXT NOT NULL UNIQUE,
    qr_payload  TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS trace_events (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    product_id   TEXT NOT NULL REFERENCES products(id),
    event_type   TEXT NOT NULL,
    details      TEXT,
    occurred_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_trace_events_product ON trace_events(product_id);

CREATE TABLE IF NOT EXISTS sync_logs (
    log_id             TEXT PRIMARY KEY,
    connector_id       TEXT NOT NULL,
    direction          TEXT NOT NULL,
    dry_run            INTEGER NOT NULL,
    status             TEXT NOT NULL,
    records_processed  INTEGER NOT NULL DEFAULT 0,
    records_created    INTEGER NOT NULL DEFAULT 0,
    records_updated    INTEGER NOT NULL DEFAULT 0,
    records_skipped    INTEGER NOT NULL DEFAULT 0,
    records_failed     INTEGER NOT NULL DEFAULT 0,
    errors             TEXT NOT NULL DEFAULT '[]',
    conflicts          TEXT NOT NULL DEFAULT '[]',
    started_at         TEXT NOT NULL,
    ended_at           TEXT,
    duration_ms        INTEGER
);
CREATE INDEX IF NOT EXISTS idx_sync_logs_connector ON sync_logs(connector_id, started_at);

CREATE TABLE IF NOT EXISTS connector_health (
    connector_id          TEXT PRIMARY KEY,
    status                TEXT NOT NULL,
    last_check            TEXT NOT NULL,
    response_time_ms      INTEGER NOT NULL,
    error                 TEXT,
    consecutive_failures  INTEGER NOT NULL DEFAULT 0,
    recommendation        TEXT
);
";

/// Database manager that wraps an r2d2 [`SqlitePool`].
pub struct DbManager {
    pool: SqlitePool,
    path: PathBuf,
}

impl DbManager {
    /// Open (or create) the database at `db_path` with the given pool size.
    pub fn new<P: AsRef<Path>>(db_path: P, pool_size: u32) -> Result<Self> {
        let path = db_path.as_ref().to_path_buf();
        let manager = SqliteConnectionManager::file(&path).with_init(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;",
            )
        });

        let pool = Pool::builder()
            .max_size(pool_size.max(1))
            .build(manager)
            .map_err(InfraError::from)?;

        info!(db_path = %path.display(), max_connections = pool.max_size(), "sqlite pool initialised");

        Ok(Self { pool, path })
    }

    /// Open the database and apply the schema.
    pub fn open<P: AsRef<Path>>(db_path: P, pool_size: u32) -> Result<Arc<Self>> {
        let manager = Self::new(db_path, pool_size)?;
        manager.run_migrations()?;
        Ok(Arc::new(manager))
    }

    /// Acquire a connection from the pool.
    pub fn get_connection(&self) -> Result<SqliteConnection> {
        Ok(self.pool.get().map_err(InfraError::from)?)
    }

    /// Ensure the full schema exists on the current database.
    pub fn run_migrations(&self) -> Result<()> {
        let conn = self.get_connection()?;
        create_schema(&conn)?;
        Ok(())
    }

    /// Return the configured database path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Verify the database is reachable and answering queries.
    pub fn health_check(&self) -> Result<()> {
        let conn = self.get_connection()?;
        conn.query_row("SELECT 1", params![], |row| row.get::<_, i32>(0))
            .map_err(InfraError::from)?;
        Ok(())
    }

    /// Run `op` on a pooled connection inside `spawn_blocking`.
    pub(crate) async fn run_blocking<T, F>(self: &Arc<Self>, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&SqliteConnection) -> std::result::Result<T, InfraError> + Send + 'static,
    {
        let db = Arc::clone(self);
        task::spawn_blocking(move || -> Result<T> {
            let conn = db.get_connection()?;
            Ok(op(&conn)?)
        })
        .await
        .map_err(map_join_error)?
    }
}

fn create_schema(conn: &SqliteConnection) -> std::result::Result<(), InfraError> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?1, CAST(strftime('%s','now') AS INTEGER))",
        params![SCHEMA_VERSION],
    )?;
    Ok(())
}

fn map_join_error(err: task::JoinError) -> MatSyncError {
    if err.is_cancelled() {
        MatSyncError::Internal("blocking task cancelled".into())
    } else {
        MatSyncError::Internal(format!("blocking task failed: {err}"))
    }
}
