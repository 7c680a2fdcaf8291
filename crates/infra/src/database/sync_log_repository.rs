//! SQLite-backed sync run log and per-connector statistics.

use std::sync::Arc;

use async_trait::async_trait;
use matsync_core::SyncLogRepository;
use matsync_domain::{Result, SyncLogEntry, SyncRunResult, SyncRunStatus, SyncStatistics};
use rusqlite::{params, Row};

use super::columns::{decode_enum, decode_json, decode_time, decode_uuid, encode_json, encode_time};
use super::manager::{DbManager, SqliteConnection};
use crate::errors::InfraError;

/// Sync run history in the `sync_logs` table.
pub struct SqliteSyncLogRepository {
    db: Arc<DbManager>,
}

impl SqliteSyncLogRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SyncLogRepository for SqliteSyncLogRepository {
    async fn start_run(&self, run: &SyncRunResult) -> Result<()> {
        let run = run.clone();
        self.db.run_blocking(move |conn| write_run(conn, &run)).await
    }

    async fn finish_run(&self, run: &SyncRunResult) -> Result<()> {
        let run = run.clone();
        self.db.run_blocking(move |conn| write_run(conn, &run)).await
    }

    async fn recent(&self, connector_id: &str, limit: usize) -> Result<Vec<SyncLogEntry>> {
        let connector_id = connector_id.to_string();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        self.db.run_blocking(move |conn| query_recent(conn, &connector_id, limit)).await
    }

    async fn statistics(&self, connector_id: &str) -> Result<SyncStatistics> {
        let connector_id = connector_id.to_string();
        self.db.run_blocking(move |conn| query_statistics(conn, &connector_id)).await
    }
}

/// Insert the run row, or overwrite it when the run is being finalized.
fn write_run(conn: &SqliteConnection, run: &SyncRunResult) -> std::result::Result<(), InfraError> {
    conn.execute(
        "INSERT INTO sync_logs (
            log_id, connector_id, direction, dry_run, status,
            records_processed, records_created, records_updated, records_skipped, records_failed,
            errors, conflicts, started_at, ended_at, duration_ms)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
         ON CONFLICT(log_id) DO UPDATE SET
            status = excluded.status,
            records_processed = excluded.records_processed,
            records_created = excluded.records_created,
            records_updated = excluded.records_updated,
            records_skipped = excluded.records_skipped,
            records_failed = excluded.records_failed,
            errors = excluded.errors,
            conflicts = excluded.conflicts,
            ended_at = excluded.ended_at,
            duration_ms = excluded.duration_ms",
        params![
            run.run_id.to_string(),
            run.connector_id,
            run.direction.to_string(),
            run.dry_run,
            run.status.to_string(),
            run.records_processed,
            run.records_created,
            run.records_updated,
            run.records_skipped,
            run.records_failed,
            encode_json(&run.errors)?,
            encode_json(&run.conflicts)?,
            encode_time(run.started_at),
            run.ended_at.map(encode_time),
            run.duration_ms(),
        ],
    )?;
    Ok(())
}

fn query_recent(
    conn: &SqliteConnection,
    connector_id: &str,
    limit: i64,
) -> std::result::Result<Vec<SyncLogEntry>, InfraError> {
    let mut stmt = conn.prepare(
        "SELECT log_id, connector_id, direction, dry_run, status,
                records_processed, records_created, records_updated, records_skipped, records_failed,
                errors, conflicts, started_at, ended_at
         FROM sync_logs
         WHERE connector_id = ?1
         ORDER BY started_at DESC, rowid DESC
         LIMIT ?2",
    )?;
    let rows = stmt
        .query_map(params![connector_id, limit], raw_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    rows.into_iter().map(|raw| raw.into_result().map(SyncLogEntry::from)).collect()
}

fn query_statistics(
    conn: &SqliteConnection,
    connector_id: &str,
) -> std::result::Result<SyncStatistics, InfraError> {
    let (total_runs, last_run_at, processed, created, updated, failed, finished, completed) = conn
        .query_row(
            "SELECT COUNT(*),
                    MAX(started_at),
                    COALESCE(SUM(records_processed), 0),
                    COALESCE(SUM(records_created), 0),
                    COALESCE(SUM(records_updated), 0),
                    COALESCE(SUM(records_failed), 0),
                    COALESCE(SUM(CASE WHEN status IN (?2, ?3) THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN status = ?2 THEN 1 ELSE 0 END), 0)
             FROM sync_logs
             WHERE connector_id = ?1",
            params![
                connector_id,
                SyncRunStatus::Completed.to_string(),
                SyncRunStatus::Failed.to_string()
            ],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, i64>(4)?,
                    row.get::<_, i64>(5)?,
                    row.get::<_, i64>(6)?,
                    row.get::<_, i64>(7)?,
                ))
            },
        )?;

    let success_rate =
        if finished == 0 { 0.0 } else { completed as f64 * 100.0 / finished as f64 };

    Ok(SyncStatistics {
        connector_id: connector_id.to_string(),
        total_runs: to_u64(total_runs),
        last_run_at: last_run_at.as_deref().map(decode_time).transpose()?,
        total_processed: to_u64(processed),
        total_created: to_u64(created),
        total_updated: to_u64(updated),
        total_failed: to_u64(failed),
        success_rate,
    })
}

fn to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or_default()
}

struct RawRun {
    log_id: String,
    connector_id: String,
    direction: String,
    dry_run: bool,
    status: String,
    counters: [u32; 5],
    errors: String,
    conflicts: String,
    started_at: String,
    ended_at: Option<String>,
}

fn raw_row(row: &Row<'_>) -> rusqlite::Result<RawRun> {
    Ok(RawRun {
        log_id: row.get(0)?,
        connector_id: row.get(1)?,
        direction: row.get(2)?,
        dry_run: row.get(3)?,
        status: row.get(4)?,
        counters: [row.get(5)?, row.get(6)?, row.get(7)?, row.get(8)?, row.get(9)?],
        errors: row.get(10)?,
        conflicts: row.get(11)?,
        started_at: row.get(12)?,
        ended_at: row.get(13)?,
    })
}

impl RawRun {
    fn into_result(self) -> std::result::Result<SyncRunResult, InfraError> {
        let [processed, created, updated, skipped, failed] = self.counters;
        Ok(SyncRunResult {
            run_id: decode_uuid(&self.log_id)?,
            connector_id: self.connector_id,
            direction: decode_enum(&self.direction)?,
            dry_run: self.dry_run,
            status: decode_enum(&self.status)?,
            records_processed: processed,
            records_created: created,
            records_updated: updated,
            records_skipped: skipped,
            records_failed: failed,
            errors: decode_json(&self.errors)?,
            conflicts: decode_json(&self.conflicts)?,
            started_at: decode_time(&self.started_at)?,
            ended_at: self.ended_at.as_deref().map(decode_time).transpose()?,
        })
    }
}
