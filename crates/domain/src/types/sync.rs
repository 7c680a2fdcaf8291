//! Sync run results, conflicts and run logs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::connector::SyncDirection;
use crate::impl_domain_status_conversions;

/// Run lifecycle: `pending -> running -> {completed, failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncRunStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl_domain_status_conversions!(SyncRunStatus {
    Pending => "pending",
    Running => "running",
    Completed => "completed",
    Failed => "failed",
});

impl SyncRunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Which side's data prevails after a conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictWinner {
    External,
    Canonical,
}

impl_domain_status_conversions!(ConflictWinner {
    External => "external",
    Canonical => "canonical",
});

/// Audit entry for a detected conflict, recorded whatever the resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictOutcome {
    pub business_key: String,
    pub winner: ConflictWinner,
    pub canonical_modified: DateTime<Utc>,
    /// `None` when the ERP timestamp could not be parsed.
    pub external_changed: Option<DateTime<Utc>>,
    pub external_changed_raw: String,
    pub differing_fields: Vec<String>,
    pub rationale: String,
}

/// Per-record (or per-phase) failure within a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRecordError {
    pub record: String,
    pub error: String,
    pub kind: String,
}

/// Conflict attached to the record it was detected on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConflictEntry {
    pub record: String,
    pub resolution: ConflictOutcome,
}

/// Aggregate outcome of one sync run (or one phase of it).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRunResult {
    pub run_id: Uuid,
    pub connector_id: String,
    pub direction: SyncDirection,
    pub dry_run: bool,
    pub status: SyncRunStatus,
    pub records_processed: u32,
    pub records_created: u32,
    pub records_updated: u32,
    pub records_skipped: u32,
    pub records_failed: u32,
    pub errors: Vec<SyncRecordError>,
    pub conflicts: Vec<SyncConflictEntry>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl SyncRunResult {
    pub fn new(
        run_id: Uuid,
        connector_id: impl Into<String>,
        direction: SyncDirection,
        dry_run: bool,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            run_id,
            connector_id: connector_id.into(),
            direction,
            dry_run,
            status: SyncRunStatus::Pending,
            records_processed: 0,
            records_created: 0,
            records_updated: 0,
            records_skipped: 0,
            records_failed: 0,
            errors: Vec::new(),
            conflicts: Vec::new(),
            started_at,
            ended_at: None,
        }
    }

    /// Fold a phase result into this run's totals.
    pub fn merge(&mut self, phase: SyncRunResult) {
        self.records_processed += phase.records_processed;
        self.records_created += phase.records_created;
        self.records_updated += phase.records_updated;
        self.records_skipped += phase.records_skipped;
        self.records_failed += phase.records_failed;
        self.errors.extend(phase.errors);
        self.conflicts.extend(phase.conflicts);
    }

    /// Record a phase-level failure (fetch aborted) under a sentinel id.
    pub fn record_phase_error(&mut self, sentinel: &str, error: &crate::MatSyncError) {
        self.errors.push(SyncRecordError {
            record: sentinel.to_string(),
            error: error.to_string(),
            kind: error.kind().to_string(),
        });
    }

    /// Record a failed record; counts toward `records_failed`.
    pub fn record_failure(&mut self, record: impl Into<String>, error: &crate::MatSyncError) {
        self.records_failed += 1;
        self.errors.push(SyncRecordError {
            record: record.into(),
            error: error.to_string(),
            kind: error.kind().to_string(),
        });
    }

    /// Close the run. `failed` if any record or phase failed.
    pub fn finish(&mut self, ended_at: DateTime<Utc>) {
        self.ended_at = Some(ended_at);
        self.status = if self.records_failed == 0 && self.errors.is_empty() {
            SyncRunStatus::Completed
        } else {
            SyncRunStatus::Failed
        };
    }

    /// Derived run duration in milliseconds.
    pub fn duration_ms(&self) -> Option<i64> {
        self.ended_at.map(|end| (end - self.started_at).num_milliseconds().max(0))
    }
}

/// Persisted log row for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncLogEntry {
    pub log_id: Uuid,
    pub duration_ms: Option<i64>,
    #[serde(flatten)]
    pub result: SyncRunResult,
}

impl From<SyncRunResult> for SyncLogEntry {
    fn from(result: SyncRunResult) -> Self {
        Self { log_id: result.run_id, duration_ms: result.duration_ms(), result }
    }
}

/// Aggregate statistics across a connector's run history.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatistics {
    pub connector_id: String,
    pub total_runs: u64,
    pub last_run_at: Option<DateTime<Utc>>,
    pub total_processed: u64,
    pub total_created: u64,
    pub total_updated: u64,
    pub total_failed: u64,
    /// Percentage of finished runs that completed, 0..=100.
    pub success_rate: f64,
}
