//! Downstream provisioning for newly created products.
//!
//! Each product gets a stable identifier, a QR payload that resolves to its
//! passport page and an initial `created` trace event.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use matsync_core::ProductProvisioner;
use matsync_domain::{CanonicalRecord, Result};
use rusqlite::{params, OptionalExtension};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use super::columns::{decode_time, decode_uuid, encode_time, now};
use super::manager::{DbManager, SqliteConnection};
use crate::errors::InfraError;

const DEFAULT_QR_BASE_URL: &str = "https://passport.matsync.local/p";
const CREATED_EVENT: &str = "created";

/// Identity assigned to a product at provisioning time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductIdentity {
    pub product_id: Uuid,
    pub identifier: String,
    pub qr_payload: String,
    pub created_at: DateTime<Utc>,
}

/// Append-only lifecycle event of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceEvent {
    pub product_id: Uuid,
    pub event_type: String,
    pub details: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Creates passport identities and trace events for new products.
pub struct SqliteProductProvisioner {
    db: Arc<DbManager>,
    qr_base_url: String,
}

impl SqliteProductProvisioner {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db, qr_base_url: DEFAULT_QR_BASE_URL.to_string() }
    }

    pub fn with_qr_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.qr_base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Identity issued for the product, if any.
    pub async fn identity(&self, product_id: Uuid) -> Result<Option<ProductIdentity>> {
        self.db.run_blocking(move |conn| query_identity(conn, product_id)).await
    }

    /// Trace events of the product, oldest first.
    pub async fn trace_events(&self, product_id: Uuid) -> Result<Vec<TraceEvent>> {
        self.db.run_blocking(move |conn| query_trace_events(conn, product_id)).await
    }
}

#[async_trait]
impl ProductProvisioner for SqliteProductProvisioner {
    async fn provision(&self, product: &CanonicalRecord) -> Result<()> {
        let product_id = product.id;
        let sku = product.sku.clone();
        let identifier = format!("urn:matsync:product:{product_id}");
        let qr_payload = format!("{}/{product_id}", self.qr_base_url);

        let inserted = self
            .db
            .run_blocking(move |conn| {
                let tx = conn.unchecked_transaction()?;
                let stamp = encode_time(now());
                let inserted = tx.execute(
                    "INSERT OR IGNORE INTO product_identities (product_id, identifier, qr_payload, created_at)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![product_id.to_string(), identifier, qr_payload, stamp],
                )?;
                if inserted > 0 {
                    tx.execute(
                        "INSERT INTO trace_events (product_id, event_type, details, occurred_at)
                         VALUES (?1, ?2, ?3, ?4)",
                        params![product_id.to_string(), CREATED_EVENT, format!("sku={sku}"), stamp],
                    )?;
                }
                tx.commit()?;
                Ok(inserted > 0)
            })
            .await?;

        debug!(product_id = %product_id, inserted, "Product identity provisioned");
        Ok(())
    }
}

fn query_identity(
    conn: &SqliteConnection,
    product_id: Uuid,
) -> std::result::Result<Option<ProductIdentity>, InfraError> {
    let row = conn
        .query_row(
            "SELECT product_id, identifier, qr_payload, created_at
             FROM product_identities WHERE product_id = ?1",
            params![product_id.to_string()],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;

    row.map(|(id, identifier, qr_payload, created_at)| {
        Ok(ProductIdentity {
            product_id: decode_uuid(&id)?,
            identifier,
            qr_payload,
            created_at: decode_time(&created_at)?,
        })
    })
    .transpose()
}

fn query_trace_events(
    conn: &SqliteConnection,
    product_id: Uuid,
) -> std::result::Result<Vec<TraceEvent>, InfraError> {
    let mut stmt = conn.prepare(
        "SELECT event_type, details, occurred_at FROM trace_events
         WHERE product_id = ?1 ORDER BY id",
    )?;
    let rows = stmt
        .query_map(params![product_id.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter()
        .map(|(event_type, details, occurred_at)| {
            Ok(TraceEvent {
                product_id,
                event_type,
                details,
                occurred_at: decode_time(&occurred_at)?,
            })
        })
        .collect()
}
