//! SQLite-backed canonical product store.
//!
//! Mapped fields live in a JSON column; the SKU is a unique column so the
//! sync engine can look products up by business key.

use std::sync::Arc;

use async_trait::async_trait;
use matsync_core::ProductStore;
use matsync_domain::{
    CanonicalRecord, MatSyncError, NewProduct, ProductFields, ProductQuery, Result,
};
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use super::columns::{decode_json, decode_time, decode_uuid, encode_json, encode_time, now};
use super::manager::{DbManager, SqliteConnection};
use crate::errors::InfraError;

const SELECT_PRODUCT: &str = "SELECT id, sku, fields, last_modified FROM products";

/// Canonical products in the `products` table.
pub struct SqliteProductStore {
    db: Arc<DbManager>,
}

impl SqliteProductStore {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Number of stored products.
    pub async fn count(&self) -> Result<usize> {
        self.db
            .run_blocking(|conn| {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
                Ok(usize::try_from(count).unwrap_or_default())
            })
            .await
    }
}

#[async_trait]
impl ProductStore for SqliteProductStore {
    async fn get(&self, id: Uuid) -> Result<Option<CanonicalRecord>> {
        self.db
            .run_blocking(move |conn| query_one(conn, "id", &id.to_string()))
            .await
    }

    async fn find_by_sku(&self, sku: &str) -> Result<Option<CanonicalRecord>> {
        let sku = sku.to_string();
        self.db.run_blocking(move |conn| query_one(conn, "sku", &sku)).await
    }

    async fn list(&self, query: ProductQuery) -> Result<Vec<CanonicalRecord>> {
        self.db
            .run_blocking(move |conn| {
                let mut stmt =
                    conn.prepare(&format!("{SELECT_PRODUCT} ORDER BY sku LIMIT ?1 OFFSET ?2"))?;
                let rows = stmt
                    .query_map(params![to_i64(query.limit), to_i64(query.offset)], raw_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                rows.into_iter().map(RawProduct::into_record).collect()
            })
            .await
    }

    async fn create(&self, product: &NewProduct) -> Result<CanonicalRecord> {
        if product.sku.trim().is_empty() {
            return Err(MatSyncError::InvalidInput("product SKU must not be empty".into()));
        }
        let product = product.clone();
        self.db.run_blocking(move |conn| insert_product(conn, product)).await
    }

    async fn update(&self, id: Uuid, fields: &ProductFields) -> Result<CanonicalRecord> {
        let fields = fields.clone();
        self.db.run_blocking(move |conn| update_product(conn, id, fields)).await
    }
}

fn query_one(
    conn: &SqliteConnection,
    column: &str,
    value: &str,
) -> std::result::Result<Option<CanonicalRecord>, InfraError> {
    let row = conn
        .query_row(&format!("{SELECT_PRODUCT} WHERE {column} = ?1"), params![value], raw_row)
        .optional()?;
    row.map(RawProduct::into_record).transpose()
}

fn insert_product(
    conn: &SqliteConnection,
    product: NewProduct,
) -> std::result::Result<CanonicalRecord, InfraError> {
    let record = CanonicalRecord {
        id: Uuid::new_v4(),
        sku: product.sku,
        fields: product.fields,
        last_modified: now(),
    };
    let stamp = encode_time(record.last_modified);
    conn.execute(
        "INSERT INTO products (id, sku, fields, created_at, last_modified)
         VALUES (?1, ?2, ?3, ?4, ?4)",
        params![record.id.to_string(), record.sku, encode_json(&record.fields)?, stamp],
    )?;
    Ok(record)
}

fn update_product(
    conn: &SqliteConnection,
    id: Uuid,
    fields: ProductFields,
) -> std::result::Result<CanonicalRecord, InfraError> {
    let last_modified = now();
    let changed = conn.execute(
        "UPDATE products SET fields = ?1, last_modified = ?2 WHERE id = ?3",
        params![encode_json(&fields)?, encode_time(last_modified), id.to_string()],
    )?;
    if changed == 0 {
        return Err(InfraError(MatSyncError::NotFound(format!("product {id}"))));
    }
    query_one(conn, "id", &id.to_string())?
        .ok_or_else(|| InfraError(MatSyncError::NotFound(format!("product {id}"))))
}

fn to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

struct RawProduct {
    id: String,
    sku: String,
    fields: String,
    last_modified: String,
}

fn raw_row(row: &Row<'_>) -> rusqlite::Result<RawProduct> {
    Ok(RawProduct {
        id: row.get(0)?,
        sku: row.get(1)?,
        fields: row.get(2)?,
        last_modified: row.get(3)?,
    })
}

impl RawProduct {
    fn into_record(self) -> std::result::Result<CanonicalRecord, InfraError> {
        Ok(CanonicalRecord {
            id: decode_uuid(&self.id)?,
            sku: self.sku,
            fields: decode_json(&self.fields)?,
            last_modified: decode_time(&self.last_modified)?,
        })
    }
}
