//! Postgres-backed snapshot table.
//!
//! Table: `inventory(item_id uuid, store_id uuid NULL, quantity integer, updated_at timestamptz)`.
//! A NULL `store_id` is the unlocated bucket, so key matching is null-safe
//! (`IS NOT DISTINCT FROM`).

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use retailerp_core::{ItemId, LocationId};
use retailerp_inventory::StockKey;

use super::{SnapshotStore, StockSnapshot, StoreError};

#[derive(Debug, Clone)]
pub struct PostgresSnapshotStore {
    pool: Arc<PgPool>,
}

impl PostgresSnapshotStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }
}

fn backend(operation: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |e| StoreError::Backend {
        operation,
        message: e.to_string(),
    }
}

fn snapshot_from_row(row: &PgRow, operation: &'static str) -> Result<StockSnapshot, StoreError> {
    let item_id: Uuid = row.try_get("item_id").map_err(backend(operation))?;
    let store_id: Option<Uuid> = row.try_get("store_id").map_err(backend(operation))?;
    let quantity: i64 = row.try_get("quantity").map_err(backend(operation))?;

    Ok(StockSnapshot {
        item_id: ItemId::from_uuid(item_id),
        location_id: store_id.map(LocationId::from_uuid),
        quantity,
    })
}

#[async_trait]
impl SnapshotStore for PostgresSnapshotStore {
    #[instrument(skip(self, key), fields(key = %key), err)]
    async fn find(&self, key: &StockKey) -> Result<Option<StockSnapshot>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT item_id, store_id, quantity::bigint AS quantity
            FROM inventory
            WHERE item_id = $1 AND store_id IS NOT DISTINCT FROM $2
            LIMIT 1
            "#,
        )
        .bind(key.item_id.as_uuid())
        .bind(key.location_id.map(Uuid::from))
        .fetch_optional(&*self.pool)
        .await
        .map_err(backend("find"))?;

        row.as_ref().map(|r| snapshot_from_row(r, "find")).transpose()
    }

    #[instrument(skip(self, key), fields(key = %key), err)]
    async fn update(&self, key: &StockKey, quantity: i64) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE inventory
            SET quantity = $3, updated_at = NOW()
            WHERE item_id = $1 AND store_id IS NOT DISTINCT FROM $2
            "#,
        )
        .bind(key.item_id.as_uuid())
        .bind(key.location_id.map(Uuid::from))
        .bind(quantity)
        .execute(&*self.pool)
        .await
        .map_err(backend("update"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Missing(*key));
        }
        Ok(())
    }

    #[instrument(skip(self, key), fields(key = %key), err)]
    async fn insert(&self, key: &StockKey, quantity: i64) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO inventory (item_id, store_id, quantity)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(key.item_id.as_uuid())
        .bind(key.location_id.map(Uuid::from))
        .bind(quantity)
        .execute(&*self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.code().as_deref() == Some("23505") => {
                StoreError::Duplicate(*key)
            }
            other => backend("insert")(other),
        })?;

        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn list(&self) -> Result<Vec<StockSnapshot>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT item_id, store_id, quantity::bigint AS quantity
            FROM inventory
            ORDER BY item_id ASC, store_id ASC NULLS FIRST
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(backend("list"))?;

        rows.iter().map(|r| snapshot_from_row(r, "list")).collect()
    }
}
