//! Postgres-backed movement history.
//!
//! Reads from the ERP's operational tables:
//! - `transfers(id, status, from_location_id, to_location_id)`
//! - `transfer_items(transfer_id, item_id, quantity)`
//! - `inventory_adjustments(item_id, adjustment)`
//! - `purchase_orders(id, status, store_id)`
//! - `purchase_order_items(purchase_order_id, item_id, quantity_received)`
//!
//! Identifiers are selected as text so a single bad value rejects one row
//! (see [`super::rows`]) instead of failing the query.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use retailerp_inventory::{AdjustmentRecord, ReceiptLine, TransferLine};

use super::rows::{
    AdjustmentRow, PurchaseOrderHeaderRow, ReceiptRow, TransferHeaderRow, TransferLineRow, decode_rows,
};
use super::{MovementSource, PURCHASE_ORDER_STATUS_RECEIVED, SourceError, TRANSFER_STATUS_COMPLETED};

#[derive(Debug, Clone)]
pub struct PostgresMovementSource {
    pool: Arc<PgPool>,
}

impl PostgresMovementSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }
}

fn query_error(what: &'static str) -> impl FnOnce(sqlx::Error) -> SourceError {
    move |e| SourceError::Query {
        what,
        message: e.to_string(),
    }
}

fn column<T>(row: &PgRow, what: &'static str, name: &str) -> Result<Option<T>, SourceError>
where
    for<'r> Option<T>: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get::<Option<T>, _>(name).map_err(|e| SourceError::Decode {
        what,
        message: format!("column `{name}`: {e}"),
    })
}

#[async_trait]
impl MovementSource for PostgresMovementSource {
    #[instrument(skip(self), fields(operation = "completed_transfer_lines"), err)]
    async fn completed_transfer_lines(&self) -> Result<Vec<TransferLine>, SourceError> {
        const WHAT: &str = "transfer_items";

        let rows = sqlx::query(
            r#"
            SELECT
                ti.item_id::text          AS item_id,
                ti.quantity::bigint       AS quantity,
                t.status                  AS status,
                t.from_location_id::text  AS from_location_id,
                t.to_location_id::text    AS to_location_id
            FROM transfer_items ti
            JOIN transfers t ON t.id = ti.transfer_id
            WHERE t.status = $1
            "#,
        )
        .bind(TRANSFER_STATUS_COMPLETED)
        .fetch_all(&*self.pool)
        .await
        .map_err(query_error(WHAT))?;

        let mut loose = Vec::with_capacity(rows.len());
        for row in &rows {
            loose.push(TransferLineRow {
                item_id: column(row, WHAT, "item_id")?,
                quantity: column(row, WHAT, "quantity")?,
                transfer: Some(TransferHeaderRow {
                    status: column(row, WHAT, "status")?,
                    from_location_id: column(row, WHAT, "from_location_id")?,
                    to_location_id: column(row, WHAT, "to_location_id")?,
                }),
            });
        }

        let lines: Vec<TransferLine> = decode_rows(WHAT, loose);
        tracing::debug!(rows = rows.len(), decoded = lines.len(), "read completed transfer lines");
        Ok(lines)
    }

    #[instrument(skip(self), fields(operation = "adjustments"), err)]
    async fn adjustments(&self) -> Result<Vec<AdjustmentRecord>, SourceError> {
        const WHAT: &str = "inventory_adjustments";

        let rows = sqlx::query(
            r#"
            SELECT
                item_id::text        AS item_id,
                adjustment::bigint   AS adjustment
            FROM inventory_adjustments
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(query_error(WHAT))?;

        let mut loose = Vec::with_capacity(rows.len());
        for row in &rows {
            loose.push(AdjustmentRow {
                item_id: column(row, WHAT, "item_id")?,
                adjustment: column(row, WHAT, "adjustment")?,
            });
        }

        let records: Vec<AdjustmentRecord> = decode_rows(WHAT, loose);
        tracing::debug!(rows = rows.len(), decoded = records.len(), "read adjustments");
        Ok(records)
    }

    #[instrument(skip(self), fields(operation = "received_purchase_lines"), err)]
    async fn received_purchase_lines(&self) -> Result<Vec<ReceiptLine>, SourceError> {
        const WHAT: &str = "purchase_order_items";

        let rows = sqlx::query(
            r#"
            SELECT
                poi.item_id::text               AS item_id,
                poi.quantity_received::bigint   AS quantity_received,
                po.status                       AS status,
                po.store_id::text               AS store_id
            FROM purchase_order_items poi
            JOIN purchase_orders po ON po.id = poi.purchase_order_id
            WHERE po.status = $1
              AND poi.quantity_received > 0
            "#,
        )
        .bind(PURCHASE_ORDER_STATUS_RECEIVED)
        .fetch_all(&*self.pool)
        .await
        .map_err(query_error(WHAT))?;

        let mut loose = Vec::with_capacity(rows.len());
        for row in &rows {
            loose.push(ReceiptRow {
                item_id: column(row, WHAT, "item_id")?,
                quantity_received: column(row, WHAT, "quantity_received")?,
                purchase_order: Some(PurchaseOrderHeaderRow {
                    status: column(row, WHAT, "status")?,
                    store_id: column(row, WHAT, "store_id")?,
                }),
            });
        }

        let lines: Vec<ReceiptLine> = decode_rows(WHAT, loose);
        tracing::debug!(rows = rows.len(), decoded = lines.len(), "read received purchase lines");
        Ok(lines)
    }
}
