use std::sync::RwLock;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

use retailerp_inventory::{AdjustmentRecord, MovementBatch, ReceiptLine, TransferLine};

use super::rows::{AdjustmentRow, ReceiptRow, TransferLineRow, decode_rows};
use super::{MovementSource, SourceError};

/// In-memory movement history.
///
/// Intended for tests/dev. Holds records that are already filtered: every
/// transfer line is from a completed transfer, every receipt from a received
/// purchase order.
#[derive(Debug, Default)]
pub struct InMemoryMovementSource {
    inner: RwLock<MovementBatch>,
}

impl InMemoryMovementSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batch(batch: MovementBatch) -> Self {
        Self {
            inner: RwLock::new(batch),
        }
    }

    /// Build from JSON arrays shaped like the REST gateway's rows.
    ///
    /// Rows of transfers that are not completed (or purchase orders not
    /// received) are filtered out; malformed rows are dropped with a warning.
    pub fn from_json_rows(
        transfers: JsonValue,
        adjustments: JsonValue,
        receipts: JsonValue,
    ) -> Result<Self, SourceError> {
        let transfer_rows: Vec<TransferLineRow> = parse_rows("transfer_items", transfers)?;
        let adjustment_rows: Vec<AdjustmentRow> = parse_rows("inventory_adjustments", adjustments)?;
        let receipt_rows: Vec<ReceiptRow> = parse_rows("purchase_order_items", receipts)?;

        let batch = MovementBatch::new(
            decode_rows("transfer_items", transfer_rows.into_iter().filter(|r| r.is_completed())),
            decode_rows("inventory_adjustments", adjustment_rows),
        )
        .with_receipts(decode_rows(
            "purchase_order_items",
            receipt_rows.into_iter().filter(|r| r.is_received()),
        ));

        Ok(Self::with_batch(batch))
    }

    pub fn record_transfer(&self, line: TransferLine) -> Result<(), SourceError> {
        self.write(|b| b.transfers.push(line))
    }

    pub fn record_adjustment(&self, adjustment: AdjustmentRecord) -> Result<(), SourceError> {
        self.write(|b| b.adjustments.push(adjustment))
    }

    pub fn record_receipt(&self, receipt: ReceiptLine) -> Result<(), SourceError> {
        self.write(|b| b.receipts.push(receipt))
    }

    fn write(&self, f: impl FnOnce(&mut MovementBatch)) -> Result<(), SourceError> {
        let mut batch = self.inner.write().map_err(|_| poisoned())?;
        f(&mut *batch);
        Ok(())
    }

    fn read<T>(&self, f: impl FnOnce(&MovementBatch) -> T) -> Result<T, SourceError> {
        let batch = self.inner.read().map_err(|_| poisoned())?;
        Ok(f(&*batch))
    }
}

fn poisoned() -> SourceError {
    SourceError::Unavailable("movement history lock poisoned".to_string())
}

fn parse_rows<R: DeserializeOwned>(what: &'static str, value: JsonValue) -> Result<Vec<R>, SourceError> {
    serde_json::from_value(value).map_err(|e| SourceError::Decode {
        what,
        message: e.to_string(),
    })
}

#[async_trait]
impl MovementSource for InMemoryMovementSource {
    async fn completed_transfer_lines(&self) -> Result<Vec<TransferLine>, SourceError> {
        self.read(|b| b.transfers.clone())
    }

    async fn adjustments(&self) -> Result<Vec<AdjustmentRecord>, SourceError> {
        self.read(|b| b.adjustments.clone())
    }

    async fn received_purchase_lines(&self) -> Result<Vec<ReceiptLine>, SourceError> {
        self.read(|b| b.receipts.clone())
    }
}
