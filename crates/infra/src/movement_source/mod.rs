//! Movement Source Reader: where reconstruction gets its history from.
//!
//! Implementations return already-typed records; loose rows are mapped at the
//! boundary by [`rows`], and malformed rows are dropped with a warning rather
//! than failing the whole read.

pub mod in_memory;
pub mod postgres;
pub mod rows;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use retailerp_inventory::{AdjustmentRecord, MovementBatch, ReceiptLine, TransferLine};

use crate::reconstruction::ReconstructionOptions;

pub use in_memory::InMemoryMovementSource;
pub use postgres::PostgresMovementSource;

/// Transfer status whose lines count as executed stock movements.
pub const TRANSFER_STATUS_COMPLETED: &str = "completed";

/// Purchase-order status whose lines count as received stock.
pub const PURCHASE_ORDER_STATUS_RECEIVED: &str = "received";

/// A read from the movement history failed. Aborts the run.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{what} query failed: {message}")]
    Query { what: &'static str, message: String },

    #[error("failed to decode {what}: {message}")]
    Decode { what: &'static str, message: String },

    #[error("movement source unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait MovementSource: Send + Sync {
    /// Lines of transfers whose status is `completed`, with parent locations.
    async fn completed_transfer_lines(&self) -> Result<Vec<TransferLine>, SourceError>;

    /// Every manual adjustment on record.
    async fn adjustments(&self) -> Result<Vec<AdjustmentRecord>, SourceError>;

    /// Lines of received purchase orders, attributed to the receiving store.
    async fn received_purchase_lines(&self) -> Result<Vec<ReceiptLine>, SourceError>;
}

#[async_trait]
impl<M> MovementSource for Arc<M>
where
    M: MovementSource + ?Sized,
{
    async fn completed_transfer_lines(&self) -> Result<Vec<TransferLine>, SourceError> {
        (**self).completed_transfer_lines().await
    }

    async fn adjustments(&self) -> Result<Vec<AdjustmentRecord>, SourceError> {
        (**self).adjustments().await
    }

    async fn received_purchase_lines(&self) -> Result<Vec<ReceiptLine>, SourceError> {
        (**self).received_purchase_lines().await
    }
}

/// Read everything one run needs. The reads are independent and issued
/// concurrently; the first failure wins and nothing is returned.
pub async fn read_movements<M>(
    source: &M,
    options: &ReconstructionOptions,
) -> Result<MovementBatch, SourceError>
where
    M: MovementSource + ?Sized,
{
    let receipts = async {
        if options.include_purchase_receipts {
            source.received_purchase_lines().await
        } else {
            Ok(Vec::new())
        }
    };

    let (transfers, adjustments, receipts) =
        tokio::try_join!(source.completed_transfer_lines(), source.adjustments(), receipts)?;

    Ok(MovementBatch::new(transfers, adjustments).with_receipts(receipts))
}
