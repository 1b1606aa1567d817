use serde::{Deserialize, Serialize};

use retailerp_core::{ItemId, LocationId};

/// One line of a completed transfer, flattened with its parent's locations.
///
/// Only lines of transfers whose status is `completed` are ever turned into
/// this type; the status filter is applied where rows are read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferLine {
    pub item_id: ItemId,
    pub quantity: i64,
    pub from_location_id: Option<LocationId>,
    pub to_location_id: Option<LocationId>,
}

/// Manual stock adjustment. Carries no location; lands in the unlocated bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentRecord {
    pub item_id: ItemId,
    /// Signed quantity change.
    pub adjustment: i64,
}

/// Received purchase-order line, attributed to the receiving location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptLine {
    pub item_id: ItemId,
    pub quantity_received: i64,
    pub location_id: Option<LocationId>,
}

/// Everything a single reconstruction run read from the movement sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovementBatch {
    pub transfers: Vec<TransferLine>,
    pub adjustments: Vec<AdjustmentRecord>,
    /// Empty unless purchase receipts were requested for this run.
    pub receipts: Vec<ReceiptLine>,
}

impl MovementBatch {
    pub fn new(transfers: Vec<TransferLine>, adjustments: Vec<AdjustmentRecord>) -> Self {
        Self {
            transfers,
            adjustments,
            receipts: Vec::new(),
        }
    }

    pub fn with_receipts(mut self, receipts: Vec<ReceiptLine>) -> Self {
        self.receipts = receipts;
        self
    }

    pub fn record_count(&self) -> usize {
        self.transfers.len() + self.adjustments.len() + self.receipts.len()
    }
}
