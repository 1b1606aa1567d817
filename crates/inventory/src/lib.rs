//! Inventory stock reconstruction (domain side).
//!
//! This crate turns movement history (completed transfers, manual adjustments,
//! optionally purchase receipts) into per-item, per-location stock totals.
//! It is deterministic domain logic only: no IO, no HTTP, no storage.

pub mod levels;
pub mod movement;

pub use levels::{StockKey, StockLevels, accumulate};
pub use movement::{AdjustmentRecord, MovementBatch, ReceiptLine, TransferLine};
