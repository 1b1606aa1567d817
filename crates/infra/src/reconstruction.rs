//! Stock reconstruction run: read movement history, fold it into totals,
//! write the totals over the snapshot table.
//!
//! ```text
//! MovementSource ──(concurrent reads, fail-fast)──▶ MovementBatch
//!        │
//!        ▼
//! accumulate() ──▶ StockLevels ──(per key: find → update | insert)──▶ SnapshotStore
//! ```
//!
//! A failed read aborts before anything is written. A failed write for one
//! key becomes a warning and the remaining keys are still written; nothing is
//! rolled back. Runs are full recomputes and assume no concurrent run against
//! the same tables.
//!
//! Sales are not part of the history: sale records carry no location, so
//! they cannot be attributed to a snapshot row.

use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use retailerp_inventory::{MovementBatch, StockLevels, accumulate};

use crate::movement_source::{MovementSource, SourceError, read_movements};
use crate::snapshot_store::SnapshotStore;

#[derive(Debug, Error)]
pub enum ReconstructionError {
    /// Reading the movement history failed; nothing was written.
    #[error("failed to read movement history: {0}")]
    DataAccess(#[from] SourceError),
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ReconstructionOptions {
    /// Also count received purchase-order lines as inbound stock.
    pub include_purchase_receipts: bool,
}

/// What the snapshot writer did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteOutcome {
    pub updated: u64,
    pub inserted: u64,
    /// Keys left untouched because their total was zero.
    pub skipped_zero: u64,
    /// One entry per key whose write failed.
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconstructionStats {
    pub items_processed: u64,
    pub stores_processed: u64,
    pub po_items_processed: u64,
    pub inventory_entries_updated: u64,
    pub inventory_entries_inserted: u64,
}

/// Response body of a reconstruction run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconstructionReport {
    pub success: bool,
    pub message: String,
    pub stats: ReconstructionStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<String>>,
}

impl ReconstructionReport {
    fn completed(batch: &MovementBatch, levels: &StockLevels, outcome: WriteOutcome) -> Self {
        let stats = ReconstructionStats {
            items_processed: levels.distinct_items().len() as u64,
            stores_processed: levels.distinct_locations().len() as u64,
            po_items_processed: batch.receipts.len() as u64,
            inventory_entries_updated: outcome.updated,
            inventory_entries_inserted: outcome.inserted,
        };

        let mut message = format!(
            "Inventory recalculated: {} updated, {} inserted, {} unchanged (zero net movement)",
            outcome.updated, outcome.inserted, outcome.skipped_zero
        );
        let warnings = if outcome.warnings.is_empty() {
            None
        } else {
            message.push_str(&format!("; completed with {} warning(s)", outcome.warnings.len()));
            Some(outcome.warnings)
        };

        Self {
            success: true,
            message,
            stats,
            warnings,
        }
    }

    /// Report for a run that aborted before writing.
    pub fn failure(err: &ReconstructionError) -> Self {
        Self {
            success: false,
            message: format!("Inventory recalculation failed: {err}"),
            stats: ReconstructionStats::default(),
            warnings: None,
        }
    }

    pub fn has_warnings(&self) -> bool {
        self.warnings.as_ref().is_some_and(|w| !w.is_empty())
    }
}

/// Write every nonzero total over the snapshot table.
///
/// Existing rows get their quantity replaced (not incremented); missing rows
/// are inserted. Zero totals are skipped: existing rows are neither zeroed
/// nor deleted, and no empty rows are created.
pub async fn write_snapshots<S>(store: &S, levels: &StockLevels) -> WriteOutcome
where
    S: SnapshotStore + ?Sized,
{
    let mut outcome = WriteOutcome::default();

    for (key, total) in levels.iter() {
        if total == 0 {
            outcome.skipped_zero += 1;
            continue;
        }

        let result = match store.find(key).await {
            Ok(Some(_)) => store.update(key, total).await.map(|()| outcome.updated += 1),
            Ok(None) => store.insert(key, total).await.map(|()| outcome.inserted += 1),
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            tracing::warn!(key = %key, quantity = total, error = %e, "snapshot write failed");
            outcome.warnings.push(format!("{key}: {e}"));
        }
    }

    outcome
}

/// One-shot stock reconstruction over a movement source and a snapshot store.
#[derive(Debug)]
pub struct StockReconstruction<M, S> {
    source: M,
    store: S,
    options: ReconstructionOptions,
}

impl<M, S> StockReconstruction<M, S>
where
    M: MovementSource,
    S: SnapshotStore,
{
    pub fn new(source: M, store: S, options: ReconstructionOptions) -> Self {
        Self { source, store, options }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    #[instrument(skip(self), fields(include_receipts = self.options.include_purchase_receipts))]
    pub async fn run(&self) -> Result<ReconstructionReport, ReconstructionError> {
        let batch = match read_movements(&self.source, &self.options).await {
            Ok(batch) => batch,
            Err(e) => {
                tracing::error!(error = %e, "stock reconstruction aborted");
                return Err(e.into());
            }
        };
        tracing::info!(
            transfers = batch.transfers.len(),
            adjustments = batch.adjustments.len(),
            receipts = batch.receipts.len(),
            "movement history loaded"
        );

        let levels = accumulate(&batch);
        tracing::info!(keys = levels.len(), nonzero = levels.nonzero().count(), "stock totals accumulated");

        let saturated: Vec<String> = levels
            .saturated()
            .map(|key| {
                tracing::warn!(key = %key, total = levels.get(key), "stock total saturated at i64 bounds");
                format!("{key}: quantity saturated at i64 bounds")
            })
            .collect();

        let mut outcome = write_snapshots(&self.store, &levels).await;
        tracing::info!(
            updated = outcome.updated,
            inserted = outcome.inserted,
            skipped_zero = outcome.skipped_zero,
            failed = outcome.warnings.len(),
            "snapshots written"
        );
        outcome.warnings.extend(saturated);

        Ok(ReconstructionReport::completed(&batch, &levels, outcome))
    }
}
