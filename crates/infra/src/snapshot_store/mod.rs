//! Persisted stock snapshots: one current-quantity row per (item, location).

pub mod in_memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use retailerp_core::{ItemId, LocationId};
use retailerp_inventory::StockKey;

pub use in_memory::InMemorySnapshotStore;
pub use postgres::PostgresSnapshotStore;

/// Current quantity for one (item, location) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub item_id: ItemId,
    pub location_id: Option<LocationId>,
    pub quantity: i64,
}

/// Snapshot lookup or write failure.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{operation} failed: {message}")]
    Backend {
        operation: &'static str,
        message: String,
    },

    #[error("no snapshot row matched {0}")]
    Missing(StockKey),

    #[error("snapshot row already exists for {0}")]
    Duplicate(StockKey),
}

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn find(&self, key: &StockKey) -> Result<Option<StockSnapshot>, StoreError>;

    /// Overwrite the quantity of an existing row.
    async fn update(&self, key: &StockKey, quantity: i64) -> Result<(), StoreError>;

    async fn insert(&self, key: &StockKey, quantity: i64) -> Result<(), StoreError>;

    /// All rows, ordered by item then location (unlocated first).
    async fn list(&self) -> Result<Vec<StockSnapshot>, StoreError>;
}

#[async_trait]
impl<S> SnapshotStore for Arc<S>
where
    S: SnapshotStore + ?Sized,
{
    async fn find(&self, key: &StockKey) -> Result<Option<StockSnapshot>, StoreError> {
        (**self).find(key).await
    }

    async fn update(&self, key: &StockKey, quantity: i64) -> Result<(), StoreError> {
        (**self).update(key, quantity).await
    }

    async fn insert(&self, key: &StockKey, quantity: i64) -> Result<(), StoreError> {
        (**self).insert(key, quantity).await
    }

    async fn list(&self) -> Result<Vec<StockSnapshot>, StoreError> {
        (**self).list().await
    }
}
