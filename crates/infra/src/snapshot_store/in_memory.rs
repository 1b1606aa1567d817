use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use retailerp_inventory::StockKey;

use super::{SnapshotStore, StockSnapshot, StoreError};

/// In-memory snapshot table for tests/dev.
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    rows: RwLock<BTreeMap<StockKey, i64>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a row in place directly, bypassing insert/update semantics.
    pub fn seed(&self, key: StockKey, quantity: i64) -> Result<(), StoreError> {
        let mut rows = self.rows.write().map_err(|_| poisoned("seed"))?;
        rows.insert(key, quantity);
        Ok(())
    }

    pub fn quantity(&self, key: &StockKey) -> Option<i64> {
        self.rows.read().ok()?.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.rows.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned(operation: &'static str) -> StoreError {
    StoreError::Backend {
        operation,
        message: "snapshot table lock poisoned".to_string(),
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn find(&self, key: &StockKey) -> Result<Option<StockSnapshot>, StoreError> {
        let rows = self.rows.read().map_err(|_| poisoned("find"))?;
        Ok(rows.get(key).map(|quantity| StockSnapshot {
            item_id: key.item_id,
            location_id: key.location_id,
            quantity: *quantity,
        }))
    }

    async fn update(&self, key: &StockKey, quantity: i64) -> Result<(), StoreError> {
        let mut rows = self.rows.write().map_err(|_| poisoned("update"))?;
        match rows.get_mut(key) {
            Some(current) => {
                *current = quantity;
                Ok(())
            }
            None => Err(StoreError::Missing(*key)),
        }
    }

    async fn insert(&self, key: &StockKey, quantity: i64) -> Result<(), StoreError> {
        let mut rows = self.rows.write().map_err(|_| poisoned("insert"))?;
        if rows.contains_key(key) {
            return Err(StoreError::Duplicate(*key));
        }
        rows.insert(*key, quantity);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<StockSnapshot>, StoreError> {
        let rows = self.rows.read().map_err(|_| poisoned("list"))?;
        Ok(rows
            .iter()
            .map(|(key, quantity)| StockSnapshot {
                item_id: key.item_id,
                location_id: key.location_id,
                quantity: *quantity,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use retailerp_core::{ItemId, LocationId};

    #[tokio::test]
    async fn update_replaces_and_requires_existing_row() {
        let store = InMemorySnapshotStore::new();
        let key = StockKey::at(ItemId::new(), LocationId::new());

        assert!(matches!(store.update(&key, 3).await, Err(StoreError::Missing(_))));

        store.insert(&key, 10).await.unwrap();
        store.update(&key, 4).await.unwrap();
        assert_eq!(store.quantity(&key), Some(4));
    }

    #[tokio::test]
    async fn insert_refuses_duplicates() {
        let store = InMemorySnapshotStore::new();
        let key = StockKey::unlocated(ItemId::new());

        store.insert(&key, 1).await.unwrap();
        assert!(matches!(store.insert(&key, 2).await, Err(StoreError::Duplicate(_))));
        assert_eq!(store.quantity(&key), Some(1));
    }

    #[tokio::test]
    async fn list_puts_unlocated_bucket_first() {
        let store = InMemorySnapshotStore::new();
        let item = ItemId::new();
        store.seed(StockKey::at(item, LocationId::new()), 2).unwrap();
        store.seed(StockKey::unlocated(item), 5).unwrap();

        let rows = store.list().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].location_id, None);
        assert_eq!(rows[0].quantity, 5);
    }

    #[tokio::test]
    async fn poisoned_lock_fails_seed_and_writes() {
        let store = std::sync::Arc::new(InMemorySnapshotStore::new());
        let holder = store.clone();
        let _ = std::thread::spawn(move || {
            let _guard = holder.rows.write().unwrap();
            panic!("writer died holding the lock");
        })
        .join();

        let key = StockKey::unlocated(ItemId::new());
        assert!(matches!(
            store.seed(key, 1),
            Err(StoreError::Backend { operation: "seed", .. })
        ));
        assert!(matches!(
            store.insert(&key, 1).await,
            Err(StoreError::Backend { operation: "insert", .. })
        ));
    }
}
