//! Delta accumulation: movement history -> signed totals per (item, location).

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use retailerp_core::{ItemId, LocationId};

use crate::movement::MovementBatch;

/// Composite stock identity. `location_id = None` is the unlocated bucket.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StockKey {
    pub item_id: ItemId,
    pub location_id: Option<LocationId>,
}

impl StockKey {
    pub fn new(item_id: ItemId, location_id: Option<LocationId>) -> Self {
        Self { item_id, location_id }
    }

    pub fn at(item_id: ItemId, location_id: LocationId) -> Self {
        Self::new(item_id, Some(location_id))
    }

    pub fn unlocated(item_id: ItemId) -> Self {
        Self::new(item_id, None)
    }
}

impl core::fmt::Display for StockKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.location_id {
            Some(loc) => write!(f, "item {} @ location {}", self.item_id, loc),
            None => write!(f, "item {} @ unlocated", self.item_id),
        }
    }
}

/// Reconstructed stock totals, one entry per [`StockKey`] touched by the input.
///
/// Entries whose total nets out to zero are kept; dropping them is the
/// writer's decision, not the accumulator's.
///
/// Totals clamp at the `i64` bounds instead of wrapping. Keys that hit a
/// bound are listed by [`StockLevels::saturated`] and their totals are not
/// the true algebraic sum.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StockLevels {
    totals: BTreeMap<StockKey, i64>,
    saturated: BTreeSet<StockKey>,
}

impl StockLevels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a signed delta to `key`, starting from 0 when absent.
    pub fn add(&mut self, key: StockKey, delta: i64) {
        let total = self.totals.entry(key).or_insert(0);
        match total.checked_add(delta) {
            Some(sum) => *total = sum,
            None => {
                *total = total.saturating_add(delta);
                self.saturated.insert(key);
            }
        }
    }

    /// Take `quantity` away from `key`.
    pub fn remove(&mut self, key: StockKey, quantity: i64) {
        match quantity.checked_neg() {
            Some(delta) => self.add(key, delta),
            // -i64::MIN does not fit; apply it in two steps.
            None => {
                self.add(key, i64::MAX);
                self.add(key, 1);
            }
        }
    }

    pub fn get(&self, key: &StockKey) -> Option<i64> {
        self.totals.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// All entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&StockKey, i64)> + '_ {
        self.totals.iter().map(|(k, v)| (k, *v))
    }

    /// Entries with a nonzero total, in key order.
    pub fn nonzero(&self) -> impl Iterator<Item = (&StockKey, i64)> + '_ {
        self.iter().filter(|(_, v)| *v != 0)
    }

    pub fn distinct_items(&self) -> BTreeSet<ItemId> {
        self.totals.keys().map(|k| k.item_id).collect()
    }

    /// Keys whose total hit `i64::MIN` or `i64::MAX` at some point.
    pub fn saturated(&self) -> impl Iterator<Item = &StockKey> + '_ {
        self.saturated.iter()
    }

    /// Locations referenced by any entry (the unlocated bucket is not a location).
    pub fn distinct_locations(&self) -> BTreeSet<LocationId> {
        self.totals.keys().filter_map(|k| k.location_id).collect()
    }
}

impl FromIterator<(StockKey, i64)> for StockLevels {
    fn from_iter<T: IntoIterator<Item = (StockKey, i64)>>(iter: T) -> Self {
        let mut levels = StockLevels::new();
        for (key, delta) in iter {
            levels.add(key, delta);
        }
        levels
    }
}

/// Fold a batch of movement records into stock totals.
///
/// - transfer line: `-quantity` at the source location, `+quantity` at the
///   destination, each only when that side is present
/// - adjustment: `+adjustment` on the item's unlocated bucket
/// - receipt: `+quantity_received` at the receiving location
///
/// Pure and order-independent; every record contributes exactly once.
pub fn accumulate(batch: &MovementBatch) -> StockLevels {
    let mut levels = StockLevels::new();

    for line in &batch.transfers {
        if let Some(from) = line.from_location_id {
            levels.remove(StockKey::at(line.item_id, from), line.quantity);
        }
        if let Some(to) = line.to_location_id {
            levels.add(StockKey::at(line.item_id, to), line.quantity);
        }
    }

    for adj in &batch.adjustments {
        levels.add(StockKey::unlocated(adj.item_id), adj.adjustment);
    }

    for receipt in &batch.receipts {
        levels.add(StockKey::new(receipt.item_id, receipt.location_id), receipt.quantity_received);
    }

    levels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::{AdjustmentRecord, ReceiptLine, TransferLine};
    use proptest::prelude::*;
    use uuid::Uuid;

    fn item(n: u128) -> ItemId {
        ItemId::from_uuid(Uuid::from_u128(n))
    }

    fn loc(n: u128) -> LocationId {
        LocationId::from_uuid(Uuid::from_u128(0x1000 + n))
    }

    fn transfer(item_id: ItemId, qty: i64, from: Option<LocationId>, to: Option<LocationId>) -> TransferLine {
        TransferLine {
            item_id,
            quantity: qty,
            from_location_id: from,
            to_location_id: to,
        }
    }

    #[test]
    fn single_transfer_moves_stock_between_locations() {
        let (x, a, b) = (item(1), loc(1), loc(2));
        let batch = MovementBatch::new(vec![transfer(x, 5, Some(a), Some(b))], vec![]);

        let levels = accumulate(&batch);

        assert_eq!(levels.len(), 2);
        assert_eq!(levels.get(&StockKey::at(x, a)), Some(-5));
        assert_eq!(levels.get(&StockKey::at(x, b)), Some(5));
    }

    #[test]
    fn adjustment_lands_in_unlocated_bucket() {
        let y = item(2);
        let batch = MovementBatch::new(vec![], vec![AdjustmentRecord { item_id: y, adjustment: -3 }]);

        let levels = accumulate(&batch);

        assert_eq!(levels.len(), 1);
        assert_eq!(levels.get(&StockKey::unlocated(y)), Some(-3));
    }

    #[test]
    fn transfer_and_adjustment_keys_stay_separate() {
        let (x, a, b) = (item(1), loc(1), loc(2));
        let batch = MovementBatch::new(
            vec![transfer(x, 10, Some(a), Some(b))],
            vec![AdjustmentRecord { item_id: x, adjustment: -10 }],
        );

        let levels = accumulate(&batch);

        assert_eq!(levels.len(), 3);
        assert_eq!(levels.get(&StockKey::at(x, a)), Some(-10));
        assert_eq!(levels.get(&StockKey::at(x, b)), Some(10));
        assert_eq!(levels.get(&StockKey::unlocated(x)), Some(-10));
    }

    #[test]
    fn round_trip_transfers_net_to_zero_but_are_kept() {
        let (x, a, b) = (item(1), loc(1), loc(2));
        let batch = MovementBatch::new(
            vec![transfer(x, 4, Some(a), Some(b)), transfer(x, 4, Some(b), Some(a))],
            vec![],
        );

        let levels = accumulate(&batch);

        assert_eq!(levels.get(&StockKey::at(x, a)), Some(0));
        assert_eq!(levels.get(&StockKey::at(x, b)), Some(0));
        assert_eq!(levels.nonzero().count(), 0);
    }

    #[test]
    fn transfer_without_locations_is_a_noop() {
        let batch = MovementBatch::new(vec![transfer(item(1), 7, None, None)], vec![]);
        assert!(accumulate(&batch).is_empty());
    }

    #[test]
    fn one_sided_transfer_only_touches_present_side() {
        let (x, a) = (item(1), loc(1));
        let batch = MovementBatch::new(vec![transfer(x, 3, None, Some(a))], vec![]);

        let levels = accumulate(&batch);

        assert_eq!(levels.len(), 1);
        assert_eq!(levels.get(&StockKey::at(x, a)), Some(3));
    }

    #[test]
    fn receipts_add_at_receiving_location() {
        let (x, a) = (item(1), loc(1));
        let batch = MovementBatch::new(vec![transfer(x, 2, Some(a), None)], vec![]).with_receipts(vec![
            ReceiptLine {
                item_id: x,
                quantity_received: 12,
                location_id: Some(a),
            },
        ]);

        assert_eq!(accumulate(&batch).get(&StockKey::at(x, a)), Some(10));
    }

    #[test]
    fn distinct_counts_ignore_unlocated_bucket() {
        let (x, y, a) = (item(1), item(2), loc(1));
        let batch = MovementBatch::new(
            vec![transfer(x, 1, None, Some(a))],
            vec![AdjustmentRecord { item_id: y, adjustment: 1 }],
        );

        let levels = accumulate(&batch);

        assert_eq!(levels.distinct_items().len(), 2);
        assert_eq!(levels.distinct_locations().into_iter().collect::<Vec<_>>(), vec![a]);
    }

    #[test]
    fn overflowing_total_saturates_and_is_flagged() {
        let (x, a, b) = (item(1), loc(1), loc(2));
        let batch = MovementBatch::new(
            vec![
                transfer(x, i64::MAX, Some(a), Some(b)),
                transfer(x, 5, None, Some(b)),
                transfer(x, 1, Some(b), Some(a)),
            ],
            vec![],
        );

        let levels = accumulate(&batch);

        assert_eq!(levels.get(&StockKey::at(x, b)), Some(i64::MAX - 1));
        assert_eq!(levels.get(&StockKey::at(x, a)), Some(-i64::MAX + 1));
        assert_eq!(levels.saturated().collect::<Vec<_>>(), vec![&StockKey::at(x, b)]);
    }

    #[test]
    fn removing_i64_min_clamps_instead_of_panicking() {
        let (x, a) = (item(1), loc(1));
        let mut levels = StockLevels::new();

        levels.remove(StockKey::at(x, a), i64::MIN);

        assert_eq!(levels.get(&StockKey::at(x, a)), Some(i64::MAX));
        assert_eq!(levels.saturated().count(), 1);
    }

    #[test]
    fn ordinary_totals_are_never_flagged() {
        let (x, a) = (item(1), loc(1));
        let levels: StockLevels = [(StockKey::at(x, a), 40), (StockKey::at(x, a), -40)].into_iter().collect();

        assert_eq!(levels.get(&StockKey::at(x, a)), Some(0));
        assert_eq!(levels.saturated().count(), 0);
    }

    fn arb_location() -> impl Strategy<Value = Option<LocationId>> {
        prop::option::of((0u128..4).prop_map(loc))
    }

    fn arb_transfer() -> impl Strategy<Value = TransferLine> {
        ((0u128..4).prop_map(item), 1i64..1_000, arb_location(), arb_location())
            .prop_map(|(item_id, qty, from, to)| transfer(item_id, qty, from, to))
    }

    fn arb_adjustment() -> impl Strategy<Value = AdjustmentRecord> {
        ((0u128..4).prop_map(item), -1_000i64..1_000)
            .prop_map(|(item_id, adjustment)| AdjustmentRecord { item_id, adjustment })
    }

    fn reference_total(batch: &MovementBatch, key: &StockKey) -> i64 {
        let mut total = 0;
        for t in &batch.transfers {
            if t.item_id != key.item_id {
                continue;
            }
            if t.from_location_id.is_some() && t.from_location_id == key.location_id {
                total -= t.quantity;
            }
            if t.to_location_id.is_some() && t.to_location_id == key.location_id {
                total += t.quantity;
            }
        }
        if key.location_id.is_none() {
            total += batch
                .adjustments
                .iter()
                .filter(|a| a.item_id == key.item_id)
                .map(|a| a.adjustment)
                .sum::<i64>();
        }
        total
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: shuffling the input records never changes any total.
        #[test]
        fn totals_are_order_independent(
            (transfers, shuffled_transfers) in prop::collection::vec(arb_transfer(), 0..20)
                .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle())),
            (adjustments, shuffled_adjustments) in prop::collection::vec(arb_adjustment(), 0..20)
                .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle())),
        ) {
            let original = accumulate(&MovementBatch::new(transfers, adjustments));
            let shuffled = accumulate(&MovementBatch::new(shuffled_transfers, shuffled_adjustments));
            prop_assert_eq!(original, shuffled);
        }

        /// Property: accumulating the same records twice yields the same mapping.
        #[test]
        fn accumulation_is_idempotent(
            transfers in prop::collection::vec(arb_transfer(), 0..20),
            adjustments in prop::collection::vec(arb_adjustment(), 0..20),
        ) {
            let batch = MovementBatch::new(transfers, adjustments);
            prop_assert_eq!(accumulate(&batch), accumulate(&batch));
        }

        /// Property: each key's total is the algebraic sum of the deltas that reference it.
        #[test]
        fn each_total_is_the_sum_of_its_deltas(
            transfers in prop::collection::vec(arb_transfer(), 0..20),
            adjustments in prop::collection::vec(arb_adjustment(), 0..20),
        ) {
            let batch = MovementBatch::new(transfers, adjustments);
            let levels = accumulate(&batch);

            for (key, total) in levels.iter() {
                prop_assert_eq!(total, reference_total(&batch, key));
            }

            let conserved: i64 = levels.iter().filter(|(k, _)| k.location_id.is_some()).map(|(_, v)| v).sum();
            let one_sided: i64 = batch
                .transfers
                .iter()
                .map(|t| match (t.from_location_id, t.to_location_id) {
                    (Some(_), None) => -t.quantity,
                    (None, Some(_)) => t.quantity,
                    _ => 0,
                })
                .sum();
            prop_assert_eq!(conserved, one_sided);
        }
    }
}
