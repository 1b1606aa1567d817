//! Loose row shapes as the database hands them over, and their mapping into
//! typed movement records.
//!
//! Every column is optional here. Rows with an embedded parent (`transfer`,
//! `purchase_order`) mirror the nested shape a REST gateway returns; the
//! Postgres adapter fills the same structs from flat joins.

use core::str::FromStr;

use serde::Deserialize;

use retailerp_core::{DomainError, ItemId, LocationId};
use retailerp_inventory::{AdjustmentRecord, ReceiptLine, TransferLine};

use super::{PURCHASE_ORDER_STATUS_RECEIVED, TRANSFER_STATUS_COMPLETED};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransferHeaderRow {
    pub status: Option<String>,
    pub from_location_id: Option<String>,
    pub to_location_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransferLineRow {
    pub item_id: Option<String>,
    pub quantity: Option<i64>,
    #[serde(default, alias = "transfers")]
    pub transfer: Option<TransferHeaderRow>,
}

impl TransferLineRow {
    pub fn is_completed(&self) -> bool {
        self.transfer.as_ref().and_then(|t| t.status.as_deref()) == Some(TRANSFER_STATUS_COMPLETED)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdjustmentRow {
    pub item_id: Option<String>,
    pub adjustment: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PurchaseOrderHeaderRow {
    pub status: Option<String>,
    pub store_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReceiptRow {
    pub item_id: Option<String>,
    pub quantity_received: Option<i64>,
    #[serde(default, alias = "purchase_orders")]
    pub purchase_order: Option<PurchaseOrderHeaderRow>,
}

impl ReceiptRow {
    pub fn is_received(&self) -> bool {
        self.purchase_order.as_ref().and_then(|po| po.status.as_deref())
            == Some(PURCHASE_ORDER_STATUS_RECEIVED)
    }
}

fn required_id<T>(value: Option<&str>, field: &str) -> Result<T, DomainError>
where
    T: FromStr<Err = DomainError>,
{
    value.ok_or_else(|| DomainError::missing_field(field))?.parse()
}

fn optional_id<T>(value: Option<&str>) -> Result<Option<T>, DomainError>
where
    T: FromStr<Err = DomainError>,
{
    value.map(|v| v.parse::<T>()).transpose()
}

impl TryFrom<TransferLineRow> for TransferLine {
    type Error = DomainError;

    fn try_from(row: TransferLineRow) -> Result<Self, Self::Error> {
        let item_id: ItemId = required_id(row.item_id.as_deref(), "item_id")?;
        let quantity = row.quantity.ok_or_else(|| DomainError::missing_field("quantity"))?;
        let header = row.transfer.unwrap_or_default();

        Ok(TransferLine {
            item_id,
            quantity,
            from_location_id: optional_id::<LocationId>(header.from_location_id.as_deref())?,
            to_location_id: optional_id::<LocationId>(header.to_location_id.as_deref())?,
        })
    }
}

impl TryFrom<AdjustmentRow> for AdjustmentRecord {
    type Error = DomainError;

    fn try_from(row: AdjustmentRow) -> Result<Self, Self::Error> {
        Ok(AdjustmentRecord {
            item_id: required_id(row.item_id.as_deref(), "item_id")?,
            adjustment: row.adjustment.ok_or_else(|| DomainError::missing_field("adjustment"))?,
        })
    }
}

impl TryFrom<ReceiptRow> for ReceiptLine {
    type Error = DomainError;

    fn try_from(row: ReceiptRow) -> Result<Self, Self::Error> {
        let item_id: ItemId = required_id(row.item_id.as_deref(), "item_id")?;
        let quantity_received = row
            .quantity_received
            .ok_or_else(|| DomainError::missing_field("quantity_received"))?;
        let store = row.purchase_order.and_then(|po| po.store_id);

        Ok(ReceiptLine {
            item_id,
            quantity_received,
            location_id: optional_id::<LocationId>(store.as_deref())?,
        })
    }
}

/// Map loose rows into typed records, dropping (and logging) the ones that
/// fail validation.
pub fn decode_rows<R, T>(what: &'static str, rows: impl IntoIterator<Item = R>) -> Vec<T>
where
    T: TryFrom<R, Error = DomainError>,
{
    rows.into_iter()
        .enumerate()
        .filter_map(|(idx, row)| match T::try_from(row) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(what, row = idx, error = %e, "skipping malformed movement row");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn nested_transfer_row_maps_to_typed_line() {
        let item = ItemId::new();
        let to = LocationId::new();
        let row: TransferLineRow = serde_json::from_value(json!({
            "item_id": item.to_string(),
            "quantity": 6,
            "transfers": { "status": "completed", "from_location_id": null, "to_location_id": to.to_string() }
        }))
        .unwrap();

        assert!(row.is_completed());
        let line = TransferLine::try_from(row).unwrap();
        assert_eq!(line.item_id, item);
        assert_eq!(line.quantity, 6);
        assert_eq!(line.from_location_id, None);
        assert_eq!(line.to_location_id, Some(to));
    }

    #[test]
    fn pending_transfer_is_not_completed() {
        let row = TransferLineRow {
            transfer: Some(TransferHeaderRow {
                status: Some("pending".into()),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(!row.is_completed());
        assert!(!TransferLineRow::default().is_completed());
    }

    #[test]
    fn missing_quantity_is_rejected() {
        let row = TransferLineRow {
            item_id: Some(ItemId::new().to_string()),
            quantity: None,
            transfer: None,
        };
        assert_eq!(
            TransferLine::try_from(row).unwrap_err(),
            DomainError::missing_field("quantity")
        );
    }

    #[test]
    fn malformed_location_is_rejected() {
        let row = TransferLineRow {
            item_id: Some(ItemId::new().to_string()),
            quantity: Some(1),
            transfer: Some(TransferHeaderRow {
                status: Some("completed".into()),
                from_location_id: Some("store-7".into()),
                to_location_id: None,
            }),
        };
        assert!(matches!(TransferLine::try_from(row), Err(DomainError::InvalidId(_))));
    }

    #[test]
    fn decode_rows_keeps_valid_and_drops_invalid() {
        let item = ItemId::new();
        let rows = vec![
            AdjustmentRow { item_id: Some(item.to_string()), adjustment: Some(-2) },
            AdjustmentRow { item_id: None, adjustment: Some(4) },
            AdjustmentRow { item_id: Some(item.to_string()), adjustment: None },
        ];

        let records: Vec<AdjustmentRecord> = decode_rows("adjustments", rows);

        assert_eq!(records, vec![AdjustmentRecord { item_id: item, adjustment: -2 }]);
    }

    #[test]
    fn receipt_row_takes_store_from_purchase_order() {
        let item = ItemId::new();
        let store = LocationId::new();
        let row: ReceiptRow = serde_json::from_value(json!({
            "item_id": item.to_string(),
            "quantity_received": 24,
            "purchase_orders": { "status": "received", "store_id": store.to_string() }
        }))
        .unwrap();

        assert!(row.is_received());
        let line = ReceiptLine::try_from(row).unwrap();
        assert_eq!(line.location_id, Some(store));
        assert_eq!(line.quantity_received, 24);
    }
}
