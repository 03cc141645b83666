//! Group stock arithmetic: decide an all-or-nothing reservation before any
//! item is written.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use aidflow_core::{DomainError, DomainResult, ItemId, Shortage, UserId};

use crate::InventoryItem;

/// Quantity of one item, as requested by a caller.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLine {
    pub item_id: ItemId,
    pub quantity: i64,
}

/// A line item `{item_id, name, quantity, unit}`.
///
/// Used for request line items and for the reserved snapshot a distribution
/// keeps (name and unit captured at reservation time).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub item_id: ItemId,
    pub name: String,
    pub quantity: i64,
    pub unit: String,
}

impl LineItem {
    pub fn stock_line(&self) -> StockLine {
        StockLine {
            item_id: self.item_id,
            quantity: self.quantity,
        }
    }
}

/// Sum duplicate item ids; reject empty input and non-positive quantities.
///
/// The result is ordered by item id, which also gives every group operation
/// the same item order.
pub fn merge_lines(lines: &[StockLine]) -> DomainResult<BTreeMap<ItemId, i64>> {
    if lines.is_empty() {
        return Err(DomainError::validation("at least one line item is required"));
    }
    let mut merged = BTreeMap::new();
    for line in lines {
        if line.quantity <= 0 {
            return Err(DomainError::validation(format!(
                "quantity for item {} must be positive",
                line.item_id
            )));
        }
        let total: &mut i64 = merged.entry(line.item_id).or_default();
        *total = total
            .checked_add(line.quantity)
            .ok_or_else(|| DomainError::validation("quantity overflow"))?;
    }
    Ok(merged)
}

/// Decide a group decrement against the current item states.
///
/// Returns the next state of every touched item, or `InsufficientInventory`
/// naming every item that cannot cover its line. Nothing is mutated.
pub fn plan_reserve(
    current: &BTreeMap<ItemId, InventoryItem>,
    merged: &BTreeMap<ItemId, i64>,
    reason: &str,
    actor_id: UserId,
    now: DateTime<Utc>,
) -> DomainResult<Vec<InventoryItem>> {
    let mut shortages = Vec::new();
    let mut next = Vec::with_capacity(merged.len());

    for (item_id, quantity) in merged {
        let item = current
            .get(item_id)
            .filter(|i| !i.is_deleted())
            .ok_or_else(|| DomainError::not_found(format!("inventory item {item_id}")))?;

        match item.adjust(-quantity, reason, actor_id, now) {
            Ok(adjusted) => next.push(adjusted),
            Err(DomainError::InsufficientInventory(mut s)) => shortages.append(&mut s),
            Err(other) => return Err(other),
        }
    }

    if shortages.is_empty() {
        Ok(next)
    } else {
        Err(DomainError::InsufficientInventory(shortages))
    }
}

/// Decide a group increment. Deleted items still receive released units.
pub fn plan_release(
    current: &BTreeMap<ItemId, InventoryItem>,
    merged: &BTreeMap<ItemId, i64>,
    reason: &str,
    actor_id: UserId,
    now: DateTime<Utc>,
) -> DomainResult<Vec<InventoryItem>> {
    merged
        .iter()
        .map(|(item_id, quantity)| {
            current
                .get(item_id)
                .ok_or_else(|| DomainError::not_found(format!("inventory item {item_id}")))?
                .adjust(*quantity, reason, actor_id, now)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ItemDraft;

    fn item(quantity: i64) -> InventoryItem {
        let draft = ItemDraft {
            name: "Blanket".to_string(),
            category: "shelter".to_string(),
            unit: "pcs".to_string(),
            quantity,
            threshold: 0,
            expiry: None,
        };
        InventoryItem::create(ItemId::new(), draft, UserId::new(), Utc::now()).unwrap()
    }

    fn index(items: &[InventoryItem]) -> BTreeMap<ItemId, InventoryItem> {
        items.iter().map(|i| (i.id_typed(), i.clone())).collect()
    }

    #[test]
    fn merge_sums_duplicates_and_rejects_non_positive() {
        let id = ItemId::new();
        let merged = merge_lines(&[
            StockLine { item_id: id, quantity: 2 },
            StockLine { item_id: id, quantity: 3 },
        ])
        .unwrap();
        assert_eq!(merged.get(&id), Some(&5));

        assert!(merge_lines(&[]).is_err());
        assert!(merge_lines(&[StockLine { item_id: id, quantity: 0 }]).is_err());
    }

    #[test]
    fn reserve_reports_every_short_item() {
        let a = item(5);
        let b = item(1);
        let c = item(9);
        let current = index(&[a.clone(), b.clone(), c.clone()]);
        let merged = merge_lines(&[
            StockLine { item_id: a.id_typed(), quantity: 6 },
            StockLine { item_id: b.id_typed(), quantity: 2 },
            StockLine { item_id: c.id_typed(), quantity: 1 },
        ])
        .unwrap();

        let err = plan_reserve(&current, &merged, "r", UserId::new(), Utc::now()).unwrap_err();
        match err {
            DomainError::InsufficientInventory(shortages) => {
                let ids: Vec<ItemId> = shortages.iter().map(|s| s.item_id).collect();
                assert_eq!(ids.len(), 2);
                assert!(ids.contains(&a.id_typed()));
                assert!(ids.contains(&b.id_typed()));
            }
            other => panic!("expected InsufficientInventory, got {other:?}"),
        }
    }

    #[test]
    fn reserve_rejects_deleted_items_release_accepts_them() {
        let gone = item(4).delete(UserId::new(), Utc::now()).unwrap();
        let current = index(&[gone.clone()]);
        let merged = merge_lines(&[StockLine { item_id: gone.id_typed(), quantity: 1 }]).unwrap();

        assert!(matches!(
            plan_reserve(&current, &merged, "r", UserId::new(), Utc::now()),
            Err(DomainError::NotFound(_))
        ));
        let released = plan_release(&current, &merged, "c", UserId::new(), Utc::now()).unwrap();
        assert_eq!(released[0].quantity(), 5);
    }
}
