//! Inventory ledger: the only writer of item quantities.
//!
//! Every mutation runs under one ledger-wide lock, so concurrent adjustments
//! and group reservations serialize. Group operations are decided in full by
//! the pure planners in `aidflow_inventory::stock` before the first write, and
//! already-applied writes are restored if a later write fails.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use tracing::{error, info, warn};

use aidflow_core::{DomainError, ExpectedVersion, ItemId, UserId, Versioned};
use aidflow_inventory::{
    InventoryItem, ItemDraft, ItemPatch, LineItem, StockLine, merge_lines, plan_release, plan_reserve,
};
use aidflow_requests::{Catalog, CatalogEntry};

use crate::document_store::{DocumentStore, StoreError};
use crate::error::WorkflowResult;

#[derive(Debug)]
pub struct InventoryLedger<S> {
    store: S,
    lock: Mutex<()>,
}

impl<S> InventoryLedger<S>
where
    S: DocumentStore<InventoryItem>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn guard(&self) -> WorkflowResult<MutexGuard<'_, ()>> {
        self.lock
            .lock()
            .map_err(|_| StoreError::Unavailable("inventory ledger lock poisoned".to_string()).into())
    }

    /// Load an item, soft-deleted ones included.
    fn load(&self, item_id: ItemId) -> WorkflowResult<InventoryItem> {
        self.store
            .get(&item_id)?
            .ok_or_else(|| DomainError::not_found(format!("inventory item {item_id}")).into())
    }

    fn save(&self, next: InventoryItem, expected_version: u64) -> WorkflowResult<InventoryItem> {
        Ok(self.store.put(next, ExpectedVersion::Exact(expected_version))?)
    }

    /// A live (not deleted) item.
    pub fn get(&self, item_id: ItemId) -> WorkflowResult<InventoryItem> {
        let item = self.load(item_id)?;
        if item.is_deleted() {
            return Err(DomainError::not_found(format!("inventory item {item_id}")).into());
        }
        Ok(item)
    }

    /// Live items ordered by name.
    pub fn list(&self) -> WorkflowResult<Vec<InventoryItem>> {
        let mut items: Vec<InventoryItem> = self.store.list()?.into_iter().filter(|i| !i.is_deleted()).collect();
        items.sort_by(|a, b| a.name().cmp(b.name()).then(a.id_typed().cmp(&b.id_typed())));
        Ok(items)
    }

    /// Live items with `quantity <= threshold`.
    pub fn items_below_threshold(&self) -> WorkflowResult<Vec<InventoryItem>> {
        Ok(self.list()?.into_iter().filter(InventoryItem::is_low_stock).collect())
    }

    pub fn create_item(&self, draft: ItemDraft, actor_id: UserId) -> WorkflowResult<InventoryItem> {
        let item = InventoryItem::create(ItemId::new(), draft, actor_id, Utc::now())?;
        let _guard = self.guard()?;
        let item = self.store.put(item, ExpectedVersion::Absent)?;
        info!(item_id = %item.id_typed(), quantity = item.quantity(), "inventory item created");
        Ok(item)
    }

    pub fn update_item(&self, item_id: ItemId, patch: &ItemPatch, actor_id: UserId) -> WorkflowResult<InventoryItem> {
        let _guard = self.guard()?;
        let current = self.load(item_id)?;
        let next = current.update(patch, actor_id, Utc::now())?;
        if next == current {
            return Ok(current);
        }
        let item = self.save(next, current.version())?;
        info!(%item_id, "inventory item updated");
        Ok(item)
    }

    pub fn delete_item(&self, item_id: ItemId, actor_id: UserId) -> WorkflowResult<InventoryItem> {
        let _guard = self.guard()?;
        let current = self.load(item_id)?;
        let next = current.delete(actor_id, Utc::now())?;
        let item = self.save(next, current.version())?;
        info!(%item_id, "inventory item deleted");
        Ok(item)
    }

    /// Single-item adjustment: `new = current + delta`, never below zero.
    pub fn adjust_quantity(
        &self,
        item_id: ItemId,
        delta: i64,
        reason: &str,
        actor_id: UserId,
    ) -> WorkflowResult<InventoryItem> {
        let _guard = self.guard()?;
        let current = self.load(item_id)?;
        if current.is_deleted() {
            return Err(DomainError::not_found(format!("inventory item {item_id}")).into());
        }
        let next = current.adjust(delta, reason, actor_id, Utc::now())?;
        let item = self.save(next, current.version())?;
        info!(%item_id, delta, quantity = item.quantity(), reason, "inventory adjusted");
        Ok(item)
    }

    /// All-or-nothing group decrement. Returns the reserved snapshot lines.
    ///
    /// Fails with `InsufficientInventory` naming every short item; nothing is
    /// changed in that case.
    pub fn reserve_many(&self, lines: &[StockLine], reason: &str, actor_id: UserId) -> WorkflowResult<Vec<LineItem>> {
        let merged = merge_lines(lines)?;
        let _guard = self.guard()?;
        let current = self.load_group(&merged)?;
        let planned = plan_reserve(&current, &merged, reason, actor_id, Utc::now())?;
        let committed = self.commit_group(planned, &current)?;
        info!(items = committed.len(), reason, "inventory reserved");
        Ok(snapshot(&committed, &merged))
    }

    /// All-or-nothing group increment; the inverse of [`Self::reserve_many`].
    pub fn release_many(&self, lines: &[StockLine], reason: &str, actor_id: UserId) -> WorkflowResult<Vec<LineItem>> {
        let merged = merge_lines(lines)?;
        let _guard = self.guard()?;
        let current = self.load_group(&merged)?;
        let planned = plan_release(&current, &merged, reason, actor_id, Utc::now())?;
        let committed = self.commit_group(planned, &current)?;
        info!(items = committed.len(), reason, "inventory released");
        Ok(snapshot(&committed, &merged))
    }

    /// Missing ids are left out; the planners report them as not found.
    fn load_group(&self, merged: &BTreeMap<ItemId, i64>) -> WorkflowResult<BTreeMap<ItemId, InventoryItem>> {
        let mut current = BTreeMap::new();
        for item_id in merged.keys() {
            if let Some(item) = self.store.get(item_id)? {
                current.insert(*item_id, item);
            }
        }
        Ok(current)
    }

    /// Write planned states in item order; on failure restore the ones already written.
    fn commit_group(
        &self,
        planned: Vec<InventoryItem>,
        current: &BTreeMap<ItemId, InventoryItem>,
    ) -> WorkflowResult<Vec<InventoryItem>> {
        let mut committed: Vec<InventoryItem> = Vec::with_capacity(planned.len());

        for next in planned {
            let item_id = next.id_typed();
            let Some(before) = current.get(&item_id) else {
                return Err(DomainError::not_found(format!("inventory item {item_id}")).into());
            };
            match self.save(next, before.version()) {
                Ok(item) => committed.push(item),
                Err(err) => {
                    warn!(%item_id, error = %err, applied = committed.len(), "group write failed; rolling back");
                    self.roll_back(&committed, current);
                    return Err(err);
                }
            }
        }

        Ok(committed)
    }

    fn roll_back(&self, committed: &[InventoryItem], current: &BTreeMap<ItemId, InventoryItem>) {
        for written in committed.iter().rev() {
            let item_id = written.id_typed();
            let Some(before) = current.get(&item_id) else { continue };
            if let Err(err) = self.store.put(before.clone(), ExpectedVersion::Exact(written.version())) {
                error!(%item_id, error = %err, "inventory rollback failed");
            }
        }
    }
}

fn snapshot(committed: &[InventoryItem], merged: &BTreeMap<ItemId, i64>) -> Vec<LineItem> {
    committed
        .iter()
        .map(|item| LineItem {
            item_id: item.id_typed(),
            name: item.name().to_string(),
            quantity: merged.get(&item.id_typed()).copied().unwrap_or_default(),
            unit: item.unit().to_string(),
        })
        .collect()
}

impl<S> Catalog for InventoryLedger<S>
where
    S: DocumentStore<InventoryItem>,
{
    fn lookup(&self, item_id: &ItemId) -> Option<CatalogEntry> {
        match self.get(*item_id) {
            Ok(item) => Some(CatalogEntry {
                name: item.name().to_string(),
                unit: item.unit().to_string(),
            }),
            Err(err) => {
                if !matches!(err.as_domain(), Some(DomainError::NotFound(_))) {
                    warn!(%item_id, error = %err, "catalog lookup failed");
                }
                None
            }
        }
    }
}
