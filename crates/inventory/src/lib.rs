//! Inventory domain module.
//!
//! This crate contains business rules for stocked items, implemented purely
//! as deterministic domain logic (no IO, no HTTP, no storage).

pub mod item;
pub mod stock;

pub use item::{
    FieldChange, HistoryChange, HistoryEntry, InventoryItem, ItemDraft, ItemPatch, MANUAL_EDIT_REASON,
};
pub use stock::{LineItem, StockLine, merge_lines, plan_release, plan_reserve};
