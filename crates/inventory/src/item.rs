use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use aidflow_core::{DomainError, DomainResult, ItemId, Shortage, UserId, Versioned};

/// One field edited by a direct update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub from: JsonValue,
    pub to: JsonValue,
}

/// What a history entry records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "change", rename_all = "snake_case")]
pub enum HistoryChange {
    Create { quantity: i64 },
    Update { fields: Vec<FieldChange> },
    Delete,
    Adjust {
        from: i64,
        to: i64,
        delta: i64,
        reason: String,
    },
}

/// Append-only audit entry on an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub change: HistoryChange,
    pub timestamp: DateTime<Utc>,
    pub actor_id: UserId,
}

/// Input for creating an item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDraft {
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub unit: String,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub threshold: i64,
    #[serde(default)]
    pub expiry: Option<NaiveDate>,
}

/// Direct edit of an item. `None` leaves a field unchanged.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub quantity: Option<i64>,
    pub threshold: Option<i64>,
    pub expiry: Option<NaiveDate>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        self == &ItemPatch::default()
    }
}

/// Reason recorded when a direct edit changes the quantity.
pub const MANUAL_EDIT_REASON: &str = "manual edit";

/// A stocked item: available quantity plus its audit trail.
///
/// State transitions are pure: every operation returns the next state and
/// leaves `self` untouched, so the ledger can decide before it commits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    id: ItemId,
    name: String,
    category: String,
    unit: String,
    quantity: i64,
    threshold: i64,
    expiry: Option<NaiveDate>,
    deleted_at: Option<DateTime<Utc>>,
    history: Vec<HistoryEntry>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
}

impl InventoryItem {
    pub fn create(id: ItemId, draft: ItemDraft, actor_id: UserId, now: DateTime<Utc>) -> DomainResult<Self> {
        let name = non_empty("name", &draft.name)?;
        let unit = non_empty("unit", &draft.unit)?;
        if draft.quantity < 0 {
            return Err(DomainError::validation("quantity cannot be negative"));
        }
        if draft.threshold < 0 {
            return Err(DomainError::validation("threshold cannot be negative"));
        }

        Ok(Self {
            id,
            name,
            category: draft.category.trim().to_string(),
            unit,
            quantity: draft.quantity,
            threshold: draft.threshold,
            expiry: draft.expiry,
            deleted_at: None,
            history: vec![HistoryEntry {
                change: HistoryChange::Create {
                    quantity: draft.quantity,
                },
                timestamp: now,
                actor_id,
            }],
            created_at: now,
            updated_at: now,
            version: 0,
        })
    }

    pub fn id_typed(&self) -> ItemId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    pub fn threshold(&self) -> i64 {
        self.threshold
    }

    pub fn expiry(&self) -> Option<NaiveDate> {
        self.expiry
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.threshold
    }

    /// Apply a signed quantity change.
    ///
    /// Fails with `InsufficientInventory` if the result would be negative.
    pub fn adjust(
        &self,
        delta: i64,
        reason: &str,
        actor_id: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if delta == 0 {
            return Err(DomainError::validation("delta cannot be zero"));
        }
        let to = self
            .quantity
            .checked_add(delta)
            .ok_or_else(|| DomainError::validation("quantity overflow"))?;
        if to < 0 {
            return Err(DomainError::InsufficientInventory(vec![Shortage {
                item_id: self.id,
                requested: -delta,
                available: self.quantity,
            }]));
        }

        let mut next = self.clone();
        next.quantity = to;
        next.updated_at = now;
        next.history.push(HistoryEntry {
            change: HistoryChange::Adjust {
                from: self.quantity,
                to,
                delta,
                reason: reason.to_string(),
            },
            timestamp: now,
            actor_id,
        });
        Ok(next)
    }

    /// Apply a direct edit. A quantity change is recorded as an `adjust` entry.
    pub fn update(&self, patch: &ItemPatch, actor_id: UserId, now: DateTime<Utc>) -> DomainResult<Self> {
        if self.is_deleted() {
            return Err(DomainError::not_found(format!("inventory item {}", self.id)));
        }
        if patch.is_empty() {
            return Err(DomainError::validation("patch has no fields"));
        }

        let mut next = self.clone();
        let mut fields = Vec::new();

        if let Some(name) = &patch.name {
            let name = non_empty("name", name)?;
            record(&mut fields, "name", &self.name, &name);
            next.name = name;
        }
        if let Some(category) = &patch.category {
            let category = category.trim().to_string();
            record(&mut fields, "category", &self.category, &category);
            next.category = category;
        }
        if let Some(unit) = &patch.unit {
            let unit = non_empty("unit", unit)?;
            record(&mut fields, "unit", &self.unit, &unit);
            next.unit = unit;
        }
        if let Some(threshold) = patch.threshold {
            if threshold < 0 {
                return Err(DomainError::validation("threshold cannot be negative"));
            }
            record(&mut fields, "threshold", &self.threshold, &threshold);
            next.threshold = threshold;
        }
        if let Some(expiry) = patch.expiry {
            record(&mut fields, "expiry", &self.expiry, &Some(expiry));
            next.expiry = Some(expiry);
        }

        if !fields.is_empty() {
            next.updated_at = now;
            next.history.push(HistoryEntry {
                change: HistoryChange::Update { fields },
                timestamp: now,
                actor_id,
            });
        }

        if let Some(quantity) = patch.quantity {
            if quantity < 0 {
                return Err(DomainError::validation("quantity cannot be negative"));
            }
            if quantity != self.quantity {
                next = next.adjust(quantity - self.quantity, MANUAL_EDIT_REASON, actor_id, now)?;
            }
        }

        Ok(next)
    }

    /// Soft delete: the record stays so later releases still land.
    pub fn delete(&self, actor_id: UserId, now: DateTime<Utc>) -> DomainResult<Self> {
        if self.is_deleted() {
            return Err(DomainError::not_found(format!("inventory item {}", self.id)));
        }
        let mut next = self.clone();
        next.deleted_at = Some(now);
        next.updated_at = now;
        next.history.push(HistoryEntry {
            change: HistoryChange::Delete,
            timestamp: now,
            actor_id,
        });
        Ok(next)
    }
}

impl Versioned for InventoryItem {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
}

fn non_empty(field: &str, value: &str) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

fn record<T: Serialize + PartialEq>(fields: &mut Vec<FieldChange>, field: &str, from: &T, to: &T) {
    if from == to {
        return;
    }
    fields.push(FieldChange {
        field: field.to_string(),
        from: serde_json::to_value(from).unwrap_or(JsonValue::Null),
        to: serde_json::to_value(to).unwrap_or(JsonValue::Null),
    });
}
