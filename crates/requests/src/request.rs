use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use aidflow_core::{DomainError, DomainResult, ItemId, RequestId, UserId, Versioned};
use aidflow_inventory::LineItem;

use crate::status::{RequestStatus, TransitionSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

/// Catalog metadata for one requestable item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    pub unit: String,
}

/// Lookup of requestable items. Deleted items must not be returned.
pub trait Catalog {
    fn lookup(&self, item_id: &ItemId) -> Option<CatalogEntry>;
}

/// Input for a new request, as submitted by (or on behalf of) a beneficiary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRequest {
    pub beneficiary_id: UserId,
    pub items: Vec<LineItem>,
    pub urgency: Urgency,
    #[serde(default)]
    pub notes: String,
}

/// A beneficiary's ask for specific quantities of specific items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AidRequest {
    id: RequestId,
    beneficiary_id: UserId,
    items: Vec<LineItem>,
    urgency: Urgency,
    status: RequestStatus,
    notes: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
}

impl AidRequest {
    /// Validate and build a `pending` request.
    ///
    /// Blank line names/units are filled from the catalog.
    pub fn create(id: RequestId, new: NewRequest, catalog: &impl Catalog, now: DateTime<Utc>) -> DomainResult<Self> {
        if new.items.is_empty() {
            return Err(DomainError::validation("a request needs at least one item"));
        }

        let mut seen = HashSet::new();
        let mut items = Vec::with_capacity(new.items.len());
        for mut line in new.items {
            if line.quantity <= 0 {
                return Err(DomainError::validation(format!(
                    "quantity for item {} must be positive",
                    line.item_id
                )));
            }
            if !seen.insert(line.item_id) {
                return Err(DomainError::validation(format!("item {} is listed twice", line.item_id)));
            }
            let entry = catalog
                .lookup(&line.item_id)
                .ok_or_else(|| DomainError::validation(format!("item {} is not in the catalog", line.item_id)))?;
            if line.name.trim().is_empty() {
                line.name = entry.name;
            }
            if line.unit.trim().is_empty() {
                line.unit = entry.unit;
            }
            items.push(line);
        }

        Ok(Self {
            id,
            beneficiary_id: new.beneficiary_id,
            items,
            urgency: new.urgency,
            status: RequestStatus::Pending,
            notes: new.notes.trim().to_string(),
            created_at: now,
            updated_at: now,
            version: 0,
        })
    }

    pub fn id_typed(&self) -> RequestId {
        self.id
    }

    pub fn beneficiary_id(&self) -> UserId {
        self.beneficiary_id
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn urgency(&self) -> Urgency {
        self.urgency
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Requested quantity for an item, if the request lists it.
    pub fn requested_quantity(&self, item_id: &ItemId) -> Option<i64> {
        self.items.iter().find(|l| &l.item_id == item_id).map(|l| l.quantity)
    }

    /// Decide a status change. `self` is left untouched.
    ///
    /// A self-edge returns an unchanged copy.
    pub fn with_status(&self, target: RequestStatus, source: TransitionSource, now: DateTime<Utc>) -> DomainResult<Self> {
        if !self.status.can_transition_to(target, source) {
            return Err(DomainError::illegal_transition(self.status, target));
        }
        let mut next = self.clone();
        if target != self.status {
            next.status = target;
            next.updated_at = now;
        }
        Ok(next)
    }
}

impl Versioned for AidRequest {
    type Id = RequestId;

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

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    struct TestCatalog(HashMap<ItemId, CatalogEntry>);

    impl Catalog for TestCatalog {
        fn lookup(&self, item_id: &ItemId) -> Option<CatalogEntry> {
            self.0.get(item_id).cloned()
        }
    }

    fn catalog(ids: &[ItemId]) -> TestCatalog {
        TestCatalog(
            ids.iter()
                .map(|id| (*id, CatalogEntry { name: "Water".to_string(), unit: "l".to_string() }))
                .collect(),
        )
    }

    fn line(item_id: ItemId, quantity: i64) -> LineItem {
        LineItem { item_id, name: String::new(), quantity, unit: String::new() }
    }

    fn new_request(items: Vec<LineItem>) -> NewRequest {
        NewRequest {
            beneficiary_id: UserId::new(),
            items,
            urgency: Urgency::High,
            notes: " two adults ".to_string(),
        }
    }

    #[test]
    fn create_starts_pending_and_fills_from_catalog() {
        let id = ItemId::new();
        let req = AidRequest::create(RequestId::new(), new_request(vec![line(id, 3)]), &catalog(&[id]), Utc::now()).unwrap();

        assert_eq!(req.status(), RequestStatus::Pending);
        assert_eq!(req.items()[0].name, "Water");
        assert_eq!(req.items()[0].unit, "l");
        assert_eq!(req.notes(), "two adults");
        assert_eq!(req.requested_quantity(&id), Some(3));
    }

    #[test]
    fn create_rejects_empty_non_positive_duplicate_and_unknown() {
        let id = ItemId::new();
        let cat = catalog(&[id]);
        let cases = vec![
            vec![],
            vec![line(id, 0)],
            vec![line(id, 1), line(id, 2)],
            vec![line(ItemId::new(), 1)],
        ];
        for items in cases {
            let err = AidRequest::create(RequestId::new(), new_request(items), &cat, Utc::now()).unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)), "{err:?}");
        }
    }

    #[test]
    fn with_status_rejects_skips_without_mutation() {
        let id = ItemId::new();
        let req = AidRequest::create(RequestId::new(), new_request(vec![line(id, 1)]), &catalog(&[id]), Utc::now()).unwrap();
        let before = req.clone();

        let err = req.with_status(RequestStatus::Delivered, TransitionSource::Direct, Utc::now()).unwrap_err();

        assert_eq!(err, DomainError::illegal_transition("pending", "delivered"));
        assert_eq!(req, before);
    }

    #[test]
    fn self_edge_is_a_no_op_copy() {
        let id = ItemId::new();
        let now = Utc::now();
        let req = AidRequest::create(RequestId::new(), new_request(vec![line(id, 1)]), &catalog(&[id]), now)
            .unwrap()
            .with_status(RequestStatus::Approved, TransitionSource::Direct, now)
            .unwrap()
            .with_status(RequestStatus::InProgress, TransitionSource::Linked, now)
            .unwrap();

        let again = req
            .with_status(RequestStatus::InProgress, TransitionSource::Linked, Utc::now())
            .unwrap();
        assert_eq!(again, req);
        assert!(req.with_status(RequestStatus::InProgress, TransitionSource::Direct, Utc::now()).is_err());
    }
}
