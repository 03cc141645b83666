use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use aidflow_core::{DistributionId, DomainError, DomainResult, RequestId, UserId, Versioned};
use aidflow_inventory::LineItem;

use crate::status::DistributionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FulfillmentMethod {
    Pickup,
    Delivery,
}

/// How the reserved items reach the beneficiary.
///
/// Serialized with a `method` tag so it can be flattened into request bodies:
/// `{"method": "pickup", "location": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum Fulfillment {
    Pickup {
        location: String,
        #[serde(default)]
        scheduled_at: Option<DateTime<Utc>>,
    },
    Delivery {
        address: String,
        #[serde(default)]
        contact_phone: Option<String>,
        #[serde(default)]
        scheduled_at: Option<DateTime<Utc>>,
    },
}

impl Fulfillment {
    pub fn method(&self) -> FulfillmentMethod {
        match self {
            Fulfillment::Pickup { .. } => FulfillmentMethod::Pickup,
            Fulfillment::Delivery { .. } => FulfillmentMethod::Delivery,
        }
    }

    fn validate(&self) -> DomainResult<()> {
        match self {
            Fulfillment::Pickup { location, .. } if location.trim().is_empty() => {
                Err(DomainError::validation("pickup location cannot be empty"))
            }
            Fulfillment::Delivery { address, .. } if address.trim().is_empty() => {
                Err(DomainError::validation("delivery address cannot be empty"))
            }
            _ => Ok(()),
        }
    }
}

/// Everything needed to record a distribution once its items are reserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDistribution {
    pub request_id: RequestId,
    /// Snapshot returned by the ledger reservation.
    pub reserved: Vec<LineItem>,
    pub fulfillment: Fulfillment,
    pub assignee_id: Option<UserId>,
    pub notes: String,
    pub created_by: UserId,
}

/// A concrete fulfillment attempt against one aid request.
///
/// The reserved item snapshot is fixed at creation; afterwards only status,
/// timestamps and assignment change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    id: DistributionId,
    request_id: RequestId,
    items: Vec<LineItem>,
    fulfillment: Fulfillment,
    assignee_id: Option<UserId>,
    status: DistributionStatus,
    notes: String,
    created_by: UserId,
    dispatched_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
}

impl Distribution {
    pub fn create(id: DistributionId, new: NewDistribution, now: DateTime<Utc>) -> DomainResult<Self> {
        if new.reserved.is_empty() {
            return Err(DomainError::validation("a distribution needs at least one item"));
        }
        new.fulfillment.validate()?;

        Ok(Self {
            id,
            request_id: new.request_id,
            items: new.reserved,
            fulfillment: new.fulfillment,
            assignee_id: new.assignee_id,
            status: DistributionStatus::Pending,
            notes: new.notes.trim().to_string(),
            created_by: new.created_by,
            dispatched_at: None,
            delivered_at: None,
            cancelled_at: None,
            created_at: now,
            updated_at: now,
            version: 0,
        })
    }

    pub fn id_typed(&self) -> DistributionId {
        self.id
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Reserved snapshot (immutable).
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn fulfillment(&self) -> &Fulfillment {
        &self.fulfillment
    }

    pub fn assignee_id(&self) -> Option<UserId> {
        self.assignee_id
    }

    pub fn status(&self) -> DistributionStatus {
        self.status
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn created_by(&self) -> UserId {
        self.created_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn dispatched_at(&self) -> Option<DateTime<Utc>> {
        self.dispatched_at
    }

    pub fn delivered_at(&self) -> Option<DateTime<Utc>> {
        self.delivered_at
    }

    pub fn cancelled_at(&self) -> Option<DateTime<Utc>> {
        self.cancelled_at
    }

    pub fn is_open(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Decide a happy-path step. Only the single next status is accepted.
    pub fn advance(&self, target: DistributionStatus, now: DateTime<Utc>) -> DomainResult<Self> {
        if !self.status.can_advance_to(target) {
            return Err(DomainError::illegal_transition(self.status, target));
        }
        let mut next = self.clone();
        next.status = target;
        next.updated_at = now;
        match target {
            DistributionStatus::InTransit => next.dispatched_at = Some(now),
            DistributionStatus::Delivered => next.delivered_at = Some(now),
            _ => {}
        }
        Ok(next)
    }

    /// Decide a cancellation. Terminal distributions cannot be cancelled.
    pub fn cancel(&self, now: DateTime<Utc>) -> DomainResult<Self> {
        if self.status.is_terminal() {
            return Err(DomainError::illegal_transition(self.status, DistributionStatus::Cancelled));
        }
        let mut next = self.clone();
        next.status = DistributionStatus::Cancelled;
        next.cancelled_at = Some(now);
        next.updated_at = now;
        Ok(next)
    }

    pub fn assign(&self, assignee_id: Option<UserId>, now: DateTime<Utc>) -> DomainResult<Self> {
        if !self.is_open() {
            return Err(DomainError::validation(format!(
                "distribution is {} and can no longer be reassigned",
                self.status
            )));
        }
        let mut next = self.clone();
        next.assignee_id = assignee_id;
        next.updated_at = now;
        Ok(next)
    }
}

impl Versioned for Distribution {
    type Id = DistributionId;

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
    use aidflow_core::ItemId;

    use super::*;

    fn new_distribution() -> NewDistribution {
        NewDistribution {
            request_id: RequestId::new(),
            reserved: vec![LineItem {
                item_id: ItemId::new(),
                name: "Tarp".to_string(),
                quantity: 2,
                unit: "pcs".to_string(),
            }],
            fulfillment: Fulfillment::Pickup {
                location: "Depot 4".to_string(),
                scheduled_at: None,
            },
            assignee_id: None,
            notes: String::new(),
            created_by: UserId::new(),
        }
    }

    fn pending() -> Distribution {
        Distribution::create(DistributionId::new(), new_distribution(), Utc::now()).unwrap()
    }

    #[test]
    fn create_requires_items_and_a_destination() {
        let mut new = new_distribution();
        new.reserved.clear();
        assert!(Distribution::create(DistributionId::new(), new, Utc::now()).is_err());

        let mut new = new_distribution();
        new.fulfillment = Fulfillment::Delivery {
            address: " ".to_string(),
            contact_phone: None,
            scheduled_at: None,
        };
        assert!(matches!(
            Distribution::create(DistributionId::new(), new, Utc::now()),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn skipping_to_delivered_is_rejected_and_state_unchanged() {
        let d = pending();
        let before = d.clone();

        let err = d.advance(DistributionStatus::Delivered, Utc::now()).unwrap_err();

        assert_eq!(err, DomainError::illegal_transition("pending", "delivered"));
        assert_eq!(d, before);
    }

    #[test]
    fn full_walk_stamps_timestamps_and_keeps_snapshot() {
        let d = pending();
        let items = d.items().to_vec();
        let d = d
            .advance(DistributionStatus::Preparing, Utc::now())
            .and_then(|d| d.advance(DistributionStatus::InTransit, Utc::now()))
            .and_then(|d| d.advance(DistributionStatus::Delivered, Utc::now()))
            .unwrap();

        assert_eq!(d.status(), DistributionStatus::Delivered);
        assert!(d.dispatched_at().is_some());
        assert!(d.delivered_at().is_some());
        assert_eq!(d.items(), items.as_slice());
        assert!(!d.is_open());
    }

    #[test]
    fn cancel_is_refused_once_delivered() {
        let delivered = pending()
            .advance(DistributionStatus::Preparing, Utc::now())
            .and_then(|d| d.advance(DistributionStatus::InTransit, Utc::now()))
            .and_then(|d| d.advance(DistributionStatus::Delivered, Utc::now()))
            .unwrap();

        assert!(delivered.cancel(Utc::now()).is_err());
        assert!(delivered.assign(Some(UserId::new()), Utc::now()).is_err());

        let cancelled = pending().cancel(Utc::now()).unwrap();
        assert_eq!(cancelled.status(), DistributionStatus::Cancelled);
        assert!(cancelled.cancelled_at().is_some());
    }

    #[test]
    fn fulfillment_flattens_with_method_tag() {
        let json = serde_json::to_value(Fulfillment::Delivery {
            address: "12 Main St".to_string(),
            contact_phone: Some("555-0100".to_string()),
            scheduled_at: None,
        })
        .unwrap();
        assert_eq!(json["method"], "delivery");
        assert_eq!(json["address"], "12 Main St");
    }
}
