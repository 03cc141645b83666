use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use aidflow_core::{DistributionId, ItemId, RequestId, UserId, Versioned};
use aidflow_distributions::{Distribution, DistributionStatus, Fulfillment};
use aidflow_infra::DistributionDraft;
use aidflow_inventory::{HistoryChange, HistoryEntry, InventoryItem, LineItem, StockLine};
use aidflow_requests::{AidRequest, NewRequest, RequestStatus, Urgency};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestLineBody {
    pub item_id: ItemId,
    pub quantity: i64,
    /// Filled from the catalog when blank.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub unit: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAidRequestBody {
    /// Defaults to the caller.
    #[serde(default)]
    pub beneficiary_id: Option<UserId>,
    pub items: Vec<RequestLineBody>,
    pub urgency: Urgency,
    #[serde(default)]
    pub notes: String,
}

impl CreateAidRequestBody {
    pub fn into_new_request(self, caller: UserId) -> NewRequest {
        NewRequest {
            beneficiary_id: self.beneficiary_id.unwrap_or(caller),
            items: self
                .items
                .into_iter()
                .map(|l| LineItem {
                    item_id: l.item_id,
                    name: l.name,
                    quantity: l.quantity,
                    unit: l.unit,
                })
                .collect(),
            urgency: self.urgency,
            notes: self.notes,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RequestStatusBody {
    pub status: RequestStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLineBody {
    pub item_id: ItemId,
    pub quantity: i64,
}

/// Fulfillment details, flattened next to `method` in request and response bodies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum FulfillmentDto {
    Pickup {
        location: String,
        #[serde(rename = "scheduledAt", default, skip_serializing_if = "Option::is_none")]
        scheduled_at: Option<DateTime<Utc>>,
    },
    Delivery {
        address: String,
        #[serde(rename = "contactPhone", default, skip_serializing_if = "Option::is_none")]
        contact_phone: Option<String>,
        #[serde(rename = "scheduledAt", default, skip_serializing_if = "Option::is_none")]
        scheduled_at: Option<DateTime<Utc>>,
    },
}

impl From<FulfillmentDto> for Fulfillment {
    fn from(value: FulfillmentDto) -> Self {
        match value {
            FulfillmentDto::Pickup { location, scheduled_at } => Fulfillment::Pickup { location, scheduled_at },
            FulfillmentDto::Delivery {
                address,
                contact_phone,
                scheduled_at,
            } => Fulfillment::Delivery {
                address,
                contact_phone,
                scheduled_at,
            },
        }
    }
}

impl From<&Fulfillment> for FulfillmentDto {
    fn from(value: &Fulfillment) -> Self {
        match value.clone() {
            Fulfillment::Pickup { location, scheduled_at } => FulfillmentDto::Pickup { location, scheduled_at },
            Fulfillment::Delivery {
                address,
                contact_phone,
                scheduled_at,
            } => FulfillmentDto::Delivery {
                address,
                contact_phone,
                scheduled_at,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDistributionBody {
    pub request_id: RequestId,
    pub items: Vec<StockLineBody>,
    #[serde(flatten)]
    pub fulfillment: FulfillmentDto,
    #[serde(default)]
    pub assignee_id: Option<UserId>,
    #[serde(default)]
    pub notes: String,
}

impl From<CreateDistributionBody> for DistributionDraft {
    fn from(value: CreateDistributionBody) -> Self {
        DistributionDraft {
            request_id: value.request_id,
            items: value
                .items
                .into_iter()
                .map(|l| StockLine {
                    item_id: l.item_id,
                    quantity: l.quantity,
                })
                .collect(),
            fulfillment: value.fulfillment.into(),
            assignee_id: value.assignee_id,
            notes: value.notes,
        }
    }
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchDistributionBody {
    #[serde(default)]
    pub status: Option<DistributionStatus>,
    /// `null` unassigns.
    #[serde(default, deserialize_with = "double_option")]
    pub assignee_id: Option<Option<UserId>>,
}

#[derive(Debug, Deserialize)]
pub struct AdjustStockBody {
    pub delta: i64,
    #[serde(default)]
    pub reason: String,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineView {
    pub item_id: ItemId,
    pub name: String,
    pub quantity: i64,
    pub unit: String,
}

impl From<&LineItem> for LineView {
    fn from(l: &LineItem) -> Self {
        Self {
            item_id: l.item_id,
            name: l.name.clone(),
            quantity: l.quantity,
            unit: l.unit.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AidRequestView {
    pub id: RequestId,
    pub beneficiary_id: UserId,
    pub items: Vec<LineView>,
    pub urgency: Urgency,
    pub status: RequestStatus,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub version: u64,
}

impl From<&AidRequest> for AidRequestView {
    fn from(r: &AidRequest) -> Self {
        Self {
            id: r.id_typed(),
            beneficiary_id: r.beneficiary_id(),
            items: r.items().iter().map(LineView::from).collect(),
            urgency: r.urgency(),
            status: r.status(),
            notes: r.notes().to_string(),
            created_at: r.created_at(),
            updated_at: r.updated_at(),
            version: r.version(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionView {
    pub id: DistributionId,
    pub request_id: RequestId,
    pub items: Vec<LineView>,
    #[serde(flatten)]
    pub fulfillment: FulfillmentDto,
    pub assignee_id: Option<UserId>,
    pub status: DistributionStatus,
    pub notes: String,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub dispatched_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub version: u64,
}

impl From<&Distribution> for DistributionView {
    fn from(d: &Distribution) -> Self {
        Self {
            id: d.id_typed(),
            request_id: d.request_id(),
            items: d.items().iter().map(LineView::from).collect(),
            fulfillment: d.fulfillment().into(),
            assignee_id: d.assignee_id(),
            status: d.status(),
            notes: d.notes().to_string(),
            created_by: d.created_by(),
            created_at: d.created_at(),
            dispatched_at: d.dispatched_at(),
            delivered_at: d.delivered_at(),
            cancelled_at: d.cancelled_at(),
            version: d.version(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryView {
    #[serde(flatten)]
    pub change: HistoryChange,
    pub timestamp: DateTime<Utc>,
    pub actor_id: UserId,
}

impl From<&HistoryEntry> for HistoryView {
    fn from(h: &HistoryEntry) -> Self {
        Self {
            change: h.change.clone(),
            timestamp: h.timestamp,
            actor_id: h.actor_id,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItemView {
    pub id: ItemId,
    pub name: String,
    pub category: String,
    pub unit: String,
    pub quantity: i64,
    pub threshold: i64,
    pub expiry: Option<NaiveDate>,
    pub low_stock: bool,
    pub deleted: bool,
    pub history: Vec<HistoryView>,
    pub updated_at: DateTime<Utc>,
    pub version: u64,
}

impl From<&InventoryItem> for InventoryItemView {
    fn from(i: &InventoryItem) -> Self {
        Self {
            id: i.id_typed(),
            name: i.name().to_string(),
            category: i.category().to_string(),
            unit: i.unit().to_string(),
            quantity: i.quantity(),
            threshold: i.threshold(),
            expiry: i.expiry(),
            low_stock: i.is_low_stock(),
            deleted: i.is_deleted(),
            history: i.history().iter().map(HistoryView::from).collect(),
            updated_at: i.updated_at(),
            version: i.version(),
        }
    }
}
