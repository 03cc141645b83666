use serde::{Deserialize, Serialize};

/// Collections a client caches and refetches as a whole.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    /// Aid requests together with their distributions.
    AidRequests,
    Inventory,
}

/// Coarse "collection changed" notification.
///
/// Carries no record payload: subscribers always refetch, never diff.
/// Wire shape is `{"type": "aid_request_updated"}` / `{"type": "inventory_updated"}`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeEvent {
    AidRequestUpdated,
    InventoryUpdated,
}

impl ChangeEvent {
    /// Stable event name (also used as the SSE event name).
    pub fn event_type(&self) -> &'static str {
        match self {
            ChangeEvent::AidRequestUpdated => "aid_request_updated",
            ChangeEvent::InventoryUpdated => "inventory_updated",
        }
    }

    /// The collection a subscriber must refetch on receipt.
    pub fn collection(&self) -> Collection {
        match self {
            ChangeEvent::AidRequestUpdated => Collection::AidRequests,
            ChangeEvent::InventoryUpdated => Collection::Inventory,
        }
    }

    pub fn for_collection(collection: Collection) -> Self {
        match collection {
            Collection::AidRequests => ChangeEvent::AidRequestUpdated,
            Collection::Inventory => ChangeEvent::InventoryUpdated,
        }
    }
}
