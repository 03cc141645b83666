//! Keyed document store boundary.
//!
//! Three independently keyed collections (`aidRequests`, `distributions`,
//! `inventory`) with per-document read-modify-write atomicity. No foreign keys
//! live in storage; cross-collection consistency is the coordinator's job.

#[cfg(test)]
pub(crate) mod failing;
pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryDocumentStore;
pub use r#trait::{DocumentStore, StoreError};

/// Collection names as they appear in logs and persisted layouts.
pub mod collections {
    pub const AID_REQUESTS: &str = "aidRequests";
    pub const DISTRIBUTIONS: &str = "distributions";
    pub const INVENTORY: &str = "inventory";
}
