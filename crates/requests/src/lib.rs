//! Aid request domain module.
//!
//! Business rules for beneficiary requests and their status graph,
//! implemented purely as deterministic domain logic (no IO, no HTTP, no
//! storage).

pub mod request;
pub mod status;

pub use request::{AidRequest, Catalog, CatalogEntry, NewRequest, Urgency};
pub use status::{RequestStatus, TransitionSource};
