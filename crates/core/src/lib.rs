//! `aidflow-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod version;

pub use error::{DomainError, DomainResult, Shortage};
pub use id::{DistributionId, ItemId, RequestId, UserId};
pub use version::{ExpectedVersion, Versioned};
