//! Domain error model.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::id::ItemId;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// One item that could not cover a requested quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shortage {
    pub item_id: ItemId,
    pub requested: i64,
    pub available: i64,
}

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// transitions, stock, conflicts). Storage failures belong to infra.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed input; the caller fixes it and retries.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A status change that the transition table does not allow.
    #[error("illegal transition from {from} to {to}")]
    IllegalTransition { from: String, to: String },

    /// Requested quantity exceeds availability for one or more items.
    #[error("insufficient inventory: {}", describe_shortages(.0))]
    InsufficientInventory(Vec<Shortage>),

    /// A referenced record does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The actor's role lacks the capability for the mutation.
    #[error("permission denied: {0}")]
    Permission(String),

    /// A race was detected and the operation was aborted without effect.
    #[error("concurrency conflict: {0}")]
    ConcurrencyConflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn illegal_transition(from: impl core::fmt::Display, to: impl core::fmt::Display) -> Self {
        Self::IllegalTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn permission(msg: impl Into<String>) -> Self {
        Self::Permission(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::ConcurrencyConflict(msg.into())
    }

    /// Stable error kind name surfaced to API clients.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::Validation(_) | DomainError::IllegalTransition { .. } => "ValidationError",
            DomainError::InsufficientInventory(_) => "InsufficientInventoryError",
            DomainError::NotFound(_) => "NotFoundError",
            DomainError::Permission(_) => "PermissionError",
            DomainError::ConcurrencyConflict(_) => "ConcurrencyConflictError",
        }
    }
}

fn describe_shortages(shortages: &[Shortage]) -> String {
    shortages
        .iter()
        .map(|s| {
            format!(
                "item {} (requested {}, available {})",
                s.item_id, s.requested, s.available
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_inventory_message_names_every_item() {
        let a = ItemId::new();
        let b = ItemId::new();
        let err = DomainError::InsufficientInventory(vec![
            Shortage { item_id: a, requested: 6, available: 4 },
            Shortage { item_id: b, requested: 2, available: 0 },
        ]);

        let msg = err.to_string();
        assert!(msg.contains(&a.to_string()));
        assert!(msg.contains(&b.to_string()));
        assert!(msg.contains("requested 6, available 4"));
        assert_eq!(err.kind(), "InsufficientInventoryError");
    }

    #[test]
    fn illegal_transition_is_a_validation_kind() {
        let err = DomainError::illegal_transition("pending", "delivered");
        assert_eq!(err.kind(), "ValidationError");
        assert_eq!(err.to_string(), "illegal transition from pending to delivered");
    }
}
