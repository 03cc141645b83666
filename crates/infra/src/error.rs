use thiserror::Error;

use aidflow_auth::AuthzError;
use aidflow_core::DomainError;

use crate::document_store::StoreError;

/// Error returned by every ledger, store and coordinator operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;

impl From<AuthzError> for WorkflowError {
    fn from(value: AuthzError) -> Self {
        WorkflowError::Domain(value.into())
    }
}

impl WorkflowError {
    /// Stable error kind name surfaced to API clients.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkflowError::Domain(e) => e.kind(),
            WorkflowError::Store(StoreError::Concurrency(_)) => "ConcurrencyConflictError",
            WorkflowError::Store(StoreError::Unavailable(_)) => "StoreError",
        }
    }

    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            WorkflowError::Domain(e) => Some(e),
            WorkflowError::Store(_) => None,
        }
    }

    /// Message safe to hand to clients. Backend details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            WorkflowError::Domain(e) => e.to_string(),
            WorkflowError::Store(StoreError::Concurrency(_)) => {
                "the record changed concurrently; reload and retry".to_string()
            }
            WorkflowError::Store(StoreError::Unavailable(_)) => "storage is temporarily unavailable".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use aidflow_auth::{Operation, Role};

    use super::*;

    #[test]
    fn kinds_cover_domain_and_store_failures() {
        let lost = WorkflowError::from(StoreError::Concurrency("v2 != v3".into()));
        assert_eq!(lost.kind(), "ConcurrencyConflictError");
        assert!(!lost.public_message().contains("v2"));

        let denied = WorkflowError::from(AuthzError::Forbidden {
            role: Role::Volunteer,
            operation: Operation::ManageInventory,
        });
        assert_eq!(denied.kind(), "PermissionError");

        let transition = WorkflowError::from(DomainError::illegal_transition("pending", "delivered"));
        assert_eq!(transition.kind(), "ValidationError");
    }
}
