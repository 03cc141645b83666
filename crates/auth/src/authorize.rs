use serde::Serialize;
use thiserror::Error;

use aidflow_core::{DomainError, UserId};

use crate::{Operation, Principal, Role};

/// What a role may do for one operation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Grant {
    Denied,
    /// Only on subjects the principal owns (or subjects nobody owns yet).
    Own,
    Full,
}

/// Ownership of the record an operation targets.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Subject {
    /// Collection-level operation or a record with no owner (e.g. unassigned distribution).
    Unowned,
    /// Record owned by a user (a beneficiary's request, a volunteer's assignment).
    OwnedBy(UserId),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("role '{role}' may not perform '{operation}'")]
    Forbidden { role: Role, operation: Operation },

    #[error("role '{role}' may only perform '{operation}' on its own records")]
    NotOwner { role: Role, operation: Operation },
}

impl From<AuthzError> for DomainError {
    fn from(value: AuthzError) -> Self {
        DomainError::permission(value.to_string())
    }
}

/// The authorization policy table, keyed by `(role, operation)`.
pub fn grant(role: Role, operation: Operation) -> Grant {
    use Grant::{Denied, Full, Own};
    use Operation::*;

    match role {
        Role::Admin | Role::Staff => Full,
        Role::Volunteer => match operation {
            AdvanceDistribution => Own,
            ViewInventory | ViewRequests => Full,
            _ => Denied,
        },
        Role::Beneficiary => match operation {
            CreateRequest | CancelRequest | ViewRequests => Own,
            _ => Denied,
        },
    }
}

/// Authorize a principal for an operation on a subject.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(principal: &Principal, operation: Operation, subject: Subject) -> Result<(), AuthzError> {
    match grant(principal.role, operation) {
        Grant::Full => Ok(()),
        Grant::Own => match subject {
            Subject::Unowned => Ok(()),
            Subject::OwnedBy(owner) if owner == principal.user_id => Ok(()),
            Subject::OwnedBy(_) => Err(AuthzError::NotOwner {
                role: principal.role,
                operation,
            }),
        },
        Grant::Denied => Err(AuthzError::Forbidden {
            role: principal.role,
            operation,
        }),
    }
}

/// Operations a role can perform at all, with their grant level.
pub fn allowed_operations(role: Role) -> Vec<(Operation, Grant)> {
    Operation::ALL
        .into_iter()
        .map(|op| (op, grant(role, op)))
        .filter(|(_, g)| *g != Grant::Denied)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: Role) -> Principal {
        Principal::new(UserId::new(), role)
    }

    #[test]
    fn staff_and_admin_hold_every_operation() {
        for role in [Role::Admin, Role::Staff] {
            let p = principal(role);
            for op in Operation::ALL {
                assert!(authorize(&p, op, Subject::OwnedBy(UserId::new())).is_ok(), "{role} {op}");
            }
        }
    }

    #[test]
    fn beneficiary_is_limited_to_own_requests() {
        let p = principal(Role::Beneficiary);

        assert!(authorize(&p, Operation::CreateRequest, Subject::OwnedBy(p.user_id)).is_ok());
        assert_eq!(
            authorize(&p, Operation::CreateRequest, Subject::OwnedBy(UserId::new())),
            Err(AuthzError::NotOwner {
                role: Role::Beneficiary,
                operation: Operation::CreateRequest
            })
        );
        assert!(matches!(
            authorize(&p, Operation::CreateDistribution, Subject::Unowned),
            Err(AuthzError::Forbidden { .. })
        ));
        assert!(authorize(&p, Operation::ViewInventory, Subject::Unowned).is_err());
    }

    #[test]
    fn volunteer_advances_unassigned_or_own_distributions() {
        let p = principal(Role::Volunteer);

        assert!(authorize(&p, Operation::AdvanceDistribution, Subject::Unowned).is_ok());
        assert!(authorize(&p, Operation::AdvanceDistribution, Subject::OwnedBy(p.user_id)).is_ok());
        assert!(authorize(&p, Operation::AdvanceDistribution, Subject::OwnedBy(UserId::new())).is_err());
        assert!(authorize(&p, Operation::CancelDistribution, Subject::Unowned).is_err());
    }

    #[test]
    fn denial_converts_to_permission_error() {
        let err: DomainError = AuthzError::Forbidden {
            role: Role::Volunteer,
            operation: Operation::ManageInventory,
        }
        .into();
        assert_eq!(err.kind(), "PermissionError");
        assert!(err.to_string().contains("manage_inventory"));
    }

    #[test]
    fn allowed_operations_omits_denied_entries() {
        let ops: Vec<Operation> = allowed_operations(Role::Beneficiary).into_iter().map(|(op, _)| op).collect();
        assert_eq!(
            ops,
            vec![Operation::CreateRequest, Operation::CancelRequest, Operation::ViewRequests]
        );
    }
}
