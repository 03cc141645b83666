use serde::{Deserialize, Serialize};

use aidflow_core::UserId;

use crate::Role;

/// An authenticated actor as seen by the workflow core.
///
/// Construction is the identity provider's job; the core only reads it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn is_staff(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Staff)
    }
}
