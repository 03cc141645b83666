use serde::{Deserialize, Serialize};

/// Every mutation or read the workflow core authorizes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    CreateRequest,
    /// Approve, deny, or otherwise move a request forward.
    ReviewRequest,
    CancelRequest,
    ViewRequests,
    CreateDistribution,
    AssignDistribution,
    AdvanceDistribution,
    CancelDistribution,
    ManageInventory,
    ViewInventory,
}

impl Operation {
    pub const ALL: [Operation; 10] = [
        Operation::CreateRequest,
        Operation::ReviewRequest,
        Operation::CancelRequest,
        Operation::ViewRequests,
        Operation::CreateDistribution,
        Operation::AssignDistribution,
        Operation::AdvanceDistribution,
        Operation::CancelDistribution,
        Operation::ManageInventory,
        Operation::ViewInventory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::CreateRequest => "create_request",
            Operation::ReviewRequest => "review_request",
            Operation::CancelRequest => "cancel_request",
            Operation::ViewRequests => "view_requests",
            Operation::CreateDistribution => "create_distribution",
            Operation::AssignDistribution => "assign_distribution",
            Operation::AdvanceDistribution => "advance_distribution",
            Operation::CancelDistribution => "cancel_distribution",
            Operation::ManageInventory => "manage_inventory",
            Operation::ViewInventory => "view_inventory",
        }
    }
}

impl core::fmt::Display for Operation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
