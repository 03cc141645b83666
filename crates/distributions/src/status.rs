use core::str::FromStr;

use serde::{Deserialize, Serialize};

use aidflow_core::DomainError;
use aidflow_requests::RequestStatus;

/// Distribution status lifecycle.
///
/// ```text
/// pending → preparing → in_transit → delivered
///    └──────────┴───────────┴──→ cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionStatus {
    Pending,
    Preparing,
    InTransit,
    Delivered,
    Cancelled,
}

impl DistributionStatus {
    pub const ALL: [DistributionStatus; 5] = [
        DistributionStatus::Pending,
        DistributionStatus::Preparing,
        DistributionStatus::InTransit,
        DistributionStatus::Delivered,
        DistributionStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DistributionStatus::Pending => "pending",
            DistributionStatus::Preparing => "preparing",
            DistributionStatus::InTransit => "in_transit",
            DistributionStatus::Delivered => "delivered",
            DistributionStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, DistributionStatus::Delivered | DistributionStatus::Cancelled)
    }

    /// The single next state on the happy path.
    pub fn next(&self) -> Option<DistributionStatus> {
        match self {
            DistributionStatus::Pending => Some(DistributionStatus::Preparing),
            DistributionStatus::Preparing => Some(DistributionStatus::InTransit),
            DistributionStatus::InTransit => Some(DistributionStatus::Delivered),
            DistributionStatus::Delivered | DistributionStatus::Cancelled => None,
        }
    }

    pub fn can_advance_to(&self, target: DistributionStatus) -> bool {
        self.next() == Some(target)
    }

    /// Status the linked aid request must carry while this distribution is in `self`.
    pub fn linked_request_status(&self) -> RequestStatus {
        match self {
            DistributionStatus::Pending | DistributionStatus::Preparing => RequestStatus::InProgress,
            DistributionStatus::InTransit => RequestStatus::InTransit,
            DistributionStatus::Delivered => RequestStatus::Delivered,
            DistributionStatus::Cancelled => RequestStatus::Cancelled,
        }
    }
}

impl core::fmt::Display for DistributionStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistributionStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DistributionStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown distribution status '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use aidflow_requests::TransitionSource;

    use super::*;

    #[test]
    fn advance_only_to_the_next_state() {
        assert!(DistributionStatus::Pending.can_advance_to(DistributionStatus::Preparing));
        assert!(!DistributionStatus::Pending.can_advance_to(DistributionStatus::InTransit));
        assert!(!DistributionStatus::Pending.can_advance_to(DistributionStatus::Delivered));
        assert!(!DistributionStatus::InTransit.can_advance_to(DistributionStatus::Preparing));
        assert!(!DistributionStatus::Delivered.can_advance_to(DistributionStatus::Cancelled));
    }

    #[test]
    fn mapping_follows_linked_request_edges() {
        // Walking the distribution chain must always be a legal linked walk on the request.
        let mut request = RequestStatus::InProgress;
        let mut status = DistributionStatus::Pending;
        while let Some(next) = status.next() {
            let target = next.linked_request_status();
            assert!(request.can_transition_to(target, TransitionSource::Linked), "{request} -> {target}");
            request = target;
            status = next;
        }
        assert_eq!(request, RequestStatus::Delivered);

        for open in [DistributionStatus::Pending, DistributionStatus::Preparing, DistributionStatus::InTransit] {
            assert!(
                open.linked_request_status()
                    .can_transition_to(RequestStatus::Cancelled, TransitionSource::Linked)
            );
        }
    }
}
