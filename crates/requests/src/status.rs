use core::str::FromStr;

use serde::{Deserialize, Serialize};

use aidflow_core::DomainError;

/// Aid request status lifecycle.
///
/// ```text
/// pending → approved → in_progress → in_transit → delivered
///    ├─→ denied
///    └─→ cancelled ←─ approved
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    InProgress,
    InTransit,
    Delivered,
    Denied,
    Cancelled,
}

/// Who is asking for a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionSource {
    /// A reviewer or beneficiary setting the status directly.
    Direct,
    /// The workflow coordinator mirroring a distribution transition.
    Linked,
}

use RequestStatus::*;

/// Edges usable by any source.
const DIRECT_EDGES: &[(RequestStatus, RequestStatus)] = &[
    (Pending, Approved),
    (Approved, InProgress),
    (InProgress, InTransit),
    (InTransit, Delivered),
    (Pending, Denied),
    (Pending, Cancelled),
    (Approved, Cancelled),
];

/// Extra edges only a linked distribution may drive.
const LINKED_EDGES: &[(RequestStatus, RequestStatus)] = &[
    (InProgress, InProgress),
    (InProgress, Cancelled),
    (InTransit, Cancelled),
];

impl RequestStatus {
    pub const ALL: [RequestStatus; 7] = [Pending, Approved, InProgress, InTransit, Delivered, Denied, Cancelled];

    pub fn as_str(&self) -> &'static str {
        match self {
            Pending => "pending",
            Approved => "approved",
            InProgress => "in_progress",
            InTransit => "in_transit",
            Delivered => "delivered",
            Denied => "denied",
            Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Delivered | Denied | Cancelled)
    }

    /// Whether a distribution may be created against a request in this status.
    pub fn accepts_distribution(&self) -> bool {
        matches!(self, Approved | InProgress)
    }

    pub fn can_transition_to(self, target: RequestStatus, source: TransitionSource) -> bool {
        let edge = (self, target);
        DIRECT_EDGES.contains(&edge) || (source == TransitionSource::Linked && LINKED_EDGES.contains(&edge))
    }

    /// Targets a direct caller may choose from this status.
    pub fn direct_targets(self) -> Vec<RequestStatus> {
        DIRECT_EDGES
            .iter()
            .filter(|(from, _)| *from == self)
            .map(|(_, to)| *to)
            .collect()
    }
}

impl core::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RequestStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown request status '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_is_adjacent_only() {
        let chain = [Pending, Approved, InProgress, InTransit, Delivered];
        for pair in chain.windows(2) {
            assert!(pair[0].can_transition_to(pair[1], TransitionSource::Direct));
        }
        assert!(!Pending.can_transition_to(InProgress, TransitionSource::Direct));
        assert!(!Approved.can_transition_to(Delivered, TransitionSource::Linked));
        assert!(!InTransit.can_transition_to(Approved, TransitionSource::Direct));
    }

    #[test]
    fn terminal_statuses_have_no_exits() {
        for from in [Delivered, Denied, Cancelled] {
            assert!(from.is_terminal());
            for to in RequestStatus::ALL {
                assert!(!from.can_transition_to(to, TransitionSource::Linked), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn cancelling_in_flight_requests_is_linked_only() {
        assert!(!InProgress.can_transition_to(Cancelled, TransitionSource::Direct));
        assert!(InProgress.can_transition_to(Cancelled, TransitionSource::Linked));
        assert!(!InTransit.can_transition_to(Cancelled, TransitionSource::Direct));
        assert!(InTransit.can_transition_to(Cancelled, TransitionSource::Linked));
    }

    #[test]
    fn direct_targets_from_pending() {
        assert_eq!(Pending.direct_targets(), vec![Approved, Denied, Cancelled]);
    }

    #[test]
    fn parses_wire_names() {
        for st in RequestStatus::ALL {
            assert_eq!(st.as_str().parse::<RequestStatus>().unwrap(), st);
            assert_eq!(serde_json::to_value(st).unwrap(), st.as_str());
        }
        assert!("shipped".parse::<RequestStatus>().is_err());
    }
}
