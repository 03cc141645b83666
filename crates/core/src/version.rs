//! Record versioning for optimistic concurrency against a document store.

use crate::error::{DomainError, DomainResult};

/// A stored record with stable identity and a write counter.
///
/// Every committed write bumps `version` by one; the store compares it against
/// an [`ExpectedVersion`] to detect lost updates.
pub trait Versioned {
    /// Strongly-typed record identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the record identifier.
    fn id(&self) -> &Self::Id;

    /// Number of committed writes applied to this record (0 = never stored).
    fn version(&self) -> u64;

    /// Overwrite the version counter. Only the store should call this.
    fn set_version(&mut self, version: u64);
}

/// Optimistic concurrency expectation for a single document write.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking.
    Any,
    /// The document must not exist yet.
    Absent,
    /// Require the stored document to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    /// `actual` is `None` when no document is stored under the key.
    pub fn matches(self, actual: Option<u64>) -> bool {
        match (self, actual) {
            (ExpectedVersion::Any, _) => true,
            (ExpectedVersion::Absent, None) => true,
            (ExpectedVersion::Absent, Some(_)) => false,
            (ExpectedVersion::Exact(v), Some(a)) => v == a,
            (ExpectedVersion::Exact(_), None) => false,
        }
    }

    pub fn check(self, actual: Option<u64>) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "optimistic concurrency check failed (expected: {self:?}, actual: {actual:?})"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_requires_matching_stored_version() {
        assert!(ExpectedVersion::Exact(3).matches(Some(3)));
        assert!(!ExpectedVersion::Exact(3).matches(Some(4)));
        assert!(!ExpectedVersion::Exact(0).matches(None));
    }

    #[test]
    fn absent_only_matches_missing_documents() {
        assert!(ExpectedVersion::Absent.matches(None));
        assert!(ExpectedVersion::Absent.check(Some(1)).is_err());
    }
}
