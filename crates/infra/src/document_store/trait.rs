use std::sync::Arc;

use thiserror::Error;

use aidflow_core::{ExpectedVersion, Versioned};

/// Document store operation error.
///
/// These are **infrastructure errors** (backend failures, lost updates) as
/// opposed to domain errors (validation, transitions, stock).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Compare-and-swap failed: the stored version moved since it was read.
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    /// The backend could not complete the operation.
    #[error("document store unavailable: {0}")]
    Unavailable(String),
}

/// Collection of versioned documents keyed by their id.
///
/// ## Write semantics
///
/// `put()`:
/// - compares the stored version against `expected` (missing document = `None`)
/// - stores `doc` with version `stored + 1` (or `1` for a new document)
/// - returns the committed copy, carrying the new version
///
/// A single `put()` is atomic. There are no multi-document transactions; callers
/// that span documents compensate on partial failure.
pub trait DocumentStore<T: Versioned>: Send + Sync {
    fn get(&self, id: &T::Id) -> Result<Option<T>, StoreError>;

    fn put(&self, doc: T, expected: ExpectedVersion) -> Result<T, StoreError>;

    /// Physically remove a document. Only used to undo a half-written create.
    fn remove(&self, id: &T::Id, expected: ExpectedVersion) -> Result<Option<T>, StoreError>;

    /// All documents, in no particular order.
    fn list(&self) -> Result<Vec<T>, StoreError>;
}

impl<T, S> DocumentStore<T> for Arc<S>
where
    T: Versioned,
    S: DocumentStore<T> + ?Sized,
{
    fn get(&self, id: &T::Id) -> Result<Option<T>, StoreError> {
        (**self).get(id)
    }

    fn put(&self, doc: T, expected: ExpectedVersion) -> Result<T, StoreError> {
        (**self).put(doc, expected)
    }

    fn remove(&self, id: &T::Id, expected: ExpectedVersion) -> Result<Option<T>, StoreError> {
        (**self).remove(id, expected)
    }

    fn list(&self) -> Result<Vec<T>, StoreError> {
        (**self).list()
    }
}
