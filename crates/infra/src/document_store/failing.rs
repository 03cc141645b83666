//! Store wrapper that fails a chosen write; used to drive compensation paths in tests.

use std::sync::Mutex;

use aidflow_core::{ExpectedVersion, Versioned};

use super::{DocumentStore, InMemoryDocumentStore, StoreError};

/// Once armed, lets `budget` puts through and fails the next one.
pub struct FailingStore<T: Versioned> {
    inner: InMemoryDocumentStore<T>,
    budget: Mutex<Option<usize>>,
}

impl<T: Versioned> FailingStore<T> {
    pub fn new(collection: &'static str) -> Self {
        Self {
            inner: InMemoryDocumentStore::new(collection),
            budget: Mutex::new(None),
        }
    }

    pub fn arm(&self, puts_allowed: usize) {
        *self.budget.lock().unwrap() = Some(puts_allowed);
    }
}

impl<T> DocumentStore<T> for FailingStore<T>
where
    T: Versioned + Clone + Send + Sync,
    T::Id: Send + Sync,
{
    fn get(&self, id: &T::Id) -> Result<Option<T>, StoreError> {
        self.inner.get(id)
    }

    fn put(&self, doc: T, expected: ExpectedVersion) -> Result<T, StoreError> {
        let mut budget = self.budget.lock().unwrap();
        if *budget == Some(0) {
            *budget = None;
            return Err(StoreError::Unavailable("disk full".into()));
        }
        if let Some(n) = budget.as_mut() {
            *n -= 1;
        }
        self.inner.put(doc, expected)
    }

    fn remove(&self, id: &T::Id, expected: ExpectedVersion) -> Result<Option<T>, StoreError> {
        self.inner.remove(id, expected)
    }

    fn list(&self) -> Result<Vec<T>, StoreError> {
        self.inner.list()
    }
}
