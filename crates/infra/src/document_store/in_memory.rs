use std::collections::HashMap;
use std::sync::RwLock;

use aidflow_core::{ExpectedVersion, Versioned};

use super::r#trait::{DocumentStore, StoreError};

/// In-memory document collection.
///
/// Intended for tests/dev. Every call takes the collection lock once, which
/// gives the per-document read-modify-write atomicity the coordinator relies on.
#[derive(Debug)]
pub struct InMemoryDocumentStore<T: Versioned> {
    collection: &'static str,
    docs: RwLock<HashMap<T::Id, T>>,
}

impl<T: Versioned> InMemoryDocumentStore<T> {
    pub fn new(collection: &'static str) -> Self {
        Self {
            collection,
            docs: RwLock::new(HashMap::new()),
        }
    }

    pub fn collection(&self) -> &'static str {
        self.collection
    }

    fn poisoned(&self) -> StoreError {
        StoreError::Unavailable(format!("{} lock poisoned", self.collection))
    }
}

impl<T> DocumentStore<T> for InMemoryDocumentStore<T>
where
    T: Versioned + Clone + Send + Sync,
    T::Id: Send + Sync,
{
    fn get(&self, id: &T::Id) -> Result<Option<T>, StoreError> {
        let docs = self.docs.read().map_err(|_| self.poisoned())?;
        Ok(docs.get(id).cloned())
    }

    fn put(&self, mut doc: T, expected: ExpectedVersion) -> Result<T, StoreError> {
        let mut docs = self.docs.write().map_err(|_| self.poisoned())?;

        let current = docs.get(doc.id()).map(Versioned::version);
        if !expected.matches(current) {
            return Err(StoreError::Concurrency(format!(
                "{} {:?}: expected {expected:?}, found {current:?}",
                self.collection,
                doc.id()
            )));
        }

        doc.set_version(current.unwrap_or(0) + 1);
        docs.insert(doc.id().clone(), doc.clone());
        Ok(doc)
    }

    fn remove(&self, id: &T::Id, expected: ExpectedVersion) -> Result<Option<T>, StoreError> {
        let mut docs = self.docs.write().map_err(|_| self.poisoned())?;

        let current = docs.get(id).map(Versioned::version);
        if !expected.matches(current) {
            return Err(StoreError::Concurrency(format!(
                "{} {id:?}: expected {expected:?}, found {current:?}",
                self.collection
            )));
        }
        Ok(docs.remove(id))
    }

    fn list(&self) -> Result<Vec<T>, StoreError> {
        let docs = self.docs.read().map_err(|_| self.poisoned())?;
        Ok(docs.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Note {
        id: u32,
        body: &'static str,
        version: u64,
    }

    impl Versioned for Note {
        type Id = u32;

        fn id(&self) -> &u32 {
            &self.id
        }

        fn version(&self) -> u64 {
            self.version
        }

        fn set_version(&mut self, version: u64) {
            self.version = version;
        }
    }

    fn note(body: &'static str) -> Note {
        Note { id: 7, body, version: 0 }
    }

    #[test]
    fn put_bumps_version_and_enforces_cas() {
        let store = InMemoryDocumentStore::new("notes");

        let first = store.put(note("a"), ExpectedVersion::Absent).unwrap();
        assert_eq!(first.version, 1);

        assert!(matches!(
            store.put(note("dup"), ExpectedVersion::Absent),
            Err(StoreError::Concurrency(_))
        ));

        let second = store.put(note("b"), ExpectedVersion::Exact(1)).unwrap();
        assert_eq!(second.version, 2);

        // A writer still holding version 1 loses.
        assert!(store.put(note("stale"), ExpectedVersion::Exact(1)).is_err());
        assert_eq!(store.get(&7).unwrap().unwrap().body, "b");
    }

    #[test]
    fn remove_checks_version_and_returns_document() {
        let store = InMemoryDocumentStore::new("notes");
        store.put(note("a"), ExpectedVersion::Absent).unwrap();

        assert!(store.remove(&7, ExpectedVersion::Exact(9)).is_err());
        let removed = store.remove(&7, ExpectedVersion::Exact(1)).unwrap();

        assert_eq!(removed.map(|n| n.body), Some("a"));
        assert!(store.list().unwrap().is_empty());
    }
}
