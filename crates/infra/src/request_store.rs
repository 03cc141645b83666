use chrono::Utc;
use tracing::info;

use aidflow_core::{DomainError, ExpectedVersion, RequestId, Versioned};
use aidflow_requests::{AidRequest, Catalog, NewRequest, RequestStatus, TransitionSource};

use crate::document_store::DocumentStore;
use crate::error::WorkflowResult;

/// Owns aid request records and their status.
#[derive(Debug)]
pub struct RequestStore<S> {
    store: S,
}

impl<S> RequestStore<S>
where
    S: DocumentStore<AidRequest>,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn create(&self, new: NewRequest, catalog: &impl Catalog) -> WorkflowResult<AidRequest> {
        let request = AidRequest::create(RequestId::new(), new, catalog, Utc::now())?;
        let request = self.store.put(request, ExpectedVersion::Absent)?;
        info!(request_id = %request.id_typed(), items = request.items().len(), "aid request created");
        Ok(request)
    }

    pub fn get(&self, request_id: RequestId) -> WorkflowResult<AidRequest> {
        self.store
            .get(&request_id)?
            .ok_or_else(|| DomainError::not_found(format!("aid request {request_id}")).into())
    }

    /// Oldest first.
    pub fn list(&self) -> WorkflowResult<Vec<AidRequest>> {
        let mut requests = self.store.list()?;
        requests.sort_by_key(|r| (r.created_at(), r.id_typed()));
        Ok(requests)
    }

    /// Move a request along its transition graph with compare-and-swap.
    ///
    /// A self-edge is returned as-is without a write.
    pub fn set_status(
        &self,
        request_id: RequestId,
        target: RequestStatus,
        source: TransitionSource,
    ) -> WorkflowResult<AidRequest> {
        let current = self.get(request_id)?;
        self.transition(&current, target, source)
    }

    /// Same as [`Self::set_status`] against an already loaded record.
    pub fn transition(
        &self,
        current: &AidRequest,
        target: RequestStatus,
        source: TransitionSource,
    ) -> WorkflowResult<AidRequest> {
        let next = current.with_status(target, source, Utc::now())?;
        if next.status() == current.status() {
            return Ok(next);
        }
        let request = self.store.put(next, ExpectedVersion::Exact(current.version()))?;
        info!(
            request_id = %request.id_typed(),
            from = %current.status(),
            to = %request.status(),
            "aid request status changed"
        );
        Ok(request)
    }

    /// Put back the content of `previous` over the committed `written` copy.
    pub(crate) fn restore(&self, previous: &AidRequest, written: &AidRequest) -> WorkflowResult<AidRequest> {
        Ok(self
            .store
            .put(previous.clone(), ExpectedVersion::Exact(written.version()))?)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use aidflow_core::{ItemId, UserId};
    use aidflow_inventory::LineItem;
    use aidflow_requests::{CatalogEntry, Urgency};

    use super::*;
    use crate::document_store::{InMemoryDocumentStore, collections};
    use crate::error::WorkflowError;

    struct Fixed(HashMap<ItemId, CatalogEntry>);

    impl Catalog for Fixed {
        fn lookup(&self, item_id: &ItemId) -> Option<CatalogEntry> {
            self.0.get(item_id).cloned()
        }
    }

    fn setup() -> (RequestStore<InMemoryDocumentStore<AidRequest>>, Fixed, ItemId) {
        let item_id = ItemId::new();
        let catalog = Fixed(HashMap::from([(
            item_id,
            CatalogEntry {
                name: "Diapers".to_string(),
                unit: "pack".to_string(),
            },
        )]));
        (
            RequestStore::new(InMemoryDocumentStore::new(collections::AID_REQUESTS)),
            catalog,
            item_id,
        )
    }

    fn new_request(item_id: ItemId) -> NewRequest {
        NewRequest {
            beneficiary_id: UserId::new(),
            items: vec![LineItem {
                item_id,
                name: String::new(),
                quantity: 2,
                unit: String::new(),
            }],
            urgency: Urgency::Medium,
            notes: String::new(),
        }
    }

    #[test]
    fn set_status_walks_graph_and_bumps_version() {
        let (store, catalog, item_id) = setup();
        let created = store.create(new_request(item_id), &catalog).unwrap();
        assert_eq!(created.version(), 1);

        let approved = store
            .set_status(created.id_typed(), RequestStatus::Approved, TransitionSource::Direct)
            .unwrap();
        assert_eq!(approved.status(), RequestStatus::Approved);
        assert_eq!(approved.version(), 2);
    }

    #[test]
    fn illegal_target_leaves_record_untouched() {
        let (store, catalog, item_id) = setup();
        let created = store.create(new_request(item_id), &catalog).unwrap();

        let err = store
            .set_status(created.id_typed(), RequestStatus::InTransit, TransitionSource::Direct)
            .unwrap_err();

        assert!(matches!(err, WorkflowError::Domain(DomainError::IllegalTransition { .. })));
        assert_eq!(store.get(created.id_typed()).unwrap(), created);
    }

    #[test]
    fn stale_copy_loses_cas() {
        let (store, catalog, item_id) = setup();
        let created = store.create(new_request(item_id), &catalog).unwrap();
        store
            .transition(&created, RequestStatus::Approved, TransitionSource::Direct)
            .unwrap();

        let err = store
            .transition(&created, RequestStatus::Denied, TransitionSource::Direct)
            .unwrap_err();
        assert_eq!(err.kind(), "ConcurrencyConflictError");
    }

    #[test]
    fn list_is_ordered_by_creation() {
        let (store, catalog, item_id) = setup();
        let first = store.create(new_request(item_id), &catalog).unwrap();
        let second = store.create(new_request(item_id), &catalog).unwrap();

        let ids: Vec<RequestId> = store.list().unwrap().iter().map(AidRequest::id_typed).collect();
        assert_eq!(ids, vec![first.id_typed(), second.id_typed()]);
    }
}
