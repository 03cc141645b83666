use tracing::info;

use aidflow_core::{DistributionId, DomainError, ExpectedVersion, RequestId, Versioned};
use aidflow_distributions::Distribution;

use crate::document_store::DocumentStore;
use crate::error::WorkflowResult;

/// Owns distribution records.
#[derive(Debug)]
pub struct DistributionStore<S> {
    store: S,
}

impl<S> DistributionStore<S>
where
    S: DocumentStore<Distribution>,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn insert(&self, distribution: Distribution) -> WorkflowResult<Distribution> {
        let distribution = self.store.put(distribution, ExpectedVersion::Absent)?;
        info!(
            distribution_id = %distribution.id_typed(),
            request_id = %distribution.request_id(),
            "distribution created"
        );
        Ok(distribution)
    }

    pub fn get(&self, distribution_id: DistributionId) -> WorkflowResult<Distribution> {
        self.store
            .get(&distribution_id)?
            .ok_or_else(|| DomainError::not_found(format!("distribution {distribution_id}")).into())
    }

    /// Oldest first.
    pub fn list(&self) -> WorkflowResult<Vec<Distribution>> {
        let mut distributions = self.store.list()?;
        distributions.sort_by_key(|d| (d.created_at(), d.id_typed()));
        Ok(distributions)
    }

    pub fn for_request(&self, request_id: RequestId) -> WorkflowResult<Vec<Distribution>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|d| d.request_id() == request_id)
            .collect())
    }

    /// The request's single non-terminal distribution, if any.
    pub fn open_for_request(&self, request_id: RequestId) -> WorkflowResult<Option<Distribution>> {
        Ok(self.for_request(request_id)?.into_iter().find(Distribution::is_open))
    }

    /// Write `next` over `current` with compare-and-swap.
    pub fn update(&self, current: &Distribution, next: Distribution) -> WorkflowResult<Distribution> {
        let distribution = self.store.put(next, ExpectedVersion::Exact(current.version()))?;
        info!(
            distribution_id = %distribution.id_typed(),
            status = %distribution.status(),
            "distribution updated"
        );
        Ok(distribution)
    }

    pub(crate) fn restore(&self, previous: &Distribution, written: &Distribution) -> WorkflowResult<Distribution> {
        Ok(self
            .store
            .put(previous.clone(), ExpectedVersion::Exact(written.version()))?)
    }

    /// Undo a create that the rest of the workflow could not follow through on.
    pub(crate) fn discard(&self, written: &Distribution) -> WorkflowResult<()> {
        self.store
            .remove(written.id(), ExpectedVersion::Exact(written.version()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use aidflow_core::{ItemId, UserId};
    use aidflow_distributions::{DistributionStatus, Fulfillment, NewDistribution};
    use aidflow_inventory::LineItem;

    use super::*;
    use crate::document_store::{InMemoryDocumentStore, collections};

    fn distribution(request_id: RequestId) -> Distribution {
        Distribution::create(
            DistributionId::new(),
            NewDistribution {
                request_id,
                reserved: vec![LineItem {
                    item_id: ItemId::new(),
                    name: "Soap".to_string(),
                    quantity: 1,
                    unit: "bar".to_string(),
                }],
                fulfillment: Fulfillment::Pickup {
                    location: "Hall B".to_string(),
                    scheduled_at: None,
                },
                assignee_id: None,
                notes: String::new(),
                created_by: UserId::new(),
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn open_for_request_ignores_terminal_distributions() {
        let store = DistributionStore::new(InMemoryDocumentStore::new(collections::DISTRIBUTIONS));
        let request_id = RequestId::new();

        let first = store.insert(distribution(request_id)).unwrap();
        let cancelled = first.cancel(Utc::now()).unwrap();
        store.update(&first, cancelled).unwrap();
        assert!(store.open_for_request(request_id).unwrap().is_none());

        let second = store.insert(distribution(request_id)).unwrap();
        let open = store.open_for_request(request_id).unwrap().unwrap();
        assert_eq!(open.id_typed(), second.id_typed());
        assert_eq!(open.status(), DistributionStatus::Pending);
        assert_eq!(store.for_request(request_id).unwrap().len(), 2);
    }

    #[test]
    fn discard_removes_only_the_written_version() {
        let store = DistributionStore::new(InMemoryDocumentStore::new(collections::DISTRIBUTIONS));
        let written = store.insert(distribution(RequestId::new())).unwrap();

        store.discard(&written).unwrap();

        assert!(store.get(written.id_typed()).is_err());
    }
}
