//! Workflow coordination across requests, distributions and inventory.
//!
//! ```text
//! caller
//!   ↓
//! 1. authorize (role, operation) once
//!   ↓
//! 2. take the per-request lock
//!   ↓
//! 3. decide with pure domain functions
//!   ↓
//! 4. write ledger / distribution / request, compensating on partial failure
//!   ↓
//! 5. publish change hints (failures are logged only)
//! ```
//!
//! The document store has no multi-document transactions, so every operation
//! that writes more than one record undoes its earlier writes when a later one
//! fails. The ledger lock serializes quantity changes; the per-request lock
//! makes advance, cancel and create mutually exclusive for one request.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{error, info, warn};

use aidflow_auth::{Grant, Operation, Principal, Subject, authorize, grant};
use aidflow_core::{DistributionId, DomainError, ItemId, RequestId, UserId, Versioned};
use aidflow_distributions::{Distribution, DistributionStatus, Fulfillment, NewDistribution};
use aidflow_events::{ChangeEvent, EventBus, InMemoryEventBus, Subscription};
use aidflow_inventory::{InventoryItem, ItemDraft, ItemPatch, LineItem, StockLine, merge_lines};
use aidflow_requests::{AidRequest, NewRequest, RequestStatus, TransitionSource};

use crate::distribution_store::DistributionStore;
use crate::document_store::{DocumentStore, InMemoryDocumentStore, StoreError, collections};
use crate::error::WorkflowResult;
use crate::ledger::InventoryLedger;
use crate::notifier::ChangeNotifier;
use crate::request_store::RequestStore;

/// Input for [`WorkflowCoordinator::create_distribution`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistributionDraft {
    pub request_id: RequestId,
    pub items: Vec<StockLine>,
    pub fulfillment: Fulfillment,
    pub assignee_id: Option<UserId>,
    pub notes: String,
}

pub struct WorkflowCoordinator<RS, DS, IS, B> {
    requests: RequestStore<RS>,
    distributions: DistributionStore<DS>,
    ledger: InventoryLedger<IS>,
    notifier: ChangeNotifier<B>,
    request_locks: Mutex<HashMap<RequestId, Arc<Mutex<()>>>>,
}

/// Coordinator wired to in-memory collections, for dev and tests.
pub type InMemoryCoordinator = WorkflowCoordinator<
    InMemoryDocumentStore<AidRequest>,
    InMemoryDocumentStore<Distribution>,
    InMemoryDocumentStore<InventoryItem>,
    Arc<InMemoryEventBus<ChangeEvent>>,
>;

impl InMemoryCoordinator {
    pub fn in_memory(bus: Arc<InMemoryEventBus<ChangeEvent>>) -> Self {
        WorkflowCoordinator::new(
            InMemoryDocumentStore::new(collections::AID_REQUESTS),
            InMemoryDocumentStore::new(collections::DISTRIBUTIONS),
            InMemoryDocumentStore::new(collections::INVENTORY),
            bus,
        )
    }
}

fn assignee_subject(distribution: &Distribution) -> Subject {
    match distribution.assignee_id() {
        Some(assignee) => Subject::OwnedBy(assignee),
        None => Subject::Unowned,
    }
}

fn check(principal: &Principal, operation: Operation, subject: Subject) -> WorkflowResult<()> {
    authorize(principal, operation, subject).map_err(|err| {
        warn!(user_id = %principal.user_id, role = %principal.role, %operation, "permission denied");
        err.into()
    })
}

impl<RS, DS, IS, B> WorkflowCoordinator<RS, DS, IS, B>
where
    RS: DocumentStore<AidRequest>,
    DS: DocumentStore<Distribution>,
    IS: DocumentStore<InventoryItem>,
    B: EventBus<ChangeEvent>,
{
    pub fn new(requests: RS, distributions: DS, inventory: IS, bus: B) -> Self {
        Self {
            requests: RequestStore::new(requests),
            distributions: DistributionStore::new(distributions),
            ledger: InventoryLedger::new(inventory),
            notifier: ChangeNotifier::new(bus),
            request_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn requests(&self) -> &RequestStore<RS> {
        &self.requests
    }

    pub fn distributions(&self) -> &DistributionStore<DS> {
        &self.distributions
    }

    pub fn ledger(&self) -> &InventoryLedger<IS> {
        &self.ledger
    }

    pub fn subscribe(&self) -> Subscription<ChangeEvent> {
        self.notifier.subscribe()
    }

    fn with_request_lock<T>(&self, request_id: RequestId, f: impl FnOnce() -> WorkflowResult<T>) -> WorkflowResult<T> {
        let lock = {
            let mut locks = self
                .request_locks
                .lock()
                .map_err(|_| StoreError::Unavailable("request lock table poisoned".to_string()))?;
            Arc::clone(locks.entry(request_id).or_default())
        };
        let _guard = lock
            .lock()
            .map_err(|_| StoreError::Unavailable(format!("lock for request {request_id} poisoned")))?;
        f()
    }

    // -------------------------
    // Aid requests
    // -------------------------

    pub fn create_request(&self, principal: &Principal, new: NewRequest) -> WorkflowResult<AidRequest> {
        check(principal, Operation::CreateRequest, Subject::OwnedBy(new.beneficiary_id))?;
        let request = self.requests.create(new, &self.ledger)?;
        self.notifier.notify(ChangeEvent::AidRequestUpdated);
        Ok(request)
    }

    /// Direct status change by a reviewer (or a beneficiary cancelling).
    ///
    /// Refused while the request has an open distribution; the distribution
    /// drives the request status then.
    pub fn set_request_status(
        &self,
        principal: &Principal,
        request_id: RequestId,
        target: RequestStatus,
    ) -> WorkflowResult<AidRequest> {
        let operation = if target == RequestStatus::Cancelled {
            Operation::CancelRequest
        } else {
            Operation::ReviewRequest
        };

        self.with_request_lock(request_id, || {
            let current = self.requests.get(request_id)?;
            check(principal, operation, Subject::OwnedBy(current.beneficiary_id()))?;

            if let Some(open) = self.distributions.open_for_request(request_id)? {
                return Err(DomainError::validation(format!(
                    "request {request_id} has open distribution {}; update the distribution instead",
                    open.id_typed()
                ))
                .into());
            }

            let request = self.requests.transition(&current, target, TransitionSource::Direct)?;
            if request.version() != current.version() {
                self.notifier.notify(ChangeEvent::AidRequestUpdated);
            }
            Ok(request)
        })
    }

    pub fn get_request(&self, principal: &Principal, request_id: RequestId) -> WorkflowResult<AidRequest> {
        let request = self.requests.get(request_id)?;
        check(principal, Operation::ViewRequests, Subject::OwnedBy(request.beneficiary_id()))?;
        Ok(request)
    }

    /// Beneficiaries only see their own requests.
    pub fn list_requests(&self, principal: &Principal) -> WorkflowResult<Vec<AidRequest>> {
        check(principal, Operation::ViewRequests, Subject::Unowned)?;
        let requests = self.requests.list()?;
        Ok(match grant(principal.role, Operation::ViewRequests) {
            Grant::Own => requests
                .into_iter()
                .filter(|r| r.beneficiary_id() == principal.user_id)
                .collect(),
            _ => requests,
        })
    }

    // -------------------------
    // Distributions
    // -------------------------

    /// Reserve stock and open a distribution for an approved or in-progress request.
    pub fn create_distribution(&self, principal: &Principal, draft: DistributionDraft) -> WorkflowResult<Distribution> {
        check(principal, Operation::CreateDistribution, Subject::Unowned)?;
        let request_id = draft.request_id;

        self.with_request_lock(request_id, || {
            let request = self.requests.get(request_id)?;
            if !request.status().accepts_distribution() {
                return Err(DomainError::validation(format!(
                    "request {request_id} is {}; distributions need an approved or in-progress request",
                    request.status()
                ))
                .into());
            }
            if let Some(open) = self.distributions.open_for_request(request_id)? {
                return Err(DomainError::validation(format!(
                    "request {request_id} already has open distribution {}",
                    open.id_typed()
                ))
                .into());
            }
            check_lines_against_request(&request, &draft.items)?;

            let distribution_id = DistributionId::new();
            let reserved = self.ledger.reserve_many(
                &draft.items,
                &format!("reserved for distribution #{distribution_id}"),
                principal.user_id,
            )?;

            match self.open_distribution(principal, &request, distribution_id, reserved.clone(), &draft) {
                Ok(distribution) => {
                    info!(%distribution_id, %request_id, items = reserved.len(), "distribution opened");
                    self.notifier
                        .notify_all(&[ChangeEvent::AidRequestUpdated, ChangeEvent::InventoryUpdated]);
                    Ok(distribution)
                }
                Err(err) => {
                    warn!(%distribution_id, %request_id, error = %err, "distribution create failed; releasing reservation");
                    self.compensate_release(&reserved, &format!("rollback of distribution #{distribution_id}"), principal.user_id);
                    Err(err)
                }
            }
        })
    }

    /// Steps 3 and 4 of a create: record the distribution, then mirror it on the request.
    fn open_distribution(
        &self,
        principal: &Principal,
        request: &AidRequest,
        distribution_id: DistributionId,
        reserved: Vec<LineItem>,
        draft: &DistributionDraft,
    ) -> WorkflowResult<Distribution> {
        let distribution = Distribution::create(
            distribution_id,
            NewDistribution {
                request_id: request.id_typed(),
                reserved,
                fulfillment: draft.fulfillment.clone(),
                assignee_id: draft.assignee_id,
                notes: draft.notes.clone(),
                created_by: principal.user_id,
            },
            Utc::now(),
        )?;
        let written = self.distributions.insert(distribution)?;

        if let Err(err) = self
            .requests
            .transition(request, DistributionStatus::Pending.linked_request_status(), TransitionSource::Linked)
        {
            if let Err(undo) = self.distributions.discard(&written) {
                error!(%distribution_id, error = %undo, "could not discard half-written distribution");
            }
            return Err(err);
        }
        Ok(written)
    }

    fn compensate_release(&self, reserved: &[LineItem], reason: &str, actor_id: UserId) {
        let lines: Vec<StockLine> = reserved.iter().map(LineItem::stock_line).collect();
        if let Err(err) = self.ledger.release_many(&lines, reason, actor_id) {
            error!(error = %err, reason, "compensating release failed; ledger needs repair");
        }
    }

    /// Move a distribution one step along the happy path and mirror it on the request.
    ///
    /// Targeting `cancelled` delegates to [`Self::cancel`].
    pub fn advance_status(
        &self,
        principal: &Principal,
        distribution_id: DistributionId,
        target: DistributionStatus,
    ) -> WorkflowResult<Distribution> {
        if target == DistributionStatus::Cancelled {
            return self.cancel(principal, distribution_id);
        }
        let request_id = self.distributions.get(distribution_id)?.request_id();

        self.with_request_lock(request_id, || {
            let current = self.distributions.get(distribution_id)?;
            check(principal, Operation::AdvanceDistribution, assignee_subject(&current))?;

            let next = current.advance(target, Utc::now())?;
            let request = self.requests.get(request_id)?;
            let written = self.distributions.update(&current, next)?;

            if let Err(err) =
                self.requests
                    .transition(&request, target.linked_request_status(), TransitionSource::Linked)
            {
                warn!(%distribution_id, %request_id, error = %err, "request mirror failed; restoring distribution");
                if let Err(undo) = self.distributions.restore(&current, &written) {
                    error!(%distribution_id, error = %undo, "could not restore distribution");
                }
                return Err(err);
            }

            info!(%distribution_id, %request_id, from = %current.status(), to = %target, "distribution advanced");
            self.notifier.notify(ChangeEvent::AidRequestUpdated);
            Ok(written)
        })
    }

    /// Cancel an open distribution and release exactly its reserved snapshot.
    ///
    /// Cancelling an already cancelled distribution succeeds without effect.
    pub fn cancel(&self, principal: &Principal, distribution_id: DistributionId) -> WorkflowResult<Distribution> {
        check(principal, Operation::CancelDistribution, Subject::Unowned)?;
        let request_id = self.distributions.get(distribution_id)?.request_id();

        self.with_request_lock(request_id, || {
            let current = self.distributions.get(distribution_id)?;
            if current.status() == DistributionStatus::Cancelled {
                info!(%distribution_id, "distribution already cancelled");
                return Ok(current);
            }

            let next = current.cancel(Utc::now())?;
            let request = self.requests.get(request_id)?;
            let written = self.distributions.update(&current, next)?;

            let request_written = match self.requests.transition(
                &request,
                DistributionStatus::Cancelled.linked_request_status(),
                TransitionSource::Linked,
            ) {
                Ok(r) => r,
                Err(err) => {
                    warn!(%distribution_id, %request_id, error = %err, "request mirror failed; restoring distribution");
                    self.undo_distribution(&current, &written);
                    return Err(err);
                }
            };

            let lines: Vec<StockLine> = current.items().iter().map(LineItem::stock_line).collect();
            let reason = format!("cancelled distribution #{distribution_id}");
            if let Err(err) = self.ledger.release_many(&lines, &reason, principal.user_id) {
                warn!(%distribution_id, error = %err, "release failed; restoring request and distribution");
                if request_written.version() != request.version() {
                    if let Err(undo) = self.requests.restore(&request, &request_written) {
                        error!(%request_id, error = %undo, "could not restore request");
                    }
                }
                self.undo_distribution(&current, &written);
                return Err(err);
            }

            info!(%distribution_id, %request_id, "distribution cancelled");
            self.notifier
                .notify_all(&[ChangeEvent::AidRequestUpdated, ChangeEvent::InventoryUpdated]);
            Ok(written)
        })
    }

    fn undo_distribution(&self, previous: &Distribution, written: &Distribution) {
        if let Err(undo) = self.distributions.restore(previous, written) {
            error!(distribution_id = %previous.id_typed(), error = %undo, "could not restore distribution");
        }
    }

    /// Set (or clear) the volunteer assigned to an open distribution.
    pub fn assign(
        &self,
        principal: &Principal,
        distribution_id: DistributionId,
        assignee_id: Option<UserId>,
    ) -> WorkflowResult<Distribution> {
        check(principal, Operation::AssignDistribution, Subject::Unowned)?;
        let request_id = self.distributions.get(distribution_id)?.request_id();

        self.with_request_lock(request_id, || {
            let current = self.distributions.get(distribution_id)?;
            let next = current.assign(assignee_id, Utc::now())?;
            let written = self.distributions.update(&current, next)?;
            info!(%distribution_id, assignee = ?assignee_id, "distribution assigned");
            self.notifier.notify(ChangeEvent::AidRequestUpdated);
            Ok(written)
        })
    }

    pub fn get_distribution(&self, principal: &Principal, distribution_id: DistributionId) -> WorkflowResult<Distribution> {
        let distribution = self.distributions.get(distribution_id)?;
        let request = self.requests.get(distribution.request_id())?;
        check(principal, Operation::ViewRequests, Subject::OwnedBy(request.beneficiary_id()))?;
        Ok(distribution)
    }

    /// Beneficiaries only see distributions of their own requests.
    pub fn list_distributions(&self, principal: &Principal) -> WorkflowResult<Vec<Distribution>> {
        check(principal, Operation::ViewRequests, Subject::Unowned)?;
        let distributions = self.distributions.list()?;
        if grant(principal.role, Operation::ViewRequests) != Grant::Own {
            return Ok(distributions);
        }
        let own: HashSet<RequestId> = self
            .list_requests(principal)?
            .iter()
            .map(AidRequest::id_typed)
            .collect();
        Ok(distributions
            .into_iter()
            .filter(|d| own.contains(&d.request_id()))
            .collect())
    }

    // -------------------------
    // Inventory
    // -------------------------

    pub fn create_item(&self, principal: &Principal, draft: ItemDraft) -> WorkflowResult<InventoryItem> {
        check(principal, Operation::ManageInventory, Subject::Unowned)?;
        let item = self.ledger.create_item(draft, principal.user_id)?;
        self.notifier.notify(ChangeEvent::InventoryUpdated);
        Ok(item)
    }

    pub fn update_item(&self, principal: &Principal, item_id: ItemId, patch: &ItemPatch) -> WorkflowResult<InventoryItem> {
        check(principal, Operation::ManageInventory, Subject::Unowned)?;
        let item = self.ledger.update_item(item_id, patch, principal.user_id)?;
        self.notifier.notify(ChangeEvent::InventoryUpdated);
        Ok(item)
    }

    pub fn delete_item(&self, principal: &Principal, item_id: ItemId) -> WorkflowResult<InventoryItem> {
        check(principal, Operation::ManageInventory, Subject::Unowned)?;
        let item = self.ledger.delete_item(item_id, principal.user_id)?;
        self.notifier.notify(ChangeEvent::InventoryUpdated);
        Ok(item)
    }

    pub fn adjust_item(
        &self,
        principal: &Principal,
        item_id: ItemId,
        delta: i64,
        reason: &str,
    ) -> WorkflowResult<InventoryItem> {
        check(principal, Operation::ManageInventory, Subject::Unowned)?;
        let item = self.ledger.adjust_quantity(item_id, delta, reason, principal.user_id)?;
        self.notifier.notify(ChangeEvent::InventoryUpdated);
        Ok(item)
    }

    pub fn get_item(&self, principal: &Principal, item_id: ItemId) -> WorkflowResult<InventoryItem> {
        check(principal, Operation::ViewInventory, Subject::Unowned)?;
        self.ledger.get(item_id)
    }

    pub fn list_items(&self, principal: &Principal) -> WorkflowResult<Vec<InventoryItem>> {
        check(principal, Operation::ViewInventory, Subject::Unowned)?;
        self.ledger.list()
    }

    pub fn low_stock_items(&self, principal: &Principal) -> WorkflowResult<Vec<InventoryItem>> {
        check(principal, Operation::ViewInventory, Subject::Unowned)?;
        self.ledger.items_below_threshold()
    }
}

/// Distribution lines must name items on the request, within the requested quantity.
fn check_lines_against_request(request: &AidRequest, lines: &[StockLine]) -> WorkflowResult<()> {
    for (item_id, quantity) in merge_lines(lines)? {
        match request.requested_quantity(&item_id) {
            None => {
                return Err(DomainError::validation(format!(
                    "item {item_id} is not part of request {}",
                    request.id_typed()
                ))
                .into());
            }
            Some(requested) if quantity > requested => {
                return Err(DomainError::validation(format!(
                    "item {item_id}: {quantity} exceeds the {requested} requested"
                ))
                .into());
            }
            Some(_) => {}
        }
    }
    Ok(())
}
