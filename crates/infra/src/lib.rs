//! Infrastructure layer: document stores and the workflow that composes them.

pub mod coordinator;
pub mod distribution_store;
pub mod document_store;
pub mod error;
pub mod ledger;
pub mod notifier;
pub mod request_store;
pub mod result;


pub use coordinator::{DistributionDraft, InMemoryCoordinator, WorkflowCoordinator};
pub use distribution_store::DistributionStore;
pub use document_store::{DocumentStore, InMemoryDocumentStore, StoreError, collections};
pub use error::{WorkflowError, WorkflowResult};
pub use ledger::InventoryLedger;
pub use notifier::ChangeNotifier;
pub use request_store::RequestStore;
pub use result::{OperationError, OperationResult};
