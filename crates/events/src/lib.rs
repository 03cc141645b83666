//! `aidflow-events`: coarse change notifications and their transport seam.

pub mod bus;
pub mod event;
pub mod in_memory_bus;
pub mod resync;

pub use bus::{EventBus, Subscription};
pub use event::{ChangeEvent, Collection};
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use resync::{BusSource, ChangeSource, DEFAULT_RESYNC_BACKOFF, Refetch, ResyncReport, ResyncSubscriber};
