use tracing::{debug, warn};

use aidflow_events::{ChangeEvent, EventBus, Subscription};

/// Publishes coarse "collection changed" hints after a commit.
///
/// A failed publish is logged and swallowed: the mutation is already
/// committed and subscribers refetch on reconnect.
#[derive(Debug)]
pub struct ChangeNotifier<B> {
    bus: B,
}

impl<B> ChangeNotifier<B>
where
    B: EventBus<ChangeEvent>,
{
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn notify(&self, event: ChangeEvent) {
        match self.bus.publish(event) {
            Ok(()) => debug!(event = event.event_type(), "change published"),
            Err(err) => warn!(event = event.event_type(), error = ?err, "change publish failed"),
        }
    }

    pub fn notify_all(&self, events: &[ChangeEvent]) {
        for event in events {
            self.notify(*event);
        }
    }

    pub fn subscribe(&self) -> Subscription<ChangeEvent> {
        self.bus.subscribe()
    }
}
