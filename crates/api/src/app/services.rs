//! Service wiring: coordinator, change bus, and the bus-to-SSE bridge.

use std::{
    convert::Infallible,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_stream::{
    Stream, StreamExt,
    wrappers::{BroadcastStream, errors::BroadcastStreamRecvError},
};

use aidflow_events::{BusSource, ChangeEvent, Collection, InMemoryEventBus, Refetch, ResyncSubscriber};
use aidflow_infra::InMemoryCoordinator;

use crate::config::ApiConfig;

/// Buffered notifications per SSE client before it is considered lagging.
const REALTIME_CAPACITY: usize = 256;

const BRIDGE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// SSE event name telling a lagging client to refetch everything.
pub const RESYNC_EVENT: &str = "resync";

/// An SSE client fell behind the broadcast buffer and missed notifications.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("sse client lagged behind by {0} notifications")]
pub struct Lagged(pub u64);

pub struct AppServices {
    pub coordinator: Arc<InMemoryCoordinator>,
    realtime_tx: broadcast::Sender<ChangeEvent>,
    sse_keepalive: Duration,
    shutdown: Arc<AtomicBool>,
}

impl AppServices {
    pub fn realtime_tx(&self) -> &broadcast::Sender<ChangeEvent> {
        &self.realtime_tx
    }
}

impl Drop for AppServices {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
    }
}

/// Forwards every refetch hint into the broadcast channel feeding SSE clients.
struct BroadcastRefetch(broadcast::Sender<ChangeEvent>);

impl Refetch for BroadcastRefetch {
    fn refetch(&mut self, collection: Collection) {
        // No connected clients is not an error.
        let _ = self.0.send(ChangeEvent::for_collection(collection));
    }
}

pub fn build_services(config: &ApiConfig) -> AppServices {
    let bus: Arc<InMemoryEventBus<ChangeEvent>> = Arc::new(InMemoryEventBus::new());
    let coordinator = Arc::new(InMemoryCoordinator::in_memory(Arc::clone(&bus)));
    let (realtime_tx, _) = broadcast::channel(REALTIME_CAPACITY);
    let shutdown = Arc::new(AtomicBool::new(false));

    {
        let subscriber = ResyncSubscriber::new()
            .with_backoff(config.resync_backoff)
            .with_poll_interval(BRIDGE_POLL_INTERVAL);
        let source = BusSource(bus);
        let mut sink = BroadcastRefetch(realtime_tx.clone());
        let shutdown = Arc::clone(&shutdown);

        tokio::task::spawn_blocking(move || {
            let report = subscriber.run(&source, &mut sink, &shutdown);
            tracing::debug!(?report, "change bridge stopped");
        });
    }

    AppServices {
        coordinator,
        realtime_tx,
        sse_keepalive: config.sse_keepalive,
        shutdown,
    }
}

fn to_sse(message: Result<ChangeEvent, BroadcastStreamRecvError>) -> SseEvent {
    match message {
        Ok(event) => SseEvent::default()
            .event(event.event_type())
            .data(serde_json::json!({ "type": event.event_type() }).to_string()),
        Err(BroadcastStreamRecvError::Lagged(n)) => {
            tracing::warn!(error = %Lagged(n), "telling client to resync");
            SseEvent::default()
                .event(RESYNC_EVENT)
                .data(serde_json::json!({ "type": RESYNC_EVENT }).to_string())
        }
    }
}

pub fn sse_stream(services: Arc<AppServices>) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = services.realtime_tx.subscribe();
    let stream = BroadcastStream::new(rx).map(|message| Ok::<_, Infallible>(to_sse(message)));

    Sse::new(stream).keep_alive(KeepAlive::new().interval(services.sse_keepalive))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refetch_hints_become_collection_events() {
        let (tx, mut rx) = broadcast::channel(4);
        let mut sink = BroadcastRefetch(tx);

        sink.refetch(Collection::Inventory);
        sink.refetch(Collection::AidRequests);

        assert_eq!(rx.try_recv().unwrap(), ChangeEvent::InventoryUpdated);
        assert_eq!(rx.try_recv().unwrap(), ChangeEvent::AidRequestUpdated);
    }

    #[tokio::test]
    async fn a_slow_client_sees_a_lag_marker_instead_of_stale_events() {
        let (tx, rx) = broadcast::channel(1);
        let mut stream = BroadcastStream::new(rx);
        for _ in 0..3 {
            tx.send(ChangeEvent::InventoryUpdated).unwrap();
        }

        assert!(matches!(stream.next().await, Some(Err(BroadcastStreamRecvError::Lagged(2)))));
        assert!(matches!(stream.next().await, Some(Ok(ChangeEvent::InventoryUpdated))));
    }
}
