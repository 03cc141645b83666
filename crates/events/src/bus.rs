//! Event publishing/subscription abstraction (mechanics only).
//!
//! The bus distributes change notifications to every connected client. It is a
//! liveness hint, not the source of truth:
//!
//! - **Transport-agnostic**: in-memory channels, SSE fan-out, a message queue, etc.
//! - **At-least-once**: a notification may be seen more than once; refetching is idempotent
//! - **No ordering guarantees** beyond "a notification eventually follows every commit"
//! - **No persistence**: the stores hold state; a dropped notification is repaired by
//!   the unconditional refetch a subscriber performs after reconnecting

use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvError, RecvTimeoutError, TryRecvError};
use std::time::Duration;

/// A subscription to the change stream.
///
/// Each subscription gets a copy of every message published after it was
/// created (broadcast semantics). When the bus drops the sending side the
/// subscription reports `Disconnected`, which is the subscriber's cue to
/// reconnect.
///
/// ```ignore
/// let subscription = bus.subscribe();
/// loop {
///     match subscription.recv_timeout(Duration::from_secs(1)) {
///         Ok(event) => refetch(event.collection()),
///         Err(RecvTimeoutError::Timeout) => continue,      // check for shutdown
///         Err(RecvTimeoutError::Disconnected) => break,    // reconnect
///     }
/// }
/// ```
///
/// Subscriptions are meant for single-threaded consumption.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Block until the next message is available.
    pub fn recv(&self) -> Result<M, RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

/// Domain-agnostic pub/sub abstraction.
///
/// ```text
/// WorkflowCoordinator (commit) → ChangeNotifier → EventBus (publish) → subscribers refetch
/// ```
///
/// Messages are published only after the mutation they describe is committed.
/// `publish()` can fail; the caller logs and moves on because the mutation is
/// already durable and subscribers resynchronize on reconnect.
///
/// Implementations must be `Send + Sync`: handlers publish concurrently.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        (**self).publish(message)
    }

    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }
}
