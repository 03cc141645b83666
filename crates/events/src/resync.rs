//! Client-side subscriber that keeps a local cache roughly in sync.
//!
//! Notifications are hints. After every successful (re)connect the subscriber
//! refetches every collection once, unconditionally, so anything published
//! while the channel was down is picked up. A dropped or refused channel is
//! retried after a fixed backoff.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::RecvTimeoutError;
use std::time::{Duration, Instant};

use crate::bus::{EventBus, Subscription};
use crate::event::{ChangeEvent, Collection};

/// Delay before retrying a dropped or refused subscription.
pub const DEFAULT_RESYNC_BACKOFF: Duration = Duration::from_secs(5);

/// Something the subscriber can (re)connect to.
pub trait ChangeSource {
    type Error: core::fmt::Debug;

    fn connect(&self) -> Result<Subscription<ChangeEvent>, Self::Error>;
}

/// Adapts any [`EventBus`] as a source that never refuses a connection.
#[derive(Debug, Clone)]
pub struct BusSource<B>(pub B);

impl<B> ChangeSource for BusSource<B>
where
    B: EventBus<ChangeEvent>,
{
    type Error = core::convert::Infallible;

    fn connect(&self) -> Result<Subscription<ChangeEvent>, Self::Error> {
        Ok(self.0.subscribe())
    }
}

/// Client cache hook: reload a whole collection from the authoritative API.
pub trait Refetch {
    fn refetch(&mut self, collection: Collection);
}

/// Counters returned when the subscriber stops.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct ResyncReport {
    pub connections: u32,
    pub failed_connects: u32,
    pub drops: u32,
    pub events: u64,
}

#[derive(Debug, Clone)]
pub struct ResyncSubscriber {
    backoff: Duration,
    poll_interval: Duration,
}

impl Default for ResyncSubscriber {
    fn default() -> Self {
        Self {
            backoff: DEFAULT_RESYNC_BACKOFF,
            poll_interval: Duration::from_secs(1),
        }
    }
}

impl ResyncSubscriber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// How often a blocked receive wakes up to check for shutdown.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Run until `shutdown` is set. Blocks the calling thread.
    pub fn run<S, R>(&self, source: &S, cache: &mut R, shutdown: &AtomicBool) -> ResyncReport
    where
        S: ChangeSource,
        R: Refetch,
    {
        let mut report = ResyncReport::default();

        while !shutdown.load(Ordering::Acquire) {
            let subscription = match source.connect() {
                Ok(s) => s,
                Err(e) => {
                    report.failed_connects += 1;
                    tracing::warn!(error = ?e, backoff_ms = self.backoff.as_millis() as u64, "change stream connect failed");
                    self.sleep_unless_shutdown(self.backoff, shutdown);
                    continue;
                }
            };

            report.connections += 1;
            tracing::debug!(connection = report.connections, "change stream connected; resynchronizing");
            refetch_all(cache);

            loop {
                if shutdown.load(Ordering::Acquire) {
                    return report;
                }
                match subscription.recv_timeout(self.poll_interval) {
                    Ok(event) => {
                        report.events += 1;
                        cache.refetch(event.collection());
                    }
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => {
                        report.drops += 1;
                        tracing::warn!(backoff_ms = self.backoff.as_millis() as u64, "change stream dropped; reconnecting");
                        break;
                    }
                }
            }

            self.sleep_unless_shutdown(self.backoff, shutdown);
        }

        report
    }

    fn sleep_unless_shutdown(&self, total: Duration, shutdown: &AtomicBool) {
        let deadline = Instant::now() + total;
        loop {
            if shutdown.load(Ordering::Acquire) {
                return;
            }
            let now = Instant::now();
            if now >= deadline {
                return;
            }
            std::thread::sleep((deadline - now).min(self.poll_interval));
        }
    }
}

fn refetch_all<R: Refetch>(cache: &mut R) {
    cache.refetch(Collection::AidRequests);
    cache.refetch(Collection::Inventory);
}
