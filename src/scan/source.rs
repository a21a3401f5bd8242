//! The seam between the relay and whatever produces scan events.

use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

use super::event::ScanEvent;

/// Receives every event pushed by a [`ScanEventSource`].
pub trait ScanEventObserver: Send + Sync {
    /// Called once per event, on the publishing thread.
    fn on_scan_event(&self, event: &ScanEvent);
}

/// Handle returned by [`ScanEventSource::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// A push-based producer of scan status changes and data points.
///
/// Implementations must not invoke observers concurrently from several
/// threads; the relay relies on a single producer to keep points in order.
pub trait ScanEventSource: Send + Sync {
    /// Register an observer.
    fn subscribe(&self, observer: Arc<dyn ScanEventObserver>) -> SubscriptionId;

    /// Remove an observer. Returns false if the id was unknown.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;
}

/// In-process event source delivering synchronously to each subscriber.
///
/// `publish` calls are serialised, so observers see a single producer even
/// when several threads publish. Observers must not publish from inside their
/// own callback.
#[derive(Default)]
pub struct ScanEventBroadcaster {
    observers: RwLock<Vec<(SubscriptionId, Arc<dyn ScanEventObserver>)>>,
    publish_lock: Mutex<()>,
    next_id: AtomicU64,
}

impl fmt::Debug for ScanEventBroadcaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanEventBroadcaster")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl ScanEventBroadcaster {
    /// Create a broadcaster with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` to every subscriber in subscription order.
    pub fn publish(&self, event: &ScanEvent) {
        let _serial = self.publish_lock.lock();
        // Snapshot so observers may (un)subscribe from inside a callback.
        let observers: Vec<Arc<dyn ScanEventObserver>> = self
            .observers
            .read()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        trace!(subscribers = observers.len(), "publishing scan event");
        for observer in observers {
            observer.on_scan_event(event);
        }
    }

    /// Number of registered observers.
    pub fn subscriber_count(&self) -> usize {
        self.observers.read().len()
    }
}

impl ScanEventSource for ScanEventBroadcaster {
    fn subscribe(&self, observer: Arc<dyn ScanEventObserver>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.observers.write().push((id, observer));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.observers.write();
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        observers.len() != before
    }
}
