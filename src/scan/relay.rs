//! Bounded-history fan-out relay for scan events.
//!
//! [`ScanDataRelay`] subscribes once to an upstream [`ScanEventSource`] and
//! forwards what it receives to any number of [`ScanListener`]s:
//!
//! - status changes become `on_started` / `on_paused` / `on_stopped`
//! - data points are cached (current run only, capped FIFO) and delivered with
//!   the full cache so late subscribers can redraw the run so far
//!
//! Delivery is synchronous, on the thread that published the upstream event,
//! in listener registration order. Listeners that need a UI thread marshal onto
//! it themselves. A listener that errors or panics is logged and skipped; the
//! remaining listeners are still notified.
//!
//! The relay is an ordinary value owned by the composition root. Build it,
//! `connect()` it, hand `Arc`s of it to consumers, `dispose()` it on shutdown.

use parking_lot::{Mutex, RwLock};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, error, info, trace};

use super::data_point::{PointCache, ScanDataPoint};
use super::event::{RunState, ScanEvent, ScanSignal, ScanStatus};
use super::source::{ScanEventObserver, ScanEventSource, SubscriptionId};
use crate::config::RelayConfig;
use crate::error::RelayError;

/// Downstream consumer of relayed scan events.
///
/// Every callback runs on the publishing thread. Returning an error only
/// produces a log entry; it never reaches the producer or other listeners.
pub trait ScanListener: Send + Sync {
    /// A scan started or resumed.
    fn on_started(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// The running scan paused.
    fn on_paused(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// The scan finished or was aborted.
    fn on_stopped(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// A point arrived. `cached` is every retained point of the current run,
    /// oldest first, and ends with `latest`.
    fn on_point(
        &self,
        cached: &[Arc<ScanDataPoint>],
        latest: &Arc<ScanDataPoint>,
    ) -> anyhow::Result<()>;
}

type ListenerList = Arc<Vec<Arc<dyn ScanListener>>>;
type DeliveryGate = Arc<dyn Fn() -> bool + Send + Sync>;

struct RelayShared {
    // Copy-on-write: dispatch iterates a snapshot, mutation swaps the Arc.
    listeners: RwLock<ListenerList>,
    cache: Mutex<PointCache>,
    run_state: AtomicU8,
    connected: AtomicBool,
    gate: RwLock<Option<DeliveryGate>>,
}

impl RelayShared {
    fn handle(&self, event: &ScanEvent) {
        if !self.connected.load(Ordering::Acquire) {
            trace!("relay disposed; ignoring late scan event");
            return;
        }

        match event {
            ScanEvent::StatusChanged { status } => self.handle_status(*status),
            ScanEvent::DataPoint(point) => self.handle_point(point),
            ScanEvent::Unknown => trace!("ignoring unrecognised scan event"),
        }
    }

    fn handle_status(&self, status: ScanStatus) {
        {
            // Same lock dispose() resets under, so a late status cannot
            // outlive the reset.
            let _cache = self.cache.lock();
            if !self.connected.load(Ordering::Acquire) {
                return;
            }
            self.run_state
                .store(RunState::from(status) as u8, Ordering::Release);
        }

        let signal = status.signal();
        debug!(?status, ?signal, "scan status changed");
        match signal {
            ScanSignal::Started => self.fire("on_started", |l| l.on_started()),
            ScanSignal::Paused => self.fire("on_paused", |l| l.on_paused()),
            ScanSignal::Stopped => self.fire("on_stopped", |l| l.on_stopped()),
        }
    }

    fn handle_point(&self, point: &ScanDataPoint) {
        let latest = Arc::new(point.clone());
        let cached = {
            let mut cache = self.cache.lock();
            // dispose() flips the flag before clearing under this lock.
            if !self.connected.load(Ordering::Acquire) {
                return;
            }
            if cache.push(Arc::clone(&latest)) {
                debug!(run = %latest.unique_name, "new run; point cache reset");
            }
            cache.snapshot()
        };

        trace!(
            run = %latest.unique_name,
            point = latest.point_number,
            cached = cached.len(),
            "relaying scan data point"
        );
        self.fire("on_point", |l| l.on_point(&cached, &latest));
    }

    fn fire<F>(&self, callback: &'static str, notify: F)
    where
        F: Fn(&dyn ScanListener) -> anyhow::Result<()>,
    {
        if let Some(gate) = self.gate.read().as_ref() {
            if !gate() {
                trace!(callback, "delivery gate closed; dropping notification");
                return;
            }
        }

        let listeners = Arc::clone(&self.listeners.read());
        for (index, listener) in listeners.iter().enumerate() {
            match panic::catch_unwind(AssertUnwindSafe(|| notify(listener.as_ref()))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    error!(callback, listener = index, error = %err, "scan listener failed");
                }
                Err(payload) => {
                    error!(
                        callback,
                        listener = index,
                        panic = panic_message(payload.as_ref()),
                        "scan listener panicked"
                    );
                }
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

/// Observer handed to the upstream source. Holds only a weak reference so the
/// source never keeps a dropped relay alive.
struct RelayObserver {
    shared: Weak<RelayShared>,
}

impl ScanEventObserver for RelayObserver {
    fn on_scan_event(&self, event: &ScanEvent) {
        if let Some(shared) = self.shared.upgrade() {
            shared.handle(event);
        }
    }
}

/// Relays one upstream scan event source to many listeners, replaying a capped
/// history of the current run.
pub struct ScanDataRelay {
    source: Arc<dyn ScanEventSource>,
    shared: Arc<RelayShared>,
    subscription: Mutex<Option<SubscriptionId>>,
}

impl fmt::Debug for ScanDataRelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanDataRelay")
            .field("connected", &self.is_connected())
            .field("run_state", &self.run_state())
            .field("listeners", &self.listener_count())
            .field("cached_points", &self.shared.cache.lock().len())
            .finish()
    }
}

impl ScanDataRelay {
    /// Create a disconnected relay retaining at most `max_cache_size` points.
    pub fn new(source: Arc<dyn ScanEventSource>, max_cache_size: usize) -> Self {
        Self {
            source,
            shared: Arc::new(RelayShared {
                listeners: RwLock::new(Arc::new(Vec::new())),
                cache: Mutex::new(PointCache::new(max_cache_size)),
                run_state: AtomicU8::new(RunState::NotRunning as u8),
                connected: AtomicBool::new(false),
                gate: RwLock::new(None),
            }),
            subscription: Mutex::new(None),
        }
    }

    /// Create a relay sized from configuration.
    pub fn from_config(source: Arc<dyn ScanEventSource>, config: &RelayConfig) -> Self {
        Self::new(source, config.max_cache_size)
    }

    /// Only deliver to listeners while `gate` returns true, e.g. while the
    /// display the listeners draw on is still alive. Closed-gate notifications
    /// are dropped silently; the cache and run state are still updated.
    pub fn with_delivery_gate<G>(self, gate: G) -> Self
    where
        G: Fn() -> bool + Send + Sync + 'static,
    {
        *self.shared.gate.write() = Some(Arc::new(gate));
        self
    }

    /// Subscribe to the upstream source.
    ///
    /// Not idempotent: a second call without an intervening
    /// [`dispose`](Self::dispose) fails with [`RelayError::AlreadyConnected`].
    pub fn connect(&self) -> Result<(), RelayError> {
        let mut subscription = self.subscription.lock();
        if subscription.is_some() {
            return Err(RelayError::AlreadyConnected);
        }

        self.shared.connected.store(true, Ordering::Release);
        let observer = Arc::new(RelayObserver {
            shared: Arc::downgrade(&self.shared),
        });
        let id = self.source.subscribe(observer);
        *subscription = Some(id);

        info!(subscription = %id, "scan data relay connected");
        Ok(())
    }

    /// Unsubscribe upstream and drop all listeners and cached points.
    ///
    /// Safe to call when not connected. Events still in flight from the
    /// source after this returns are ignored.
    pub fn dispose(&self) {
        let mut subscription = self.subscription.lock();
        self.shared.connected.store(false, Ordering::Release);

        if let Some(id) = subscription.take() {
            if !self.source.unsubscribe(id) {
                debug!(subscription = %id, "source had already dropped the relay subscription");
            }
            info!(subscription = %id, "scan data relay disposed");
        }

        *self.shared.listeners.write() = Arc::new(Vec::new());
        let mut cache = self.shared.cache.lock();
        cache.clear();
        self.shared
            .run_state
            .store(RunState::NotRunning as u8, Ordering::Release);
    }

    /// Register a listener. Adding the same listener twice delivers twice.
    pub fn add_listener(&self, listener: Arc<dyn ScanListener>) {
        let mut listeners = self.shared.listeners.write();
        Arc::make_mut(&mut listeners).push(listener);
    }

    /// Remove every registration of `listener`. Returns how many were removed.
    pub fn remove_listener<L>(&self, listener: &Arc<L>) -> usize
    where
        L: ScanListener + ?Sized,
    {
        let target = Arc::as_ptr(listener).cast::<()>();
        let mut listeners = self.shared.listeners.write();
        let before = listeners.len();
        if listeners
            .iter()
            .any(|existing| Arc::as_ptr(existing).cast::<()>() == target)
        {
            Arc::make_mut(&mut listeners)
                .retain(|existing| Arc::as_ptr(existing).cast::<()>() != target);
        }
        before - listeners.len()
    }

    /// Single entry point for upstream notifications.
    ///
    /// The source calls this through the relay's subscription; it is public so
    /// an embedding application can feed events from its own transport.
    pub fn on_upstream_event(&self, event: &ScanEvent) {
        self.shared.handle(event);
    }

    /// Snapshot of the cached points of the current run, oldest first.
    pub fn current_data_points(&self) -> Vec<Arc<ScanDataPoint>> {
        self.shared.cache.lock().snapshot()
    }

    /// Run state from the most recent status event. Never blocks.
    pub fn run_state(&self) -> RunState {
        RunState::from_u8(self.shared.run_state.load(Ordering::Acquire))
    }

    /// Whether the relay is subscribed upstream.
    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::Acquire)
    }

    /// Number of registered listeners, counting duplicates.
    pub fn listener_count(&self) -> usize {
        self.shared.listeners.read().len()
    }
}

impl Drop for ScanDataRelay {
    fn drop(&mut self) {
        if let Some(id) = self.subscription.get_mut().take() {
            self.source.unsubscribe(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::source::ScanEventBroadcaster;
    use serde_json::json;
    use tracing_test::traced_test;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
    }

    impl ScanListener for Recorder {
        fn on_started(&self) -> anyhow::Result<()> {
            self.calls.lock().push("started".into());
            Ok(())
        }

        fn on_point(
            &self,
            cached: &[Arc<ScanDataPoint>],
            latest: &Arc<ScanDataPoint>,
        ) -> anyhow::Result<()> {
            self.calls
                .lock()
                .push(format!("point {} of {}", latest.point_number, cached.len()));
            Ok(())
        }
    }

    struct Failing;

    impl ScanListener for Failing {
        fn on_point(
            &self,
            _cached: &[Arc<ScanDataPoint>],
            _latest: &Arc<ScanDataPoint>,
        ) -> anyhow::Result<()> {
            anyhow::bail!("plot view closed")
        }
    }

    fn connected_relay(max: usize) -> (Arc<ScanEventBroadcaster>, ScanDataRelay) {
        let source = Arc::new(ScanEventBroadcaster::new());
        let relay = ScanDataRelay::new(source.clone(), max);
        relay.connect().unwrap();
        (source, relay)
    }

    #[test]
    fn test_connect_twice_fails() {
        let (source, relay) = connected_relay(10);
        assert_eq!(relay.connect(), Err(RelayError::AlreadyConnected));
        assert_eq!(source.subscriber_count(), 1);
    }

    #[test]
    fn test_reconnect_after_dispose() {
        let (source, relay) = connected_relay(10);
        relay.dispose();
        assert_eq!(source.subscriber_count(), 0);
        assert!(relay.connect().is_ok());
        assert_eq!(source.subscriber_count(), 1);
    }

    #[test]
    fn test_point_delivery_carries_cache() {
        let (source, relay) = connected_relay(10);
        let recorder = Arc::new(Recorder::default());
        relay.add_listener(recorder.clone());

        source.publish(&ScanEvent::status(ScanStatus::Running));
        for n in 0..2 {
            source.publish(&ScanDataPoint::new("scan-1", n, json!(null)).into());
        }

        assert_eq!(
            *recorder.calls.lock(),
            vec!["started", "point 0 of 1", "point 1 of 2"]
        );
        assert_eq!(relay.run_state(), RunState::Running);
    }

    #[test]
    fn test_remove_listener_removes_duplicates() {
        let (_source, relay) = connected_relay(10);
        let recorder = Arc::new(Recorder::default());
        relay.add_listener(recorder.clone());
        relay.add_listener(recorder.clone());
        assert_eq!(relay.listener_count(), 2);

        assert_eq!(relay.remove_listener(&recorder), 2);
        assert_eq!(relay.remove_listener(&recorder), 0);
        assert_eq!(relay.listener_count(), 0);
    }

    #[test]
    #[traced_test]
    fn test_failing_listener_is_logged() {
        let (source, relay) = connected_relay(10);
        let recorder = Arc::new(Recorder::default());
        relay.add_listener(Arc::new(Failing));
        relay.add_listener(recorder.clone());

        source.publish(&ScanDataPoint::new("scan-1", 0, json!(null)).into());

        assert!(logs_contain("scan listener failed"));
        assert!(logs_contain("plot view closed"));
        assert_eq!(recorder.calls.lock().len(), 1);
    }

    #[test]
    fn test_status_racing_dispose_leaves_not_running() {
        for _ in 0..50 {
            let (source, relay) = connected_relay(10);
            let relay = Arc::new(relay);
            let stop = Arc::new(AtomicBool::new(false));

            let publisher = {
                let source = Arc::clone(&source);
                let relay = Arc::clone(&relay);
                let stop = Arc::clone(&stop);
                std::thread::spawn(move || {
                    while !stop.load(Ordering::Acquire) {
                        source.publish(&ScanEvent::status(ScanStatus::Running));
                        relay.on_upstream_event(&ScanEvent::status(ScanStatus::Paused));
                    }
                })
            };

            std::thread::yield_now();
            relay.dispose();
            stop.store(true, Ordering::Release);
            publisher.join().unwrap();

            assert_eq!(relay.run_state(), RunState::NotRunning);
        }
    }

    #[test]
    fn test_drop_unsubscribes() {
        let (source, relay) = connected_relay(10);
        drop(relay);
        assert_eq!(source.subscriber_count(), 0);
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
