// ── Per-device polling coordinator ──
//
// One coordinator per device. It owns the fetch cycle for that device,
// caches the latest status snapshot, and fans updates out to subscribers.
// Snapshots are replaced whole through `ArcSwap`, so readers never see a
// half-applied update; fetches for one device are serialized by an
// in-flight gate.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::DeviceApi;
use crate::config::clamp_scan_interval;
use crate::error::CoreError;
use crate::model::DataPointSample;

// ── Snapshot ────────────────────────────────────────────────────────

/// Immutable view of a coordinator's state after one fetch cycle.
#[derive(Debug, Clone, Default)]
pub struct CoordinatorSnapshot {
    /// Samples from the last successful fetch, `None` until one succeeds.
    pub samples: Option<Arc<Vec<DataPointSample>>>,
    /// Outcome of the most recent fetch.
    pub last_update_success: bool,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    /// Number of completed fetch cycles.
    pub revision: u64,
}

impl CoordinatorSnapshot {
    pub fn sample(&self, code: &str) -> Option<&DataPointSample> {
        self.samples.as_deref()?.iter().find(|s| s.code == code)
    }

    pub fn has_data(&self) -> bool {
        self.samples.is_some()
    }
}

// ── Scheduling ──────────────────────────────────────────────────────

/// Work run on every tick.
pub type TickFn = Box<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Drives a coordinator's periodic fetches.
///
/// Implementations call `tick` every `period` until `cancel` fires. The
/// first call happens one full period after scheduling.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, period: Duration, cancel: CancellationToken, tick: TickFn);
}

/// Runs each schedule as a spawned Tokio task.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn schedule(&self, period: Duration, cancel: CancellationToken, tick: TickFn) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            interval.tick().await; // consume the immediate first tick

            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    _ = interval.tick() => tick().await,
                }
            }
        });
    }
}

// ── Subscriptions ───────────────────────────────────────────────────

/// Callback invoked after every committed fetch cycle.
pub type Listener = dyn Fn(&CoordinatorSnapshot) + Send + Sync;

struct ListenerEntry {
    id: u64,
    active: Arc<AtomicBool>,
    callback: Arc<Listener>,
}

/// Handle returned by [`Coordinator::subscribe`].
///
/// Dropping the handle does not unsubscribe; call
/// [`unsubscribe`](Self::unsubscribe). Safe to call from inside the
/// listener itself, and more than once.
pub struct Subscription {
    id: u64,
    active: Arc<AtomicBool>,
    coordinator: Weak<Inner>,
}

impl Subscription {
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(inner) = self.coordinator.upgrade() {
            inner.remove_listener(self.id);
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

// ── Coordinator ─────────────────────────────────────────────────────

/// Polls one device and shares the result.
///
/// Cheaply cloneable; clones share the same state. Dropping the last
/// handle stops the timer, but a listener that captures a `Coordinator`
/// or `SensorReading` clone keeps the state alive; such owners must call
/// [`shutdown`](Self::shutdown) (or unsubscribe) to tear it down.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<Inner>,
}

struct Inner {
    device_id: String,
    interval: Duration,
    api: Arc<dyn DeviceApi>,
    snapshot: ArcSwap<CoordinatorSnapshot>,
    in_flight: tokio::sync::Mutex<()>,
    revision: watch::Sender<u64>,
    listeners: Mutex<Vec<ListenerEntry>>,
    next_listener_id: AtomicU64,
    started: AtomicBool,
    cancel: CancellationToken,
}

impl Inner {
    fn remove_listener(&self, id: u64) {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|l| l.id != id);
    }
}

// Only reached once no listener holds a handle; see `Coordinator::shutdown`.
impl Drop for Inner {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl Coordinator {
    /// Create an idle coordinator. `interval` is raised to the 30 s floor.
    pub fn new(device_id: impl Into<String>, api: Arc<dyn DeviceApi>, interval: Duration) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(Inner {
                device_id: device_id.into(),
                interval: clamp_scan_interval(interval),
                api,
                snapshot: ArcSwap::from_pointee(CoordinatorSnapshot::default()),
                in_flight: tokio::sync::Mutex::new(()),
                revision,
                listeners: Mutex::new(Vec::new()),
                next_listener_id: AtomicU64::new(0),
                started: AtomicBool::new(false),
                cancel: CancellationToken::new(),
            }),
        }
    }

    pub fn device_id(&self) -> &str {
        &self.inner.device_id
    }

    pub fn interval(&self) -> Duration {
        self.inner.interval
    }

    /// The latest committed snapshot.
    pub fn snapshot(&self) -> Arc<CoordinatorSnapshot> {
        self.inner.snapshot.load_full()
    }

    pub fn last_update_success(&self) -> bool {
        self.inner.snapshot.load().last_update_success
    }

    /// Watch the revision counter; it bumps after each committed cycle.
    pub fn changes(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Whether two handles point at the same coordinator.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Start the periodic timer. Later calls are no-ops.
    pub fn start(&self, scheduler: &dyn Scheduler) {
        if self.inner.started.swap(true, Ordering::AcqRel) || self.is_shut_down() {
            return;
        }

        let weak = Arc::downgrade(&self.inner);
        let tick: TickFn = Box::new(move || {
            let weak = weak.clone();
            Box::pin(async move {
                if let Some(inner) = weak.upgrade() {
                    Coordinator { inner }.tick().await;
                }
            })
        });

        debug!(
            device_id = %self.inner.device_id,
            interval_secs = self.inner.interval.as_secs(),
            "starting poll timer"
        );
        scheduler.schedule(self.inner.interval, self.inner.cancel.clone(), tick);
    }

    /// Stop the timer and drop all listeners.
    ///
    /// Dropping the listeners releases any handles they captured, so this
    /// is the teardown path for coordinators with self-referencing
    /// listeners.
    ///
    /// A fetch already in flight runs to completion, but its result is
    /// discarded and nobody is notified.
    pub fn shutdown(&self) {
        if self.inner.cancel.is_cancelled() {
            return;
        }
        self.inner.cancel.cancel();
        let drained = std::mem::take(
            &mut *self
                .inner
                .listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for entry in drained {
            entry.active.store(false, Ordering::Release);
        }
        debug!(device_id = %self.inner.device_id, "coordinator shut down");
    }

    // ── Fetching ─────────────────────────────────────────────────────

    /// Fetch now, outside the timer.
    ///
    /// If a fetch for this device is already running, waits for it to
    /// finish instead of starting another.
    pub async fn request_refresh(&self) -> Result<(), CoreError> {
        self.ensure_running()?;

        let guard = if let Ok(guard) = self.inner.in_flight.try_lock() {
            guard
        } else {
            debug!(device_id = %self.inner.device_id, "joining in-flight fetch");
            tokio::select! {
                biased;
                () = self.inner.cancel.cancelled() => return Err(self.shutdown_error()),
                _finished = self.inner.in_flight.lock() => return self.ensure_running(),
            }
        };

        if self.fetch(guard).await {
            Ok(())
        } else {
            Err(self.shutdown_error())
        }
    }

    /// Timer entry point. Dropped when a fetch is already in flight.
    pub(crate) async fn tick(&self) {
        match self.inner.in_flight.try_lock() {
            Ok(guard) => {
                self.fetch(guard).await;
            }
            Err(_) => {
                debug!(device_id = %self.inner.device_id, "fetch in flight, skipping tick");
            }
        }
    }

    /// Run one fetch cycle while holding the in-flight gate.
    ///
    /// Returns `false` when the result was discarded after shutdown.
    async fn fetch(&self, _gate: tokio::sync::MutexGuard<'_, ()>) -> bool {
        let device_id = &self.inner.device_id;
        debug!(device_id = %device_id, "fetching status");

        let result = self.inner.api.device_status(device_id).await;

        if self.inner.cancel.is_cancelled() {
            debug!(device_id = %device_id, "discarding fetch completed after shutdown");
            return false;
        }

        let previous = self.inner.snapshot.load();
        let next = match result {
            Ok(entries) => {
                let samples: Vec<DataPointSample> = entries
                    .into_iter()
                    .filter_map(|entry| DataPointSample::from_status(device_id, entry))
                    .collect();
                debug!(device_id = %device_id, count = samples.len(), "status updated");
                CoordinatorSnapshot {
                    samples: Some(Arc::new(samples)),
                    last_update_success: true,
                    last_success_at: Some(Utc::now()),
                    last_error: None,
                    revision: previous.revision + 1,
                }
            }
            Err(e) => {
                let e = CoreError::for_device(e, device_id);
                warn!(device_id = %device_id, error = %e, "status fetch failed");
                CoordinatorSnapshot {
                    samples: previous.samples.clone(),
                    last_update_success: false,
                    last_success_at: previous.last_success_at,
                    last_error: Some(e.to_string()),
                    revision: previous.revision + 1,
                }
            }
        };

        let next = Arc::new(next);
        self.inner.snapshot.store(Arc::clone(&next));
        self.inner.revision.send_replace(next.revision);
        self.notify(&next);
        true
    }

    // ── Listeners ────────────────────────────────────────────────────

    /// Register a listener, called after every committed cycle in
    /// registration order.
    ///
    /// The coordinator owns `callback` until it is unsubscribed or the
    /// coordinator shuts down.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&CoordinatorSnapshot) + Send + Sync + 'static,
    {
        let id = self.inner.next_listener_id.fetch_add(1, Ordering::Relaxed);
        let active = Arc::new(AtomicBool::new(!self.is_shut_down()));
        if active.load(Ordering::Acquire) {
            self.inner
                .listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(ListenerEntry {
                    id,
                    active: Arc::clone(&active),
                    callback: Arc::new(callback),
                });
        }
        Subscription {
            id,
            active,
            coordinator: Arc::downgrade(&self.inner),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn notify(&self, snapshot: &CoordinatorSnapshot) {
        // Call outside the lock so listeners may (un)subscribe.
        let listeners: Vec<(Arc<AtomicBool>, Arc<Listener>)> = self
            .inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|l| (Arc::clone(&l.active), Arc::clone(&l.callback)))
            .collect();

        for (active, callback) in listeners {
            if active.load(Ordering::Acquire) {
                callback(snapshot);
            }
        }
    }

    fn ensure_running(&self) -> Result<(), CoreError> {
        if self.is_shut_down() {
            Err(self.shutdown_error())
        } else {
            Ok(())
        }
    }

    fn shutdown_error(&self) -> CoreError {
        CoreError::Shutdown {
            device_id: self.inner.device_id.clone(),
        }
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.inner.snapshot.load();
        f.debug_struct("Coordinator")
            .field("device_id", &self.inner.device_id)
            .field("interval", &self.inner.interval)
            .field("revision", &snapshot.revision)
            .field("last_update_success", &snapshot.last_update_success)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::OnceLock;
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::api::fake::FakeApi;
    use crate::model::DataPointValue;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn setup() -> (Arc<FakeApi>, Coordinator) {
        let api = Arc::new(FakeApi::default().with_device(
            "th1",
            "Hall",
            json!([{ "code": "temp_current", "value": 215 }]),
        ));
        let coordinator = Coordinator::new("th1", api.clone(), Duration::from_secs(60));
        (api, coordinator)
    }

    async fn wait_for_calls(api: &FakeApi, n: usize) {
        while api.status_calls("th1") < n {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn starts_idle() {
        let (_api, coordinator) = setup();
        let snapshot = coordinator.snapshot();
        assert!(!snapshot.has_data());
        assert!(!snapshot.last_update_success);
        assert_eq!(snapshot.revision, 0);
    }

    #[tokio::test]
    async fn successful_fetch_commits_samples() {
        let (_api, coordinator) = setup();
        coordinator.request_refresh().await.unwrap();

        let snapshot = coordinator.snapshot();
        assert!(snapshot.last_update_success);
        assert!(snapshot.last_success_at.is_some());
        assert_eq!(
            snapshot.sample("temp_current").unwrap().value,
            DataPointValue::Integer(215)
        );
        assert_eq!(*coordinator.changes().borrow(), 1);
    }

    #[tokio::test]
    async fn failed_fetch_keeps_previous_samples() {
        let (api, coordinator) = setup();
        coordinator.request_refresh().await.unwrap();
        let before = coordinator.snapshot();

        api.fail_status("th1", true);
        coordinator.request_refresh().await.unwrap();
        let after = coordinator.snapshot();

        assert!(!after.last_update_success);
        assert!(after.last_error.is_some());
        assert_eq!(after.samples, before.samples);
        assert_eq!(after.last_success_at, before.last_success_at);

        api.fail_status("th1", false);
        coordinator.request_refresh().await.unwrap();
        assert!(coordinator.last_update_success());
        assert!(coordinator.snapshot().last_error.is_none());
    }

    #[tokio::test]
    async fn failure_before_any_success_has_no_data() {
        let (api, coordinator) = setup();
        api.fail_status("th1", true);
        coordinator.request_refresh().await.unwrap();

        let snapshot = coordinator.snapshot();
        assert!(!snapshot.has_data());
        assert!(!snapshot.last_update_success);
    }

    #[tokio::test]
    async fn failures_still_notify() {
        let (api, coordinator) = setup();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = coordinator.subscribe(move |s| sink.lock().unwrap().push(s.last_update_success));

        coordinator.request_refresh().await.unwrap();
        api.fail_status("th1", true);
        coordinator.request_refresh().await.unwrap();

        assert_eq!(*seen.lock().unwrap(), [true, false]);
    }

    #[tokio::test]
    async fn concurrent_refreshes_coalesce() {
        let (api, coordinator) = setup();
        api.hold();

        let first = tokio::spawn({
            let c = coordinator.clone();
            async move { c.request_refresh().await }
        });
        wait_for_calls(&api, 1).await;

        let second = tokio::spawn({
            let c = coordinator.clone();
            async move { c.request_refresh().await }
        });
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }

        api.release();
        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();

        assert_eq!(api.status_calls("th1"), 1);
        assert_eq!(coordinator.snapshot().revision, 1);
    }

    #[tokio::test]
    async fn tick_is_dropped_while_fetch_in_flight() {
        let (api, coordinator) = setup();
        api.hold();

        let pending = tokio::spawn({
            let c = coordinator.clone();
            async move { c.request_refresh().await }
        });
        wait_for_calls(&api, 1).await;

        coordinator.tick().await;
        assert_eq!(api.status_calls("th1"), 1);

        api.release();
        pending.await.unwrap().unwrap();
        assert_eq!(coordinator.snapshot().revision, 1);
    }

    #[tokio::test]
    async fn listeners_run_in_registration_order() {
        let (_api, coordinator) = setup();
        let order = Arc::new(Mutex::new(Vec::new()));
        for n in 0..3 {
            let order = Arc::clone(&order);
            let _ = coordinator.subscribe(move |_| order.lock().unwrap().push(n));
        }

        coordinator.request_refresh().await.unwrap();
        assert_eq!(*order.lock().unwrap(), [0, 1, 2]);
    }

    #[tokio::test]
    async fn listener_sees_committed_snapshot() {
        let (_api, coordinator) = setup();
        let observer = coordinator.clone();
        let matched = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&matched);
        let _sub = coordinator.subscribe(move |s| {
            flag.store(observer.snapshot().revision == s.revision, Ordering::SeqCst);
        });

        coordinator.request_refresh().await.unwrap();
        assert!(matched.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn unsubscribe_inside_callback_keeps_next_listener() {
        let (_api, coordinator) = setup();
        let first_calls = Arc::new(AtomicUsize::new(0));
        let second_calls = Arc::new(AtomicUsize::new(0));

        let handle: Arc<OnceLock<Subscription>> = Arc::new(OnceLock::new());
        let sub = coordinator.subscribe({
            let handle = Arc::clone(&handle);
            let calls = Arc::clone(&first_calls);
            move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                if let Some(sub) = handle.get() {
                    sub.unsubscribe();
                }
            }
        });
        handle.set(sub).unwrap();

        let _second = coordinator.subscribe({
            let calls = Arc::clone(&second_calls);
            move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
            }
        });

        coordinator.request_refresh().await.unwrap();
        coordinator.request_refresh().await.unwrap();

        assert_eq!(first_calls.load(Ordering::SeqCst), 1);
        assert_eq!(second_calls.load(Ordering::SeqCst), 2);
        assert_eq!(coordinator.listener_count(), 1);
    }

    #[tokio::test]
    async fn unsubscribe_is_idempotent() {
        let (_api, coordinator) = setup();
        let sub = coordinator.subscribe(|_| {});
        let keep = coordinator.subscribe(|_| {});

        sub.unsubscribe();
        sub.unsubscribe();

        assert!(!sub.is_active());
        assert!(keep.is_active());
        assert_eq!(coordinator.listener_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn timer_polls_at_clamped_interval() {
        let api = Arc::new(FakeApi::default().with_device("th1", "Hall", json!([])));
        let coordinator = Coordinator::new("th1", api.clone(), Duration::from_secs(1));
        assert_eq!(coordinator.interval(), Duration::from_secs(30));

        coordinator.start(&TokioScheduler);
        coordinator.start(&TokioScheduler);

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert_eq!(api.status_calls("th1"), 0);

        tokio::time::sleep(Duration::from_secs(32)).await;
        assert_eq!(api.status_calls("th1"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_the_timer() {
        let (api, coordinator) = setup();
        coordinator.start(&TokioScheduler);
        coordinator.shutdown();

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(api.status_calls("th1"), 0);
        assert!(matches!(
            coordinator.request_refresh().await,
            Err(CoreError::Shutdown { .. })
        ));
    }

    #[tokio::test]
    async fn fetch_finishing_after_shutdown_is_discarded() {
        let (api, coordinator) = setup();
        let notified = Arc::new(AtomicUsize::new(0));
        let _sub = coordinator.subscribe({
            let notified = Arc::clone(&notified);
            move |_| {
                notified.fetch_add(1, Ordering::SeqCst);
            }
        });

        api.hold();
        let pending = tokio::spawn({
            let c = coordinator.clone();
            async move { c.request_refresh().await }
        });
        wait_for_calls(&api, 1).await;

        coordinator.shutdown();
        api.release();

        assert!(matches!(
            pending.await.unwrap(),
            Err(CoreError::Shutdown { .. })
        ));
        assert_eq!(notified.load(Ordering::SeqCst), 0);
        assert!(!coordinator.snapshot().has_data());
    }

    #[tokio::test]
    async fn listener_holding_a_clone_is_released_by_shutdown() {
        let (_api, coordinator) = setup();
        let state = Arc::downgrade(&coordinator.inner);
        let _sub = coordinator.subscribe({
            let owner = coordinator.clone();
            move |_| {
                let _ = owner.device_id();
            }
        });

        let handle = coordinator.clone();
        drop(coordinator);
        assert!(state.upgrade().is_some());

        handle.shutdown();
        drop(handle);
        assert!(state.upgrade().is_none());
    }

    #[tokio::test]
    async fn unsubscribe_releases_a_captured_clone() {
        let (_api, coordinator) = setup();
        let state = Arc::downgrade(&coordinator.inner);
        let sub = coordinator.subscribe({
            let owner = coordinator.clone();
            move |_| {
                let _ = owner.device_id();
            }
        });

        sub.unsubscribe();
        drop(coordinator);
        assert!(state.upgrade().is_none());
    }
}
