//! View-state projector
//!
//! Turns catalogue store loads into a stream of immutable [`ViewState`]
//! snapshots. Each load fetches one catalogue snapshot, derives the grouped
//! and flat views from it and publishes both together.
//!
//! # Delivery
//!
//! - Callback observers ([`ViewStateProjector::subscribe`]) receive the
//!   current snapshot on registration and then every published snapshot, in
//!   publish order.
//! - [`ViewStateProjector::watch`] hands out a `tokio::sync::watch` receiver
//!   for consumers that only care about the latest value.
//!
//! # Loads
//!
//! At most one fetch is in flight. Concurrent `load`/`refresh` calls join the
//! running fetch and receive the same outcome. Store errors and timeouts are
//! published as [`LoadStatus::Failed`] snapshots that keep the previous views.
//! After [`ViewStateProjector::shutdown`] nothing is published.

mod observer;
mod state;

pub use observer::{SnapshotObserver, Subscription};
pub use state::{LoadOutcome, LoadStatus, ViewState};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::catalogue::Catalogue;
use crate::errors::LoadFailure;
use crate::repositories::CatalogueStore;
use observer::{ObserverRegistry, deliver};

/// What asked for a load, for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTrigger {
    Load,
    Refresh,
}

impl fmt::Display for LoadTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadTrigger::Load => write!(f, "load"),
            LoadTrigger::Refresh => write!(f, "refresh"),
        }
    }
}

type SharedLoad = Shared<BoxFuture<'static, LoadOutcome>>;

struct InFlight {
    id: u64,
    future: SharedLoad,
}

struct ProjectorInner {
    store: Arc<dyn CatalogueStore>,
    load_timeout: Option<Duration>,
    state_tx: watch::Sender<Arc<ViewState>>,
    observers: Arc<ObserverRegistry>,
    /// Serializes publishing and observer registration
    publish_lock: tokio::sync::Mutex<()>,
    in_flight: Mutex<Option<InFlight>>,
    next_load_id: AtomicU64,
    fetch_count: AtomicU64,
    shutdown: CancellationToken,
}

/// Derives and publishes catalogue view state for observers
///
/// Cloning is cheap; clones share the same published state.
#[derive(Clone)]
pub struct ViewStateProjector {
    inner: Arc<ProjectorInner>,
}

impl ViewStateProjector {
    /// Create a projector without a load timeout
    pub fn new(store: Arc<dyn CatalogueStore>) -> Self {
        Self::build(store, None)
    }

    /// Create a projector whose loads fail with [`LoadFailure::Timeout`] after `load_timeout`
    pub fn with_timeout(store: Arc<dyn CatalogueStore>, load_timeout: Duration) -> Self {
        Self::build(store, Some(load_timeout))
    }

    fn build(store: Arc<dyn CatalogueStore>, load_timeout: Option<Duration>) -> Self {
        let (state_tx, _) = watch::channel(Arc::new(ViewState::default()));
        Self {
            inner: Arc::new(ProjectorInner {
                store,
                load_timeout,
                state_tx,
                observers: Arc::new(ObserverRegistry::default()),
                publish_lock: tokio::sync::Mutex::new(()),
                in_flight: Mutex::new(None),
                next_load_id: AtomicU64::new(1),
                fetch_count: AtomicU64::new(0),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Load the catalogue and publish a snapshot
    ///
    /// Joins the running fetch when one is in flight.
    pub async fn load(&self) -> LoadOutcome {
        self.run(LoadTrigger::Load).await
    }

    /// User-triggered reload; same semantics as [`Self::load`]
    pub async fn refresh(&self) -> LoadOutcome {
        self.run(LoadTrigger::Refresh).await
    }

    /// Start a load on the runtime without waiting for it
    pub fn spawn_load(&self) -> JoinHandle<LoadOutcome> {
        let projector = self.clone();
        tokio::spawn(async move { projector.load().await })
    }

    /// Register an observer
    ///
    /// The observer receives the current snapshot before this returns and then
    /// every later snapshot until the returned [`Subscription`] is dropped or
    /// unsubscribed. After shutdown the observer only receives the current
    /// snapshot.
    pub async fn subscribe<O>(&self, observer: O) -> Subscription
    where
        O: SnapshotObserver + 'static,
    {
        let observer: Arc<dyn SnapshotObserver> = Arc::new(observer);
        let _publishing = self.inner.publish_lock.lock().await;

        let id = self.inner.observers.next_id();
        let active = !self.inner.shutdown.is_cancelled();
        if active {
            self.inner.observers.insert(id, Arc::clone(&observer));
            debug!("Observer {} subscribed", id);
        }

        deliver(id, observer.as_ref(), &self.current());
        Subscription::new(id, &self.inner.observers, active)
    }

    /// Receiver of the latest published snapshot
    ///
    /// Intermediate snapshots may be skipped; use [`Self::subscribe`] to see
    /// every one.
    pub fn watch(&self) -> watch::Receiver<Arc<ViewState>> {
        self.inner.state_tx.subscribe()
    }

    /// The latest published snapshot
    pub fn current(&self) -> Arc<ViewState> {
        self.inner.current()
    }

    /// Tear down the projector
    ///
    /// Cancels any in-flight fetch, discards later loads and releases every
    /// observer. No snapshot is published once this returns.
    pub async fn shutdown(&self) {
        if self.inner.shutdown.is_cancelled() {
            return;
        }
        self.inner.shutdown.cancel();

        let _publishing = self.inner.publish_lock.lock().await;
        let released = self.inner.observers.clear();
        info!("View-state projector shut down, released {} observers", released);
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.shutdown.is_cancelled()
    }

    pub fn observer_count(&self) -> usize {
        self.inner.observers.len()
    }

    /// Number of store fetches started so far
    pub fn fetch_count(&self) -> u64 {
        self.inner.fetch_count.load(Ordering::Acquire)
    }

    /// Description of the underlying store
    pub fn describe_store(&self) -> String {
        self.inner.store.describe()
    }

    async fn run(&self, trigger: LoadTrigger) -> LoadOutcome {
        if self.inner.shutdown.is_cancelled() {
            debug!("Ignoring {} after shutdown", trigger);
            return LoadOutcome::Discarded;
        }

        let future = {
            let mut in_flight = self.inner.in_flight();
            let joined = in_flight.as_ref().map(|running| {
                debug!("Joining in-flight load {} for {}", running.id, trigger);
                running.future.clone()
            });
            match joined {
                Some(future) => future,
                None => {
                    let id = self.inner.next_load_id.fetch_add(1, Ordering::Relaxed);
                    let inner = Arc::clone(&self.inner);
                    let future = async move {
                        let outcome = AssertUnwindSafe(inner.fetch_and_publish(id, trigger))
                            .catch_unwind()
                            .await;
                        // The slot must be cleared even if the load panicked
                        inner.finish(id);
                        outcome.unwrap_or_else(|panic| std::panic::resume_unwind(panic))
                    }
                    .boxed()
                    .shared();
                    *in_flight = Some(InFlight {
                        id,
                        future: future.clone(),
                    });
                    future
                }
            }
        };

        future.await
    }
}

impl ProjectorInner {
    fn current(&self) -> Arc<ViewState> {
        self.state_tx.borrow().clone()
    }

    fn in_flight(&self) -> MutexGuard<'_, Option<InFlight>> {
        self.in_flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn finish(&self, id: u64) {
        let mut in_flight = self.in_flight();
        if in_flight.as_ref().is_some_and(|running| running.id == id) {
            *in_flight = None;
        }
    }

    async fn fetch_and_publish(&self, id: u64, trigger: LoadTrigger) -> LoadOutcome {
        self.fetch_count.fetch_add(1, Ordering::AcqRel);
        debug!("Starting catalogue {} {} from {}", trigger, id, self.store.describe());

        let result = tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => {
                debug!("Catalogue {} {} cancelled by shutdown", trigger, id);
                return LoadOutcome::Discarded;
            }
            result = self.fetch() => result,
        };

        self.publish(result, trigger).await
    }

    async fn fetch(&self) -> Result<Catalogue, LoadFailure> {
        let load = self.store.load_catalogue();
        match self.load_timeout {
            Some(limit) => match tokio::time::timeout(limit, load).await {
                Ok(result) => result.map_err(LoadFailure::from),
                Err(_) => Err(LoadFailure::Timeout {
                    after_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                }),
            },
            None => load.await.map_err(LoadFailure::from),
        }
    }

    async fn publish(
        &self,
        result: Result<Catalogue, LoadFailure>,
        trigger: LoadTrigger,
    ) -> LoadOutcome {
        let _publishing = self.publish_lock.lock().await;
        if self.shutdown.is_cancelled() {
            debug!("Discarding catalogue {} result after shutdown", trigger);
            return LoadOutcome::Discarded;
        }

        let snapshot = match result {
            Ok(catalogue) => {
                let state = ViewState::loaded(&catalogue);
                info!(
                    "Catalogue {}: {} entries in {} categories",
                    trigger,
                    state.flat.len(),
                    state.grouped.len()
                );
                state
            }
            Err(failure) => {
                warn!("Catalogue {} failed: {}", trigger, failure);
                ViewState::failed(&self.current(), failure)
            }
        };

        let snapshot = Arc::new(snapshot);
        self.state_tx.send_replace(Arc::clone(&snapshot));
        self.observers.notify(&snapshot);
        LoadOutcome::Published(snapshot)
    }
}

impl fmt::Debug for ViewStateProjector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewStateProjector")
            .field("store", &self.inner.store.describe())
            .field("load_timeout", &self.inner.load_timeout)
            .field("observers", &self.observer_count())
            .field("shut_down", &self.is_shut_down())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{CatalogueError, CatalogueResult};
    use crate::models::VideoEntry;
    use crate::repositories::InMemoryCatalogueStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize};
    use tracing_test::traced_test;

    /// Store with switchable failures and an optional delay per load
    struct ScriptedStore {
        catalogue: Mutex<Catalogue>,
        failing: AtomicBool,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl ScriptedStore {
        fn new(catalogue: Catalogue, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                catalogue: Mutex::new(catalogue),
                failing: AtomicBool::new(false),
                delay,
                calls: AtomicUsize::new(0),
            })
        }

        fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        fn replace(&self, catalogue: Catalogue) {
            *self.catalogue.lock().unwrap() = catalogue;
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CatalogueStore for ScriptedStore {
        async fn load_catalogue(&self) -> CatalogueResult<Catalogue> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.failing.load(Ordering::SeqCst) {
                return Err(CatalogueError::http(
                    "https://example.com/catalogue.json",
                    "connection refused",
                ));
            }
            Ok(self.catalogue.lock().unwrap().clone())
        }

        fn describe(&self) -> String {
            "scripted".to_string()
        }
    }

    fn catalogue(ids: &[(&str, &str)]) -> Catalogue {
        Catalogue::new(
            ids.iter()
                .map(|(id, category)| {
                    VideoEntry::new(
                        *id,
                        format!("Title {id}"),
                        format!("https://img.example.com/{id}.jpg"),
                        format!("https://cdn.example.com/{id}.mp4"),
                        *category,
                    )
                })
                .collect(),
        )
        .unwrap()
    }

    fn sample() -> Catalogue {
        catalogue(&[("m1", "Movies"), ("s1", "Sports"), ("m2", "Movies")])
    }

    /// Observer that records every snapshot it receives
    fn recorder() -> (Arc<Mutex<Vec<Arc<ViewState>>>>, impl SnapshotObserver + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |snapshot: &Arc<ViewState>| {
            sink.lock().unwrap().push(Arc::clone(snapshot));
        })
    }

    #[tokio::test]
    async fn test_initial_state_is_not_loaded() {
        let projector = ViewStateProjector::new(Arc::new(InMemoryCatalogueStore::default()));
        let current = projector.current();
        assert_eq!(current.status, LoadStatus::NotLoaded);
        assert!(current.grouped.is_empty());
        assert!(current.flat.is_empty());
    }

    #[tokio::test]
    async fn test_load_publishes_grouped_and_flat() {
        let projector = ViewStateProjector::new(Arc::new(InMemoryCatalogueStore::new(sample())));
        let mut rx = projector.watch();

        let outcome = projector.load().await;
        let snapshot = outcome.snapshot().unwrap();
        assert!(snapshot.is_loaded());

        let flat: Vec<&str> = snapshot.flat.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(flat, vec!["m1", "s1", "m2"]);
        assert_eq!(snapshot.grouped.categories(), vec!["Movies", "Sports"]);
        let movies: Vec<&str> = snapshot
            .grouped
            .get("Movies")
            .unwrap()
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(movies, vec!["m1", "m2"]);

        assert!(rx.has_changed().unwrap());
        assert!(Arc::ptr_eq(&*rx.borrow_and_update(), snapshot));
        assert!(Arc::ptr_eq(&projector.current(), snapshot));
    }

    #[tokio::test]
    async fn test_repeated_loads_publish_equal_snapshots() {
        let projector = ViewStateProjector::new(Arc::new(InMemoryCatalogueStore::new(sample())));
        let first = projector.load().await.snapshot().cloned().unwrap();
        let second = projector.refresh().await.snapshot().cloned().unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(*first, *second);
    }

    #[tokio::test]
    async fn test_empty_catalogue_loads_without_error() {
        let projector = ViewStateProjector::new(Arc::new(InMemoryCatalogueStore::default()));
        let snapshot = projector.load().await.snapshot().cloned().unwrap();
        assert_eq!(snapshot.status, LoadStatus::Loaded);
        assert!(snapshot.grouped.is_empty());
        assert!(snapshot.flat.is_empty());
    }

    #[tokio::test]
    async fn test_subscribe_delivers_current_then_updates_in_order() {
        let store = ScriptedStore::new(sample(), Duration::ZERO);
        let projector = ViewStateProjector::new(store.clone());
        projector.load().await;

        let (seen, observer) = recorder();
        let _subscription = projector.subscribe(observer).await;
        assert_eq!(seen.lock().unwrap().len(), 1);
        assert!(seen.lock().unwrap()[0].is_loaded());

        store.replace(catalogue(&[("n1", "News")]));
        projector.refresh().await;
        store.set_failing(true);
        projector.refresh().await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[1].flat.len(), 1);
        assert!(seen[2].failure().is_some());
    }

    #[tokio::test]
    async fn test_unsubscribed_observer_receives_nothing() {
        let projector = ViewStateProjector::new(Arc::new(InMemoryCatalogueStore::new(sample())));
        let (seen, observer) = recorder();
        let subscription = projector.subscribe(observer).await;
        let (dropped_seen, dropped_observer) = recorder();
        let dropped = projector.subscribe(dropped_observer).await;
        assert_eq!(projector.observer_count(), 2);

        subscription.unsubscribe();
        subscription.unsubscribe();
        drop(dropped);
        assert_eq!(projector.observer_count(), 0);

        projector.load().await;
        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(dropped_seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_keeps_previous_views() {
        let store = ScriptedStore::new(sample(), Duration::ZERO);
        let projector = ViewStateProjector::new(store.clone());
        let loaded = projector.load().await.snapshot().cloned().unwrap();

        store.set_failing(true);
        let failed = projector.refresh().await.snapshot().cloned().unwrap();

        match &failed.status {
            LoadStatus::Failed(LoadFailure::Source { message }) => {
                assert!(message.contains("connection refused"))
            }
            other => panic!("expected source failure, got {other:?}"),
        }
        assert_eq!(failed.grouped, loaded.grouped);
        assert_eq!(failed.flat, loaded.flat);
    }

    #[tokio::test]
    async fn test_first_load_failure_is_distinguishable() {
        let store = ScriptedStore::new(sample(), Duration::ZERO);
        store.set_failing(true);
        let projector = ViewStateProjector::new(store);

        let snapshot = projector.load().await.snapshot().cloned().unwrap();
        assert!(snapshot.failure().is_some());
        assert!(snapshot.flat.is_empty());
        assert_ne!(*snapshot, ViewState::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_timeout_publishes_timeout_failure() {
        let store = ScriptedStore::new(sample(), Duration::from_secs(60));
        let projector = ViewStateProjector::with_timeout(store, Duration::from_secs(1));

        let snapshot = projector.load().await.snapshot().cloned().unwrap();
        assert_eq!(
            snapshot.status,
            LoadStatus::Failed(LoadFailure::Timeout { after_ms: 1000 })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_loads_share_one_fetch() {
        let store = ScriptedStore::new(sample(), Duration::from_millis(50));
        let projector = ViewStateProjector::new(store.clone());

        let (a, b, c) = tokio::join!(projector.load(), projector.refresh(), projector.load());
        assert_eq!(store.calls(), 1);
        assert_eq!(projector.fetch_count(), 1);

        let a = a.snapshot().cloned().unwrap();
        assert!(Arc::ptr_eq(&a, b.snapshot().unwrap()));
        assert!(Arc::ptr_eq(&a, c.snapshot().unwrap()));

        projector.load().await;
        assert_eq!(store.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_discards_in_flight_load() {
        let store = ScriptedStore::new(sample(), Duration::from_secs(5));
        let projector = ViewStateProjector::new(store.clone());
        let (seen, observer) = recorder();
        let _subscription = projector.subscribe(observer).await;

        let handle = projector.spawn_load();
        while projector.fetch_count() == 0 {
            tokio::task::yield_now().await;
        }
        projector.shutdown().await;

        assert!(handle.await.unwrap().is_discarded());
        assert!(projector.load().await.is_discarded());
        assert_eq!(projector.current().status, LoadStatus::NotLoaded);
        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(projector.observer_count(), 0);
    }

    #[tokio::test]
    async fn test_subscribe_after_shutdown_is_inactive() {
        let projector = ViewStateProjector::new(Arc::new(InMemoryCatalogueStore::new(sample())));
        projector.load().await;
        projector.shutdown().await;

        let (seen, observer) = recorder();
        let subscription = projector.subscribe(observer).await;
        assert!(!subscription.is_active());
        assert_eq!(seen.lock().unwrap().len(), 1);
        assert!(seen.lock().unwrap()[0].is_loaded());
    }

    #[tokio::test]
    async fn test_panicking_observer_does_not_break_later_loads() {
        let projector = ViewStateProjector::new(Arc::new(InMemoryCatalogueStore::new(sample())));
        let deliveries = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&deliveries);
        let panicking = projector
            .subscribe(move |_: &Arc<ViewState>| {
                if counter.fetch_add(1, Ordering::SeqCst) == 1 {
                    panic!("observer failure on second delivery");
                }
            })
            .await;
        let (seen, observer) = recorder();
        let _subscription = projector.subscribe(observer).await;

        assert!(projector.load().await.snapshot().unwrap().is_loaded());
        assert_eq!(deliveries.load(Ordering::SeqCst), 2);
        assert_eq!(seen.lock().unwrap().len(), 2);

        drop(panicking);
        assert!(projector.refresh().await.snapshot().unwrap().is_loaded());
        assert_eq!(seen.lock().unwrap().len(), 3);
    }

    /// Store whose first load panics
    struct PanicOnceStore {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CatalogueStore for PanicOnceStore {
        async fn load_catalogue(&self) -> CatalogueResult<Catalogue> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("store failure");
            }
            Ok(sample())
        }

        fn describe(&self) -> String {
            "panic-once".to_string()
        }
    }

    #[tokio::test]
    async fn test_panicked_load_is_not_joined_by_later_loads() {
        let projector = ViewStateProjector::new(Arc::new(PanicOnceStore {
            calls: AtomicUsize::new(0),
        }));

        let first = projector.spawn_load().await;
        assert!(first.unwrap_err().is_panic());

        let snapshot = projector.load().await.snapshot().cloned().unwrap();
        assert!(snapshot.is_loaded());
        assert_eq!(projector.fetch_count(), 2);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_refresh_is_logged() {
        let projector = ViewStateProjector::new(Arc::new(InMemoryCatalogueStore::new(sample())));
        projector.refresh().await;
        assert!(logs_contain("Catalogue refresh: 3 entries in 2 categories"));
    }
}
