//! Snapshot observers and their subscription handles

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::{debug, warn};

use super::state::ViewState;

/// Consumer of published snapshots
///
/// Called on the publishing task, in publish order. Implementations should
/// return quickly and must not register new observers from inside
/// `on_snapshot`; dropping or unsubscribing a [`Subscription`] is fine.
///
/// Closures taking `&Arc<ViewState>` implement this trait.
pub trait SnapshotObserver: Send + Sync {
    fn on_snapshot(&self, snapshot: &Arc<ViewState>);
}

impl<F> SnapshotObserver for F
where
    F: Fn(&Arc<ViewState>) + Send + Sync,
{
    fn on_snapshot(&self, snapshot: &Arc<ViewState>) {
        self(snapshot)
    }
}

type ObserverMap = BTreeMap<u64, Arc<dyn SnapshotObserver>>;

/// Registered observers keyed by registration order
#[derive(Default)]
pub(crate) struct ObserverRegistry {
    observers: Mutex<ObserverMap>,
    next_id: AtomicU64,
}

impl ObserverRegistry {
    fn observers(&self) -> MutexGuard<'_, ObserverMap> {
        self.observers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub(crate) fn insert(&self, id: u64, observer: Arc<dyn SnapshotObserver>) {
        self.observers().insert(id, observer);
    }

    pub(crate) fn remove(&self, id: u64) -> bool {
        self.observers().remove(&id).is_some()
    }

    pub(crate) fn clear(&self) -> usize {
        let mut observers = self.observers();
        let released = observers.len();
        observers.clear();
        released
    }

    pub(crate) fn len(&self) -> usize {
        self.observers().len()
    }

    /// Deliver a snapshot to every observer still registered at its turn
    pub(crate) fn notify(&self, snapshot: &Arc<ViewState>) {
        let ids: Vec<u64> = self.observers().keys().copied().collect();
        for id in ids {
            // Lock released before the call so observers may unsubscribe
            let observer = self.observers().get(&id).cloned();
            if let Some(observer) = observer {
                deliver(id, observer.as_ref(), snapshot);
            }
        }
    }
}

/// Call one observer; a panicking observer is logged and does not stop delivery
pub(crate) fn deliver(id: u64, observer: &dyn SnapshotObserver, snapshot: &Arc<ViewState>) {
    let delivered = panic::catch_unwind(AssertUnwindSafe(|| observer.on_snapshot(snapshot)));
    if delivered.is_err() {
        warn!("Observer {} panicked while handling a snapshot", id);
    }
}

/// Handle of a registered observer
///
/// Dropping the handle unsubscribes. Unsubscribing twice, or after the
/// projector is gone, is a no-op.
#[must_use = "dropping a Subscription unsubscribes the observer"]
pub struct Subscription {
    id: u64,
    registry: Weak<ObserverRegistry>,
    active: AtomicBool,
}

impl Subscription {
    pub(crate) fn new(id: u64, registry: &Arc<ObserverRegistry>, active: bool) -> Self {
        Self {
            id,
            registry: Arc::downgrade(registry),
            active: AtomicBool::new(active),
        }
    }

    /// Stop further deliveries to this observer
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            if registry.remove(self.id) {
                debug!("Observer {} unsubscribed", self.id);
            }
        }
    }

    /// Whether the observer may still receive snapshots
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
            && self
                .registry
                .upgrade()
                .is_some_and(|registry| registry.observers().contains_key(&self.id))
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notify_skips_observers_removed_mid_delivery() {
        let registry = Arc::new(ObserverRegistry::default());
        let hits = Arc::new(AtomicU64::new(0));

        let second_id = 1;
        let remover = Arc::clone(&registry);
        registry.insert(0, Arc::new(move |_: &Arc<ViewState>| {
            remover.remove(second_id);
        }));
        let counter = Arc::clone(&hits);
        registry.insert(second_id, Arc::new(move |_: &Arc<ViewState>| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        registry.notify(&Arc::new(ViewState::default()));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_panicking_observer_does_not_stop_delivery() {
        let registry = Arc::new(ObserverRegistry::default());
        let hits = Arc::new(AtomicU64::new(0));

        fn failing(_: &Arc<ViewState>) {
            panic!("observer failure");
        }
        registry.insert(0, Arc::new(failing));
        let counter = Arc::clone(&hits);
        registry.insert(1, Arc::new(move |_: &Arc<ViewState>| {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        let snapshot = Arc::new(ViewState::default());
        registry.notify(&snapshot);
        registry.notify(&snapshot);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_subscription_drop_unsubscribes() {
        let registry = Arc::new(ObserverRegistry::default());
        let id = registry.next_id();
        registry.insert(id, Arc::new(|_: &Arc<ViewState>| {}));

        let subscription = Subscription::new(id, &registry, true);
        assert!(subscription.is_active());
        subscription.unsubscribe();
        subscription.unsubscribe();
        assert!(!subscription.is_active());
        assert_eq!(registry.len(), 0);

        let id = registry.next_id();
        registry.insert(id, Arc::new(|_: &Arc<ViewState>| {}));
        drop(Subscription::new(id, &registry, true));
        assert_eq!(registry.len(), 0);
    }
}
