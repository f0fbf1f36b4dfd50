//! Online/Offline Tracker
//!
//! A constructible replacement for a global `offlineMode` flag. The tracker
//! mirrors the platform's connectivity indicator and republishes every
//! platform transition as an `OfflineStatusEvent`, so subscribers never
//! depend on the platform's own event names.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use spin::RwLock;

use crate::platform::ConnectivitySource;

/// Platform connectivity events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformEvent {
    Online,
    Offline,
}

/// Published after every platform transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfflineStatusEvent {
    pub offline: bool,
}

/// Handle returned by `subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Arc<dyn Fn(&OfflineStatusEvent) + Send + Sync>;

pub struct ConnectivityTracker<S: ConnectivitySource> {
    source: S,
    offline: AtomicBool,
    next_id: AtomicU64,
    subscribers: RwLock<BTreeMap<SubscriptionId, Subscriber>>,
}

impl<S: ConnectivitySource> ConnectivityTracker<S> {
    /// Start tracking, reading the initial state from `source`.
    pub fn new(source: S) -> Self {
        let offline = !source.is_online();
        Self {
            source,
            offline: AtomicBool::new(offline),
            next_id: AtomicU64::new(1),
            subscribers: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Subscribers may subscribe or unsubscribe from inside their own
    /// callback; such changes apply from the next dispatch on.
    pub fn subscribe<F>(&self, subscriber: F) -> SubscriptionId
    where
        F: Fn(&OfflineStatusEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.subscribers.write().insert(id, Arc::new(subscriber));
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.write().remove(&id).is_some()
    }

    /// Handle a platform online/offline event.
    ///
    /// The flag is recomputed from the live source rather than taken from
    /// the event, and exactly one status event is dispatched.
    pub fn handle(&self, event: PlatformEvent) -> OfflineStatusEvent {
        log::info!("[Connectivity] {:?} event", event);
        self.publish()
    }

    /// Publish the current state without a platform event, e.g. once at
    /// page setup so late subscribers learn the initial state.
    pub fn announce(&self) -> OfflineStatusEvent {
        self.publish()
    }

    fn publish(&self) -> OfflineStatusEvent {
        let offline = !self.source.is_online();
        self.offline.store(offline, Ordering::SeqCst);
        log::info!(
            "[Connectivity] app is {}",
            if offline { "offline" } else { "online" }
        );

        let status = OfflineStatusEvent { offline };
        let subscribers: Vec<Subscriber> = self.subscribers.read().values().cloned().collect();
        for subscriber in subscribers {
            subscriber(&status);
        }
        status
    }
}
