//! Page-side glue.
//!
//! Everything the application does around the worker: announcing
//! connectivity changes, queueing actions taken while offline, asking the
//! platform for background sync and showing the worker's sync results.

use std::sync::Arc;

use crate::connectivity::{ConnectivityTracker, OfflineStatusEvent, PlatformEvent};
use crate::error::SyncError;
use crate::notify::{NotificationListener, SyncNotification};
use crate::platform::{ConnectivitySource, SyncRegistrar, Toast, ToastSink};
use crate::queue::{Collection, NewRecord, OfflineQueue, PendingAction, StoreBackend};
use crate::sync::SyncTag;

pub struct OfflineClient<S, R, T, B>
where
    S: ConnectivitySource,
    R: SyncRegistrar,
    T: ToastSink,
    B: StoreBackend,
{
    tracker: ConnectivityTracker<S>,
    queue: Arc<OfflineQueue<B>>,
    registrar: R,
    toasts: T,
    listener: NotificationListener,
}

/// User-facing noun for an action.
fn noun(action: &PendingAction) -> (&'static str, &'static str) {
    match action {
        PendingAction::Rating { .. } => ("Rating", "rating"),
        PendingAction::Favorite { .. } => ("Favorite", "favorite"),
    }
}

impl<S, R, T, B> OfflineClient<S, R, T, B>
where
    S: ConnectivitySource,
    R: SyncRegistrar,
    T: ToastSink,
    B: StoreBackend,
{
    pub fn new(source: S, queue: Arc<OfflineQueue<B>>, registrar: R, toasts: T) -> Self {
        Self {
            tracker: ConnectivityTracker::new(source),
            queue,
            registrar,
            toasts,
            listener: NotificationListener::new(),
        }
    }

    pub fn tracker(&self) -> &ConnectivityTracker<S> {
        &self.tracker
    }

    pub fn is_offline(&self) -> bool {
        self.tracker.is_offline()
    }

    pub fn toasts(&self) -> &T {
        &self.toasts
    }

    pub fn registrar(&self) -> &R {
        &self.registrar
    }

    /// Platform went online or offline.
    ///
    /// Going online also registers both sync tags. Registration is best
    /// effort: failures are logged and the next reconnect tries again.
    pub fn on_connectivity_event(&self, event: PlatformEvent) -> OfflineStatusEvent {
        let status = self.tracker.handle(event);
        match event {
            PlatformEvent::Online => {
                self.toasts.show(Toast::new(
                    "Connection Restored",
                    "You are back online. Syncing pending data...",
                ));
                for tag in SyncTag::ALL {
                    self.request_sync(tag);
                }
            }
            PlatformEvent::Offline => {
                self.toasts.show(Toast::destructive(
                    "You are offline",
                    "Changes will be synced when connection is restored.",
                ));
            }
        }
        status
    }

    pub fn save_offline_rating(
        &self,
        station_id: impl Into<String>,
        rating: u8,
        comment: Option<String>,
    ) -> bool {
        self.save_offline(NewRecord::rating(station_id, rating, comment))
    }

    pub fn save_offline_favorite(&self, station_id: impl Into<String>) -> bool {
        self.save_offline(NewRecord::favorite(station_id))
    }

    /// Queue an action for the next sync and ask for one.
    ///
    /// Returns `false` (after an error toast) only if the record could not
    /// be stored. Once stored, a failed sync registration is not an error:
    /// the record is safe and the next reconnect registers again.
    pub fn save_offline(&self, record: NewRecord) -> bool {
        let (title, lower) = noun(&record.action);
        let collection: Collection = record.action.collection();

        if let Err(e) = self.queue.add_item(collection, record) {
            log::error!("[Queue] Error saving offline {}: {}", lower, e);
            self.toasts.show(Toast::destructive(
                format!("Error Saving {}", title),
                format!("Could not save your {} for offline use.", lower),
            ));
            return false;
        }

        log::info!("[Queue] {} saved for offline sync", title);
        self.toasts.show(Toast::new(
            format!("{} Saved Offline", title),
            format!("Your {} will be synced when you reconnect.", lower),
        ));
        self.request_sync(SyncTag::from(collection));
        true
    }

    /// A message arrived from the worker.
    pub fn handle_worker_message(&self, data: &[u8]) -> Option<SyncNotification> {
        self.listener.handle_message(data, &self.toasts)
    }

    fn request_sync(&self, tag: SyncTag) {
        match self.registrar.register(tag) {
            Ok(()) => log::debug!("[SW Sync] Registered {}", tag),
            Err(SyncError::Unsupported) => log::debug!("[SW Sync] Background sync unsupported"),
            Err(e) => log::error!("[SW Sync] Error registering {}: {}", tag, e),
        }
    }
}
