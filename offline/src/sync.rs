//! Background Sync
//!
//! Two halves:
//!
//! - `drain`: what the worker does when a sync tag fires. It replays every
//!   queued record against the backend, removes the ones the server
//!   accepted and reports the outcome as at most one success and one error
//!   notification.
//! - `SyncManager`: the platform-side tag registry that decides when a tag
//!   fires.
//!
//! There is no retry ceiling. A record the server keeps rejecting stays
//! queued and is re-sent on every drain.

use core::fmt;
use core::str::FromStr;
use std::collections::BTreeMap;

use spin::RwLock;

use crate::config::OfflineConfig;
use crate::error::SyncError;
use crate::http::{resolve, Request};
use crate::notify::{SyncNotification, SyncOperation};
use crate::platform::{ConnectivitySource, Network, SyncRegistrar};
use crate::queue::{Collection, OfflineQueue, PendingAction, PendingRecord, StoreBackend};

// ── Tags ────────────────────────────────────────────────────

/// Sync tag, one per queue collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SyncTag {
    Ratings,
    Favorites,
}

impl SyncTag {
    pub const ALL: [SyncTag; 2] = [SyncTag::Ratings, SyncTag::Favorites];

    pub fn as_str(self) -> &'static str {
        match self {
            SyncTag::Ratings => "sync-ratings",
            SyncTag::Favorites => "sync-favorites",
        }
    }

    pub fn collection(self) -> Collection {
        match self {
            SyncTag::Ratings => Collection::OfflineRatings,
            SyncTag::Favorites => Collection::OfflineFavorites,
        }
    }

    pub fn operation(self) -> SyncOperation {
        match self {
            SyncTag::Ratings => SyncOperation::Ratings,
            SyncTag::Favorites => SyncOperation::Favorites,
        }
    }
}

impl From<Collection> for SyncTag {
    fn from(collection: Collection) -> Self {
        match collection {
            Collection::OfflineRatings => SyncTag::Ratings,
            Collection::OfflineFavorites => SyncTag::Favorites,
        }
    }
}

impl fmt::Display for SyncTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncTag {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sync-ratings" => Ok(SyncTag::Ratings),
            "sync-favorites" => Ok(SyncTag::Favorites),
            other => Err(SyncError::UnknownTag(other.to_string())),
        }
    }
}

// ── Drain ───────────────────────────────────────────────────

/// Outcome of one drain pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrainReport {
    pub tag: SyncTag,
    /// Records in the snapshot taken at the start of the pass.
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Zero, one or two notifications; never one per record.
    pub notifications: Vec<SyncNotification>,
}

fn endpoint_for(config: &OfflineConfig, action: &PendingAction) -> String {
    let path = match action {
        PendingAction::Rating { .. } => &config.sync.ratings_endpoint,
        PendingAction::Favorite { .. } => &config.sync.favorites_endpoint,
    };
    resolve(&config.cache.origin, path)
}

/// POST one record. `Ok` means the server accepted it.
fn deliver(
    network: &dyn Network,
    config: &OfflineConfig,
    record: &PendingRecord,
) -> Result<(), String> {
    let body = serde_json::to_vec(&record.to_wire_json()).map_err(|e| e.to_string())?;
    let request = Request::post_json(endpoint_for(config, &record.action), body);
    let response = network.fetch(&request).map_err(|e| e.to_string())?;
    if response.ok() {
        Ok(())
    } else {
        Err(format!("Server responded with {}", response.status))
    }
}

/// Replay every queued record for `tag`, one at a time.
///
/// Only the records present when the pass starts are attempted; anything
/// added meanwhile waits for the next pass.
pub fn drain<B: StoreBackend>(
    queue: &OfflineQueue<B>,
    network: &dyn Network,
    config: &OfflineConfig,
    tag: SyncTag,
) -> DrainReport {
    let operation = tag.operation();
    let collection = tag.collection();
    let mut report = DrainReport {
        tag,
        attempted: 0,
        succeeded: 0,
        failed: 0,
        notifications: Vec::new(),
    };

    let pending = match queue.get_all_items(collection) {
        Ok(pending) => pending,
        Err(e) => {
            log::error!("[SW Sync] Error syncing {}: {}", operation, e);
            report.notifications.push(SyncNotification::aborted(operation));
            return report;
        }
    };
    if pending.is_empty() {
        return report;
    }

    log::info!("[SW Sync] Syncing {} pending {}", pending.len(), operation);
    report.attempted = pending.len();

    for record in &pending {
        let kind = record.action.kind();
        match deliver(network, config, record) {
            Ok(()) => {
                if let Err(e) = queue.delete_item(collection, &record.id) {
                    log::warn!(
                        "[SW Sync] Synced {} {} but could not remove it: {}",
                        kind,
                        record.id,
                        e
                    );
                }
                report.succeeded += 1;
                log::info!("[SW Sync] Successfully synced {} {}", kind, record.id);
            }
            Err(reason) => {
                report.failed += 1;
                log::error!("[SW Sync] Failed to sync {} {}: {}", kind, record.id, reason);
            }
        }
    }

    if report.succeeded > 0 {
        report
            .notifications
            .push(SyncNotification::synced(operation, report.succeeded));
    }
    if report.failed > 0 {
        report
            .notifications
            .push(SyncNotification::failed(operation, report.failed));
    }
    report
}

// ── Platform registry ───────────────────────────────────────

/// Sync event delivered to the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncEvent {
    /// Raw tag as the platform delivers it (`sync-ratings`, ...)
    pub tag: String,
}

impl SyncEvent {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into() }
    }
}

/// Registration state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncState {
    /// Waiting for connectivity.
    #[default]
    Pending,
    /// Sync event dispatched, handler running.
    Firing,
}

#[derive(Debug, Clone, Copy)]
struct SyncRegistration {
    state: SyncState,
    /// Registered again while firing; fire once more after completion.
    refire: bool,
}

/// Platform-side registry of sync tags.
///
/// Registering a tag that is already pending is a no-op. Tags fire only
/// while the connectivity source reports online.
#[derive(Debug)]
pub struct SyncManager {
    registrations: RwLock<BTreeMap<SyncTag, SyncRegistration>>,
    worker_active: RwLock<bool>,
}

impl SyncManager {
    pub fn new() -> Self {
        Self {
            registrations: RwLock::new(BTreeMap::new()),
            worker_active: RwLock::new(true),
        }
    }

    /// Registration needs an active worker; the host flips this while a
    /// worker is being replaced.
    pub fn set_worker_active(&self, active: bool) {
        *self.worker_active.write() = active;
    }

    pub fn state(&self, tag: SyncTag) -> Option<SyncState> {
        self.registrations.read().get(&tag).map(|r| r.state)
    }

    /// Registered tags, in tag order.
    pub fn tags(&self) -> Vec<SyncTag> {
        self.registrations.read().keys().copied().collect()
    }

    /// Dispatch every pending tag, if online.
    pub fn fire_pending(&self, connectivity: &dyn ConnectivitySource) -> Vec<SyncEvent> {
        if !connectivity.is_online() {
            return Vec::new();
        }

        let mut registrations = self.registrations.write();
        registrations
            .iter_mut()
            .filter(|(_, r)| r.state == SyncState::Pending)
            .map(|(tag, r)| {
                r.state = SyncState::Firing;
                SyncEvent::new(tag.as_str())
            })
            .collect()
    }

    /// The handler for `tag` finished. The registration is dropped unless
    /// the tag was registered again while it was firing.
    pub fn complete(&self, tag: SyncTag) {
        let mut registrations = self.registrations.write();
        let Some(registration) = registrations.get_mut(&tag) else {
            return;
        };
        if registration.refire {
            registration.refire = false;
            registration.state = SyncState::Pending;
        } else {
            registrations.remove(&tag);
        }
    }
}

impl Default for SyncManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncRegistrar for SyncManager {
    fn register(&self, tag: SyncTag) -> Result<(), SyncError> {
        if !*self.worker_active.read() {
            return Err(SyncError::NoActiveWorker {
                tag: tag.as_str().to_string(),
            });
        }

        let mut registrations = self.registrations.write();
        let registration = registrations.entry(tag).or_insert(SyncRegistration {
            state: SyncState::Pending,
            refire: false,
        });
        if registration.state == SyncState::Firing {
            registration.refire = true;
        }
        Ok(())
    }
}
