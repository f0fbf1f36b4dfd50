//! Client Notification Bridge
//!
//! Worker → page messages describing the outcome of a sync drain, and the
//! page-side listener that turns them into toasts.
//!
//! Delivery is at-most-once: a client that is closed when the worker posts
//! simply misses the message. The queue, not the notification, is the
//! source of truth.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::platform::{ClientType, Clients, Toast, ToastSink};

/// Outcome kind.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Success,
    Error,
}

/// Which queue the notification is about.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SyncOperation {
    Ratings,
    Favorites,
}

impl SyncOperation {
    pub fn as_str(self) -> &'static str {
        match self {
            SyncOperation::Ratings => "ratings",
            SyncOperation::Favorites => "favorites",
        }
    }
}

impl fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of one drain, as seen by the page.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SyncNotification {
    pub status: SyncStatus,
    pub operation: SyncOperation,
    pub message: String,
    /// Records affected. Absent when the queue could not be read at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl SyncNotification {
    pub fn synced(operation: SyncOperation, count: usize) -> Self {
        Self {
            status: SyncStatus::Success,
            operation,
            message: format!("Successfully synced {} {}", count, operation),
            count: Some(count),
        }
    }

    pub fn failed(operation: SyncOperation, count: usize) -> Self {
        Self {
            status: SyncStatus::Error,
            operation,
            message: format!("Failed to sync {} {}", count, operation),
            count: Some(count),
        }
    }

    /// The drain could not start.
    pub fn aborted(operation: SyncOperation) -> Self {
        Self {
            status: SyncStatus::Error,
            operation,
            message: format!("Error syncing {}", operation),
            count: None,
        }
    }
}

/// Message posted from the worker to its clients.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "SYNC_NOTIFICATION")]
    SyncNotification(SyncNotification),
}

impl ClientMessage {
    /// Structured-clone equivalent of the message.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

// ── Worker side ─────────────────────────────────────────────

/// Post a notification to every open window client. Returns how many
/// clients accepted it; failures are logged and skipped.
pub fn notify_clients(clients: &dyn Clients, notification: &SyncNotification) -> usize {
    let message = ClientMessage::SyncNotification(notification.clone());
    let mut delivered = 0;
    for client in clients.match_all(ClientType::Window) {
        match clients.post_message(&client, &message) {
            Ok(()) => delivered += 1,
            Err(e) => log::error!("[SW Sync] Error sending notification to {}: {}", client, e),
        }
    }
    delivered
}

// ── Page side ───────────────────────────────────────────────

/// Turns worker messages into toasts.
#[derive(Debug, Default, Clone, Copy)]
pub struct NotificationListener;

impl NotificationListener {
    pub fn new() -> Self {
        Self
    }

    /// Toast shown for a notification.
    pub fn toast_for(notification: &SyncNotification) -> Toast {
        match notification.status {
            SyncStatus::Success => Toast::new("Sync Complete", notification.message.clone()),
            SyncStatus::Error => Toast::destructive("Sync Failed", notification.message.clone()),
        }
    }

    /// Handle raw message data from the worker. Anything that is not a sync
    /// notification is ignored.
    pub fn handle_message(&self, data: &[u8], toasts: &dyn ToastSink) -> Option<SyncNotification> {
        let ClientMessage::SyncNotification(notification) =
            serde_json::from_slice::<ClientMessage>(data).ok()?;
        toasts.show(Self::toast_for(&notification));
        Some(notification)
    }
}
