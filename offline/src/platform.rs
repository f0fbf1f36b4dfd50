//! Platform Interface
//!
//! The narrow surface the worker and the page need from whatever hosts
//! them: network access, the open-client list and message posting, sync
//! registration, the live connectivity flag and user-visible toasts.
//! Everything else (content caches, the durable queue) is owned by this
//! crate.

use core::fmt;

use crate::http::{Request, Response};
use crate::notify::ClientMessage;
use crate::sync::SyncTag;
use crate::error::SyncError;

// ── Network ─────────────────────────────────────────────────

/// A fetch that produced no response at all.
///
/// Non-2xx statuses are *not* network errors; they come back as
/// `Ok(Response)` and callers check `Response::ok()`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// The platform reports no connectivity.
    #[error("network offline")]
    Offline,
    /// Connection reset, DNS failure, TLS error and the like.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Network access.
pub trait Network {
    /// Perform a request.
    fn fetch(&self, request: &Request) -> Result<Response, NetworkError>;
}

// ── Clients ─────────────────────────────────────────────────

/// Opaque id of an open application instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub String);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Client type filter for `Clients::match_all`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientType {
    /// Top-level windows and tabs.
    Window,
    /// Dedicated and shared workers.
    Worker,
    /// Everything.
    All,
}

/// Open clients controlled by the worker.
pub trait Clients {
    /// Enumerate clients of the given type.
    fn match_all(&self, client_type: ClientType) -> Vec<ClientId>;

    /// Post a message. Fire-and-forget: no acknowledgement comes back.
    fn post_message(&self, client: &ClientId, message: &ClientMessage) -> Result<(), NetworkError>;

    /// Take control of every open client in scope.
    fn claim(&self);
}

/// Everything the worker itself needs from its global scope.
pub trait WorkerScope: Network + Clients {
    /// Ask the platform to activate this worker without waiting for old
    /// clients to close.
    fn skip_waiting(&self);
}

// ── Page side ───────────────────────────────────────────────

/// Registers sync tags so the platform fires `sync` events on reconnect.
pub trait SyncRegistrar {
    /// Register a tag. Registering an already-pending tag is not an error.
    fn register(&self, tag: SyncTag) -> Result<(), SyncError>;
}

/// The platform's live connectivity flag.
pub trait ConnectivitySource {
    /// `navigator.onLine` equivalent.
    fn is_online(&self) -> bool;
}

/// Toast styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastVariant {
    Default,
    Destructive,
}

/// A transient user-visible message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub description: String,
    pub variant: ToastVariant,
}

impl Toast {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            variant: ToastVariant::Default,
        }
    }

    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            variant: ToastVariant::Destructive,
            ..Self::new(title, description)
        }
    }
}

/// Where toasts are rendered.
pub trait ToastSink {
    fn show(&self, toast: Toast);
}
