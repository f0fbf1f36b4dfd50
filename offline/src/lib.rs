//! EV Charging Offline Worker
//!
//! Offline cache and background sync layer for the EV charging station
//! finder. The hosted backend owns persistence and business rules; this crate
//! owns what happens when the network is unreliable.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────── page ────────────────┐      ┌────────────── worker ──────────────┐
//! │ OfflineClient                        │      │ OfflineWorker                      │
//! │  ├─ ConnectivityTracker              │      │  ├─ LifecycleManager               │
//! │  ├─ NotificationListener ◄───────────┼──────┼──┤  (install / activate)           │
//! │  └─ save_offline_* ──► OfflineQueue ◄┼──────┼──┤ Router ─► strategies ─► Cache   │
//! │                 └──► SyncRegistrar ──┼──────┼─►│ drain ─► Network ─► notify      │
//! └──────────────────────────────────────┘      └────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `config`: TOML-backed configuration with the shipped defaults
//! - `error`: crate error types
//! - `http`: request/response model shared by worker and platform
//! - `cache`: named content caches (one entry per cache name + URL)
//! - `strategy`: cache-first, network-first, stale-while-revalidate
//! - `router`: request → strategy routing rule
//! - `lifecycle`: worker state machine and lifecycle events
//! - `platform`: the narrow interface the worker needs from its host
//! - `worker`: install / activate / fetch / sync handlers
//! - `queue`: durable offline queue (pending ratings and favorites)
//! - `sync`: background sync drain and the sync-tag registry
//! - `notify`: worker → page sync notifications and toasts
//! - `connectivity`: online/offline tracker
//! - `client`: page-side glue tying the pieces together

pub mod cache;
pub mod client;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod notify;
pub mod platform;
pub mod queue;
pub mod router;
pub mod strategy;
pub mod sync;
pub mod worker;

// Re-exports for convenience
pub use cache::{Cache, CacheStorage, CachedResponse};
pub use client::OfflineClient;
pub use config::{CacheConfig, OfflineConfig, StoreConfig, SyncConfig};
pub use connectivity::{ConnectivityTracker, OfflineStatusEvent, PlatformEvent, SubscriptionId};
pub use error::{
    ConfigError, FetchError, LifecycleError, OfflineError, Result, StoreError, SyncError,
};
pub use http::{Request, RequestMethod, Response, ResponseType};
pub use lifecycle::{LifecycleEvent, LifecycleManager, WorkerState};
pub use notify::{ClientMessage, NotificationListener, SyncNotification, SyncOperation, SyncStatus};
pub use platform::{
    ClientId, ClientType, Clients, ConnectivitySource, Network, NetworkError, SyncRegistrar,
    Toast, ToastSink, ToastVariant, WorkerScope,
};
pub use queue::{
    Collection, FileBackend, MemoryBackend, NewRecord, OfflineQueue, PendingAction, PendingRecord,
    StoreBackend,
};
pub use router::{Route, Router};
pub use strategy::{CacheStrategy, Deferred, StrategyOutcome};
pub use sync::{DrainReport, SyncEvent, SyncManager, SyncState, SyncTag};
pub use worker::{FetchEvent, OfflineWorker};
