//! Offline Worker
//!
//! The worker's event handlers. The host platform drives it:
//!
//! 1. `install` pre-caches the static set and the offline page
//! 2. `activate` claims clients and evicts old cache generations
//! 3. `handle_fetch` routes each request to a strategy, then `settle`
//!    runs whatever the strategy deferred
//! 4. `handle_sync` drains the queue for a fired sync tag
//!
//! No handler fails because of content: network, cache and queue errors
//! are logged and turned into error responses or error notifications.
//! Only lifecycle misuse by the host (e.g. activating twice) is returned.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::cache::CacheStorage;
use crate::config::OfflineConfig;
use crate::error::{ConfigError, LifecycleError};
use crate::http::{resolve, Request, Response};
use crate::lifecycle::{LifecycleManager, WorkerState};
use crate::notify::notify_clients;
use crate::platform::WorkerScope;
use crate::queue::{OfflineQueue, StoreBackend};
use crate::router::{Route, Router};
use crate::strategy::{self, Deferred};
use crate::sync::{self, DrainReport, SyncEvent, SyncTag};

// ── Fetch events ────────────────────────────────────────────

static NEXT_FETCH_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique fetch event number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FetchEventId(u64);

impl FetchEventId {
    fn next() -> Self {
        Self(NEXT_FETCH_ID.fetch_add(1, Ordering::SeqCst))
    }
}

/// An intercepted request.
///
/// If `respond_with` is never called the platform handles the request
/// itself. Work passed to `wait_until` keeps the event open until
/// `OfflineWorker::settle` runs it.
#[derive(Debug)]
pub struct FetchEvent {
    id: FetchEventId,
    request: Request,
    response: Option<Response>,
    responded: bool,
    extensions: Vec<Deferred>,
}

impl FetchEvent {
    pub fn new(request: Request) -> Self {
        Self {
            id: FetchEventId::next(),
            request,
            response: None,
            responded: false,
            extensions: Vec::new(),
        }
    }

    pub fn id(&self) -> FetchEventId {
        self.id
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Respond with a response. Only the first call counts.
    pub fn respond_with(&mut self, response: Response) {
        if !self.responded {
            self.responded = true;
            self.response = Some(response);
        }
    }

    pub fn responded(&self) -> bool {
        self.responded
    }

    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    pub fn take_response(&mut self) -> Option<Response> {
        self.response.take()
    }

    /// Extend the event's lifetime until `work` has run.
    pub fn wait_until(&mut self, work: Deferred) {
        self.extensions.push(work);
    }

    /// Work still outstanding.
    pub fn pending(&self) -> &[Deferred] {
        &self.extensions
    }

    /// Whether every extension has run.
    pub fn is_settled(&self) -> bool {
        self.extensions.is_empty()
    }
}

// ── Worker ──────────────────────────────────────────────────

pub struct OfflineWorker<S: WorkerScope, B: StoreBackend> {
    config: OfflineConfig,
    router: Router,
    caches: CacheStorage,
    lifecycle: LifecycleManager,
    queue: Arc<OfflineQueue<B>>,
    scope: S,
}

impl<S: WorkerScope, B: StoreBackend> OfflineWorker<S, B> {
    /// Fails only if a routing pattern does not compile.
    pub fn new(
        config: OfflineConfig,
        scope: S,
        queue: Arc<OfflineQueue<B>>,
    ) -> Result<Self, ConfigError> {
        let router = Router::new(&config.cache)?;
        Ok(Self {
            config,
            router,
            caches: CacheStorage::new(),
            lifecycle: LifecycleManager::new(),
            queue,
            scope,
        })
    }

    /// Build a worker from a TOML configuration file.
    pub fn from_config_file(
        path: &Path,
        scope: S,
        queue: Arc<OfflineQueue<B>>,
    ) -> crate::Result<Self> {
        let config = OfflineConfig::load(path)?;
        log::info!("[SW] Loaded configuration from {}", path.display());
        Ok(Self::new(config, scope, queue)?)
    }

    pub fn config(&self) -> &OfflineConfig {
        &self.config
    }

    pub fn state(&self) -> WorkerState {
        self.lifecycle.state()
    }

    pub fn lifecycle(&self) -> &LifecycleManager {
        &self.lifecycle
    }

    pub fn lifecycle_mut(&mut self) -> &mut LifecycleManager {
        &mut self.lifecycle
    }

    pub fn caches(&self) -> &CacheStorage {
        &self.caches
    }

    /// Cache storage persists across worker versions; hosts use this to
    /// hand over what a previous worker left behind.
    pub fn caches_mut(&mut self) -> &mut CacheStorage {
        &mut self.caches
    }

    pub fn queue(&self) -> &Arc<OfflineQueue<B>> {
        &self.queue
    }

    pub fn scope(&self) -> &S {
        &self.scope
    }

    // ── Install / activate ──────────────────────────────────

    /// Pre-cache the static set and the offline page, then ask to skip
    /// waiting. Caching failures are logged; install always completes.
    pub fn install(&mut self) -> Result<(), LifecycleError> {
        self.lifecycle.transition(WorkerState::Installing)?;
        self.scope.skip_waiting();
        self.lifecycle.skip_waiting()?;

        let origin = &self.config.cache.origin;
        let requests: Vec<Request> = self
            .config
            .cache
            .static_urls
            .iter()
            .map(|url| Request::new(resolve(origin, url)))
            .collect();

        let cache = self.caches.open(&self.config.cache.cache_name);
        match cache.add_all(&self.scope, &requests) {
            Ok(n) => log::info!("[SW] Pre-cached {} static assets", n),
            Err(e) => log::error!("[SW] Failed to pre-cache static assets: {}", e),
        }

        // Fetched on its own so a bulk failure above cannot leave the
        // worker without a fallback page.
        let offline_url = resolve(origin, &self.config.cache.offline_url);
        match self.scope.fetch(&Request::new(offline_url.clone())) {
            Ok(response) if response.ok() => cache.put_url(&offline_url, &response),
            Ok(response) => log::error!(
                "[SW] Failed to cache offline page: server responded with {}",
                response.status
            ),
            Err(e) => log::error!("[SW] Failed to cache offline page: {}", e),
        }

        self.lifecycle.transition(WorkerState::Installed)
    }

    /// Claim clients and delete every cache generation except the current
    /// one.
    pub fn activate(&mut self) -> Result<(), LifecycleError> {
        self.lifecycle.transition(WorkerState::Activating)?;

        let current = self.config.cache.cache_name.as_str();
        let stale: Vec<String> = self
            .caches
            .keys()
            .into_iter()
            .filter(|name| *name != current)
            .map(str::to_string)
            .collect();
        for name in &stale {
            self.caches.delete(name);
            log::info!("[SW] Deleted old cache {}", name);
        }

        self.lifecycle.transition(WorkerState::Activated)?;
        self.scope.claim();
        self.lifecycle.claim()
    }

    /// A newer worker took over.
    pub fn supersede(&mut self) -> Result<(), LifecycleError> {
        self.lifecycle.transition(WorkerState::Redundant)
    }

    // ── Fetch ───────────────────────────────────────────────

    /// Route and answer an intercepted request. Passthrough requests are
    /// left unanswered.
    pub fn handle_fetch(&mut self, event: &mut FetchEvent) {
        let strategy = match self.router.route(event.request()) {
            Route::Passthrough => return,
            Route::Strategy(strategy) => strategy,
        };

        match strategy.apply(
            &mut self.caches,
            &self.config.cache,
            &self.scope,
            event.request(),
        ) {
            Ok(outcome) => {
                event.respond_with(outcome.response);
                if let Some(work) = outcome.deferred {
                    event.wait_until(work);
                }
            }
            Err(e) => {
                log::error!("[SW] {:?} failed: {}", strategy, e);
                event.respond_with(Response::error());
            }
        }
    }

    /// Run the work a fetch event is waiting on.
    pub fn settle(&mut self, event: &mut FetchEvent) {
        for work in event.extensions.drain(..) {
            match work {
                Deferred::Revalidate(request) => {
                    strategy::revalidate(&mut self.caches, &self.config.cache, &self.scope, &request);
                }
            }
        }
    }

    // ── Sync ────────────────────────────────────────────────

    /// Drain the queue for a fired tag and notify open windows. Unknown
    /// tags are ignored.
    pub fn handle_sync(&mut self, event: &SyncEvent) -> Option<DrainReport> {
        let tag = match event.tag.parse::<SyncTag>() {
            Ok(tag) => tag,
            Err(e) => {
                log::debug!("[SW Sync] Ignoring sync event: {}", e);
                return None;
            }
        };

        let report = sync::drain(self.queue.as_ref(), &self.scope, &self.config, tag);
        for notification in &report.notifications {
            notify_clients(&self.scope, notification);
        }
        Some(report)
    }
}
