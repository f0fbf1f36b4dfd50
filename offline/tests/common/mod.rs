//! Shared test doubles for the integration suites.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ev_offline::{
    ClientId, ClientMessage, ClientType, Clients, ConnectivitySource, MemoryBackend, Network,
    NetworkError, OfflineConfig, OfflineQueue, OfflineWorker, Request, Response, StoreConfig,
    SyncNotification, Toast, ToastSink, WorkerScope,
};

type Handler = Box<dyn Fn(&Request) -> Result<Response, NetworkError>>;

/// Scripted worker scope: network, clients and skip-waiting in one.
pub struct MockScope {
    handler: Handler,
    online: Cell<bool>,
    pub windows: Vec<ClientId>,
    pub fetches: RefCell<Vec<Request>>,
    pub posted: RefCell<Vec<(ClientId, ClientMessage)>>,
    pub claimed: Cell<bool>,
    pub skipped_waiting: Cell<bool>,
}

impl MockScope {
    pub fn new(handler: impl Fn(&Request) -> Result<Response, NetworkError> + 'static) -> Self {
        Self {
            handler: Box::new(handler),
            online: Cell::new(true),
            windows: vec![ClientId("window-1".into())],
            fetches: RefCell::new(Vec::new()),
            posted: RefCell::new(Vec::new()),
            claimed: Cell::new(false),
            skipped_waiting: Cell::new(false),
        }
    }

    /// Every URL answers 200 with `body of <url>`.
    pub fn site() -> Self {
        Self::new(|request| Ok(page(&format!("body of {}", request.url))))
    }

    pub fn with_windows(mut self, windows: &[&str]) -> Self {
        self.windows = windows.iter().map(|w| ClientId(w.to_string())).collect();
        self
    }

    /// While offline every fetch fails without reaching the handler.
    pub fn set_online(&self, online: bool) {
        self.online.set(online);
    }

    pub fn fetch_count(&self, url: &str) -> usize {
        self.fetches.borrow().iter().filter(|r| r.url == url).count()
    }

    /// Notifications posted, in order, regardless of recipient.
    pub fn notifications(&self) -> Vec<SyncNotification> {
        self.posted
            .borrow()
            .iter()
            .map(|(_, message)| match message {
                ClientMessage::SyncNotification(n) => n.clone(),
            })
            .collect()
    }
}

impl Network for MockScope {
    fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        self.fetches.borrow_mut().push(request.clone());
        if !self.online.get() {
            return Err(NetworkError::Offline);
        }
        (self.handler)(request)
    }
}

impl Clients for MockScope {
    fn match_all(&self, client_type: ClientType) -> Vec<ClientId> {
        match client_type {
            ClientType::Window | ClientType::All => self.windows.clone(),
            ClientType::Worker => Vec::new(),
        }
    }

    fn post_message(&self, client: &ClientId, message: &ClientMessage) -> Result<(), NetworkError> {
        self.posted
            .borrow_mut()
            .push((client.clone(), message.clone()));
        Ok(())
    }

    fn claim(&self) {
        self.claimed.set(true);
    }
}

impl WorkerScope for MockScope {
    fn skip_waiting(&self) {
        self.skipped_waiting.set(true);
    }
}

/// 200 text/html response.
pub fn page(body: &str) -> Response {
    Response::with_body(200, "text/html", body.as_bytes().to_vec())
}

/// Flippable connectivity shared between tracker and test.
#[derive(Clone, Default)]
pub struct Link(Arc<AtomicBool>);

impl Link {
    pub fn online() -> Self {
        let link = Self::default();
        link.set(true);
        link
    }

    pub fn set(&self, online: bool) {
        self.0.store(online, Ordering::SeqCst);
    }
}

impl ConnectivitySource for Link {
    fn is_online(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Remembers every toast shown.
#[derive(Clone, Default)]
pub struct RecordingToasts(Arc<spin::Mutex<Vec<Toast>>>);

impl RecordingToasts {
    pub fn titles(&self) -> Vec<String> {
        self.0.lock().iter().map(|t| t.title.clone()).collect()
    }

    pub fn all(&self) -> Vec<Toast> {
        self.0.lock().clone()
    }
}

impl ToastSink for RecordingToasts {
    fn show(&self, toast: Toast) {
        self.0.lock().push(toast);
    }
}

pub fn memory_queue() -> Arc<OfflineQueue<MemoryBackend>> {
    Arc::new(OfflineQueue::new(MemoryBackend::new(), StoreConfig::default()))
}

/// Installed and activated worker with default configuration.
pub fn active_worker(
    scope: MockScope,
    queue: Arc<OfflineQueue<MemoryBackend>>,
) -> OfflineWorker<MockScope, MemoryBackend> {
    let mut worker = OfflineWorker::new(OfflineConfig::default(), scope, queue).unwrap();
    worker.install().unwrap();
    worker.activate().unwrap();
    worker
}
