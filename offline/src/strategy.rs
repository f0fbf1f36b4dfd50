//! Cache Strategies
//!
//! The three ways an intercepted request is satisfied. All of them work on
//! the current cache generation only (`CacheConfig::cache_name`) and key
//! entries by absolute request URL.
//!
//! Only successful (2xx) GET responses are written back. HEAD requests may
//! be answered from the cache but never populate it.

use crate::cache::CacheStorage;
use crate::config::CacheConfig;
use crate::error::FetchError;
use crate::http::{resolve, Request, RequestMethod, Response};
use crate::platform::{Network, NetworkError};

/// Body of the placeholder returned when revalidation has nothing to fall
/// back on.
pub const NETWORK_ERROR_BODY: &str = "Network error, using cached data";

/// Strategy selected by the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStrategy {
    CacheFirst,
    NetworkFirst,
    StaleWhileRevalidate,
}

/// Work that outlives the response and must run before the fetch event
/// settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deferred {
    /// Refresh the cached copy of this request from the network.
    Revalidate(Request),
}

/// What a strategy produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyOutcome {
    /// Handed to the page immediately.
    pub response: Response,
    /// Still to run; see `OfflineWorker::settle`.
    pub deferred: Option<Deferred>,
}

impl StrategyOutcome {
    fn ready(response: Response) -> Self {
        Self {
            response,
            deferred: None,
        }
    }
}

impl CacheStrategy {
    /// Run this strategy for one request.
    pub fn apply(
        self,
        caches: &mut CacheStorage,
        config: &CacheConfig,
        network: &dyn Network,
        request: &Request,
    ) -> Result<StrategyOutcome, FetchError> {
        match self {
            CacheStrategy::CacheFirst => {
                cache_first(caches, config, network, request).map(StrategyOutcome::ready)
            }
            CacheStrategy::NetworkFirst => {
                network_first(caches, config, network, request).map(StrategyOutcome::ready)
            }
            CacheStrategy::StaleWhileRevalidate => Ok(stale_while_revalidate(
                caches, config, network, request,
            )),
        }
    }
}

// ── Strategies ──────────────────────────────────────────────

/// Serve from cache; on a miss go to the network and keep a copy.
pub fn cache_first(
    caches: &mut CacheStorage,
    config: &CacheConfig,
    network: &dyn Network,
    request: &Request,
) -> Result<Response, FetchError> {
    if let Some(hit) = caches.match_in(&config.cache_name, &request.url) {
        log::trace!("[SW Cache] hit {}", request.url);
        return Ok(hit.to_response());
    }

    match network.fetch(request) {
        Ok(response) => {
            store(caches, config, request, &response);
            Ok(response)
        }
        Err(source) => offline_fallback(caches, config, request, source),
    }
}

/// Prefer the network; fall back to the cache, then the offline page.
pub fn network_first(
    caches: &mut CacheStorage,
    config: &CacheConfig,
    network: &dyn Network,
    request: &Request,
) -> Result<Response, FetchError> {
    match network.fetch(request) {
        Ok(response) => {
            store(caches, config, request, &response);
            Ok(response)
        }
        Err(source) => {
            if let Some(hit) = caches.match_in(&config.cache_name, &request.url) {
                log::debug!("[SW Cache] network failed, serving cached {}", request.url);
                return Ok(hit.to_response());
            }
            offline_fallback(caches, config, request, source)
        }
    }
}

/// Answer from the cache when possible and refresh it in the background.
///
/// On a hit the network request is returned as `Deferred::Revalidate`
/// rather than performed, so the caller gets the cached response without
/// waiting on the network. On a miss the revalidation runs inline and its
/// result is the response.
pub fn stale_while_revalidate(
    caches: &mut CacheStorage,
    config: &CacheConfig,
    network: &dyn Network,
    request: &Request,
) -> StrategyOutcome {
    if let Some(hit) = caches.match_in(&config.cache_name, &request.url) {
        return StrategyOutcome {
            response: hit.to_response(),
            deferred: Some(Deferred::Revalidate(request.clone())),
        };
    }
    StrategyOutcome::ready(revalidate(caches, config, network, request))
}

/// Fetch, refresh the cache on success, and synthesize a JSON error body
/// when the network is unreachable.
pub fn revalidate(
    caches: &mut CacheStorage,
    config: &CacheConfig,
    network: &dyn Network,
    request: &Request,
) -> Response {
    match network.fetch(request) {
        Ok(response) => {
            store(caches, config, request, &response);
            response
        }
        Err(e) => {
            log::error!("[SW Cache] Failed to fetch {}: {}", request.url, e);
            Response::json(&serde_json::json!({ "error": NETWORK_ERROR_BODY }))
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────

fn store(caches: &mut CacheStorage, config: &CacheConfig, request: &Request, response: &Response) {
    if response.ok() && request.method == RequestMethod::Get {
        caches.open(&config.cache_name).put(request, response);
    }
}

fn offline_fallback(
    caches: &CacheStorage,
    config: &CacheConfig,
    request: &Request,
    source: NetworkError,
) -> Result<Response, FetchError> {
    if !request.accepts_html() {
        return Err(FetchError::Network {
            url: request.url.clone(),
            source,
        });
    }

    let offline_url = resolve(&config.origin, &config.offline_url);
    caches
        .match_in(&config.cache_name, &offline_url)
        .map(|page| page.to_response())
        .ok_or(FetchError::OfflinePageMissing { offline_url })
}
