//! Content Cache
//!
//! Cache generations keyed by name (`ev-charging-cache-v1`, ...), each a
//! URL-indexed set of stored responses. A URL maps to at most one response
//! per generation and storing it again replaces the old copy.
//!
//! Entries never expire individually; a generation disappears as a whole
//! when a newer worker activates.

use std::collections::BTreeMap;

use crate::http::{Request, Response};
use crate::platform::{Network, NetworkError};

// ── Stored responses ────────────────────────────────────────

/// A response as kept in a cache generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    /// Absolute URL of the request that produced it.
    pub url: String,
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
    /// When it was stored, in epoch milliseconds.
    pub cached_at: i64,
}

impl CachedResponse {
    fn capture(url: &str, response: &Response) -> Self {
        Self {
            url: url.to_string(),
            status: response.status,
            headers: response.headers.clone(),
            body: response.body.clone(),
            cached_at: chrono::Utc::now().timestamp_millis(),
        }
    }

    /// Rebuild a response to hand back to the page.
    pub fn to_response(&self) -> Response {
        let mut response = Response::new(self.status);
        response.headers = self.headers.clone();
        response.body = self.body.clone();
        response
    }

    /// Body plus header bytes.
    pub fn size(&self) -> usize {
        let header_bytes: usize = self.headers.iter().map(|(k, v)| k.len() + v.len()).sum();
        self.body.len() + header_bytes
    }
}

// ── One generation ──────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct Cache {
    name: String,
    by_url: BTreeMap<String, CachedResponse>,
    bytes: usize,
}

impl Cache {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Keep `response` under the request URL.
    pub fn put(&mut self, request: &Request, response: &Response) {
        self.put_url(&request.url, response);
    }

    pub fn put_url(&mut self, url: &str, response: &Response) {
        let stored = CachedResponse::capture(url, response);
        self.bytes += stored.size();
        if let Some(replaced) = self.by_url.insert(url.to_string(), stored) {
            self.bytes = self.bytes.saturating_sub(replaced.size());
        }
    }

    /// Fetch every request, then store all of them or none.
    ///
    /// A transport failure or a non-2xx status on any request aborts the
    /// whole batch before anything is written.
    pub fn add_all(
        &mut self,
        network: &dyn Network,
        requests: &[Request],
    ) -> Result<usize, AddAllError> {
        let mut batch = Vec::with_capacity(requests.len());
        for request in requests {
            let response = network.fetch(request).map_err(|source| AddAllError::Network {
                url: request.url.clone(),
                source,
            })?;
            if !response.ok() {
                return Err(AddAllError::BadStatus {
                    url: request.url.clone(),
                    status: response.status,
                });
            }
            batch.push((request, response));
        }

        for (request, response) in &batch {
            self.put(request, response);
        }
        Ok(batch.len())
    }

    pub fn match_url(&self, url: &str) -> Option<&CachedResponse> {
        self.by_url.get(url)
    }

    /// Drop the entry for `url`. Returns whether there was one.
    pub fn delete(&mut self, url: &str) -> bool {
        match self.by_url.remove(url) {
            Some(removed) => {
                self.bytes = self.bytes.saturating_sub(removed.size());
                true
            }
            None => false,
        }
    }

    /// Stored URLs, sorted.
    pub fn keys(&self) -> Vec<&str> {
        self.by_url.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.by_url.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_url.is_empty()
    }

    pub fn size(&self) -> usize {
        self.bytes
    }
}

/// Why `Cache::add_all` stored nothing.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AddAllError {
    #[error("{url}: {source}")]
    Network {
        url: String,
        #[source]
        source: NetworkError,
    },

    #[error("{url}: server responded with {status}")]
    BadStatus { url: String, status: u16 },
}

// ── All generations ─────────────────────────────────────────

/// Every cache generation the worker can see.
#[derive(Debug, Clone, Default)]
pub struct CacheStorage {
    generations: BTreeMap<String, Cache>,
}

impl CacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// The generation called `name`, created empty if missing.
    pub fn open(&mut self, name: &str) -> &mut Cache {
        self.generations
            .entry(name.to_string())
            .or_insert_with(|| Cache::new(name))
    }

    pub fn get(&self, name: &str) -> Option<&Cache> {
        self.generations.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.generations.contains_key(name)
    }

    /// Remove a generation and everything in it.
    pub fn delete(&mut self, name: &str) -> bool {
        self.generations.remove(name).is_some()
    }

    /// Generation names, sorted.
    pub fn keys(&self) -> Vec<&str> {
        self.generations.keys().map(String::as_str).collect()
    }

    /// First generation (in name order) holding `url`.
    pub fn match_url(&self, url: &str) -> Option<(&str, &CachedResponse)> {
        self.generations
            .iter()
            .find_map(|(name, cache)| Some((name.as_str(), cache.match_url(url)?)))
    }

    pub fn match_in(&self, name: &str, url: &str) -> Option<&CachedResponse> {
        self.generations.get(name)?.match_url(url)
    }

    pub fn total_size(&self) -> usize {
        self.generations.values().map(Cache::size).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    const SHELL: &str = "http://localhost/index.html";
    const LOGO: &str = "http://localhost/logo512.png";

    fn text(body: &str) -> Response {
        Response::with_body(200, "text/plain", body.as_bytes().to_vec())
    }

    /// Echoes the URL back, except for one unreachable URL.
    struct Origin {
        unreachable: Option<&'static str>,
        status: u16,
        seen: RefCell<Vec<String>>,
    }

    impl Origin {
        fn up() -> Self {
            Self {
                unreachable: None,
                status: 200,
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl Network for Origin {
        fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
            self.seen.borrow_mut().push(request.url.clone());
            if self.unreachable == Some(request.url.as_str()) {
                return Err(NetworkError::Offline);
            }
            let mut response = text(&request.url);
            response.status = self.status;
            Ok(response)
        }
    }

    #[test]
    fn test_put_then_match() {
        let mut cache = Cache::new("ev-charging-cache-v1");
        cache.put(&Request::new(SHELL), &text("<div id=root>"));

        let hit = cache.match_url(SHELL).unwrap();
        assert_eq!(hit.status, 200);
        assert_eq!(hit.body, b"<div id=root>");
        assert_eq!(hit.url, SHELL);
    }

    #[test]
    fn test_second_put_replaces_first() {
        let mut cache = Cache::new("ev-charging-cache-v1");
        cache.put_url(SHELL, &text("build 1"));
        cache.put_url(SHELL, &text("build 2"));

        assert_eq!(cache.keys(), vec![SHELL]);
        assert_eq!(cache.match_url(SHELL).unwrap().body, b"build 2");
    }

    #[test]
    fn test_size_follows_replacement_and_delete() {
        let mut cache = Cache::new("ev-charging-cache-v1");
        cache.put_url(LOGO, &Response::with_body(200, "image/png", vec![0u8; 10]));
        let big = cache.size();
        cache.put_url(LOGO, &Response::with_body(200, "image/png", vec![0u8; 4]));
        assert_eq!(cache.size(), big - 6);

        assert!(cache.delete(LOGO));
        assert!(!cache.delete(LOGO));
        assert_eq!(cache.size(), 0);
        assert!(cache.match_url(LOGO).is_none());
    }

    #[test]
    fn test_add_all_stores_whole_batch() {
        let origin = Origin::up();
        let mut cache = Cache::new("ev-charging-cache-v1");
        let batch = [Request::new(SHELL), Request::new(LOGO)];

        assert_eq!(cache.add_all(&origin, &batch), Ok(2));
        assert_eq!(cache.keys(), vec![SHELL, LOGO]);
        assert_eq!(origin.seen.borrow().len(), 2);
    }

    #[test]
    fn test_add_all_unreachable_url_stores_nothing() {
        let origin = Origin {
            unreachable: Some(LOGO),
            ..Origin::up()
        };
        let mut cache = Cache::new("ev-charging-cache-v1");
        let batch = [Request::new(SHELL), Request::new(LOGO)];

        let err = cache.add_all(&origin, &batch).unwrap_err();
        assert_eq!(
            err,
            AddAllError::Network {
                url: LOGO.to_string(),
                source: NetworkError::Offline
            }
        );
        assert!(cache.is_empty());
        assert_eq!(
            std::error::Error::source(&err).map(|e| e.to_string()),
            Some("network offline".to_string())
        );
    }

    #[test]
    fn test_add_all_rejects_error_status() {
        let origin = Origin {
            status: 404,
            ..Origin::up()
        };
        let mut cache = Cache::new("ev-charging-cache-v1");
        let err = cache.add_all(&origin, &[Request::new(SHELL)]).unwrap_err();
        assert_eq!(err.to_string(), format!("{}: server responded with 404", SHELL));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_generations_are_separate() {
        let mut storage = CacheStorage::new();
        assert!(!storage.has("ev-charging-cache-v1"));
        storage.open("ev-charging-cache-v0").put_url(SHELL, &text("old"));
        storage.open("ev-charging-cache-v1").put_url(LOGO, &text("png"));

        assert!(storage.match_in("ev-charging-cache-v1", SHELL).is_none());
        assert_eq!(
            storage.match_url(SHELL).map(|(name, _)| name),
            Some("ev-charging-cache-v0")
        );
        let per_generation: usize = ["ev-charging-cache-v0", "ev-charging-cache-v1"]
            .iter()
            .map(|name| storage.get(name).unwrap().size())
            .sum();
        assert_eq!(storage.total_size(), per_generation);

        assert!(storage.delete("ev-charging-cache-v0"));
        assert_eq!(storage.keys(), vec!["ev-charging-cache-v1"]);
    }

    #[test]
    fn test_cached_copy_rebuilds_same_response() {
        let fresh = Response::with_body(200, "text/html", b"<html>".to_vec());
        let stored = CachedResponse::capture(SHELL, &fresh);
        assert_eq!(stored.to_response(), fresh);
    }
}
