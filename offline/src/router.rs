//! Request Routing
//!
//! Picks a strategy for each intercepted request. Rules are checked in
//! order and the first match wins:
//!
//! 1. not GET/HEAD, or a browser-extension URL → not intercepted
//! 2. API pattern → stale-while-revalidate
//! 3. same origin as the worker, or a dynamic-asset pattern → cache-first
//! 4. anything else → network-first

use regex::Regex;

use crate::config::CacheConfig;
use crate::error::ConfigError;
use crate::http::{origin_of, Request};
use crate::strategy::CacheStrategy;

/// URL schemes used by browser extensions.
const EXTENSION_SCHEMES: &[&str] = &[
    "chrome-extension://",
    "moz-extension://",
    "safari-web-extension://",
];

/// Routing decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Leave the request to the platform's default handling.
    Passthrough,
    Strategy(CacheStrategy),
}

/// Compiled routing rules.
#[derive(Debug, Clone)]
pub struct Router {
    origin: String,
    api: Vec<Regex>,
    dynamic: Vec<Regex>,
}

fn compile(patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })
        })
        .collect()
}

impl Router {
    pub fn new(config: &CacheConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            origin: config.origin.trim_end_matches('/').to_string(),
            api: compile(&config.api_patterns)?,
            dynamic: compile(&config.dynamic_patterns)?,
        })
    }

    pub fn route(&self, request: &Request) -> Route {
        let url = request.url.as_str();

        if !request.method.is_read() || EXTENSION_SCHEMES.iter().any(|s| url.starts_with(s)) {
            return Route::Passthrough;
        }

        if self.api.iter().any(|re| re.is_match(url)) {
            return Route::Strategy(CacheStrategy::StaleWhileRevalidate);
        }

        let same_origin = origin_of(url) == Some(self.origin.as_str());
        if same_origin || self.dynamic.iter().any(|re| re.is_match(url)) {
            return Route::Strategy(CacheStrategy::CacheFirst);
        }

        Route::Strategy(CacheStrategy::NetworkFirst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::RequestMethod;

    fn router() -> Router {
        Router::new(&CacheConfig::default()).unwrap()
    }

    fn route(url: &str) -> Route {
        router().route(&Request::new(url))
    }

    #[test]
    fn test_non_read_methods_pass_through() {
        let router = router();
        for method in [RequestMethod::Post, RequestMethod::Put, RequestMethod::Delete] {
            let req = Request::new("http://localhost/api/ratings").with_method(method);
            assert_eq!(router.route(&req), Route::Passthrough);
        }
        let head = Request::new("http://localhost/").with_method(RequestMethod::Head);
        assert_ne!(router.route(&head), Route::Passthrough);
    }

    #[test]
    fn test_extension_urls_pass_through() {
        assert_eq!(route("chrome-extension://abc/popup.js"), Route::Passthrough);
        assert_eq!(route("moz-extension://abc/icon.png"), Route::Passthrough);
    }

    #[test]
    fn test_api_patterns_win_over_dynamic() {
        assert_eq!(
            route("https://db.example.co/rest/v1/charging_stations?select=*"),
            Route::Strategy(CacheStrategy::StaleWhileRevalidate)
        );
        assert_eq!(
            route("https://db.example.co/rest/v1/station_ratings/logo.png"),
            Route::Strategy(CacheStrategy::StaleWhileRevalidate)
        );
    }

    #[test]
    fn test_same_origin_is_cache_first() {
        assert_eq!(
            route("http://localhost/stations/42"),
            Route::Strategy(CacheStrategy::CacheFirst)
        );
    }

    #[test]
    fn test_dynamic_assets_are_cache_first() {
        assert_eq!(
            route("https://cdn.example.com/font.woff2"),
            Route::Strategy(CacheStrategy::CacheFirst)
        );
        assert_eq!(
            route("https://api.mapbox.com/styles/v1/streets"),
            Route::Strategy(CacheStrategy::CacheFirst)
        );
    }

    #[test]
    fn test_everything_else_is_network_first() {
        assert_eq!(
            route("https://maps.example.com/geocode?q=lisbon"),
            Route::Strategy(CacheStrategy::NetworkFirst)
        );
        // Different port is a different origin.
        assert_eq!(
            route("http://localhost:8080/data"),
            Route::Strategy(CacheStrategy::NetworkFirst)
        );
    }

    #[test]
    fn test_invalid_pattern_is_reported() {
        let config = CacheConfig {
            api_patterns: vec!["^https://(unclosed".to_string()],
            ..CacheConfig::default()
        };
        let err = Router::new(&config).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { ref pattern, .. } if pattern == "^https://(unclosed"));
    }
}
