//! Worker configuration.
//!
//! Every field has a shipped default, so a TOML file only needs to name what
//! it overrides:
//!
//! ```toml
//! [cache]
//! cache_name = "ev-charging-cache-v2"
//!
//! [sync]
//! ratings_endpoint = "/api/v2/ratings"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default cache generation name.
pub const DEFAULT_CACHE_NAME: &str = "ev-charging-cache-v1";

/// Default offline fallback page.
pub const DEFAULT_OFFLINE_URL: &str = "/offline.html";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfflineConfig {
    pub cache: CacheConfig,
    pub sync: SyncConfig,
    pub store: StoreConfig,
}

/// Content cache and routing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Current cache generation. Every other cache name is evicted on
    /// activate.
    pub cache_name: String,
    /// Page served to HTML requests when both cache and network fail.
    pub offline_url: String,
    /// The worker's own origin, used for the same-origin rule and to
    /// resolve relative URLs.
    pub origin: String,
    /// Pre-cached on install.
    pub static_urls: Vec<String>,
    /// Cached on first use (cache-first).
    pub dynamic_patterns: Vec<String>,
    /// Served stale-while-revalidate.
    pub api_patterns: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_name: DEFAULT_CACHE_NAME.to_string(),
            offline_url: DEFAULT_OFFLINE_URL.to_string(),
            origin: "http://localhost".to_string(),
            static_urls: [
                "/",
                "/index.html",
                "/offline.html",
                "/manifest.json",
                "/favicon.ico",
                "/logo192.png",
                "/logo512.png",
                "/static/js/main.js",
                "/static/css/main.css",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            dynamic_patterns: vec![
                r"\.(?:js|css|woff2|png|svg|jpg|jpeg|gif|webp)$".to_string(),
                r"^https://api\.mapbox\.com/".to_string(),
            ],
            api_patterns: vec![
                r"^https://.*?/charging_stations".to_string(),
                r"^https://.*?/station_ratings".to_string(),
            ],
        }
    }
}

/// Background sync endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub ratings_endpoint: String,
    pub favorites_endpoint: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            ratings_endpoint: "/api/ratings".to_string(),
            favorites_endpoint: "/api/favorites".to_string(),
        }
    }
}

/// Durable queue location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Database name; the file backend uses it as a directory name.
    pub database: String,
    /// Schema version.
    pub version: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database: "ev-charging-offline-db".to_string(),
            version: 1,
        }
    }
}

impl OfflineConfig {
    /// Parse from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}
