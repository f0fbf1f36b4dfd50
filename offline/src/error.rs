use crate::lifecycle::WorkerState;
use crate::platform::NetworkError;

/// All errors produced by the offline layer.
///
/// Worker lifecycle handlers never surface these to the platform; they are
/// logged and turned into error responses or error notifications. The page
/// side (`OfflineClient`) and direct queue callers see them as-is.
#[derive(thiserror::Error, Debug)]
pub enum OfflineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("offline store error: {0}")]
    Store(#[from] StoreError),

    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("sync registration failed: {0}")]
    Sync(#[from] SyncError),

    #[error("worker lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Crate-wide result alias.
pub type Result<T> = core::result::Result<T, OfflineError>;

/// Failure of a cache strategy to produce any response.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Cache miss and the network failed; no offline page applies.
    #[error("network unavailable and no cached response for {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: NetworkError,
    },

    /// HTML fallback was wanted but the offline page is not cached.
    #[error("offline page {offline_url} is not cached")]
    OfflinePageMissing { offline_url: String },
}

/// Durable queue failures.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// Insert-only semantics: the id is already present.
    #[error("record {id} already exists in {collection}")]
    ConstraintError { collection: String, id: String },

    /// The record's kind does not belong to the target collection.
    #[error("{kind} records cannot be stored in {collection}")]
    WrongCollection { collection: String, kind: String },

    #[error("unknown collection: {0}")]
    UnknownCollection(String),

    #[error("failed to encode {collection}: {source}")]
    Encode {
        collection: String,
        #[source]
        source: postcard::Error,
    },

    #[error("failed to decode {collection}: {source}")]
    Decode {
        collection: String,
        #[source]
        source: postcard::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration failures.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("config file {path}: {source}")]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Sync-tag registration failures.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("background sync is not supported")]
    Unsupported,

    #[error("no active worker to register {tag} with")]
    NoActiveWorker { tag: String },

    #[error("unknown sync tag: {0}")]
    UnknownTag(String),
}

/// Worker state machine violations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    #[error("invalid worker state transition {from:?} -> {to:?}")]
    InvalidTransition { from: WorkerState, to: WorkerState },

    #[error("worker must be activated to claim clients (currently {0:?})")]
    NotActivated(WorkerState),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_wraps_into_offline_error() {
        let err: OfflineError = StoreError::ConstraintError {
            collection: "offlineRatings".into(),
            id: "r1".into(),
        }
        .into();
        assert!(matches!(err, OfflineError::Store(_)));
        assert_eq!(
            err.to_string(),
            "offline store error: record r1 already exists in offlineRatings"
        );
    }

    #[test]
    fn fetch_error_message_names_url() {
        let err = FetchError::Network {
            url: "/missing.js".into(),
            source: NetworkError::Offline,
        };
        assert!(err.to_string().contains("/missing.js"));
    }
}
