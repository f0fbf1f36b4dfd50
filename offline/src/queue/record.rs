use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

// ── Collection ──────────────────────────────────────────────

/// A named queue collection.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Collection {
    #[serde(rename = "offlineRatings")]
    OfflineRatings,
    #[serde(rename = "offlineFavorites")]
    OfflineFavorites,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::OfflineRatings, Collection::OfflineFavorites];

    /// Store name as the page refers to it.
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::OfflineRatings => "offlineRatings",
            Collection::OfflineFavorites => "offlineFavorites",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "offlineRatings" => Ok(Collection::OfflineRatings),
            "offlineFavorites" => Ok(Collection::OfflineFavorites),
            other => Err(StoreError::UnknownCollection(other.to_string())),
        }
    }
}

// ── Records ─────────────────────────────────────────────────

/// What the user did while offline.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    Rating {
        station_id: String,
        rating: u8,
        comment: Option<String>,
    },
    Favorite {
        station_id: String,
    },
}

impl PendingAction {
    /// Short kind name, used in logs and errors.
    pub fn kind(&self) -> &'static str {
        match self {
            PendingAction::Rating { .. } => "rating",
            PendingAction::Favorite { .. } => "favorite",
        }
    }

    /// The only collection this action may be stored in.
    pub fn collection(&self) -> Collection {
        match self {
            PendingAction::Rating { .. } => Collection::OfflineRatings,
            PendingAction::Favorite { .. } => Collection::OfflineFavorites,
        }
    }

    pub fn station_id(&self) -> &str {
        match self {
            PendingAction::Rating { station_id, .. } | PendingAction::Favorite { station_id } => {
                station_id
            }
        }
    }
}

/// A record as handed to `OfflineQueue::add_item`.
///
/// An absent or empty id is replaced with a generated UUID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
    pub id: Option<String>,
    pub action: PendingAction,
}

impl NewRecord {
    pub fn rating(station_id: impl Into<String>, rating: u8, comment: Option<String>) -> Self {
        Self {
            id: None,
            action: PendingAction::Rating {
                station_id: station_id.into(),
                rating,
                comment,
            },
        }
    }

    pub fn favorite(station_id: impl Into<String>) -> Self {
        Self {
            id: None,
            action: PendingAction::Favorite {
                station_id: station_id.into(),
            },
        }
    }

    /// Builder: use a caller-supplied id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// A queued record.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PendingRecord {
    /// Unique within its collection.
    pub id: String,
    pub action: PendingAction,
    /// When the record was queued.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl PendingRecord {
    /// The JSON object POSTed to the backend.
    ///
    /// Keys are camelCase and `timestamp` is ISO-8601 with milliseconds,
    /// matching what the web app sends when it is online.
    pub fn to_wire_json(&self) -> serde_json::Value {
        let timestamp = self.created_at.to_rfc3339_opts(SecondsFormat::Millis, true);
        match &self.action {
            PendingAction::Rating {
                station_id,
                rating,
                comment,
            } => {
                let mut body = serde_json::json!({
                    "id": self.id,
                    "stationId": station_id,
                    "rating": rating,
                    "timestamp": timestamp,
                });
                if let Some(comment) = comment {
                    body["comment"] = serde_json::Value::String(comment.clone());
                }
                body
            }
            PendingAction::Favorite { station_id } => serde_json::json!({
                "id": self.id,
                "stationId": station_id,
                "timestamp": timestamp,
            }),
        }
    }
}
