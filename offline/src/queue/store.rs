use chrono::SubsecRound;
use serde::{Deserialize, Serialize};
use spin::Mutex;

use super::record::{Collection, NewRecord, PendingRecord};
use crate::config::StoreConfig;
use crate::error::StoreError;

/// Raw byte storage for one database.
///
/// A backend knows nothing about records; it loads and saves the encoded
/// contents of a whole collection.
pub trait StoreBackend: Send + Sync {
    /// Encoded collection contents, or `None` if it was never written.
    fn load(&self, collection: Collection) -> Result<Option<Vec<u8>>, StoreError>;

    /// Replace the collection contents.
    fn save(&self, collection: Collection, bytes: &[u8]) -> Result<(), StoreError>;
}

/// On-disk shape of one collection.
#[derive(Serialize, Deserialize, Debug, Default)]
struct StoredCollection {
    version: u32,
    records: Vec<PendingRecord>,
}

/// The durable queue.
///
/// Shared between the page (which adds records) and the worker (which
/// drains them); wrap it in an `Arc` to hand it to both.
pub struct OfflineQueue<B: StoreBackend> {
    backend: B,
    config: StoreConfig,
    /// Serializes open → transact → close so concurrent writers never
    /// interleave a load with another writer's save.
    txn: Mutex<()>,
}

impl<B: StoreBackend> OfflineQueue<B> {
    pub fn new(backend: B, config: StoreConfig) -> Self {
        log::info!(
            "[Queue] Using database {} (version {})",
            config.database,
            config.version
        );
        Self {
            backend,
            config,
            txn: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn open(&self, collection: Collection) -> Result<StoredCollection, StoreError> {
        let Some(bytes) = self.backend.load(collection)? else {
            return Ok(StoredCollection {
                version: self.config.version,
                records: Vec::new(),
            });
        };
        let stored: StoredCollection =
            postcard::from_bytes(&bytes).map_err(|source| StoreError::Decode {
                collection: collection.as_str().to_string(),
                source,
            })?;
        if stored.version != self.config.version {
            log::warn!(
                "[Queue] {} was written by schema version {}, running {}",
                collection,
                stored.version,
                self.config.version
            );
        }
        Ok(stored)
    }

    fn commit(&self, collection: Collection, records: Vec<PendingRecord>) -> Result<(), StoreError> {
        let stored = StoredCollection {
            version: self.config.version,
            records,
        };
        let bytes = postcard::to_stdvec(&stored).map_err(|source| StoreError::Encode {
            collection: collection.as_str().to_string(),
            source,
        })?;
        self.backend.save(collection, &bytes)
    }

    /// Insert a record, generating an id if none was supplied and stamping
    /// the creation time.
    pub fn add_item(
        &self,
        collection: Collection,
        record: NewRecord,
    ) -> Result<PendingRecord, StoreError> {
        if record.action.collection() != collection {
            return Err(StoreError::WrongCollection {
                collection: collection.as_str().to_string(),
                kind: record.action.kind().to_string(),
            });
        }

        let id = record
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        // Stored with millisecond precision; stamp at that precision so the
        // returned record equals what is read back.
        let pending = PendingRecord {
            id,
            action: record.action,
            created_at: chrono::Utc::now().trunc_subsecs(3),
        };

        let _txn = self.txn.lock();
        let mut stored = self.open(collection)?;
        if stored.records.iter().any(|r| r.id == pending.id) {
            return Err(StoreError::ConstraintError {
                collection: collection.as_str().to_string(),
                id: pending.id,
            });
        }
        stored.records.push(pending.clone());
        self.commit(collection, stored.records)?;

        log::debug!("[Queue] Added {} {} to {}", pending.action.kind(), pending.id, collection);
        Ok(pending)
    }

    /// Snapshot of every record in the collection, oldest first.
    pub fn get_all_items(&self, collection: Collection) -> Result<Vec<PendingRecord>, StoreError> {
        let _txn = self.txn.lock();
        Ok(self.open(collection)?.records)
    }

    /// Remove a record by id. Removing a missing id succeeds.
    pub fn delete_item(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        let _txn = self.txn.lock();
        let mut stored = self.open(collection)?;
        let before = stored.records.len();
        stored.records.retain(|r| r.id != id);
        if stored.records.len() == before {
            return Ok(());
        }
        self.commit(collection, stored.records)
    }

    /// Remove every record in the collection.
    pub fn clear_store(&self, collection: Collection) -> Result<(), StoreError> {
        let _txn = self.txn.lock();
        self.commit(collection, Vec::new())?;
        log::info!("[Queue] Cleared {}", collection);
        Ok(())
    }

    pub fn count(&self, collection: Collection) -> Result<usize, StoreError> {
        let _txn = self.txn.lock();
        Ok(self.open(collection)?.records.len())
    }
}
