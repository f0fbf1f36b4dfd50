use std::collections::BTreeMap;
use std::sync::Arc;

use spin::RwLock;

use super::record::Collection;
use super::store::StoreBackend;
use crate::error::StoreError;

/// In-memory backend. Clones share the same storage, so a page-side and a
/// worker-side queue built from one backend see each other's writes.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    collections: Arc<RwLock<BTreeMap<Collection, Vec<u8>>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StoreBackend for MemoryBackend {
    fn load(&self, collection: Collection) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.collections.read().get(&collection).cloned())
    }

    fn save(&self, collection: Collection, bytes: &[u8]) -> Result<(), StoreError> {
        self.collections.write().insert(collection, bytes.to_vec());
        Ok(())
    }
}
