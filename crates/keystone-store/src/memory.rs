use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use keystone_types::ObjectHash;
use tracing::{debug, trace};

use crate::error::{StoreError, StoreResult};
use crate::metrics::StoreMetrics;
use crate::object::{ObjectKind, StoredObject};
use crate::traits::ObjectStore;

/// In-memory, HashMap-based object store.
///
/// All objects are held behind a `RwLock`, so any number of readers may
/// proceed while a single writer inserts. Objects are keyed by hash and
/// kind, and cloned on read.
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<(ObjectHash, ObjectKind), StoredObject>>,
    metrics: Arc<StoreMetrics>,
}

impl InMemoryObjectStore {
    /// Create a new empty store with its own metrics.
    pub fn new() -> Self {
        Self::with_metrics(Arc::new(StoreMetrics::new()))
    }

    /// Create a new empty store that records into `metrics`.
    pub fn with_metrics(metrics: Arc<StoreMetrics>) -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            metrics,
        }
    }

    /// Shared handle to this store's counters.
    pub fn metrics(&self) -> Arc<StoreMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.objects.read().map_err(|_| StoreError::LockPoisoned)?.len())
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Total bytes across all stored objects.
    pub fn total_bytes(&self) -> StoreResult<u64> {
        let map = self.objects.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(map.values().map(|obj| obj.size).sum())
    }

    /// Sorted, deduplicated list of every stored hash.
    pub fn all_hashes(&self) -> StoreResult<Vec<ObjectHash>> {
        let map = self.objects.read().map_err(|_| StoreError::LockPoisoned)?;
        let mut hashes: Vec<ObjectHash> = map.keys().map(|(hash, _)| *hash).collect();
        hashes.sort();
        hashes.dedup();
        Ok(hashes)
    }

    fn lookup(&self, hash: &ObjectHash, kinds: &[ObjectKind]) -> StoreResult<Option<StoredObject>> {
        let found = {
            let map = self.objects.read().map_err(|_| StoreError::LockPoisoned)?;
            kinds.iter().find_map(|kind| map.get(&(*hash, *kind)).cloned())
        };
        self.metrics.record_read(found.is_some());
        if let Some(obj) = &found {
            obj.verify()?;
        }
        Ok(found)
    }

    #[cfg(test)]
    fn corrupt(&self, hash: &ObjectHash, contents: &[u8]) {
        let mut map = self.objects.write().unwrap();
        for ((h, _), obj) in map.iter_mut() {
            if h == hash {
                obj.contents = contents.to_vec();
            }
        }
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn store(&self, object: &StoredObject) -> StoreResult<ObjectHash> {
        object.verify()?;
        let mut map = self.objects.write().map_err(|_| StoreError::LockPoisoned)?;
        let key = (object.hash, object.kind);
        if map.contains_key(&key) {
            self.metrics.record_dedup();
            trace!(hash = %object.hash, "object already stored");
            return Ok(object.hash);
        }
        map.insert(key, object.clone());
        self.metrics.record_write(object.size);
        debug!(hash = %object.hash, kind = %object.kind, size = object.size, "stored object");
        Ok(object.hash)
    }

    fn read(&self, hash: &ObjectHash) -> StoreResult<Option<StoredObject>> {
        self.lookup(hash, &[ObjectKind::Blob, ObjectKind::Tree])
    }

    fn read_as(&self, hash: &ObjectHash, kind: ObjectKind) -> StoreResult<Option<StoredObject>> {
        self.lookup(hash, &[kind])
    }

    fn exists(&self, hash: &ObjectHash) -> StoreResult<bool> {
        let map = self.objects.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(map.contains_key(&(*hash, ObjectKind::Blob)) || map.contains_key(&(*hash, ObjectKind::Tree)))
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.objects.read().map(|m| m.len()).unwrap_or_default();
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &count)
            .finish()
    }
}
