use keystone_types::ObjectHash;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{StoreError, StoreResult};
use crate::object::{ObjectKind, StoredObject, Tree, TreeEntry};

/// Content-addressed object store.
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written. The same bytes always produce the
///   same hash, and storing them twice as the same kind is a no-op. A blob
///   and a tree with identical bytes are kept as two objects.
/// - Reads verify content integrity; a mismatch is reported as
///   [`StoreError::HashMismatch`], never returned as data.
/// - Concurrent reads are always safe.
/// - There is no delete. History relies on every object remaining readable.
pub trait ObjectStore: Send + Sync {
    /// Store an object and return its content hash.
    ///
    /// If an object with the same hash and kind already exists, nothing is
    /// written.
    fn store(&self, object: &StoredObject) -> StoreResult<ObjectHash>;

    /// Read an object by hash. Returns `Ok(None)` if it does not exist.
    fn read(&self, hash: &ObjectHash) -> StoreResult<Option<StoredObject>>;

    /// Read the object stored under `hash` as `kind`.
    ///
    /// Identical bytes may be stored as both a blob and a tree under one
    /// hash; this only returns the copy stored as `kind`.
    fn read_as(&self, hash: &ObjectHash, kind: ObjectKind) -> StoreResult<Option<StoredObject>> {
        Ok(self.read(hash)?.filter(|obj| obj.kind == kind))
    }

    /// Check whether an object exists.
    fn exists(&self, hash: &ObjectHash) -> StoreResult<bool>;

    /// Read an object by hash, failing with [`StoreError::NotFound`] if absent.
    fn get(&self, hash: &ObjectHash) -> StoreResult<StoredObject> {
        self.read(hash)?.ok_or(StoreError::NotFound(*hash))
    }

    /// Like [`read_as`](Self::read_as), failing with
    /// [`StoreError::UnexpectedKind`] when the hash is only stored as the
    /// other kind and [`StoreError::NotFound`] when it is absent.
    fn get_as(&self, hash: &ObjectHash, kind: ObjectKind) -> StoreResult<StoredObject> {
        if let Some(obj) = self.read_as(hash, kind)? {
            return Ok(obj);
        }
        match self.read(hash)? {
            Some(other) => {
                other.expect_kind(kind)?;
                Ok(other)
            }
            None => Err(StoreError::NotFound(*hash)),
        }
    }

    /// Read multiple objects in a batch.
    fn read_batch(&self, hashes: &[ObjectHash]) -> StoreResult<Vec<Option<StoredObject>>> {
        hashes.iter().map(|h| self.read(h)).collect()
    }

    /// Store multiple objects in a batch and return their hashes.
    fn store_batch(&self, objects: &[StoredObject]) -> StoreResult<Vec<ObjectHash>> {
        objects.iter().map(|obj| self.store(obj)).collect()
    }
}

/// Typed helpers layered over any [`ObjectStore`].
pub trait ObjectStoreExt: ObjectStore {
    /// Store raw bytes as a blob.
    fn store_blob(&self, contents: &[u8]) -> StoreResult<StoredObject> {
        let object = StoredObject::blob(contents.to_vec());
        self.store(&object)?;
        Ok(object)
    }

    /// Store the canonical JSON encoding of `value` as a blob.
    fn store_json<T: Serialize + ?Sized>(&self, value: &T) -> StoreResult<StoredObject> {
        let object = StoredObject::json_blob(value)?;
        self.store(&object)?;
        Ok(object)
    }

    /// Store a tree and return the entry a parent tree would use for it.
    fn store_tree(&self, name: &str, tree: &Tree) -> StoreResult<TreeEntry> {
        let object = tree.to_stored_object()?;
        self.store(&object)?;
        Ok(TreeEntry::for_object(name, &object))
    }

    /// Read and decode a tree.
    fn get_tree(&self, hash: &ObjectHash) -> StoreResult<Tree> {
        Tree::from_stored_object(&self.get_as(hash, ObjectKind::Tree)?)
    }

    /// Read a blob and decode its JSON contents.
    fn get_json<T: DeserializeOwned>(&self, hash: &ObjectHash) -> StoreResult<T> {
        let object = self.get_as(hash, ObjectKind::Blob)?;
        serde_json::from_slice(&object.contents).map_err(|e| StoreError::CorruptObject {
            hash: *hash,
            reason: e.to_string(),
        })
    }
}

impl<S: ObjectStore + ?Sized> ObjectStoreExt for S {}
