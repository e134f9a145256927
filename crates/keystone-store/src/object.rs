use std::fmt;

use keystone_crypto::ContentHasher;
use keystone_types::ObjectHash;
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// The kind of object stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// A serialized entity.
    Blob,
    /// A name-ordered listing of blobs and subtrees.
    Tree,
}

impl ObjectKind {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "blob" => Some(Self::Blob),
            "tree" => Some(Self::Tree),
            _ => None,
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored object: kind tag, content hash, size, and raw contents.
///
/// `StoredObject` is the unit of storage. Its `hash` is always the SHA-256
/// of `contents`; constructors compute it and [`verify`](Self::verify)
/// re-checks it. For blobs the contents are the canonical serialization of
/// an entity; for trees they are the canonical entry listing produced by
/// [`Tree::encode`], so the tree hash is a function of its sorted entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    pub kind: ObjectKind,
    pub hash: ObjectHash,
    pub size: u64,
    pub contents: Vec<u8>,
}

impl StoredObject {
    /// Create a stored object, computing its hash and size.
    pub fn new(kind: ObjectKind, contents: Vec<u8>) -> Self {
        let hash = ContentHasher::digest(&contents);
        let size = contents.len() as u64;
        Self {
            kind,
            hash,
            size,
            contents,
        }
    }

    /// A blob over raw bytes.
    pub fn blob(contents: Vec<u8>) -> Self {
        Self::new(ObjectKind::Blob, contents)
    }

    /// A blob holding the canonical JSON encoding of `value`.
    pub fn json_blob<T: Serialize + ?Sized>(value: &T) -> StoreResult<Self> {
        Ok(Self::blob(keystone_crypto::canonical_json(value)?))
    }

    /// Recompute the content hash and compare it with the recorded one.
    pub fn verify(&self) -> StoreResult<()> {
        let computed = ContentHasher::digest(&self.contents);
        if computed != self.hash {
            return Err(StoreError::HashMismatch {
                expected: self.hash,
                computed,
            });
        }
        Ok(())
    }

    /// Ensure this object has the expected kind.
    pub fn expect_kind(&self, expected: ObjectKind) -> StoreResult<()> {
        if self.kind != expected {
            return Err(StoreError::UnexpectedKind {
                hash: self.hash,
                expected: expected.to_string(),
                actual: self.kind.to_string(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// A single entry in a tree object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub kind: ObjectKind,
    pub name: String,
    pub hash: ObjectHash,
    /// Size of the referenced object's contents in bytes.
    pub size: u64,
}

impl TreeEntry {
    /// Create a new tree entry.
    pub fn new(kind: ObjectKind, name: impl Into<String>, hash: ObjectHash, size: u64) -> Self {
        Self {
            kind,
            name: name.into(),
            hash,
            size,
        }
    }

    /// An entry referencing a stored object.
    pub fn for_object(name: impl Into<String>, object: &StoredObject) -> Self {
        Self::new(object.kind, name, object.hash, object.size)
    }

    fn validate_name(&self) -> StoreResult<()> {
        let reason = if self.name.is_empty() {
            Some("name must not be empty")
        } else if self.name.contains(['\t', '\n']) {
            Some("name must not contain tabs or newlines")
        } else {
            None
        };
        match reason {
            Some(reason) => Err(StoreError::InvalidEntryName {
                name: self.name.clone(),
                reason: reason.into(),
            }),
            None => Ok(()),
        }
    }
}

impl PartialOrd for TreeEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TreeEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.name.cmp(&other.name)
    }
}

/// Hierarchical listing object, ordered by entry name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tree {
    /// Sorted entries in this tree.
    pub entries: Vec<TreeEntry>,
}

impl Tree {
    /// Create a new tree with the given entries.
    ///
    /// Entries are sorted by name for deterministic hashing.
    pub fn new(mut entries: Vec<TreeEntry>) -> Self {
        entries.sort();
        Self { entries }
    }

    /// Create an empty tree.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Canonical listing: one `kind \t name \t hash \t size \n` line per
    /// sorted entry. The tree's hash is the SHA-256 of these bytes.
    pub fn encode(&self) -> StoreResult<Vec<u8>> {
        let mut out = Vec::new();
        let mut previous: Option<&str> = None;
        for entry in &self.entries {
            entry.validate_name()?;
            if previous == Some(entry.name.as_str()) {
                return Err(StoreError::InvalidEntryName {
                    name: entry.name.clone(),
                    reason: "duplicate entry name".into(),
                });
            }
            previous = Some(entry.name.as_str());
            out.extend_from_slice(
                format!(
                    "{}\t{}\t{}\t{}\n",
                    entry.kind, entry.name, entry.hash, entry.size
                )
                .as_bytes(),
            );
        }
        Ok(out)
    }

    /// Convert into a `StoredObject` for storage.
    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        Ok(StoredObject::new(ObjectKind::Tree, self.encode()?))
    }

    /// Decode from a `StoredObject`.
    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        obj.expect_kind(ObjectKind::Tree)?;
        let corrupt = |reason: String| StoreError::CorruptObject {
            hash: obj.hash,
            reason,
        };
        let text = std::str::from_utf8(&obj.contents).map_err(|e| corrupt(e.to_string()))?;

        let mut entries = Vec::new();
        for line in text.lines() {
            let mut fields = line.splitn(4, '\t');
            let (Some(kind), Some(name), Some(hash), Some(size)) =
                (fields.next(), fields.next(), fields.next(), fields.next())
            else {
                return Err(corrupt(format!("malformed entry line {line:?}")));
            };
            let kind = ObjectKind::parse(kind)
                .ok_or_else(|| corrupt(format!("unknown entry kind {kind:?}")))?;
            let hash = ObjectHash::from_hex(hash).map_err(|e| corrupt(e.to_string()))?;
            let size = size
                .parse::<u64>()
                .map_err(|e| corrupt(format!("bad entry size: {e}")))?;
            entries.push(TreeEntry::new(kind, name, hash, size));
        }
        Ok(Self::new(entries))
    }

    /// Content hash this tree will be stored under.
    pub fn compute_hash(&self) -> StoreResult<ObjectHash> {
        Ok(ContentHasher::digest(&self.encode()?))
    }

    /// Look up an entry by name.
    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries
            .binary_search_by(|e| e.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.entries[i])
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the tree has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of the sizes of all entries.
    pub fn total_size(&self) -> u64 {
        self.entries.iter().map(|e| e.size).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hash(byte: u8) -> ObjectHash {
        ObjectHash::from_digest([byte; 32])
    }

    #[test]
    fn blob_hash_is_sha256_of_contents() {
        let obj = StoredObject::blob(b"abc".to_vec());
        assert_eq!(
            obj.hash.to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(obj.size, 3);
    }

    #[test]
    fn verify_detects_tampering() {
        let mut obj = StoredObject::blob(b"original".to_vec());
        assert!(obj.verify().is_ok());
        obj.contents = b"tampered".to_vec();
        assert!(matches!(obj.verify(), Err(StoreError::HashMismatch { .. })));
    }

    #[test]
    fn tree_entries_sorted() {
        let tree = Tree::new(vec![
            TreeEntry::new(ObjectKind::Blob, "zebra", hash(1), 1),
            TreeEntry::new(ObjectKind::Blob, "alpha", hash(2), 2),
            TreeEntry::new(ObjectKind::Tree, "middle", hash(3), 3),
        ]);
        let names: Vec<_> = tree.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["alpha", "middle", "zebra"]);
    }

    #[test]
    fn tree_hash_ignores_insertion_order() {
        let a = Tree::new(vec![
            TreeEntry::new(ObjectKind::Blob, "a", hash(1), 10),
            TreeEntry::new(ObjectKind::Blob, "b", hash(2), 20),
        ]);
        let b = Tree::new(vec![
            TreeEntry::new(ObjectKind::Blob, "b", hash(2), 20),
            TreeEntry::new(ObjectKind::Blob, "a", hash(1), 10),
        ]);
        assert_eq!(a.compute_hash().unwrap(), b.compute_hash().unwrap());
    }

    #[test]
    fn tree_hash_covers_every_entry_field() {
        let base = Tree::new(vec![TreeEntry::new(ObjectKind::Blob, "a", hash(1), 10)]);
        let renamed = Tree::new(vec![TreeEntry::new(ObjectKind::Blob, "b", hash(1), 10)]);
        let resized = Tree::new(vec![TreeEntry::new(ObjectKind::Blob, "a", hash(1), 11)]);
        let rekinded = Tree::new(vec![TreeEntry::new(ObjectKind::Tree, "a", hash(1), 10)]);
        let h = base.compute_hash().unwrap();
        assert_ne!(h, renamed.compute_hash().unwrap());
        assert_ne!(h, resized.compute_hash().unwrap());
        assert_ne!(h, rekinded.compute_hash().unwrap());
    }

    #[test]
    fn tree_decodes_what_it_encodes() {
        let tree = Tree::new(vec![
            TreeEntry::new(ObjectKind::Blob, "Air Handler 1.json", hash(7), 120),
            TreeEntry::new(ObjectKind::Tree, "floors", hash(8), 64),
        ]);
        let stored = tree.to_stored_object().unwrap();
        assert_eq!(stored.hash, tree.compute_hash().unwrap());
        assert_eq!(Tree::from_stored_object(&stored).unwrap(), tree);
    }

    #[test]
    fn tree_rejects_bad_names() {
        let tabbed = Tree::new(vec![TreeEntry::new(ObjectKind::Blob, "a\tb", hash(1), 1)]);
        assert!(matches!(
            tabbed.encode(),
            Err(StoreError::InvalidEntryName { .. })
        ));
        let dup = Tree::new(vec![
            TreeEntry::new(ObjectKind::Blob, "same", hash(1), 1),
            TreeEntry::new(ObjectKind::Blob, "same", hash(2), 1),
        ]);
        assert!(dup.encode().is_err());
    }

    #[test]
    fn decoding_blob_as_tree_fails() {
        let blob = StoredObject::blob(b"not a tree".to_vec());
        assert!(matches!(
            Tree::from_stored_object(&blob),
            Err(StoreError::UnexpectedKind { .. })
        ));
    }

    #[test]
    fn tree_get_entry() {
        let tree = Tree::new(vec![
            TreeEntry::new(ObjectKind::Blob, "a", hash(1), 1),
            TreeEntry::new(ObjectKind::Blob, "b", hash(2), 2),
        ]);
        assert_eq!(tree.get("b").map(|e| e.hash), Some(hash(2)));
        assert!(tree.get("missing").is_none());
        assert_eq!(tree.total_size(), 3);
    }

    #[test]
    fn empty_tree_has_stable_hash() {
        let empty = Tree::empty();
        assert!(empty.is_empty());
        assert_eq!(
            empty.compute_hash().unwrap(),
            ContentHasher::digest(b"")
        );
    }
}
