use keystone_types::ObjectHash;
use sha2::{Digest, Sha256};

use crate::canonical::{canonical_json, CanonicalError};

/// SHA-256 content hasher.
///
/// Stateless; all methods are associated functions. `digest_parts` hashes a
/// sequence of byte slices as if they were concatenated, which is how tree
/// listings, snapshots, and commit headers are hashed without first building
/// one large buffer.
pub struct ContentHasher;

impl ContentHasher {
    /// SHA-256 of `data`.
    pub fn digest(data: &[u8]) -> ObjectHash {
        let bytes: [u8; 32] = Sha256::digest(data).into();
        ObjectHash::from_digest(bytes)
    }

    /// SHA-256 over the concatenation of `parts`.
    pub fn digest_parts<I, P>(parts: I) -> ObjectHash
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[u8]>,
    {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part.as_ref());
        }
        let bytes: [u8; 32] = hasher.finalize().into();
        ObjectHash::from_digest(bytes)
    }

    /// SHA-256 over the canonical JSON encoding of `value`.
    pub fn hash_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<ObjectHash, CanonicalError> {
        let data = canonical_json(value)?;
        Ok(Self::digest(&data))
    }

    /// Verify that `data` produces the `expected` hash.
    pub fn verify(data: &[u8], expected: &ObjectHash) -> bool {
        Self::digest(data) == *expected
    }
}
