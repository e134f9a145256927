use keystone_types::{ErrorKind, ObjectHash};

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(ObjectHash),

    /// Content hash mismatch on read (data corruption).
    #[error("hash mismatch for {expected}: computed {computed}")]
    HashMismatch {
        expected: ObjectHash,
        computed: ObjectHash,
    },

    /// The object had an unexpected kind (e.g., expected tree, got blob).
    #[error("unexpected object kind for {hash}: expected {expected}, got {actual}")]
    UnexpectedKind {
        hash: ObjectHash,
        expected: String,
        actual: String,
    },

    /// A tree entry name cannot be encoded.
    #[error("invalid tree entry name {name:?}: {reason}")]
    InvalidEntryName { name: String, reason: String },

    /// The object data is malformed or cannot be decoded.
    #[error("corrupt object {hash}: {reason}")]
    CorruptObject { hash: ObjectHash, reason: String },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The backend's lock was poisoned by a panicking writer.
    #[error("object store lock poisoned")]
    LockPoisoned,
}

impl StoreError {
    /// Map onto the engine-wide error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidEntryName { .. } => ErrorKind::Config,
            Self::HashMismatch { .. }
            | Self::UnexpectedKind { .. }
            | Self::CorruptObject { .. }
            | Self::Serialization(_)
            | Self::LockPoisoned => ErrorKind::Io,
        }
    }
}

impl From<keystone_crypto::CanonicalError> for StoreError {
    fn from(err: keystone_crypto::CanonicalError) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
