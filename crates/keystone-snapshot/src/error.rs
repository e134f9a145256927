use keystone_facility::FacilityError;
use keystone_store::StoreError;
use keystone_types::{ErrorKind, ObjectHash, RepositoryId};

/// Errors from snapshot capture, storage, and materialization.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("facility lookup failed: {0}")]
    Facility(#[from] FacilityError),

    #[error("object store error: {0}")]
    Store(#[from] StoreError),

    /// No snapshot with this hash was recorded for the repository.
    #[error("snapshot {hash} not found in repository {repository}")]
    NotFound {
        repository: RepositoryId,
        hash: ObjectHash,
    },

    /// A snapshot tree lacks an entry every snapshot must carry.
    #[error("snapshot tree {tree} is missing entry {name:?}")]
    MissingEntry { tree: ObjectHash, name: String },

    #[error("snapshot repository error: {0}")]
    Backend(String),
}

impl SnapshotError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Facility(e) => e.kind(),
            Self::Store(e) => e.kind(),
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::MissingEntry { .. } | Self::Backend(_) => ErrorKind::Io,
        }
    }
}

/// Result alias for snapshot operations.
pub type SnapshotResult<T> = Result<T, SnapshotError>;
