use keystone_ledger::LedgerError;
use keystone_snapshot::SnapshotError;
use keystone_types::{ErrorKind, ObjectHash};

/// Errors that can occur while computing a diff.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    /// A version points at a snapshot that was never recorded.
    #[error("version {version} references missing snapshot {snapshot}")]
    SnapshotMissing { version: String, snapshot: ObjectHash },

    /// An entity could not be encoded for field comparison.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DiffError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Ledger(e) => e.kind(),
            Self::Snapshot(e) => e.kind(),
            Self::SnapshotMissing { .. } => ErrorKind::NotFound,
            Self::Serialization(_) => ErrorKind::Io,
        }
    }
}
