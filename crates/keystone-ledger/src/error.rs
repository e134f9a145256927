use keystone_refs::RefError;
use keystone_types::{ErrorKind, ObjectHash};

/// Errors produced by commit graph operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("commit not found: {0}")]
    CommitNotFound(String),

    #[error("version not found: {0}")]
    VersionNotFound(String),

    #[error("commit {0} already exists")]
    DuplicateCommit(ObjectHash),

    /// A parent hash does not resolve to a stored commit.
    #[error("commit {commit} references missing parent {parent}")]
    DanglingParent {
        commit: ObjectHash,
        parent: ObjectHash,
    },

    #[error("version tag {tag:?} already exists")]
    DuplicateTag { tag: String },

    #[error("short hash {prefix:?} matches {count} commits")]
    AmbiguousPrefix { prefix: String, count: usize },

    /// The request was malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The operation is not allowed in the current state.
    #[error("{0}")]
    InvalidState(String),

    /// Stored records contradict each other.
    #[error("integrity violation: {0}")]
    Integrity(String),

    #[error(transparent)]
    Ref(#[from] RefError),

    #[error("ledger backend error: {0}")]
    Backend(String),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CommitNotFound(_) | Self::VersionNotFound(_) => ErrorKind::NotFound,
            Self::DuplicateCommit(_) | Self::DuplicateTag { .. } | Self::InvalidState(_) => {
                ErrorKind::InvalidState
            }
            Self::DanglingParent { .. } | Self::Integrity(_) => ErrorKind::ValidationFailure,
            Self::AmbiguousPrefix { .. } | Self::InvalidRequest(_) => ErrorKind::Config,
            Self::Ref(e) => e.kind(),
            Self::Backend(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn poisoned<E: std::fmt::Display>(e: E) -> Self {
        Self::Backend(format!("ledger lock poisoned: {e}"))
    }
}

/// Result alias for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
