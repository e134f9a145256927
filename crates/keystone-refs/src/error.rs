//! Error types for branch operations.

use keystone_types::{ErrorKind, ObjectHash};
use thiserror::Error;

/// Errors that can occur during branch operations.
#[derive(Debug, Error)]
pub enum RefError {
    /// The branch was not found.
    #[error("branch not found: {0}")]
    NotFound(String),

    /// A branch with this name already exists in the repository.
    #[error("branch already exists: {name}")]
    AlreadyExists { name: String },

    /// The branch name is invalid.
    #[error("invalid branch name {name:?}: {reason}")]
    InvalidBranchName { name: String, reason: String },

    /// The operation is not allowed in the branch's current state.
    #[error("{0}")]
    InvalidState(String),

    /// HEAD moved since it was read; the update was not applied.
    #[error("stale head on branch {branch}: expected {expected:?}, found {actual:?}")]
    StaleHead {
        branch: String,
        expected: Option<ObjectHash>,
        actual: Option<ObjectHash>,
    },

    /// The branch backend failed.
    #[error("branch backend error: {0}")]
    Backend(String),
}

impl RefError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::AlreadyExists { .. } | Self::InvalidState(_) | Self::StaleHead { .. } => {
                ErrorKind::InvalidState
            }
            Self::InvalidBranchName { .. } => ErrorKind::Config,
            Self::Backend(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn poisoned<E: std::fmt::Display>(e: E) -> Self {
        Self::Backend(format!("lock poisoned: {e}"))
    }
}

/// Convenience type alias for branch operations.
pub type RefResult<T> = std::result::Result<T, RefError>;
