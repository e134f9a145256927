use std::fmt;

use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

/// Engine-wide error taxonomy.
///
/// Every crate-level error enum maps onto one of these kinds through a
/// `kind()` method so that callers can branch on the category of failure
/// without matching on each crate's variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An object, branch, version, or commit is absent.
    NotFound,
    /// The operation is not allowed in the current state.
    InvalidState,
    /// A structural check failed.
    ValidationFailure,
    /// A collaborator repository failed.
    Io,
    /// The request itself was malformed.
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::InvalidState => write!(f, "invalid state"),
            Self::ValidationFailure => write!(f, "validation failure"),
            Self::Io => write!(f, "io failure"),
            Self::Config => write!(f, "config error"),
        }
    }
}

impl From<&TypeError> for ErrorKind {
    fn from(_: &TypeError) -> Self {
        ErrorKind::Config
    }
}
