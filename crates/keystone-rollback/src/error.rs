use keystone_diff::DiffError;
use keystone_facility::FacilityError;
use keystone_ledger::LedgerError;
use keystone_refs::RefError;
use keystone_snapshot::SnapshotError;
use keystone_types::ErrorKind;

/// Errors that stop a rollback.
///
/// Writes issued before the error stay applied; running the rollback again
/// converges on the target state.
#[derive(Debug, thiserror::Error)]
pub enum RollbackError {
    #[error(transparent)]
    Diff(#[from] DiffError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Ref(#[from] RefError),

    #[error("facility write failed: {0}")]
    Facility(#[from] FacilityError),

    #[error("repository has no checked-out branch")]
    NoCurrentBranch,

    /// Raised by [`ValidationResult::into_result`](crate::ValidationResult::into_result).
    #[error("restored state failed validation: {}", .0.join("; "))]
    Validation(Vec<String>),
}

impl RollbackError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Diff(e) => e.kind(),
            Self::Snapshot(e) => e.kind(),
            Self::Ledger(e) => e.kind(),
            Self::Ref(e) => e.kind(),
            Self::Facility(e) => e.kind(),
            Self::NoCurrentBranch => ErrorKind::InvalidState,
            Self::Validation(_) => ErrorKind::ValidationFailure,
        }
    }
}
