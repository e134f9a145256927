use keystone_diff::DiffError;
use keystone_facility::FacilityError;
use keystone_ledger::LedgerError;
use keystone_refs::RefError;
use keystone_rollback::RollbackError;
use keystone_snapshot::SnapshotError;
use keystone_store::StoreError;
use keystone_types::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Facility(#[from] FacilityError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Ref(#[from] RefError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Diff(#[from] DiffError),

    #[error(transparent)]
    Rollback(#[from] RollbackError),
}

impl SdkError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::Io(_) => ErrorKind::Io,
            Self::Facility(e) => e.kind(),
            Self::Store(e) => e.kind(),
            Self::Snapshot(e) => e.kind(),
            Self::Ref(e) => e.kind(),
            Self::Ledger(e) => e.kind(),
            Self::Diff(e) => e.kind(),
            Self::Rollback(e) => e.kind(),
        }
    }
}

pub type SdkResult<T> = Result<T, SdkError>;
