use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation shared between a caller and a running restore.
///
/// The restore checks the flag before each write.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// How a rollback runs.
#[derive(Clone, Debug)]
pub struct RollbackOptions {
    /// Record the restored state as a new commit on the current branch.
    pub create_version: bool,
    /// Commit message; defaults to `Rollback to <tag>`.
    pub message: Option<String>,
    pub validate_after: bool,
    /// Compute the change set without writing anything.
    pub dry_run: bool,
    pub cancel: CancelFlag,
}

impl Default for RollbackOptions {
    fn default() -> Self {
        Self {
            create_version: true,
            message: None,
            validate_after: true,
            dry_run: false,
            cancel: CancelFlag::new(),
        }
    }
}

impl RollbackOptions {
    pub fn dry_run() -> Self {
        Self {
            dry_run: true,
            ..Self::default()
        }
    }
}
