//! Storage and authorization interfaces consumed by the branch manager.

use chrono::{DateTime, Utc};
use keystone_types::{BranchId, ObjectHash, RepositoryId};

use crate::error::RefResult;
use crate::types::{Branch, BranchStatus};

/// Storage backend for branch records.
///
/// Implementations must be `Send + Sync` and make each method atomic with
/// respect to the others. Branch names are unique per repository and each
/// repository has at most one default branch.
pub trait BranchRepository: Send + Sync {
    /// Insert a new branch. Fails with `AlreadyExists` if the repository
    /// already has a branch of this name.
    fn create(&self, branch: &Branch) -> RefResult<()>;

    fn get(&self, id: &BranchId) -> RefResult<Option<Branch>>;

    fn get_by_name(&self, repository: &RepositoryId, name: &str) -> RefResult<Option<Branch>>;

    /// All branches of a repository, sorted by name.
    fn list(&self, repository: &RepositoryId) -> RefResult<Vec<Branch>>;

    /// Move HEAD to `new` if and only if it currently equals `expected` and
    /// the branch is active.
    ///
    /// Returns `StaleHead` when HEAD has moved and `InvalidState` when the
    /// branch is no longer active; nothing changes in either case.
    fn compare_and_set_head(
        &self,
        id: &BranchId,
        expected: Option<&ObjectHash>,
        new: ObjectHash,
        at: DateTime<Utc>,
    ) -> RefResult<Branch>;

    fn update_status(
        &self,
        id: &BranchId,
        status: BranchStatus,
        at: DateTime<Utc>,
    ) -> RefResult<Branch>;

    /// Make `id` the repository's only default branch.
    fn set_default(&self, repository: &RepositoryId, id: &BranchId, at: DateTime<Utc>)
        -> RefResult<Branch>;

    /// Remove a branch. Returns `true` if it existed.
    fn delete(&self, id: &BranchId) -> RefResult<bool>;

    /// The checked-out branch of a repository, if any.
    fn current(&self, repository: &RepositoryId) -> RefResult<Option<BranchId>>;

    fn set_current(&self, repository: &RepositoryId, id: &BranchId) -> RefResult<()>;
}

/// Decides whether an actor may merge in a repository.
pub trait PermissionChecker: Send + Sync {
    fn can_merge(&self, repository: &RepositoryId, actor: &str) -> bool;
}

/// Permits every merge.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowAll;

impl PermissionChecker for AllowAll {
    fn can_merge(&self, _repository: &RepositoryId, _actor: &str) -> bool {
        true
    }
}

/// Refuses every merge.
#[derive(Clone, Copy, Debug, Default)]
pub struct DenyAll;

impl PermissionChecker for DenyAll {
    fn can_merge(&self, _repository: &RepositoryId, _actor: &str) -> bool {
        false
    }
}
