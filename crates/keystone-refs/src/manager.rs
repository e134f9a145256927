use std::sync::Arc;

use keystone_types::{BranchId, Clock, RepositoryId};
use tracing::info;

use crate::error::{RefError, RefResult};
use crate::names::validate_branch_name;
use crate::traits::{BranchRepository, PermissionChecker};
use crate::types::{AuthorizedMerge, Branch, BranchStatus, ReviewApproval};

/// Branch lifecycle operations for building repositories.
///
/// Checkout only moves the per-repository current-branch pointer; it never
/// touches live facility state.
pub struct BranchManager {
    branches: Arc<dyn BranchRepository>,
    permissions: Arc<dyn PermissionChecker>,
    clock: Arc<dyn Clock>,
}

impl BranchManager {
    pub fn new(
        branches: Arc<dyn BranchRepository>,
        permissions: Arc<dyn PermissionChecker>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            branches,
            permissions,
            clock,
        }
    }

    /// The underlying branch repository.
    pub fn repository(&self) -> &Arc<dyn BranchRepository> {
        &self.branches
    }

    /// Create the default branch of a new repository and check it out.
    pub fn init_repository(&self, repository: &RepositoryId, default_name: &str) -> RefResult<Branch> {
        let branch = self.new_branch(repository, default_name, None, true)?;
        self.branches.set_current(repository, &branch.id)?;
        info!(repository = %repository, branch = %branch.name, "initialized default branch");
        Ok(branch)
    }

    /// Create a branch from the checked-out branch.
    pub fn create_branch(&self, repository: &RepositoryId, name: &str) -> RefResult<Branch> {
        let from = self.current_branch(repository)?;
        self.branch_off(repository, name, &from)
    }

    /// Create a branch from a named branch.
    pub fn create_branch_from(
        &self,
        repository: &RepositoryId,
        name: &str,
        from: &str,
    ) -> RefResult<Branch> {
        let from = self.get_branch(repository, from)?;
        self.branch_off(repository, name, &from)
    }

    fn branch_off(&self, repository: &RepositoryId, name: &str, from: &Branch) -> RefResult<Branch> {
        let branch = self.new_branch(repository, name, Some(from), false)?;
        info!(
            repository = %repository,
            branch = %branch.name,
            from = %from.name,
            "created branch"
        );
        Ok(branch)
    }

    fn new_branch(
        &self,
        repository: &RepositoryId,
        name: &str,
        from: Option<&Branch>,
        is_default: bool,
    ) -> RefResult<Branch> {
        validate_branch_name(name)?;
        let now = self.clock.now();
        let branch = Branch {
            id: BranchId::new(),
            repository_id: *repository,
            name: name.to_string(),
            head_commit: from.and_then(|b| b.head_commit),
            status: BranchStatus::Active,
            is_default,
            created_from: from.map(|b| b.id),
            created_at: now,
            updated_at: now,
        };
        self.branches.create(&branch)?;
        Ok(branch)
    }

    /// Look up a branch by name.
    pub fn get_branch(&self, repository: &RepositoryId, name: &str) -> RefResult<Branch> {
        self.branches
            .get_by_name(repository, name)?
            .ok_or_else(|| RefError::NotFound(name.to_string()))
    }

    /// Look up a branch by id.
    pub fn get_branch_by_id(&self, id: &BranchId) -> RefResult<Branch> {
        self.branches
            .get(id)?
            .ok_or_else(|| RefError::NotFound(id.to_string()))
    }

    /// The checked-out branch.
    pub fn current_branch(&self, repository: &RepositoryId) -> RefResult<Branch> {
        let id = self.branches.current(repository)?.ok_or_else(|| {
            RefError::InvalidState(format!("repository {repository} has no checked-out branch"))
        })?;
        self.get_branch_by_id(&id)
    }

    /// Switch the repository's working context to `name`.
    pub fn checkout_branch(&self, repository: &RepositoryId, name: &str) -> RefResult<Branch> {
        let branch = self.get_branch(repository, name)?;
        self.branches.set_current(repository, &branch.id)?;
        info!(repository = %repository, branch = %branch.name, "checked out branch");
        Ok(branch)
    }

    /// All branches, sorted by name.
    pub fn list_branches(&self, repository: &RepositoryId) -> RefResult<Vec<Branch>> {
        self.branches.list(repository)
    }

    /// Delete a branch. The default and the checked-out branch cannot be
    /// deleted.
    pub fn delete_branch(&self, repository: &RepositoryId, name: &str) -> RefResult<()> {
        let branch = self.get_branch(repository, name)?;
        if branch.is_default {
            return Err(RefError::InvalidState(format!(
                "cannot delete the default branch {name}"
            )));
        }
        if self.branches.current(repository)? == Some(branch.id) {
            return Err(RefError::InvalidState(format!(
                "cannot delete the checked-out branch {name}"
            )));
        }
        self.branches.delete(&branch.id)?;
        info!(repository = %repository, branch = %name, "deleted branch");
        Ok(())
    }

    /// Close a branch so it no longer accepts commits.
    pub fn close_branch(&self, repository: &RepositoryId, name: &str) -> RefResult<Branch> {
        let branch = self.get_branch(repository, name)?;
        if branch.is_default {
            return Err(RefError::InvalidState(format!(
                "cannot close the default branch {name}"
            )));
        }
        let closed = self
            .branches
            .update_status(&branch.id, BranchStatus::Closed, self.clock.now())?;
        info!(repository = %repository, branch = %name, "closed branch");
        Ok(closed)
    }

    /// Make `name` the repository's default branch.
    pub fn set_default_branch(&self, repository: &RepositoryId, name: &str) -> RefResult<Branch> {
        let branch = self.get_branch(repository, name)?;
        if !branch.is_active() {
            return Err(RefError::InvalidState(format!(
                "cannot make {} branch {name} the default",
                branch.status
            )));
        }
        let updated = self
            .branches
            .set_default(repository, &branch.id, self.clock.now())?;
        info!(repository = %repository, branch = %name, "set default branch");
        Ok(updated)
    }

    /// Check that merging `source` into `target` went through review.
    ///
    /// Without an approval the merge is refused. With one, the approving
    /// actor must pass the permission checker and the approval must name
    /// this exact source and target. The returned token is what the commit
    /// graph requires to record a merge commit.
    pub fn authorize_merge(
        &self,
        repository: &RepositoryId,
        source: &str,
        target: &str,
        approval: Option<ReviewApproval>,
    ) -> RefResult<AuthorizedMerge> {
        let approval = approval.ok_or_else(|| {
            RefError::InvalidState("merge attempted outside review workflow".into())
        })?;
        if !self.permissions.can_merge(repository, &approval.approver) {
            return Err(RefError::InvalidState(format!(
                "{} is not permitted to merge in repository {repository}",
                approval.approver
            )));
        }
        if approval.source_branch != source || approval.target_branch != target {
            return Err(RefError::InvalidState(format!(
                "review {} approves {} -> {}, not {source} -> {target}",
                approval.review_id, approval.source_branch, approval.target_branch
            )));
        }
        if source == target {
            return Err(RefError::InvalidState("cannot merge a branch into itself".into()));
        }

        let source = self.get_branch(repository, source)?;
        let target = self.get_branch(repository, target)?;
        for branch in [&source, &target] {
            if !branch.is_active() {
                return Err(RefError::InvalidState(format!(
                    "cannot merge {} branch {}",
                    branch.status, branch.name
                )));
            }
            if branch.head_commit.is_none() {
                return Err(RefError::InvalidState(format!(
                    "branch {} has no commits",
                    branch.name
                )));
            }
        }
        Ok(AuthorizedMerge::new(source, target, approval))
    }

    /// Mark the source of a completed merge as merged.
    pub fn mark_merged(&self, merge: AuthorizedMerge) -> RefResult<Branch> {
        let merged = self.branches.update_status(
            &merge.source().id,
            BranchStatus::Merged,
            self.clock.now(),
        )?;
        info!(
            branch = %merged.name,
            into = %merge.target().name,
            review = %merge.approval().review_id,
            "branch merged"
        );
        Ok(merged)
    }
}
