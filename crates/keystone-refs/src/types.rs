//! Branch records and review-approval types.

use std::fmt;

use chrono::{DateTime, Utc};
use keystone_types::{BranchId, ObjectHash, RepositoryId};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a branch. Only active branches accept commits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchStatus {
    Active,
    Merged,
    Closed,
}

impl fmt::Display for BranchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Merged => write!(f, "merged"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// A named, mutable pointer to the latest commit of a history line.
///
/// `head_commit` is the full commit hash; `None` until the first commit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub id: BranchId,
    pub repository_id: RepositoryId,
    pub name: String,
    pub head_commit: Option<ObjectHash>,
    pub status: BranchStatus,
    pub is_default: bool,
    pub created_from: Option<BranchId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Branch {
    pub fn is_active(&self) -> bool {
        self.status == BranchStatus::Active
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.head_commit {
            Some(head) => write!(f, "{} -> {}", self.name, head.short_hex()),
            None => write!(f, "{} (no commits)", self.name),
        }
    }
}

/// Evidence that a pull request merging `source` into `target` was approved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewApproval {
    pub review_id: String,
    /// Identifier of the approving actor, checked against the permission
    /// checker.
    pub approver: String,
    pub source_branch: String,
    pub target_branch: String,
}

/// A merge that passed review and permission checks.
///
/// Only [`BranchManager::authorize_merge`](crate::BranchManager::authorize_merge)
/// can construct one, so holding an `AuthorizedMerge` proves the merge went
/// through the review workflow.
#[derive(Clone, Debug)]
pub struct AuthorizedMerge {
    source: Branch,
    target: Branch,
    approval: ReviewApproval,
}

impl AuthorizedMerge {
    pub(crate) fn new(source: Branch, target: Branch, approval: ReviewApproval) -> Self {
        Self {
            source,
            target,
            approval,
        }
    }

    /// The branch being merged, as read at authorization time.
    pub fn source(&self) -> &Branch {
        &self.source
    }

    /// The branch receiving the merge, as read at authorization time.
    pub fn target(&self) -> &Branch {
        &self.target
    }

    pub fn approval(&self) -> &ReviewApproval {
        &self.approval
    }
}
