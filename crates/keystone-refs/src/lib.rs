//! Branch management for Keystone.
//!
//! Branches are named, mutable pointers to the latest commit of a history
//! line. Each repository has exactly one default branch and one checked-out
//! branch. HEAD only moves through
//! [`BranchRepository::compare_and_set_head`], which the commit graph calls
//! while holding its own write lock.
//!
//! # Merging
//!
//! Branches are merged only through reviewed proposals.
//! [`BranchManager::authorize_merge`] checks the review approval and the
//! [`PermissionChecker`], and returns an [`AuthorizedMerge`] token that the
//! commit graph requires before it will record a merge commit.
//!
//! # Branch Names
//!
//! Names follow git-style rules; see [`names::validate_branch_name`].

pub mod error;
pub mod manager;
pub mod memory;
pub mod names;
pub mod traits;
pub mod types;

pub use error::{RefError, RefResult};
pub use manager::BranchManager;
pub use memory::InMemoryBranchStore;
pub use traits::{AllowAll, BranchRepository, DenyAll, PermissionChecker};
pub use types::{AuthorizedMerge, Branch, BranchStatus, ReviewApproval};
