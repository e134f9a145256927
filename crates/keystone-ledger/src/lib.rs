//! Commit graph for Keystone.
//!
//! Every commit records one captured snapshot on one branch and is
//! identified by the SHA-256 of its canonical header (see
//! [`records::commit_hash`]). Each commit produces exactly one [`Version`],
//! a taggable handle used by diff and rollback.
//!
//! Commits are append-only. Storing a commit, storing its version, and
//! moving the branch HEAD happen in one step through
//! [`LedgerWriter::append_commit`]; a concurrent writer that lost the race
//! gets [`RefError::StaleHead`](keystone_refs::RefError::StaleHead) and
//! nothing is written.
//!
//! Merge commits can only be created from an
//! [`AuthorizedMerge`](keystone_refs::AuthorizedMerge) token.

pub mod error;
pub mod graph;
pub mod memory;
pub mod records;
pub mod traits;
pub mod validation;

pub use error::{LedgerError, LedgerResult};
pub use graph::{CommitGraph, NewCommit, MIN_PREFIX_LEN};
pub use memory::InMemoryLedger;
pub use records::{
    commit_hash, Author, ChangeCounts, ChangesSummary, Commit, CommitBinding, Version,
    VersionMetadata, VersionRef, VersionSource,
};
pub use traits::{Ledger, LedgerReader, LedgerWriter};
pub use validation::{verify_graph, GraphValidator, ValidationReport, Violation, ViolationKind};
