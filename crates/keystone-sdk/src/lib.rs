//! High-level SDK for Keystone.
//!
//! [`Keystone`] ties the snapshot builder, commit graph, branch manager,
//! diff engine, and rollback service together over one set of
//! [`Backends`]. This is the main entry point for applications embedding
//! building-state version control.
//!
//! ```no_run
//! use std::sync::Arc;
//! use keystone_sdk::{Author, CommitRequest, EngineConfig, InMemoryFacility, Keystone};
//!
//! # fn main() -> keystone_sdk::SdkResult<()> {
//! let facility = Arc::new(InMemoryFacility::new());
//! let ks = Keystone::in_memory(EngineConfig::default(), facility)?;
//! # let repo = keystone_sdk::RepositoryId::new();
//! ks.open_repository(&repo)?;
//! let author = Author::new("Ana", "ana@example.com", "u-1");
//! ks.commit(&repo, CommitRequest::new("Initial survey", author))?;
//! # Ok(())
//! # }
//! ```

pub mod commit;
pub mod config;
pub mod error;
pub mod logging;
pub mod repository;

pub use commit::{CommitRequest, LogEntry};
pub use config::EngineConfig;
pub use error::{SdkError, SdkResult};
pub use logging::init_tracing;
pub use repository::{Backends, Keystone};

// Re-export key types
pub use keystone_diff::{CategoryChanges, DiffResult, ModifiedEntity};
pub use keystone_facility::{BuildingState, Category, EntityRecord, InMemoryFacility};
pub use keystone_ledger::{Author, ChangesSummary, Commit, CommitBinding, ValidationReport, Version, VersionRef};
pub use keystone_refs::{Branch, BranchStatus, ReviewApproval};
pub use keystone_rollback::{CancelFlag, RollbackOptions, RollbackResult};
pub use keystone_snapshot::Snapshot;
pub use keystone_types::{EntityId, ErrorKind, ObjectHash, RepositoryId};
