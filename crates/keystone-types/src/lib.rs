//! Foundation types for Keystone.
//!
//! This crate provides the identity, hashing, and temporal types shared by
//! every other Keystone crate.
//!
//! # Key Types
//!
//! - [`ObjectHash`] -- SHA-256 content hash (objects, trees, snapshots, commits)
//! - [`RepositoryId`], [`BranchId`], [`CommitId`], [`VersionId`] -- UUID v7 identifiers
//! - [`EntityId`] -- stable identifier of a facility entity (building, floor, ...)
//! - [`Clock`] -- injectable wall clock
//! - [`ErrorKind`] -- the engine-wide error taxonomy

pub mod clock;
pub mod error;
pub mod hash;
pub mod ids;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ErrorKind, TypeError};
pub use hash::{ObjectHash, SHORT_HASH_LEN};
pub use ids::{BranchId, CommitId, EntityId, RepositoryId, VersionId};
