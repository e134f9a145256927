//! Diff engine for Keystone.
//!
//! Compares two versions of a building entity by entity. Entities are
//! matched by their stable id within each category (buildings, floors,
//! rooms, equipment, automation points) and reported as added, removed, or
//! modified. Modified entries list the top-level fields that changed.
//!
//! Diffing B against A yields the [`DiffResult::inverse`] of diffing A
//! against B.
//!
//! # Key Types
//!
//! - [`DiffEngine`] -- resolves versions to snapshots and diffs them
//! - [`DiffResult`] / [`CategoryChanges`] / [`ModifiedEntity`] -- the change set
//! - [`diff_states`] -- diff two in-memory [`BuildingState`](keystone_facility::BuildingState)s

pub mod changes;
pub mod engine;
pub mod error;
pub mod state_diff;

pub use changes::{CategoryChanges, DiffResult, ModifiedEntity};
pub use engine::DiffEngine;
pub use error::DiffError;
pub use state_diff::{changed_fields, diff_records, diff_states};
