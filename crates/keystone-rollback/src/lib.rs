//! Rollback service for Keystone.
//!
//! Restores a building's live state to the snapshot of a recorded version
//! and, by default, records the result as a new forward commit. History is
//! never rewritten.
//!
//! The restore diffs the live state against the target and writes only
//! what differs: upserts parent before child (buildings, floors, rooms,
//! equipment, points), then deletes child before parent. Writes are not
//! transactional across entity types; a failure stops the restore with the
//! earlier writes in place, and running it again converges.
//!
//! # Key Types
//!
//! - [`RollbackService`] -- runs a rollback
//! - [`RollbackOptions`] / [`CancelFlag`] -- dry run, validation, versioning, cancellation
//! - [`RollbackResult`] / [`RestoredCounts`] / [`ValidationResult`] -- the outcome

pub mod error;
pub mod options;
pub mod service;
pub mod validate;

pub use error::RollbackError;
pub use options::{CancelFlag, RollbackOptions};
pub use service::{RestoredCounts, RollbackResult, RollbackService};
pub use validate::{validate_state, ValidationResult};
