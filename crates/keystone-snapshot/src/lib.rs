//! Snapshot capture for Keystone.
//!
//! A snapshot is the full state of one building repository at a point in
//! time, stored as five subtrees under a root tree:
//!
//! ```text
//! root
//! ├── building/    building.json, floors/<floor>.json
//! ├── equipment/   <type>/<equipment>.json
//! ├── files/       (empty)
//! ├── operations/  points/<point>.json
//! └── spatial/     <floor>/<room>.json
//! ```
//!
//! The snapshot hash covers the five subtree hashes and the capture counts,
//! so capturing unchanged state twice yields the same snapshot.

pub mod builder;
pub mod error;
pub mod materialize;
pub mod model;
pub mod repository;

pub use builder::{blob_name, entry_name, SnapshotBuilder};
pub use error::{SnapshotError, SnapshotResult};
pub use materialize::{category_hash, load_category, materialize};
pub use model::{Snapshot, SnapshotMetadata};
pub use repository::{InMemorySnapshotRepository, SnapshotRepository};
