//! Content-addressed object storage for Keystone.
//!
//! Every entity serialization and every snapshot tree is stored as an
//! immutable object keyed by the SHA-256 of its contents. Identical bytes
//! are stored once no matter how many snapshots reference them.
//!
//! # Object Kinds
//!
//! - blobs hold the canonical JSON of one entity
//! - [`Tree`] objects list named children (blobs or subtrees) sorted by name
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait; [`ObjectStoreExt`]
//! adds typed helpers on top of any backend.
//!
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding

pub mod error;
pub mod memory;
pub mod metrics;
pub mod object;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::InMemoryObjectStore;
pub use metrics::{MetricsSnapshot, StoreMetrics};
pub use object::{ObjectKind, StoredObject, Tree, TreeEntry};
pub use traits::{ObjectStore, ObjectStoreExt};
