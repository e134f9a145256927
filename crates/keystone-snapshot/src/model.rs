use chrono::{DateTime, Utc};
use keystone_crypto::ContentHasher;
use keystone_types::{ObjectHash, RepositoryId};
use serde::{Deserialize, Serialize};

/// Root tree entry holding the building record and its floors.
pub const BUILDING_TREE: &str = "building";
/// Root tree entry holding equipment grouped by type.
pub const EQUIPMENT_TREE: &str = "equipment";
/// Root tree entry holding rooms grouped by floor.
pub const SPATIAL_TREE: &str = "spatial";
/// Root tree entry reserved for attached documents.
pub const FILES_TREE: &str = "files";
/// Root tree entry holding building-automation data.
pub const OPERATIONS_TREE: &str = "operations";

/// Name of the building blob inside the building tree.
pub const BUILDING_BLOB: &str = "building.json";
/// Name of the floors subtree inside the building tree.
pub const FLOORS_TREE: &str = "floors";
/// Name of the points subtree inside the operations tree.
pub const POINTS_TREE: &str = "points";
/// Equipment subtree for items without a type.
pub const UNCLASSIFIED: &str = "unclassified";

/// Counts gathered while capturing a snapshot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    /// Floors plus rooms.
    pub space_count: u64,
    /// Equipment plus automation points.
    pub item_count: u64,
    pub file_count: u64,
    /// Sum of entity blob sizes in bytes.
    pub total_size: u64,
}

/// A full point-in-time capture of one repository's building.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub repository_id: RepositoryId,
    pub hash: ObjectHash,
    pub building_tree: ObjectHash,
    pub equipment_tree: ObjectHash,
    pub spatial_tree: ObjectHash,
    pub files_tree: ObjectHash,
    pub operations_tree: ObjectHash,
    pub root_tree: ObjectHash,
    pub metadata: SnapshotMetadata,
    pub created_at: DateTime<Utc>,
}

impl Snapshot {
    /// Snapshot identity: SHA-256 over the five subtree hashes and the
    /// capture counts. Repository id, root tree and timestamp do not
    /// contribute, so identical state always hashes the same.
    pub fn compute_hash(
        building: &ObjectHash,
        equipment: &ObjectHash,
        spatial: &ObjectHash,
        files: &ObjectHash,
        operations: &ObjectHash,
        metadata: &SnapshotMetadata,
    ) -> ObjectHash {
        let header = format!(
            "building {building}\nequipment {equipment}\nspatial {spatial}\nfiles {files}\n\
             operations {operations}\nspaces {}\nitems {}\nfiles {}\nsize {}\n",
            metadata.space_count, metadata.item_count, metadata.file_count, metadata.total_size,
        );
        ContentHasher::digest(header.as_bytes())
    }

    /// Recompute this snapshot's hash from its fields.
    pub fn recompute_hash(&self) -> ObjectHash {
        Self::compute_hash(
            &self.building_tree,
            &self.equipment_tree,
            &self.spatial_tree,
            &self.files_tree,
            &self.operations_tree,
            &self.metadata,
        )
    }

    pub fn short_hash(&self) -> String {
        self.hash.short_hex()
    }
}
