use std::collections::BTreeMap;
use std::sync::Arc;

use keystone_facility::{Entity, FacilityReader};
use keystone_store::{ObjectStore, ObjectStoreExt, Tree, TreeEntry};
use keystone_types::{Clock, RepositoryId};
use tracing::{debug, info};

use crate::error::SnapshotResult;
use crate::model::{
    Snapshot, SnapshotMetadata, BUILDING_BLOB, BUILDING_TREE, EQUIPMENT_TREE, FILES_TREE,
    FLOORS_TREE, OPERATIONS_TREE, POINTS_TREE, SPATIAL_TREE, UNCLASSIFIED,
};
use crate::repository::SnapshotRepository;

/// Name of an entity's blob inside its tree.
pub fn blob_name(id: &keystone_types::EntityId) -> String {
    format!("{id}.json")
}

/// Tree entry name for a free-form group key such as an equipment type.
///
/// `%`, tabs, and line breaks are percent-encoded, so distinct keys always
/// give distinct, valid names.
pub fn entry_name(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for c in key.chars() {
        match c {
            '%' => out.push_str("%25"),
            '\t' => out.push_str("%09"),
            '\n' => out.push_str("%0A"),
            '\r' => out.push_str("%0D"),
            c => out.push(c),
        }
    }
    out
}

/// Captures live facility state into snapshot trees.
pub struct SnapshotBuilder {
    facility: Arc<dyn FacilityReader>,
    store: Arc<dyn ObjectStore>,
    snapshots: Arc<dyn SnapshotRepository>,
    clock: Arc<dyn Clock>,
}

impl SnapshotBuilder {
    pub fn new(
        facility: Arc<dyn FacilityReader>,
        store: Arc<dyn ObjectStore>,
        snapshots: Arc<dyn SnapshotRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            facility,
            store,
            snapshots,
            clock,
        }
    }

    /// Capture the repository's building into the object store and record a
    /// snapshot.
    ///
    /// Every facility read happens before the snapshot record is written, so
    /// a lookup failure never leaves a record behind. Objects stored before
    /// the failure stay in the store unreferenced.
    pub fn capture_snapshot(&self, repository_id: &RepositoryId) -> SnapshotResult<Snapshot> {
        let repo = self.facility.repository(repository_id)?;
        let building_id = &repo.building_id;
        let building = self.facility.building(building_id)?;
        let floors = self.facility.floors(building_id)?;
        let rooms = self.facility.rooms(building_id)?;
        let equipment = self.facility.equipment(building_id)?;
        let points = self.facility.points(building_id)?;

        let mut total_size = 0u64;

        // building/ = { building.json, floors/ }
        let building_blob = self.store.store_json(&building)?;
        total_size += building_blob.size;
        let floors_tree = self.entity_tree(&floors, &mut total_size)?;
        let floors_entry = self.store.store_tree(FLOORS_TREE, &floors_tree)?;
        let building_tree = Tree::new(vec![
            TreeEntry::for_object(BUILDING_BLOB, &building_blob),
            floors_entry,
        ]);
        let building_entry = self.store.store_tree(BUILDING_TREE, &building_tree)?;

        // equipment/<type>/<id>.json
        let mut by_type: BTreeMap<String, Vec<_>> = BTreeMap::new();
        for item in equipment.iter() {
            let key = if item.equipment_type.is_empty() {
                UNCLASSIFIED.to_string()
            } else {
                item.equipment_type.clone()
            };
            by_type.entry(key).or_default().push(item.clone());
        }
        let mut type_entries = Vec::with_capacity(by_type.len());
        for (equipment_type, items) in &by_type {
            let tree = self.entity_tree(items, &mut total_size)?;
            type_entries.push(self.store.store_tree(&entry_name(equipment_type), &tree)?);
        }
        let equipment_entry = self
            .store
            .store_tree(EQUIPMENT_TREE, &Tree::new(type_entries))?;

        // spatial/<floor_id>/<room_id>.json
        let mut by_floor: BTreeMap<String, Vec<_>> = BTreeMap::new();
        for room in rooms.iter() {
            by_floor
                .entry(room.floor_id.to_string())
                .or_default()
                .push(room.clone());
        }
        let mut floor_entries = Vec::with_capacity(by_floor.len());
        for (floor_id, items) in &by_floor {
            let tree = self.entity_tree(items, &mut total_size)?;
            floor_entries.push(self.store.store_tree(&entry_name(floor_id), &tree)?);
        }
        let spatial_entry = self
            .store
            .store_tree(SPATIAL_TREE, &Tree::new(floor_entries))?;

        // operations/points/<id>.json
        let points_tree = self.entity_tree(&points, &mut total_size)?;
        let points_entry = self.store.store_tree(POINTS_TREE, &points_tree)?;
        let operations_entry = self
            .store
            .store_tree(OPERATIONS_TREE, &Tree::new(vec![points_entry]))?;

        let files_entry = self.store.store_tree(FILES_TREE, &Tree::empty())?;

        let root_tree = Tree::new(vec![
            building_entry.clone(),
            equipment_entry.clone(),
            spatial_entry.clone(),
            files_entry.clone(),
            operations_entry.clone(),
        ]);
        let root_entry = self.store.store_tree("root", &root_tree)?;

        let metadata = SnapshotMetadata {
            space_count: (floors.len() + rooms.len()) as u64,
            item_count: (equipment.len() + points.len()) as u64,
            file_count: 0,
            total_size,
        };
        let hash = Snapshot::compute_hash(
            &building_entry.hash,
            &equipment_entry.hash,
            &spatial_entry.hash,
            &files_entry.hash,
            &operations_entry.hash,
            &metadata,
        );

        let snapshot = Snapshot {
            repository_id: *repository_id,
            hash,
            building_tree: building_entry.hash,
            equipment_tree: equipment_entry.hash,
            spatial_tree: spatial_entry.hash,
            files_tree: files_entry.hash,
            operations_tree: operations_entry.hash,
            root_tree: root_entry.hash,
            metadata,
            created_at: self.clock.now(),
        };
        let stored = self.snapshots.create(&snapshot)?;
        info!(
            repository = %repository_id,
            snapshot = %stored.short_hash(),
            spaces = metadata.space_count,
            items = metadata.item_count,
            "captured snapshot"
        );
        Ok(stored)
    }

    /// Store one blob per entity and return the tree listing them.
    fn entity_tree<E: Entity>(&self, items: &[E], total_size: &mut u64) -> SnapshotResult<Tree> {
        let mut entries = Vec::with_capacity(items.len());
        for item in items {
            let blob = self.store.store_json(item)?;
            *total_size += blob.size;
            entries.push(TreeEntry::for_object(blob_name(item.id()), &blob));
        }
        debug!(category = %E::CATEGORY, count = entries.len(), "built entity tree");
        Ok(Tree::new(entries))
    }
}
