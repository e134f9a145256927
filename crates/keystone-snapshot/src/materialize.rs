//! Decode snapshot trees back into typed entities.

use keystone_facility::{
    AutomationPoint, Building, BuildingState, Category, Entity, EntityRecord, Equipment, Floor,
    Room,
};
use keystone_store::{ObjectKind, ObjectStore, ObjectStoreExt, Tree, TreeEntry};
use keystone_types::ObjectHash;

use crate::error::{SnapshotError, SnapshotResult};
use crate::model::{Snapshot, BUILDING_BLOB, FLOORS_TREE, POINTS_TREE};

fn entry<'t>(tree: &'t Tree, tree_hash: &ObjectHash, name: &str) -> SnapshotResult<&'t TreeEntry> {
    tree.get(name).ok_or_else(|| SnapshotError::MissingEntry {
        tree: *tree_hash,
        name: name.to_string(),
    })
}

/// Hash of the object holding one category inside a snapshot.
///
/// Two snapshots with equal category hashes hold identical entities of that
/// category.
pub fn category_hash(
    store: &dyn ObjectStore,
    snapshot: &Snapshot,
    category: Category,
) -> SnapshotResult<ObjectHash> {
    match category {
        Category::Buildings | Category::Floors => {
            let tree = store.get_tree(&snapshot.building_tree)?;
            let name = if category == Category::Buildings {
                BUILDING_BLOB
            } else {
                FLOORS_TREE
            };
            Ok(entry(&tree, &snapshot.building_tree, name)?.hash)
        }
        Category::Rooms => Ok(snapshot.spatial_tree),
        Category::Equipment => Ok(snapshot.equipment_tree),
        Category::Points => {
            let tree = store.get_tree(&snapshot.operations_tree)?;
            Ok(entry(&tree, &snapshot.operations_tree, POINTS_TREE)?.hash)
        }
    }
}

/// Decode every blob in a flat tree as `E`.
fn decode_flat<E: Entity>(store: &dyn ObjectStore, hash: &ObjectHash) -> SnapshotResult<Vec<EntityRecord>> {
    let tree = store.get_tree(hash)?;
    let mut out = Vec::with_capacity(tree.len());
    for e in tree.entries.iter().filter(|e| e.kind == ObjectKind::Blob) {
        let entity: E = store.get_json(&e.hash)?;
        out.push(entity.into_record());
    }
    Ok(out)
}

/// Decode a tree of subtrees, each holding blobs of `E`.
fn decode_grouped<E: Entity>(store: &dyn ObjectStore, hash: &ObjectHash) -> SnapshotResult<Vec<EntityRecord>> {
    let tree = store.get_tree(hash)?;
    let mut out = Vec::new();
    for group in tree.entries.iter().filter(|e| e.kind == ObjectKind::Tree) {
        out.extend(decode_flat::<E>(store, &group.hash)?);
    }
    Ok(out)
}

/// Load every entity of one category from a snapshot.
pub fn load_category(
    store: &dyn ObjectStore,
    snapshot: &Snapshot,
    category: Category,
) -> SnapshotResult<Vec<EntityRecord>> {
    let hash = category_hash(store, snapshot, category)?;
    match category {
        Category::Buildings => {
            let building: Building = store.get_json(&hash)?;
            Ok(vec![building.into_record()])
        }
        Category::Floors => decode_flat::<Floor>(store, &hash),
        Category::Rooms => decode_grouped::<Room>(store, &hash),
        Category::Equipment => decode_grouped::<Equipment>(store, &hash),
        Category::Points => decode_flat::<AutomationPoint>(store, &hash),
    }
}

/// Rebuild the full building state a snapshot captured.
pub fn materialize(store: &dyn ObjectStore, snapshot: &Snapshot) -> SnapshotResult<BuildingState> {
    let mut state = BuildingState::new();
    for category in Category::ALL {
        for record in load_category(store, snapshot, category)? {
            state.insert(record);
        }
    }
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::SnapshotBuilder;
    use crate::repository::InMemorySnapshotRepository;
    use keystone_facility::testing::*;
    use keystone_facility::{EntityWrite, FacilityReader, FacilityWriter, InMemoryFacility};
    use keystone_store::InMemoryObjectStore;
    use keystone_types::FixedClock;
    use std::sync::Arc;

    fn capture(facility: &Arc<InMemoryFacility>, store: &Arc<InMemoryObjectStore>) -> Snapshot {
        let info = facility.repository_for_building(&eid(BUILDING_ID)).unwrap();
        SnapshotBuilder::new(
            facility.clone(),
            store.clone(),
            Arc::new(InMemorySnapshotRepository::new()),
            Arc::new(FixedClock::epoch()),
        )
        .capture_snapshot(&info.id)
        .unwrap()
    }

    #[test]
    fn materialize_matches_live_state() {
        let facility = Arc::new(InMemoryFacility::new());
        seed_building(&facility, 3);
        let store = Arc::new(InMemoryObjectStore::new());
        let snap = capture(&facility, &store);

        let live = BuildingState::from_reader(facility.as_ref(), &eid(BUILDING_ID)).unwrap();
        let restored = materialize(store.as_ref(), &snap).unwrap();
        assert_eq!(restored, live);
    }

    #[test]
    fn extra_attributes_survive_capture() {
        let facility = Arc::new(InMemoryFacility::new());
        seed_building(&facility, 1);
        let mut tagged = room("room-x", "floor-1");
        tagged.extra.insert("occupancy".into(), "12".into());
        facility
            .apply(
                &eid(BUILDING_ID),
                EntityWrite::Upsert(EntityRecord::Room(tagged.clone())),
            )
            .unwrap();

        let store = Arc::new(InMemoryObjectStore::new());
        let snap = capture(&facility, &store);
        let state = materialize(store.as_ref(), &snap).unwrap();
        assert_eq!(state.rooms[&eid("room-x")], tagged);
    }

    #[test]
    fn category_hash_isolates_categories() {
        let facility = Arc::new(InMemoryFacility::new());
        seed_building(&facility, 2);
        let store = Arc::new(InMemoryObjectStore::new());
        let before = capture(&facility, &store);

        facility
            .apply(
                &eid(BUILDING_ID),
                EntityWrite::Upsert(EntityRecord::Point(point("pt-2", None))),
            )
            .unwrap();
        let after = capture(&facility, &store);

        for category in Category::ALL {
            let a = category_hash(store.as_ref(), &before, category).unwrap();
            let b = category_hash(store.as_ref(), &after, category).unwrap();
            assert_eq!(a == b, category != Category::Points, "{category}");
        }
        assert_eq!(load_category(store.as_ref(), &after, Category::Points).unwrap().len(), 2);
    }

    #[test]
    fn missing_tree_is_store_error() {
        let store = InMemoryObjectStore::new();
        let facility = Arc::new(InMemoryFacility::new());
        seed_building(&facility, 1);
        let snap = capture(&facility, &Arc::new(InMemoryObjectStore::new()));
        let err = materialize(&store, &snap).unwrap_err();
        assert!(matches!(err, SnapshotError::Store(_)));
    }
}
