use std::collections::BTreeMap;

use keystone_types::EntityId;

use crate::error::{FacilityError, FacilityResult};
use crate::model::{
    AutomationPoint, Building, Category, Entity, EntityRecord, Equipment, Floor, Room,
};
use crate::traits::FacilityReader;

/// Every entity of one building, keyed by id within each category.
///
/// This is the shape both live storage and materialized snapshots are read
/// into, so the diff and rollback code can compare them directly.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BuildingState {
    pub buildings: BTreeMap<EntityId, Building>,
    pub floors: BTreeMap<EntityId, Floor>,
    pub rooms: BTreeMap<EntityId, Room>,
    pub equipment: BTreeMap<EntityId, Equipment>,
    pub points: BTreeMap<EntityId, AutomationPoint>,
}

fn index<E: Entity>(items: Vec<E>) -> BTreeMap<EntityId, E> {
    items.into_iter().map(|e| (e.id().clone(), e)).collect()
}

fn records<E: Entity>(map: &BTreeMap<EntityId, E>) -> Vec<EntityRecord> {
    map.values().cloned().map(Entity::into_record).collect()
}

impl BuildingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the live state of `building_id`.
    ///
    /// A missing building record is not an error here: the remaining
    /// categories are still read so that a deleted building can be restored.
    pub fn from_reader(reader: &dyn FacilityReader, building_id: &EntityId) -> FacilityResult<Self> {
        let buildings = match reader.building(building_id) {
            Ok(b) => index(vec![b]),
            Err(FacilityError::BuildingNotFound(_)) => BTreeMap::new(),
            Err(e) => return Err(e),
        };
        Ok(Self {
            buildings,
            floors: index(reader.floors(building_id)?),
            rooms: index(reader.rooms(building_id)?),
            equipment: index(reader.equipment(building_id)?),
            points: index(reader.points(building_id)?),
        })
    }

    /// The building record, if present.
    pub fn building(&self) -> Option<&Building> {
        self.buildings.values().next()
    }

    pub fn insert(&mut self, record: EntityRecord) {
        match record {
            EntityRecord::Building(e) => {
                self.buildings.insert(e.id.clone(), e);
            }
            EntityRecord::Floor(e) => {
                self.floors.insert(e.id.clone(), e);
            }
            EntityRecord::Room(e) => {
                self.rooms.insert(e.id.clone(), e);
            }
            EntityRecord::Equipment(e) => {
                self.equipment.insert(e.id.clone(), e);
            }
            EntityRecord::Point(e) => {
                self.points.insert(e.id.clone(), e);
            }
        }
    }

    pub fn remove(&mut self, category: Category, id: &EntityId) -> Option<EntityRecord> {
        match category {
            Category::Buildings => self.buildings.remove(id).map(Entity::into_record),
            Category::Floors => self.floors.remove(id).map(Entity::into_record),
            Category::Rooms => self.rooms.remove(id).map(Entity::into_record),
            Category::Equipment => self.equipment.remove(id).map(Entity::into_record),
            Category::Points => self.points.remove(id).map(Entity::into_record),
        }
    }

    pub fn get(&self, category: Category, id: &EntityId) -> Option<EntityRecord> {
        match category {
            Category::Buildings => self.buildings.get(id).cloned().map(Entity::into_record),
            Category::Floors => self.floors.get(id).cloned().map(Entity::into_record),
            Category::Rooms => self.rooms.get(id).cloned().map(Entity::into_record),
            Category::Equipment => self.equipment.get(id).cloned().map(Entity::into_record),
            Category::Points => self.points.get(id).cloned().map(Entity::into_record),
        }
    }

    /// All records of one category, in id order.
    pub fn records(&self, category: Category) -> Vec<EntityRecord> {
        match category {
            Category::Buildings => records(&self.buildings),
            Category::Floors => records(&self.floors),
            Category::Rooms => records(&self.rooms),
            Category::Equipment => records(&self.equipment),
            Category::Points => records(&self.points),
        }
    }

    pub fn count(&self, category: Category) -> usize {
        match category {
            Category::Buildings => self.buildings.len(),
            Category::Floors => self.floors.len(),
            Category::Rooms => self.rooms.len(),
            Category::Equipment => self.equipment.len(),
            Category::Points => self.points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        Category::ALL.iter().all(|c| self.count(*c) == 0)
    }
}
