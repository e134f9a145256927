use std::collections::HashMap;
use std::sync::RwLock;

use keystone_types::{EntityId, RepositoryId};
use tracing::debug;

use crate::error::{FacilityError, FacilityResult};
use crate::model::{
    AutomationPoint, Building, Category, EntityRecord, EntityWrite, Equipment, Floor, Room,
    RepositoryInfo,
};
use crate::state::BuildingState;
use crate::traits::{FacilityReader, FacilityWriter};

fn poisoned<E: std::fmt::Display>(e: E) -> FacilityError {
    FacilityError::Backend(format!("lock poisoned: {e}"))
}

/// In-memory facility storage.
///
/// Holds one [`BuildingState`] per building and the repository registry
/// behind `RwLock`s. Data is lost when the value is dropped.
#[derive(Debug, Default)]
pub struct InMemoryFacility {
    repositories: RwLock<HashMap<RepositoryId, RepositoryInfo>>,
    buildings: RwLock<HashMap<EntityId, BuildingState>>,
}

impl InMemoryFacility {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a building and a repository tracking it.
    pub fn register_repository(
        &self,
        name: impl Into<String>,
        building: Building,
    ) -> FacilityResult<RepositoryInfo> {
        let info = RepositoryInfo {
            id: RepositoryId::new(),
            building_id: building.id.clone(),
            name: name.into(),
        };
        {
            let mut buildings = self.buildings.write().map_err(poisoned)?;
            if buildings.contains_key(&building.id) {
                return Err(FacilityError::InvalidEntity(format!(
                    "building {} is already registered",
                    building.id
                )));
            }
            let mut state = BuildingState::new();
            state.insert(EntityRecord::Building(building));
            buildings.insert(info.building_id.clone(), state);
        }
        self.repositories
            .write()
            .map_err(poisoned)?
            .insert(info.id, info.clone());
        debug!(repository = %info.id, building = %info.building_id, "registered repository");
        Ok(info)
    }

    /// Copy of one building's full state.
    pub fn state(&self, building_id: &EntityId) -> FacilityResult<BuildingState> {
        self.with_state(building_id, |s| s.clone())
    }

    fn with_state<T>(
        &self,
        building_id: &EntityId,
        f: impl FnOnce(&BuildingState) -> T,
    ) -> FacilityResult<T> {
        let buildings = self.buildings.read().map_err(poisoned)?;
        let state = buildings
            .get(building_id)
            .ok_or_else(|| FacilityError::BuildingNotFound(building_id.clone()))?;
        Ok(f(state))
    }
}

fn check_parent(building_id: &EntityId, record: &EntityRecord) -> FacilityResult<()> {
    let owner = match record {
        EntityRecord::Building(b) => Some(&b.id),
        EntityRecord::Floor(f) => Some(&f.building_id),
        EntityRecord::Equipment(e) => Some(&e.building_id),
        EntityRecord::Room(_) | EntityRecord::Point(_) => None,
    };
    match owner {
        Some(owner) if owner != building_id => Err(FacilityError::InvalidEntity(format!(
            "{} {} belongs to building {owner}, not {building_id}",
            record.category(),
            record.id()
        ))),
        _ => Ok(()),
    }
}

impl FacilityReader for InMemoryFacility {
    fn repository(&self, id: &RepositoryId) -> FacilityResult<RepositoryInfo> {
        self.repositories
            .read()
            .map_err(poisoned)?
            .get(id)
            .cloned()
            .ok_or(FacilityError::RepositoryNotFound(*id))
    }

    fn repository_for_building(&self, building_id: &EntityId) -> FacilityResult<RepositoryInfo> {
        self.repositories
            .read()
            .map_err(poisoned)?
            .values()
            .find(|r| &r.building_id == building_id)
            .cloned()
            .ok_or_else(|| FacilityError::NoRepositoryForBuilding(building_id.clone()))
    }

    fn building(&self, building_id: &EntityId) -> FacilityResult<Building> {
        self.with_state(building_id, |s| s.building().cloned())?
            .ok_or_else(|| FacilityError::BuildingNotFound(building_id.clone()))
    }

    fn floors(&self, building_id: &EntityId) -> FacilityResult<Vec<Floor>> {
        self.with_state(building_id, |s| s.floors.values().cloned().collect())
    }

    fn rooms(&self, building_id: &EntityId) -> FacilityResult<Vec<Room>> {
        self.with_state(building_id, |s| s.rooms.values().cloned().collect())
    }

    fn equipment(&self, building_id: &EntityId) -> FacilityResult<Vec<Equipment>> {
        self.with_state(building_id, |s| s.equipment.values().cloned().collect())
    }

    fn points(&self, building_id: &EntityId) -> FacilityResult<Vec<AutomationPoint>> {
        self.with_state(building_id, |s| s.points.values().cloned().collect())
    }
}

impl FacilityWriter for InMemoryFacility {
    fn apply(&self, building_id: &EntityId, write: EntityWrite) -> FacilityResult<()> {
        let mut buildings = self.buildings.write().map_err(poisoned)?;
        let state = buildings
            .get_mut(building_id)
            .ok_or_else(|| FacilityError::BuildingNotFound(building_id.clone()))?;
        match write {
            EntityWrite::Upsert(record) => {
                check_parent(building_id, &record)?;
                debug!(building = %building_id, category = %record.category(), id = %record.id(), "upsert entity");
                state.insert(record);
            }
            EntityWrite::Delete { category, id } => {
                if category == Category::Buildings && &id != building_id {
                    return Err(FacilityError::InvalidEntity(format!(
                        "cannot delete building {id} through {building_id}"
                    )));
                }
                debug!(building = %building_id, %category, %id, "delete entity");
                state.remove(category, &id);
            }
        }
        Ok(())
    }
}
