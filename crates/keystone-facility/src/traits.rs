use keystone_types::{EntityId, RepositoryId};

use crate::error::FacilityResult;
use crate::model::{AutomationPoint, Building, Equipment, EntityWrite, Floor, Room, RepositoryInfo};

/// Read access to live facility state.
///
/// List operations return entities sorted by id. An unknown building yields
/// [`FacilityError::BuildingNotFound`](crate::FacilityError::BuildingNotFound)
/// from every method.
pub trait FacilityReader: Send + Sync {
    /// Look up a repository.
    fn repository(&self, id: &RepositoryId) -> FacilityResult<RepositoryInfo>;

    /// Find the repository that tracks a building.
    fn repository_for_building(&self, building_id: &EntityId) -> FacilityResult<RepositoryInfo>;

    fn building(&self, building_id: &EntityId) -> FacilityResult<Building>;

    fn floors(&self, building_id: &EntityId) -> FacilityResult<Vec<Floor>>;

    fn rooms(&self, building_id: &EntityId) -> FacilityResult<Vec<Room>>;

    fn equipment(&self, building_id: &EntityId) -> FacilityResult<Vec<Equipment>>;

    fn points(&self, building_id: &EntityId) -> FacilityResult<Vec<AutomationPoint>>;
}

/// Write access to live facility state.
///
/// Each call is one independent write. There is no transaction spanning
/// calls: a failure part-way through a sequence leaves earlier writes in
/// place.
pub trait FacilityWriter: Send + Sync {
    /// Apply a single upsert or delete to the building's state.
    ///
    /// Deleting an entity that does not exist is not an error.
    fn apply(&self, building_id: &EntityId, write: EntityWrite) -> FacilityResult<()>;
}
