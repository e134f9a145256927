//! Live facility state for Keystone.
//!
//! Keystone versions the state of a building: the building record, its
//! floors and rooms, installed equipment, and building-automation points.
//! This crate defines those entities, the [`FacilityReader`] and
//! [`FacilityWriter`] interfaces the engine consumes, and an in-memory
//! backend.

pub mod error;
pub mod memory;
pub mod model;
pub mod state;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod traits;

pub use error::{FacilityError, FacilityResult};
pub use memory::InMemoryFacility;
pub use model::{
    AutomationPoint, Building, Category, Entity, EntityRecord, EntityWrite, Equipment, Extra,
    Floor, RepositoryInfo, Room,
};
pub use state::BuildingState;
pub use traits::{FacilityReader, FacilityWriter};
