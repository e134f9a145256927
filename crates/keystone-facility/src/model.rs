//! Typed facility entities.
//!
//! Each entity has a stable [`EntityId`], a fixed set of typed fields, and a
//! residual `extra` map for attributes the platform attaches without a
//! schema change. Field order here is the serialization order, but canonical
//! encoding sorts keys so reordering fields never changes a hash.

use std::collections::BTreeMap;
use std::fmt;

use keystone_types::{EntityId, RepositoryId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Free-form extension attributes.
pub type Extra = BTreeMap<String, String>;

/// Entity category, ordered parent before child.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Buildings,
    Floors,
    Rooms,
    Equipment,
    Points,
}

impl Category {
    /// Every category, parent before child.
    pub const ALL: [Category; 5] = [
        Category::Buildings,
        Category::Floors,
        Category::Rooms,
        Category::Equipment,
        Category::Points,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Buildings => "buildings",
            Self::Floors => "floors",
            Self::Rooms => "rooms",
            Self::Equipment => "equipment",
            Self::Points => "points",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The root of a facility aggregate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    pub id: EntityId,
    pub name: String,
    pub address: String,
    pub building_type: String,
    pub year_built: Option<i32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: Extra,
}

/// A storey of a building.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Floor {
    pub id: EntityId,
    pub building_id: EntityId,
    pub name: String,
    pub level: i32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: Extra,
}

/// A room on a floor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: EntityId,
    pub floor_id: EntityId,
    pub name: String,
    pub room_type: String,
    pub area_m2: Option<u32>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: Extra,
}

/// A piece of installed equipment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    pub id: EntityId,
    pub building_id: EntityId,
    pub floor_id: Option<EntityId>,
    pub room_id: Option<EntityId>,
    pub name: String,
    /// Grouping key inside snapshots. Empty means unclassified.
    pub equipment_type: String,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub status: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: Extra,
}

/// A building-automation point, optionally bound to equipment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutomationPoint {
    pub id: EntityId,
    pub equipment_id: Option<EntityId>,
    pub name: String,
    pub point_type: String,
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: Extra,
}

/// Links a versioned repository to the building it tracks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub id: RepositoryId,
    pub building_id: EntityId,
    pub name: String,
}

/// Common behavior of every facility entity.
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const CATEGORY: Category;

    fn id(&self) -> &EntityId;

    fn into_record(self) -> EntityRecord;
}

macro_rules! impl_entity {
    ($ty:ty, $category:expr, $variant:ident) => {
        impl Entity for $ty {
            const CATEGORY: Category = $category;

            fn id(&self) -> &EntityId {
                &self.id
            }

            fn into_record(self) -> EntityRecord {
                EntityRecord::$variant(self)
            }
        }
    };
}

impl_entity!(Building, Category::Buildings, Building);
impl_entity!(Floor, Category::Floors, Floor);
impl_entity!(Room, Category::Rooms, Room);
impl_entity!(Equipment, Category::Equipment, Equipment);
impl_entity!(AutomationPoint, Category::Points, Point);

/// Any one entity, tagged by category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", content = "entity", rename_all = "lowercase")]
pub enum EntityRecord {
    Building(Building),
    Floor(Floor),
    Room(Room),
    Equipment(Equipment),
    Point(AutomationPoint),
}

impl EntityRecord {
    pub fn category(&self) -> Category {
        match self {
            Self::Building(_) => Category::Buildings,
            Self::Floor(_) => Category::Floors,
            Self::Room(_) => Category::Rooms,
            Self::Equipment(_) => Category::Equipment,
            Self::Point(_) => Category::Points,
        }
    }

    pub fn id(&self) -> &EntityId {
        match self {
            Self::Building(e) => &e.id,
            Self::Floor(e) => &e.id,
            Self::Room(e) => &e.id,
            Self::Equipment(e) => &e.id,
            Self::Point(e) => &e.id,
        }
    }

    /// The entity's fields as a JSON object, without the category tag.
    pub fn to_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        match self {
            Self::Building(e) => serde_json::to_value(e),
            Self::Floor(e) => serde_json::to_value(e),
            Self::Room(e) => serde_json::to_value(e),
            Self::Equipment(e) => serde_json::to_value(e),
            Self::Point(e) => serde_json::to_value(e),
        }
    }
}

/// A single mutation of live facility state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntityWrite {
    Upsert(EntityRecord),
    Delete { category: Category, id: EntityId },
}

impl EntityWrite {
    pub fn category(&self) -> Category {
        match self {
            Self::Upsert(record) => record.category(),
            Self::Delete { category, .. } => *category,
        }
    }
}
