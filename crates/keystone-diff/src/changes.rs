//! Change sets produced by the diff engine.

use keystone_facility::{Category, EntityRecord};
use keystone_ledger::{ChangeCounts, ChangesSummary};
use keystone_types::{EntityId, VersionId};
use serde::{Deserialize, Serialize};

/// An entity present on both sides with different content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifiedEntity {
    pub id: EntityId,
    pub before: EntityRecord,
    pub after: EntityRecord,
    /// Top-level fields whose values differ, sorted.
    pub changed_fields: Vec<String>,
}

impl ModifiedEntity {
    fn inverse(&self) -> Self {
        Self {
            id: self.id.clone(),
            before: self.after.clone(),
            after: self.before.clone(),
            changed_fields: self.changed_fields.clone(),
        }
    }
}

/// Changes within one category. Each list is ordered by entity id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryChanges {
    pub added: Vec<EntityRecord>,
    pub removed: Vec<EntityRecord>,
    pub modified: Vec<ModifiedEntity>,
}

impl CategoryChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    pub fn counts(&self) -> ChangeCounts {
        ChangeCounts {
            added: self.added.len() as u64,
            modified: self.modified.len() as u64,
            removed: self.removed.len() as u64,
        }
    }

    pub fn inverse(&self) -> Self {
        Self {
            added: self.removed.clone(),
            removed: self.added.clone(),
            modified: self.modified.iter().map(ModifiedEntity::inverse).collect(),
        }
    }
}

/// Every change between two building states.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffResult {
    /// `None` when diffing from the empty state.
    pub from_version: Option<VersionId>,
    pub to_version: Option<VersionId>,
    pub buildings: CategoryChanges,
    pub floors: CategoryChanges,
    pub rooms: CategoryChanges,
    pub equipment: CategoryChanges,
    pub points: CategoryChanges,
}

impl DiffResult {
    pub fn get(&self, category: Category) -> &CategoryChanges {
        match category {
            Category::Buildings => &self.buildings,
            Category::Floors => &self.floors,
            Category::Rooms => &self.rooms,
            Category::Equipment => &self.equipment,
            Category::Points => &self.points,
        }
    }

    pub fn get_mut(&mut self, category: Category) -> &mut CategoryChanges {
        match category {
            Category::Buildings => &mut self.buildings,
            Category::Floors => &mut self.floors,
            Category::Rooms => &mut self.rooms,
            Category::Equipment => &mut self.equipment,
            Category::Points => &mut self.points,
        }
    }

    /// Per-category counts, the form stored on commits.
    pub fn summary(&self) -> ChangesSummary {
        let mut summary = ChangesSummary::default();
        for category in Category::ALL {
            *summary.get_mut(category) = self.get(category).counts();
        }
        summary
    }

    pub fn is_empty(&self) -> bool {
        Category::ALL.iter().all(|c| self.get(*c).is_empty())
    }

    pub fn total(&self) -> u64 {
        self.summary().total()
    }

    /// The diff in the opposite direction.
    pub fn inverse(&self) -> Self {
        Self {
            from_version: self.to_version,
            to_version: self.from_version,
            buildings: self.buildings.inverse(),
            floors: self.floors.inverse(),
            rooms: self.rooms.inverse(),
            equipment: self.equipment.inverse(),
            points: self.points.inverse(),
        }
    }
}
