//! Advisory structural checks on restored state.

use keystone_facility::BuildingState;
use serde::{Deserialize, Serialize};

use crate::error::RollbackError;

/// Findings of a post-restore check. Never causes a revert.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// A result with no findings.
    pub fn passed() -> Self {
        Self {
            valid: true,
            ..Self::default()
        }
    }

    /// Escalate errors into a `ValidationFailure`.
    pub fn into_result(self) -> Result<Self, RollbackError> {
        if self.valid {
            Ok(self)
        } else {
            Err(RollbackError::Validation(self.errors))
        }
    }
}

/// Check that every reference inside `state` resolves.
///
/// Errors: no building record, floors of another building, rooms on missing
/// floors, equipment pointing at missing floors or rooms, points bound to
/// missing equipment. Warnings: a building without floors.
pub fn validate_state(state: &BuildingState) -> ValidationResult {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let building = state.building();
    match building {
        None => errors.push("building record is missing".to_string()),
        Some(_) if state.floors.is_empty() => {
            warnings.push("building has no floors".to_string());
        }
        Some(_) => {}
    }

    for floor in state.floors.values() {
        if building.is_some_and(|b| b.id != floor.building_id) {
            errors.push(format!(
                "floor {} belongs to unknown building {}",
                floor.id, floor.building_id
            ));
        }
    }
    for room in state.rooms.values() {
        if !state.floors.contains_key(&room.floor_id) {
            errors.push(format!("room {} is on missing floor {}", room.id, room.floor_id));
        }
    }
    for item in state.equipment.values() {
        if let Some(floor) = item.floor_id.as_ref().filter(|f| !state.floors.contains_key(*f)) {
            errors.push(format!("equipment {} is on missing floor {floor}", item.id));
        }
        if let Some(room) = item.room_id.as_ref().filter(|r| !state.rooms.contains_key(*r)) {
            errors.push(format!("equipment {} is in missing room {room}", item.id));
        }
    }
    for point in state.points.values() {
        if let Some(eq) = point
            .equipment_id
            .as_ref()
            .filter(|e| !state.equipment.contains_key(*e))
        {
            errors.push(format!("point {} is bound to missing equipment {eq}", point.id));
        }
    }

    ValidationResult {
        valid: errors.is_empty(),
        errors,
        warnings,
    }
}
