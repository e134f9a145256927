//! Fixture builders shared by downstream test suites.
//!
//! Enabled with the `testing` feature.

use keystone_types::EntityId;

use crate::memory::InMemoryFacility;
use crate::model::{AutomationPoint, Building, EntityRecord, EntityWrite, Equipment, Extra, Floor, Room, RepositoryInfo};
use crate::traits::FacilityWriter;

/// Id of the building created by [`seed_building`].
pub const BUILDING_ID: &str = "bldg-1";

pub fn eid(s: &str) -> EntityId {
    match EntityId::new(s) {
        Ok(id) => id,
        Err(e) => panic!("bad fixture id {s:?}: {e}"),
    }
}

pub fn building(id: &str) -> Building {
    Building {
        id: eid(id),
        name: "Harbor Point".into(),
        address: "100 Harbor Way".into(),
        building_type: "office".into(),
        year_built: Some(2004),
        extra: Extra::new(),
    }
}

pub fn floor(id: &str, building: &str, level: i32) -> Floor {
    Floor {
        id: eid(id),
        building_id: eid(building),
        name: format!("Level {level}"),
        level,
        extra: Extra::new(),
    }
}

pub fn room(id: &str, floor: &str) -> Room {
    Room {
        id: eid(id),
        floor_id: eid(floor),
        name: format!("Room {id}"),
        room_type: "office".into(),
        area_m2: Some(24),
        extra: Extra::new(),
    }
}

pub fn equipment(id: &str, building: &str, equipment_type: &str, floor: Option<&str>) -> Equipment {
    Equipment {
        id: eid(id),
        building_id: eid(building),
        floor_id: floor.map(eid),
        room_id: None,
        name: format!("Unit {id}"),
        equipment_type: equipment_type.into(),
        manufacturer: Some("Trane".into()),
        model: None,
        status: "operational".into(),
        extra: Extra::new(),
    }
}

pub fn point(id: &str, equipment: Option<&str>) -> AutomationPoint {
    AutomationPoint {
        id: eid(id),
        equipment_id: equipment.map(eid),
        name: format!("Point {id}"),
        point_type: "sensor".into(),
        unit: Some("degC".into()),
        extra: Extra::new(),
    }
}

/// Register `bldg-1` with `floor_count` floors (`floor-1`..), one room per
/// floor (`room-<n>01`), an `ahu` unit on floor 1, an untyped unit, and one
/// point bound to the `ahu`.
pub fn seed_building(facility: &InMemoryFacility, floor_count: i32) -> RepositoryInfo {
    let info = match facility.register_repository("harbor-point", building(BUILDING_ID)) {
        Ok(info) => info,
        Err(e) => panic!("seed failed: {e}"),
    };
    let b = eid(BUILDING_ID);
    let mut writes = Vec::new();
    for level in 1..=floor_count {
        let floor_id = format!("floor-{level}");
        writes.push(EntityRecord::Floor(floor(&floor_id, BUILDING_ID, level)));
        writes.push(EntityRecord::Room(room(&format!("room-{level}01"), &floor_id)));
    }
    writes.push(EntityRecord::Equipment(equipment(
        "eq-ahu-1",
        BUILDING_ID,
        "ahu",
        Some("floor-1"),
    )));
    writes.push(EntityRecord::Equipment(equipment("eq-misc-1", BUILDING_ID, "", None)));
    writes.push(EntityRecord::Point(point("pt-1", Some("eq-ahu-1"))));
    for record in writes {
        if let Err(e) = facility.apply(&b, EntityWrite::Upsert(record)) {
            panic!("seed write failed: {e}");
        }
    }
    info
}
