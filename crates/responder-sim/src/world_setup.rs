//! Entity spawn factories for stations, vehicles, and alarms.
//!
//! The entity is spawned first and the registry hands out its id, which is
//! then written into the component so both sides agree.

use hecs::World;

use responder_core::components::*;
use responder_core::enums::{TerrainConstraint, VehicleStatus};
use responder_core::types::{AlarmId, GeoPoint, StationId, VehicleId};
use responder_fsm::profiles::category_for_kind;

use crate::registry::Registry;

/// Spawn a station with no vehicles.
pub fn spawn_station(
    world: &mut World,
    registry: &mut Registry,
    name: String,
    position: GeoPoint,
) -> StationId {
    let entity = world.spawn((StationInfo {
        id: StationId(0),
        name,
        position,
    },));
    let id = registry.insert_station(entity);
    if let Ok(mut info) = world.get::<&mut StationInfo>(entity) {
        info.id = id;
    }
    id
}

/// Spawn a vehicle parked in standby at its home station.
pub fn spawn_vehicle(
    world: &mut World,
    registry: &mut Registry,
    home: &StationInfo,
    name: String,
    kind: String,
) -> VehicleId {
    let category = category_for_kind(&kind);
    let entity = world.spawn((
        VehicleInfo {
            id: VehicleId(0),
            name,
            kind,
            category,
            home: home.id,
        },
        VehicleState {
            status: VehicleStatus::Standby,
            position: home.position,
            ..Default::default()
        },
    ));
    let id = registry.insert_vehicle(entity);
    if let Ok(mut info) = world.get::<&mut VehicleInfo>(entity) {
        info.id = id;
    }
    id
}

/// Alarm fields decided by the spawner.
pub struct AlarmSpec {
    pub kind: String,
    pub constraint: TerrainConstraint,
    pub position: GeoPoint,
    pub origin_station: StationId,
    pub relaxed_placement: bool,
}

/// Spawn an active alarm with zeroed counters.
pub fn spawn_alarm(
    world: &mut World,
    registry: &mut Registry,
    spec: AlarmSpec,
    now_secs: f64,
) -> AlarmId {
    let entity = world.spawn((AlarmInfo {
        id: AlarmId(0),
        kind: spec.kind,
        constraint: spec.constraint,
        position: spec.position,
        origin_station: spec.origin_station,
        dispatched_count: 0,
        resolved_count: 0,
        created_at_secs: now_secs,
        relaxed_placement: spec.relaxed_placement,
    },));
    let id = registry.insert_alarm(entity);
    if let Ok(mut info) = world.get::<&mut AlarmInfo>(entity) {
        info.id = id;
    }
    id
}
