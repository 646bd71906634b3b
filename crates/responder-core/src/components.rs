//! ECS components for hecs entities.
//!
//! Components are plain data structs with no methods.
//! Simulation logic lives in systems, not components.

use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::types::{AlarmId, GeoPoint, StationId, VehicleId};

/// A station: fixed home base for a group of vehicles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationInfo {
    pub id: StationId,
    pub name: String,
    /// Never changes after creation.
    pub position: GeoPoint,
}

/// Immutable vehicle identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleInfo {
    pub id: VehicleId,
    pub name: String,
    /// Free-form vehicle kind as configured by the operator (e.g. "Ambulance").
    pub kind: String,
    pub category: VehicleCategory,
    /// Home station. Lookup key, not ownership.
    pub home: StationId,
}

/// Mutable vehicle runtime state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VehicleState {
    pub status: VehicleStatus,
    pub position: GeoPoint,
    /// Alarm currently being served.
    pub current_alarm: Option<AlarmId>,
    /// Most recent alarm this vehicle was dispatched to. Survives the
    /// trip home and decides mission log attribution.
    pub last_dispatched_alarm: Option<AlarmId>,
    /// Current patrol waypoint, if patrolling.
    pub patrol_target: Option<GeoPoint>,
}

/// An active incident.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmInfo {
    pub id: AlarmId,
    /// Display text with terrain tags stripped.
    pub kind: String,
    pub constraint: TerrainConstraint,
    pub position: GeoPoint,
    /// Station the alarm was spawned around.
    pub origin_station: StationId,
    pub dispatched_count: u32,
    pub resolved_count: u32,
    /// Simulated time of creation in seconds.
    pub created_at_secs: f64,
    /// Whether the spawn resolver fell back to relaxed placement.
    #[serde(default)]
    pub relaxed_placement: bool,
}
