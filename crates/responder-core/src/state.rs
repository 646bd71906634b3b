//! Simulation snapshot: the complete read-only state published after each tick.

use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::events::SimEvent;
use crate::types::{AlarmId, GeoPoint, SimTime, StationId, VehicleId};

/// Complete simulation state broadcast to observers after each tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimSnapshot {
    pub time: SimTime,
    pub paused: bool,
    pub stations: Vec<StationView>,
    pub vehicles: Vec<VehicleView>,
    pub alarms: Vec<AlarmView>,
    /// Mission log entries appended since the previous snapshot.
    pub new_log_entries: Vec<MissionLogEntry>,
    /// Total mission log length.
    pub log_len: usize,
    /// Events raised since the previous snapshot.
    pub events: Vec<SimEvent>,
    pub stats: DispatchStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationView {
    pub id: StationId,
    pub name: String,
    pub position: GeoPoint,
    pub vehicles: Vec<VehicleId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleView {
    pub id: VehicleId,
    pub name: String,
    pub kind: String,
    pub category: VehicleCategory,
    pub home: StationId,
    pub status: VehicleStatus,
    pub position: GeoPoint,
    pub current_alarm: Option<AlarmId>,
    pub last_dispatched_alarm: Option<AlarmId>,
    /// Whether a movement or dwell task is live for this vehicle.
    pub has_task: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmView {
    pub id: AlarmId,
    pub kind: String,
    pub constraint: TerrainConstraint,
    pub position: GeoPoint,
    pub dispatched_count: u32,
    pub resolved_count: u32,
    /// Seconds since creation.
    pub age_secs: f64,
}

/// Append-only record of a closed alarm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionLogEntry {
    pub alarm_id: AlarmId,
    pub kind: String,
    /// Simulated completion time in seconds.
    pub completed_at_secs: f64,
    /// Completion time as `MM:SS`.
    pub clock: String,
    /// Names of the vehicles credited with the response.
    pub vehicles: Vec<String>,
    pub response: ResponseTime,
}

/// Running counters for the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchStats {
    pub alarms_created: u64,
    pub alarms_resolved: u64,
    pub alarms_manually_resolved: u64,
    pub vehicles_dispatched: u64,
    /// Alarm placements that needed the relaxed fallback.
    pub relaxed_spawns: u64,
    /// Movements that fell back to a direct line after a routing failure.
    pub route_fallbacks: u64,
}
