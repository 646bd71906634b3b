//! Operator commands sent to the simulation.
//!
//! Commands are queued and processed at the next tick boundary.

use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::types::{AlarmId, GeoPoint, StationId, VehicleId};

/// All possible operator actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DispatchCommand {
    // --- Alarms ---
    /// Spawn an alarm near a station. Radius falls back to the configured default.
    CreateAlarm {
        station: StationId,
        radius_km: Option<f64>,
        constraint: TerrainConstraint,
    },
    /// Spawn an alarm of a random catalog type near a random station.
    CreateRandomAlarm,
    /// Send a batch of vehicles to an alarm.
    Dispatch {
        alarm: AlarmId,
        vehicles: Vec<VehicleId>,
    },
    /// Close an alarm regardless of arrivals.
    ResolveManually { alarm: AlarmId },

    // --- Vehicle orders ---
    StartPatrol { vehicle: VehicleId },
    StopPatrol { vehicle: VehicleId },
    SendHome { vehicle: VehicleId },

    // --- Fleet management ---
    AddStation { name: String, position: GeoPoint },
    RenameStation { station: StationId, name: String },
    /// Remove a station together with its vehicles.
    RemoveStation { station: StationId },
    /// Add a vehicle. Category is inferred from `kind`.
    AddVehicle {
        station: StationId,
        name: String,
        kind: String,
    },
    RemoveVehicle { vehicle: VehicleId },

    // --- Simulation control ---
    /// Drop every cached terrain classification.
    ClearTerrainCache,
    Pause,
    Resume,
}
