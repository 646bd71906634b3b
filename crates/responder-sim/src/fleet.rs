//! Station and vehicle management, plus fleet import/export.
//!
//! A fleet file is JSON:
//!
//! ```json
//! { "stations": [ { "name": "Central", "position": { "lat": 55.67, "lng": 12.56 },
//!                   "vehicles": [ { "name": "A-1", "kind": "Ambulance" } ] } ] }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use responder_core::components::{StationInfo, VehicleInfo};
use responder_core::enums::VehicleStatus;
use responder_core::error::DispatchError;
use responder_core::types::{GeoPoint, StationId, VehicleId};

use crate::context::SimContext;
use crate::systems::alarms;
use crate::world_setup;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FleetConfig {
    #[serde(default)]
    pub stations: Vec<StationConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationConfig {
    pub name: String,
    pub position: GeoPoint,
    #[serde(default)]
    pub vehicles: Vec<VehicleConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleConfig {
    pub name: String,
    pub kind: String,
}

#[derive(Debug, Error)]
pub enum FleetError {
    #[error("failed to parse fleet JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read fleet file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FleetConfig {
    pub fn from_json_str(json: &str) -> Result<Self, FleetError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, FleetError> {
        let contents = std::fs::read_to_string(path).map_err(|source| FleetError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn to_json_string(&self) -> Result<String, FleetError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn vehicle_count(&self) -> usize {
        self.stations.iter().map(|s| s.vehicles.len()).sum()
    }
}

// --- Stations ---

pub fn add_station(ctx: &mut SimContext, name: String, position: GeoPoint) -> StationId {
    let id = world_setup::spawn_station(&mut ctx.world, &mut ctx.registry, name, position);
    tracing::info!(station = %id, %position, "station added");
    id
}

/// Rename a station. Its position never changes.
///
/// Surrounding whitespace is dropped; a blank name is rejected and the old
/// name kept.
pub fn rename_station(ctx: &mut SimContext, station: StationId, name: String) -> Result<(), DispatchError> {
    let entity = ctx.station_entity(station)?;
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(DispatchError::InvalidName(name));
    }
    let name = trimmed.to_string();
    let mut info = ctx
        .world
        .get::<&mut StationInfo>(entity)
        .map_err(|_| DispatchError::StationNotFound(station))?;
    tracing::info!(%station, from = %info.name, to = %name, "station renamed");
    info.name = name;
    Ok(())
}

/// Remove a station together with every vehicle homed there.
pub fn remove_station(ctx: &mut SimContext, station: StationId) -> Result<(), DispatchError> {
    ctx.station_entity(station)?;
    let homed: Vec<VehicleId> = ctx
        .registry
        .vehicle_entries()
        .filter(|(_, entity)| {
            ctx.world
                .get::<&VehicleInfo>(*entity)
                .map(|info| info.home == station)
                .unwrap_or(false)
        })
        .map(|(id, _)| id)
        .collect();
    for vehicle in homed {
        remove_vehicle(ctx, vehicle)?;
    }
    if let Some(entity) = ctx.registry.remove_station(station) {
        let _ = ctx.world.despawn(entity);
    }
    tracing::info!(%station, "station removed");
    Ok(())
}

// --- Vehicles ---

/// Add a vehicle in standby at `station`. The category is derived from the kind.
pub fn add_vehicle(
    ctx: &mut SimContext,
    station: StationId,
    name: String,
    kind: String,
) -> Result<VehicleId, DispatchError> {
    let entity = ctx.station_entity(station)?;
    let home = ctx
        .world
        .get::<&StationInfo>(entity)
        .map(|s| (*s).clone())
        .map_err(|_| DispatchError::StationNotFound(station))?;
    let id = world_setup::spawn_vehicle(&mut ctx.world, &mut ctx.registry, &home, name, kind);
    tracing::info!(vehicle = %id, %station, "vehicle added");
    Ok(id)
}

/// Remove a vehicle. An en-route vehicle is withdrawn from its alarm first,
/// and its task is cancelled.
pub fn remove_vehicle(ctx: &mut SimContext, vehicle: VehicleId) -> Result<(), DispatchError> {
    let state = ctx
        .vehicle_state(vehicle)
        .ok_or(DispatchError::VehicleNotFound(vehicle))?;
    ctx.scheduler.cancel_vehicle(vehicle);
    if state.status == VehicleStatus::EnRoute {
        if let Some(alarm) = state.current_alarm {
            alarms::withdraw_vehicle(ctx, alarm, vehicle);
        }
    }
    if let Some(entity) = ctx.registry.remove_vehicle(vehicle) {
        let _ = ctx.world.despawn(entity);
    }
    tracing::info!(%vehicle, "vehicle removed");
    Ok(())
}

// --- Import / export ---

/// Replace the whole fleet. Active alarms, tasks and the mission log are
/// dropped and every vehicle starts in standby at its station. Ids keep
/// counting up from before the load.
pub fn load(ctx: &mut SimContext, fleet: &FleetConfig) {
    ctx.scheduler.clear();
    ctx.world.clear();
    ctx.registry.clear();
    ctx.mission_log.clear();
    ctx.notifier.drain();

    for station in &fleet.stations {
        let id = world_setup::spawn_station(
            &mut ctx.world,
            &mut ctx.registry,
            station.name.clone(),
            station.position,
        );
        let home = StationInfo {
            id,
            name: station.name.clone(),
            position: station.position,
        };
        for vehicle in &station.vehicles {
            world_setup::spawn_vehicle(
                &mut ctx.world,
                &mut ctx.registry,
                &home,
                vehicle.name.clone(),
                vehicle.kind.clone(),
            );
        }
    }
    tracing::info!(
        stations = fleet.stations.len(),
        vehicles = fleet.vehicle_count(),
        "fleet loaded"
    );
}

/// Current stations and vehicles, in id order.
pub fn export(ctx: &SimContext) -> FleetConfig {
    let mut stations = Vec::new();
    for id in ctx.registry.station_ids() {
        let Some(entity) = ctx.registry.station(id) else {
            continue;
        };
        let Ok(info) = ctx.world.get::<&StationInfo>(entity) else {
            continue;
        };
        let vehicles = ctx
            .registry
            .vehicle_entries()
            .filter_map(|(_, e)| ctx.world.get::<&VehicleInfo>(e).ok().map(|v| (*v).clone()))
            .filter(|v| v.home == id)
            .map(|v| VehicleConfig {
                name: v.name,
                kind: v.kind,
            })
            .collect();
        stations.push(StationConfig {
            name: info.name.clone(),
            position: info.position,
            vehicles,
        });
    }
    FleetConfig { stations }
}
