//! Patrol loop: vehicles wander between random waypoints around their station.

use responder_core::enums::{StatusTrigger, VehicleCategory};
use responder_core::error::DispatchError;
use responder_core::types::{GeoPoint, VehicleId};

use crate::context::SimContext;
use crate::systems::movement::ArrivalAction;

/// Put a vehicle on patrol and send it to its first waypoint.
pub fn start_patrol(ctx: &mut SimContext, vehicle: VehicleId) -> Result<(), DispatchError> {
    ctx.apply_trigger(vehicle, StatusTrigger::StartPatrol)?;
    ctx.update_vehicle_state(vehicle, |s| s.current_alarm = None);
    tracing::info!(%vehicle, "patrol started");
    next_leg(ctx, vehicle)
}

/// End the patrol. The vehicle is back in standby at its station.
pub fn stop_patrol(ctx: &mut SimContext, vehicle: VehicleId) -> Result<(), DispatchError> {
    ctx.apply_trigger(vehicle, StatusTrigger::StopPatrol)?;
    ctx.snap_home(vehicle)?;
    ctx.update_vehicle_state(vehicle, |s| s.patrol_target = None);
    tracing::info!(%vehicle, "patrol stopped");
    Ok(())
}

/// A waypoint was reached; pick the next one.
pub fn waypoint_reached(ctx: &mut SimContext, vehicle: VehicleId) -> Result<(), DispatchError> {
    ctx.apply_trigger(vehicle, StatusTrigger::WaypointReached)?;
    next_leg(ctx, vehicle)
}

fn next_leg(ctx: &mut SimContext, vehicle: VehicleId) -> Result<(), DispatchError> {
    let waypoint = choose_waypoint(ctx, vehicle)?;
    ctx.update_vehicle_state(vehicle, |s| s.patrol_target = Some(waypoint));
    ctx.start_journey(vehicle, waypoint, ArrivalAction::PatrolWaypoint)?;
    tracing::debug!(%vehicle, %waypoint, "patrol leg");
    Ok(())
}

/// Random point within the patrol radius of the home station. Ground units
/// only accept land; after `waypoint_attempts` misses the station itself is used.
pub fn choose_waypoint(ctx: &mut SimContext, vehicle: VehicleId) -> Result<GeoPoint, DispatchError> {
    let info = ctx
        .vehicle_info(vehicle)
        .ok_or(DispatchError::VehicleNotFound(vehicle))?;
    let home = ctx
        .station_position(info.home)
        .ok_or(DispatchError::StationNotFound(info.home))?;
    let radius_km = ctx.config.patrol.radius_km;
    let now = ctx.now();

    for _ in 0..ctx.config.patrol.waypoint_attempts {
        let Some(candidate) = ctx.resolver.sample(&mut ctx.rng, home, radius_km) else {
            continue;
        };
        if info.category == VehicleCategory::Aerial {
            return Ok(candidate);
        }
        if !ctx.terrain_cache.classify(candidate, &*ctx.oracle, now) {
            return Ok(candidate);
        }
    }
    tracing::debug!(%vehicle, "no land waypoint found, patrolling to station");
    Ok(home)
}
