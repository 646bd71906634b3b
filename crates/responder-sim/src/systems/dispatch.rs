//! Dispatch coordination and journey completion handling.
//!
//! A dispatch is validated as a whole before anything changes: if any
//! vehicle is unknown or busy, or the alarm is gone, nothing is mutated.

use rand::Rng;

use responder_core::components::AlarmInfo;
use responder_core::enums::{StatusTrigger, VehicleStatus};
use responder_core::error::DispatchError;
use responder_core::types::{AlarmId, VehicleId};

use crate::context::SimContext;
use crate::systems::alarms;
use crate::systems::movement::{ArrivalAction, Completion};
use crate::systems::patrol;

/// Send a batch of vehicles to an alarm.
///
/// Duplicate ids are collapsed. `dispatched_count` grows by the batch size
/// once per call. Each vehicle's previous task and patrol state are
/// cancelled before its new journey starts.
pub fn dispatch(
    ctx: &mut SimContext,
    alarm: AlarmId,
    vehicles: &[VehicleId],
) -> Result<(), DispatchError> {
    let mut batch: Vec<VehicleId> = Vec::with_capacity(vehicles.len());
    for v in vehicles {
        if !batch.contains(v) {
            batch.push(*v);
        }
    }
    if batch.is_empty() {
        return Err(DispatchError::EmptyBatch);
    }

    let alarm_entity = ctx.alarm_entity(alarm)?;
    for vehicle in &batch {
        ctx.check_trigger(*vehicle, StatusTrigger::Dispatch)?;
    }
    let destination = ctx
        .alarm_info(alarm)
        .map(|a| a.position)
        .ok_or(DispatchError::AlarmNotFound(alarm))?;

    if let Ok(mut info) = ctx.world.get::<&mut AlarmInfo>(alarm_entity) {
        info.dispatched_count += batch.len() as u32;
    }
    ctx.stats.vehicles_dispatched += batch.len() as u64;

    for vehicle in batch {
        ctx.apply_trigger(vehicle, StatusTrigger::Dispatch)?;
        ctx.update_vehicle_state(vehicle, |s| {
            s.current_alarm = Some(alarm);
            s.last_dispatched_alarm = Some(alarm);
        });
        ctx.start_journey(vehicle, destination, ArrivalAction::AtAlarm(alarm))?;
        tracing::info!(%alarm, %vehicle, "vehicle dispatched");
    }
    Ok(())
}

/// Order a vehicle back to its station.
///
/// An en-route vehicle is withdrawn from its alarm first. A vehicle already
/// heading home keeps its current journey.
pub fn send_home(ctx: &mut SimContext, vehicle: VehicleId) -> Result<(), DispatchError> {
    let state = ctx
        .vehicle_state(vehicle)
        .ok_or(DispatchError::VehicleNotFound(vehicle))?;
    if state.status == VehicleStatus::ReturningHome && ctx.scheduler.has_task(vehicle) {
        return Ok(());
    }

    ctx.apply_trigger(vehicle, StatusTrigger::Recall)?;
    if state.status == VehicleStatus::EnRoute {
        if let Some(alarm) = state.current_alarm {
            alarms::withdraw_vehicle(ctx, alarm, vehicle);
        }
    }
    ctx.start_home_journey(vehicle)?;
    tracing::info!(%vehicle, from = %state.status, "vehicle sent home");
    Ok(())
}

/// React to a finished task.
pub fn handle_completion(ctx: &mut SimContext, completion: Completion) {
    let vehicle = completion.vehicle;
    let result = match completion.action {
        ArrivalAction::AtAlarm(alarm) => arrive_at_alarm(ctx, vehicle, alarm),
        ArrivalAction::DwellElapsed(_) => leave_scene(ctx, vehicle),
        ArrivalAction::Home => arrive_home(ctx, vehicle),
        ArrivalAction::PatrolWaypoint => patrol::waypoint_reached(ctx, vehicle),
    };
    if let Err(err) = result {
        tracing::warn!(%vehicle, action = ?completion.action, error = %err, "completion not applied");
    }
}

fn arrive_at_alarm(
    ctx: &mut SimContext,
    vehicle: VehicleId,
    alarm: AlarmId,
) -> Result<(), DispatchError> {
    ctx.apply_trigger(vehicle, StatusTrigger::Arrive)?;
    let counted = alarms::record_arrival(ctx, alarm);
    tracing::debug!(%vehicle, %alarm, counted, "vehicle arrived on scene");

    let (min, max) = (ctx.config.dwell_min_secs, ctx.config.dwell_max_secs);
    let dwell = if max > min {
        ctx.rng.gen_range(min..=max)
    } else {
        min
    };
    ctx.scheduler.start_dwell(vehicle, dwell, alarm);

    alarms::check_resolution(ctx, alarm);
    Ok(())
}

fn leave_scene(ctx: &mut SimContext, vehicle: VehicleId) -> Result<(), DispatchError> {
    ctx.apply_trigger(vehicle, StatusTrigger::DwellElapsed)?;
    ctx.start_home_journey(vehicle)?;
    Ok(())
}

/// Standby at the station. The current alarm is dropped; the last dispatched
/// alarm stays until that alarm is resolved so the vehicle is still credited.
fn arrive_home(ctx: &mut SimContext, vehicle: VehicleId) -> Result<(), DispatchError> {
    ctx.apply_trigger(vehicle, StatusTrigger::ReachedHome)?;
    ctx.snap_home(vehicle)?;
    ctx.update_vehicle_state(vehicle, |s| s.current_alarm = None);
    Ok(())
}
