//! Alarm lifecycle: creation, resolution bookkeeping, manual override.
//!
//! An alarm is resolved exactly when `dispatched == resolved` and at least one
//! vehicle was dispatched. The check re-fetches the alarm by id every time,
//! so calling it from every arrival, in any order, resolves the alarm once.

use rand::Rng;

use responder_core::components::{AlarmInfo, VehicleState};
use responder_core::enums::{ResponseTime, StatusTrigger, TerrainConstraint};
use responder_core::error::DispatchError;
use responder_core::state::MissionLogEntry;
use responder_core::types::{format_clock, AlarmId, StationId, VehicleId};

use crate::context::SimContext;
use crate::systems::spawner::AlarmType;
use crate::world_setup::{self, AlarmSpec};

/// Create an alarm near `station` whose location satisfies `constraint`.
///
/// The type text is drawn from catalog entries with the same constraint.
/// Placement never fails: an exhausted search falls back to a relaxed spot
/// next to the station.
pub fn create_alarm(
    ctx: &mut SimContext,
    station: StationId,
    radius_km: f64,
    constraint: TerrainConstraint,
) -> Result<AlarmId, DispatchError> {
    let center = ctx
        .station_position(station)
        .ok_or(DispatchError::StationNotFound(station))?;
    let radius_km = if radius_km.is_finite() && radius_km > 0.0 {
        radius_km
    } else {
        tracing::warn!(radius_km, "invalid spawn radius, using default");
        ctx.config.spawn.default_radius_km
    };

    let kind = ctx.catalog.pick_text_for(constraint, &mut ctx.rng);
    let now = ctx.now();
    let placement = ctx.resolver.resolve(
        &mut ctx.rng,
        &mut ctx.terrain_cache,
        &*ctx.oracle,
        now,
        center,
        radius_km,
        constraint,
    );

    Ok(spawn(
        ctx,
        AlarmSpec {
            kind,
            constraint,
            position: placement.position,
            origin_station: station,
            relaxed_placement: placement.relaxed,
        },
    ))
}

/// Create an alarm of a random catalog type near a random station.
///
/// When a type's terrain requirement cannot be met within the attempt
/// budget, another type is drawn, up to `max_type_selections` times. After
/// that the last type is placed with the relaxed fallback.
/// Returns None when there are no stations.
pub fn create_random_alarm(ctx: &mut SimContext) -> Option<AlarmId> {
    let stations = ctx.registry.station_ids();
    if stations.is_empty() {
        return None;
    }
    let station = stations[ctx.rng.gen_range(0..stations.len())];
    let center = ctx.station_position(station)?;
    let radius_km = ctx.config.spawn.default_radius_km;
    let now = ctx.now();

    let mut last_type: Option<AlarmType> = None;
    for _ in 0..ctx.config.spawn.max_type_selections {
        let Some(alarm_type) = ctx.catalog.pick(&mut ctx.rng).cloned() else {
            break;
        };
        match ctx.resolver.try_resolve(
            &mut ctx.rng,
            &mut ctx.terrain_cache,
            &*ctx.oracle,
            now,
            center,
            radius_km,
            alarm_type.constraint,
        ) {
            Ok(position) => {
                return Some(spawn(
                    ctx,
                    AlarmSpec {
                        kind: alarm_type.text,
                        constraint: alarm_type.constraint,
                        position,
                        origin_station: station,
                        relaxed_placement: false,
                    },
                ));
            }
            Err(err) => {
                tracing::debug!(kind = %alarm_type.text, error = %err, "reselecting alarm type");
                last_type = Some(alarm_type);
            }
        }
    }

    let alarm_type = last_type.unwrap_or_else(|| AlarmType::parse("Alarm"));
    tracing::warn!(%station, kind = %alarm_type.text, "spawn exhausted, using relaxed placement");
    let position = ctx.resolver.relaxed(
        &mut ctx.rng,
        &mut ctx.terrain_cache,
        &*ctx.oracle,
        now,
        center,
    );
    Some(spawn(
        ctx,
        AlarmSpec {
            kind: alarm_type.text,
            constraint: alarm_type.constraint,
            position,
            origin_station: station,
            relaxed_placement: true,
        },
    ))
}

fn spawn(ctx: &mut SimContext, spec: AlarmSpec) -> AlarmId {
    let relaxed = spec.relaxed_placement;
    let now = ctx.now();
    let id = world_setup::spawn_alarm(&mut ctx.world, &mut ctx.registry, spec, now);

    ctx.stats.alarms_created += 1;
    if relaxed {
        ctx.stats.relaxed_spawns += 1;
    }
    if let Some(entity) = ctx.registry.alarm(id) {
        if let Ok(info) = ctx.world.get::<&AlarmInfo>(entity) {
            tracing::info!(alarm = %id, kind = %info.kind, position = %info.position, "alarm created");
            ctx.notifier.alarm_created(&info);
        }
    }
    id
}

/// Count one arrival. Never lets `resolved` pass `dispatched`.
pub fn record_arrival(ctx: &mut SimContext, alarm: AlarmId) -> bool {
    let Some(entity) = ctx.registry.alarm(alarm) else {
        return false;
    };
    let Ok(mut info) = ctx.world.get::<&mut AlarmInfo>(entity) else {
        return false;
    };
    if info.resolved_count < info.dispatched_count {
        info.resolved_count += 1;
        true
    } else {
        tracing::warn!(%alarm, "arrival beyond dispatched count ignored");
        false
    }
}

/// Resolve the alarm if every dispatched vehicle has arrived.
///
/// Safe to call any number of times: a missing or unfinished alarm is a no-op.
pub fn check_resolution(ctx: &mut SimContext, alarm: AlarmId) -> bool {
    let Some(info) = ctx.alarm_info(alarm) else {
        return false;
    };
    if info.dispatched_count == 0 || info.dispatched_count != info.resolved_count {
        return false;
    }
    let secs = ctx.now() - info.created_at_secs;
    retire(ctx, alarm, ResponseTime::Elapsed { secs }).is_some()
}

/// Close an alarm regardless of arrivals.
///
/// Every vehicle still assigned to it is forced to standby at its station.
/// Returns false, with a warning, when the alarm does not exist.
pub fn resolve_manually(ctx: &mut SimContext, alarm: AlarmId) -> bool {
    if !ctx.alarm_is_active(alarm) {
        tracing::warn!(%alarm, "manual resolution of unknown alarm ignored");
        return false;
    }

    let assigned: Vec<VehicleId> = vehicles_where(ctx, |s| s.current_alarm == Some(alarm));
    for vehicle in assigned {
        if let Err(err) = ctx.apply_trigger(vehicle, StatusTrigger::ForceStandby) {
            tracing::warn!(%vehicle, error = %err, "could not reset vehicle");
            continue;
        }
        if let Err(err) = ctx.snap_home(vehicle) {
            tracing::warn!(%vehicle, error = %err, "could not snap vehicle home");
        }
        ctx.update_vehicle_state(vehicle, |s| s.current_alarm = None);
    }

    retire(ctx, alarm, ResponseTime::Manual).is_some()
}

/// Take an en-route vehicle off an alarm: one fewer dispatched, and no credit.
pub fn withdraw_vehicle(ctx: &mut SimContext, alarm: AlarmId, vehicle: VehicleId) {
    ctx.update_vehicle_state(vehicle, |s| {
        if s.current_alarm == Some(alarm) {
            s.current_alarm = None;
        }
        if s.last_dispatched_alarm == Some(alarm) {
            s.last_dispatched_alarm = None;
        }
    });

    if let Some(entity) = ctx.registry.alarm(alarm) {
        if let Ok(mut info) = ctx.world.get::<&mut AlarmInfo>(entity) {
            if info.dispatched_count > info.resolved_count {
                info.dispatched_count -= 1;
            }
        }
    }
    tracing::debug!(%alarm, %vehicle, "vehicle withdrawn from alarm");
    check_resolution(ctx, alarm);
}

/// Remove the alarm, log it, and notify. Credits every vehicle whose
/// last dispatched alarm is this one; manual closures credit nobody.
fn retire(ctx: &mut SimContext, alarm: AlarmId, response: ResponseTime) -> Option<MissionLogEntry> {
    let entity = ctx.registry.remove_alarm(alarm)?;
    let info = ctx.world.remove_one::<AlarmInfo>(entity).ok()?;
    let _ = ctx.world.despawn(entity);

    let manual = matches!(response, ResponseTime::Manual);
    let credited = vehicles_where(ctx, |s| s.last_dispatched_alarm == Some(alarm));
    let vehicles: Vec<String> = if manual {
        Vec::new()
    } else {
        credited
            .iter()
            .filter_map(|v| ctx.vehicle_info(*v).map(|i| i.name))
            .collect()
    };
    for vehicle in credited {
        ctx.update_vehicle_state(vehicle, |s| s.last_dispatched_alarm = None);
    }

    let now = ctx.now();
    let entry = MissionLogEntry {
        alarm_id: alarm,
        kind: info.kind.clone(),
        completed_at_secs: now,
        clock: format_clock(now),
        vehicles,
        response,
    };

    if manual {
        ctx.stats.alarms_manually_resolved += 1;
    } else {
        ctx.stats.alarms_resolved += 1;
    }
    tracing::info!(
        %alarm,
        kind = %info.kind,
        response = %response,
        vehicles = ?entry.vehicles,
        "alarm resolved"
    );
    ctx.notifier.alarm_resolved(&info, &entry);
    ctx.mission_log.push(entry.clone());
    Some(entry)
}

/// Vehicles whose runtime state matches, in id order.
fn vehicles_where(ctx: &SimContext, pred: impl Fn(&VehicleState) -> bool) -> Vec<VehicleId> {
    ctx.registry
        .vehicle_entries()
        .filter(|(_, entity)| {
            ctx.world
                .get::<&VehicleState>(*entity)
                .map(|s| pred(&*s))
                .unwrap_or(false)
        })
        .map(|(id, _)| id)
        .collect()
}
