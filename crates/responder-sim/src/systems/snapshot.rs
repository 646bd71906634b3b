//! Snapshot system: queries the ECS world and builds a complete SimSnapshot.
//!
//! This system is read-only. It never modifies the world.

use hecs::World;

use responder_core::components::*;
use responder_core::events::SimEvent;
use responder_core::state::*;

use crate::context::SimContext;
use crate::systems::movement::MovementScheduler;

/// Build a complete SimSnapshot from the current context. Only mission log
/// entries from `log_start` on are copied; the full log stays borrowable
/// through the engine.
pub fn build_snapshot(
    ctx: &SimContext,
    paused: bool,
    events: Vec<SimEvent>,
    log_start: usize,
) -> SimSnapshot {
    let vehicles = build_vehicles(&ctx.world, &ctx.scheduler);
    SimSnapshot {
        time: ctx.time,
        paused,
        stations: build_stations(&ctx.world, &vehicles),
        alarms: build_alarms(&ctx.world, ctx.now()),
        vehicles,
        new_log_entries: ctx.mission_log.get(log_start..).unwrap_or_default().to_vec(),
        log_len: ctx.mission_log.len(),
        events,
        stats: ctx.stats,
    }
}

/// Build StationView list, each with the ids of its vehicles.
fn build_stations(world: &World, vehicles: &[VehicleView]) -> Vec<StationView> {
    let mut stations: Vec<StationView> = world
        .query::<&StationInfo>()
        .iter()
        .map(|(_, info)| StationView {
            id: info.id,
            name: info.name.clone(),
            position: info.position,
            vehicles: vehicles
                .iter()
                .filter(|v| v.home == info.id)
                .map(|v| v.id)
                .collect(),
        })
        .collect();

    stations.sort_by_key(|s| s.id);
    stations
}

fn build_vehicles(world: &World, scheduler: &MovementScheduler) -> Vec<VehicleView> {
    let mut vehicles: Vec<VehicleView> = world
        .query::<(&VehicleInfo, &VehicleState)>()
        .iter()
        .map(|(_, (info, state))| VehicleView {
            id: info.id,
            name: info.name.clone(),
            kind: info.kind.clone(),
            category: info.category,
            home: info.home,
            status: state.status,
            position: state.position,
            current_alarm: state.current_alarm,
            last_dispatched_alarm: state.last_dispatched_alarm,
            has_task: scheduler.has_task(info.id),
        })
        .collect();

    vehicles.sort_by_key(|v| v.id);
    vehicles
}

fn build_alarms(world: &World, now_secs: f64) -> Vec<AlarmView> {
    let mut alarms: Vec<AlarmView> = world
        .query::<&AlarmInfo>()
        .iter()
        .map(|(_, info)| AlarmView {
            id: info.id,
            kind: info.kind.clone(),
            constraint: info.constraint,
            position: info.position,
            dispatched_count: info.dispatched_count,
            resolved_count: info.resolved_count,
            age_secs: (now_secs - info.created_at_secs).max(0.0),
        })
        .collect();

    alarms.sort_by_key(|a| a.id);
    alarms
}
