//! Automatic operator: sends the nearest free vehicle to every new alarm.
//!
//! Water alarms prefer aerial units when one is free.

use responder_core::commands::DispatchCommand;
use responder_core::enums::{TerrainConstraint, VehicleCategory};
use responder_core::state::{AlarmView, SimSnapshot, VehicleView};
use responder_core::types::VehicleId;

#[derive(Debug, Clone, Copy, Default)]
pub struct AutoDispatcher;

impl AutoDispatcher {
    pub fn new() -> Self {
        Self
    }

    /// Commands for every alarm that has nobody assigned yet. A vehicle is
    /// used at most once per call.
    pub fn plan(&self, snapshot: &SimSnapshot) -> Vec<DispatchCommand> {
        let mut taken: Vec<VehicleId> = Vec::new();
        let mut commands = Vec::new();

        for alarm in snapshot.alarms.iter().filter(|a| a.dispatched_count == 0) {
            let free: Vec<&VehicleView> = snapshot
                .vehicles
                .iter()
                .filter(|v| v.status.is_dispatchable() && !taken.contains(&v.id))
                .collect();
            let Some(vehicle) = choose(alarm, &free) else {
                tracing::debug!(alarm = %alarm.id, "no free vehicle for alarm");
                continue;
            };
            taken.push(vehicle);
            commands.push(DispatchCommand::Dispatch {
                alarm: alarm.id,
                vehicles: vec![vehicle],
            });
        }
        commands
    }
}

fn choose(alarm: &AlarmView, free: &[&VehicleView]) -> Option<VehicleId> {
    if alarm.constraint == TerrainConstraint::WaterOnly {
        let aerial: Vec<&VehicleView> = free
            .iter()
            .copied()
            .filter(|v| v.category == VehicleCategory::Aerial)
            .collect();
        if let Some(id) = nearest(alarm, &aerial) {
            return Some(id);
        }
    }
    nearest(alarm, free)
}

fn nearest(alarm: &AlarmView, candidates: &[&VehicleView]) -> Option<VehicleId> {
    candidates
        .iter()
        .min_by(|a, b| {
            let da = a.position.distance_km(&alarm.position);
            let db = b.position.distance_km(&alarm.position);
            da.total_cmp(&db).then(a.id.cmp(&b.id))
        })
        .map(|v| v.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    use responder_core::enums::VehicleStatus;
    use responder_core::types::{AlarmId, GeoPoint, StationId};

    fn vehicle(id: u32, lat: f64, category: VehicleCategory, status: VehicleStatus) -> VehicleView {
        VehicleView {
            id: VehicleId(id),
            name: format!("V-{id}"),
            kind: "test".into(),
            category,
            home: StationId(1),
            status,
            position: GeoPoint::new(lat, 10.0),
            current_alarm: None,
            last_dispatched_alarm: None,
            has_task: false,
        }
    }

    fn alarm(id: u64, lat: f64, constraint: TerrainConstraint, dispatched: u32) -> AlarmView {
        AlarmView {
            id: AlarmId(id),
            kind: "test".into(),
            constraint,
            position: GeoPoint::new(lat, 10.0),
            dispatched_count: dispatched,
            resolved_count: 0,
            age_secs: 0.0,
        }
    }

    #[test]
    fn test_nearest_free_vehicle_is_sent() {
        let snapshot = SimSnapshot {
            vehicles: vec![
                vehicle(1, 56.0, VehicleCategory::Ground, VehicleStatus::Standby),
                vehicle(2, 56.5, VehicleCategory::Ground, VehicleStatus::Standby),
                vehicle(3, 56.49, VehicleCategory::Ground, VehicleStatus::EnRoute),
            ],
            alarms: vec![
                alarm(1, 56.5, TerrainConstraint::LandOnly, 0),
                alarm(2, 56.5, TerrainConstraint::LandOnly, 0),
                alarm(3, 56.5, TerrainConstraint::LandOnly, 1),
            ],
            ..Default::default()
        };
        let commands = AutoDispatcher::new().plan(&snapshot);
        assert_eq!(commands.len(), 2, "Alarm 3 is already covered");
        assert!(matches!(
            &commands[0],
            DispatchCommand::Dispatch { alarm, vehicles } if *alarm == AlarmId(1) && vehicles == &vec![VehicleId(2)]
        ));
        assert!(matches!(
            &commands[1],
            DispatchCommand::Dispatch { vehicles, .. } if vehicles == &vec![VehicleId(1)]
        ));
    }

    #[test]
    fn test_water_alarm_prefers_aerial() {
        let snapshot = SimSnapshot {
            vehicles: vec![
                vehicle(1, 56.5, VehicleCategory::Ground, VehicleStatus::Standby),
                vehicle(2, 55.0, VehicleCategory::Aerial, VehicleStatus::Patrolling),
            ],
            alarms: vec![alarm(1, 56.5, TerrainConstraint::WaterOnly, 0)],
            ..Default::default()
        };
        let commands = AutoDispatcher::new().plan(&snapshot);
        assert!(matches!(
            &commands[0],
            DispatchCommand::Dispatch { vehicles, .. } if vehicles == &vec![VehicleId(2)]
        ));
    }

    #[test]
    fn test_no_free_vehicle_no_command() {
        let snapshot = SimSnapshot {
            vehicles: vec![vehicle(1, 56.0, VehicleCategory::Ground, VehicleStatus::AtIncident)],
            alarms: vec![alarm(1, 56.5, TerrainConstraint::LandOnly, 0)],
            ..Default::default()
        };
        assert!(AutoDispatcher::new().plan(&snapshot).is_empty());
    }
}
