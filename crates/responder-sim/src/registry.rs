//! Stable id to entity index.
//!
//! Ids are allocated from counters that only grow, so a removed station,
//! vehicle, or alarm id is never handed out again, even across fleet reloads.
//! Ordered maps keep iteration deterministic.

use std::collections::BTreeMap;

use hecs::Entity;

use responder_core::types::{AlarmId, StationId, VehicleId};

#[derive(Debug, Default)]
pub struct Registry {
    stations: BTreeMap<StationId, Entity>,
    vehicles: BTreeMap<VehicleId, Entity>,
    alarms: BTreeMap<AlarmId, Entity>,
    next_station: u32,
    next_vehicle: u32,
    next_alarm: u64,
}

impl Registry {
    pub fn station(&self, id: StationId) -> Option<Entity> {
        self.stations.get(&id).copied()
    }

    pub fn vehicle(&self, id: VehicleId) -> Option<Entity> {
        self.vehicles.get(&id).copied()
    }

    pub fn alarm(&self, id: AlarmId) -> Option<Entity> {
        self.alarms.get(&id).copied()
    }

    pub fn station_ids(&self) -> Vec<StationId> {
        self.stations.keys().copied().collect()
    }

    pub fn vehicle_ids(&self) -> Vec<VehicleId> {
        self.vehicles.keys().copied().collect()
    }

    pub fn alarm_ids(&self) -> Vec<AlarmId> {
        self.alarms.keys().copied().collect()
    }

    pub fn vehicle_entries(&self) -> impl Iterator<Item = (VehicleId, Entity)> + '_ {
        self.vehicles.iter().map(|(id, e)| (*id, *e))
    }

    pub fn alarm_count(&self) -> usize {
        self.alarms.len()
    }

    pub fn insert_station(&mut self, entity: Entity) -> StationId {
        self.next_station += 1;
        let id = StationId(self.next_station);
        self.stations.insert(id, entity);
        id
    }

    pub fn insert_vehicle(&mut self, entity: Entity) -> VehicleId {
        self.next_vehicle += 1;
        let id = VehicleId(self.next_vehicle);
        self.vehicles.insert(id, entity);
        id
    }

    pub fn insert_alarm(&mut self, entity: Entity) -> AlarmId {
        self.next_alarm += 1;
        let id = AlarmId(self.next_alarm);
        self.alarms.insert(id, entity);
        id
    }

    pub fn remove_station(&mut self, id: StationId) -> Option<Entity> {
        self.stations.remove(&id)
    }

    pub fn remove_vehicle(&mut self, id: VehicleId) -> Option<Entity> {
        self.vehicles.remove(&id)
    }

    pub fn remove_alarm(&mut self, id: AlarmId) -> Option<Entity> {
        self.alarms.remove(&id)
    }

    /// Forget every entity. Counters keep running.
    pub fn clear(&mut self) {
        self.stations.clear();
        self.vehicles.clear();
        self.alarms.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_never_reused() {
        let mut world = hecs::World::new();
        let mut registry = Registry::default();
        let a = registry.insert_alarm(world.spawn((1u8,)));
        let b = registry.insert_alarm(world.spawn((2u8,)));
        assert_eq!(a, AlarmId(1));
        assert_eq!(b, AlarmId(2));

        registry.remove_alarm(b);
        registry.clear();
        let c = registry.insert_alarm(world.spawn((3u8,)));
        assert_eq!(c, AlarmId(3), "Removed ids must not be handed out again");
        assert!(registry.alarm(a).is_none());
    }
}
