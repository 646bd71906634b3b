//! Collaborators the engine consumes: path geometry and presentation hooks.

use std::sync::{Arc, Mutex};

use thiserror::Error;

use responder_core::components::{AlarmInfo, VehicleInfo, VehicleState};
use responder_core::constants::MAX_PENDING_EVENTS;
use responder_core::enums::VehicleStatus;
use responder_core::events::SimEvent;
use responder_core::state::MissionLogEntry;
use responder_core::types::GeoPoint;

/// Path geometry between two points.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub coordinates: Vec<GeoPoint>,
    pub total_distance_m: f64,
}

impl Route {
    /// Two-point route along the great circle.
    pub fn direct(origin: GeoPoint, destination: GeoPoint) -> Self {
        Self {
            total_distance_m: origin.distance_m(&destination),
            coordinates: vec![origin, destination],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("route unavailable: {0}")]
    Unavailable(String),
}

/// Supplies road geometry for ground units.
pub trait RouteProvider {
    fn route(&self, origin: GeoPoint, destination: GeoPoint) -> Result<Route, RouteError>;
}

/// Routes everything as a straight line.
#[derive(Debug, Clone, Copy, Default)]
pub struct StraightLineRouter;

impl RouteProvider for StraightLineRouter {
    fn route(&self, origin: GeoPoint, destination: GeoPoint) -> Result<Route, RouteError> {
        Ok(Route::direct(origin, destination))
    }
}

/// Observer hooks called on every state change. Outcomes are ignored.
pub trait PresentationSink {
    fn on_vehicle_status_changed(
        &mut self,
        _vehicle: &VehicleInfo,
        _state: &VehicleState,
        _from: VehicleStatus,
    ) {
    }
    fn on_alarm_created(&mut self, _alarm: &AlarmInfo) {}
    fn on_alarm_resolved(&mut self, _alarm: &AlarmInfo, _entry: &MissionLogEntry) {}
}

/// Sink that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl PresentationSink for NullSink {}

/// Sink that records notifications into a shared buffer.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    records: Arc<Mutex<Vec<SimEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the recorded notifications.
    pub fn records(&self) -> Arc<Mutex<Vec<SimEvent>>> {
        Arc::clone(&self.records)
    }

    fn push(&self, event: SimEvent) {
        if let Ok(mut records) = self.records.lock() {
            records.push(event);
        }
    }
}

impl PresentationSink for RecordingSink {
    fn on_vehicle_status_changed(
        &mut self,
        vehicle: &VehicleInfo,
        state: &VehicleState,
        from: VehicleStatus,
    ) {
        self.push(SimEvent::VehicleStatusChanged {
            vehicle: vehicle.id,
            from,
            to: state.status,
        });
    }

    fn on_alarm_created(&mut self, alarm: &AlarmInfo) {
        self.push(SimEvent::AlarmCreated {
            alarm: alarm.id,
            kind: alarm.kind.clone(),
            position: alarm.position,
        });
    }

    fn on_alarm_resolved(&mut self, alarm: &AlarmInfo, entry: &MissionLogEntry) {
        self.push(SimEvent::AlarmResolved {
            alarm: alarm.id,
            response: entry.response,
        });
    }
}

/// Fans notifications out to the sink and the snapshot event buffer.
///
/// The buffer is bounded: when the API is driven without ticking, the oldest
/// events are dropped. The sink still sees every notification.
pub struct Notifier {
    sink: Box<dyn PresentationSink + Send>,
    pending: Vec<SimEvent>,
    capacity: usize,
    dropped: u64,
}

impl Notifier {
    pub fn new(sink: Box<dyn PresentationSink + Send>) -> Self {
        Self::with_capacity(sink, MAX_PENDING_EVENTS)
    }

    pub fn with_capacity(sink: Box<dyn PresentationSink + Send>, capacity: usize) -> Self {
        Self {
            sink,
            pending: Vec::new(),
            capacity: capacity.max(1),
            dropped: 0,
        }
    }

    pub fn set_sink(&mut self, sink: Box<dyn PresentationSink + Send>) {
        self.sink = sink;
    }

    pub fn vehicle_status_changed(
        &mut self,
        vehicle: &VehicleInfo,
        state: &VehicleState,
        from: VehicleStatus,
    ) {
        tracing::debug!(
            vehicle = %vehicle.id,
            name = %vehicle.name,
            from = %from,
            to = %state.status,
            "vehicle status changed"
        );
        self.sink.on_vehicle_status_changed(vehicle, state, from);
        self.push(SimEvent::VehicleStatusChanged {
            vehicle: vehicle.id,
            from,
            to: state.status,
        });
    }

    pub fn alarm_created(&mut self, alarm: &AlarmInfo) {
        self.sink.on_alarm_created(alarm);
        self.push(SimEvent::AlarmCreated {
            alarm: alarm.id,
            kind: alarm.kind.clone(),
            position: alarm.position,
        });
    }

    pub fn alarm_resolved(&mut self, alarm: &AlarmInfo, entry: &MissionLogEntry) {
        self.sink.on_alarm_resolved(alarm, entry);
        self.push(SimEvent::AlarmResolved {
            alarm: alarm.id,
            response: entry.response,
        });
    }

    /// Events dropped from the buffer so far.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Keeps between `capacity` and twice that many of the newest events.
    fn push(&mut self, event: SimEvent) {
        self.pending.push(event);
        if self.pending.len() >= self.capacity * 2 {
            let excess = self.pending.len() - self.capacity;
            self.pending.drain(..excess);
            self.dropped += excess as u64;
            tracing::warn!(
                dropped = excess,
                "event buffer full, oldest undrained events dropped"
            );
        }
    }

    /// Events raised since the last drain.
    pub fn pending(&self) -> &[SimEvent] {
        &self.pending
    }

    pub fn drain(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use responder_core::enums::TerrainConstraint;
    use responder_core::types::{AlarmId, StationId};

    fn alarm(id: u32) -> AlarmInfo {
        AlarmInfo {
            id: AlarmId(id.into()),
            kind: "Fall injury".into(),
            constraint: TerrainConstraint::LandOnly,
            position: GeoPoint::new(56.0, 9.5),
            origin_station: StationId(1),
            created_at_secs: 0.0,
            dispatched_count: 0,
            resolved_count: 0,
            relaxed_placement: false,
        }
    }

    #[test]
    fn test_undrained_buffer_is_bounded() {
        let sink = RecordingSink::new();
        let records = sink.records();
        let mut notifier = Notifier::with_capacity(Box::new(sink), 8);
        for id in 1..=100 {
            notifier.alarm_created(&alarm(id));
        }

        let kept = notifier.pending().len();
        assert!((8..16).contains(&kept), "Buffer holds {kept} events");
        assert_eq!(notifier.dropped() as usize + kept, 100);
        assert!(
            matches!(notifier.pending().last(), Some(SimEvent::AlarmCreated { alarm, .. }) if *alarm == AlarmId(100)),
            "Newest event is kept"
        );
        assert_eq!(records.lock().unwrap().len(), 100, "Sink sees everything");

        assert_eq!(notifier.drain().len(), kept);
        assert!(notifier.pending().is_empty());
    }
}
