//! Movement scheduler: cancellable per-vehicle tasks driven by the tick.
//!
//! Each vehicle owns at most one task. A task is either a journey along a
//! polyline or an on-scene dwell. Starting a task for a vehicle that already
//! has one cancels the old task first, so two live tasks for the same
//! vehicle cannot exist.
//!
//! Journeys interpolate by distance along the path. The step count is
//! `ceil(duration / tick)`, so every journey takes the configured travel
//! time no matter how long the path is.

use std::collections::BTreeMap;

use hecs::World;

use responder_core::components::VehicleState;
use responder_core::types::{AlarmId, GeoPoint, VehicleId};

use crate::registry::Registry;

/// Unique id of one started task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

/// Proof of ownership for a running task. Cancelling with a stale handle
/// is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelHandle {
    pub vehicle: VehicleId,
    pub task: TaskId,
}

/// What the engine should do when a task finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrivalAction {
    /// Reached the alarm position.
    AtAlarm(AlarmId),
    /// Reached the home station.
    Home,
    /// Reached a patrol waypoint.
    PatrolWaypoint,
    /// On-scene dwell for the alarm is over.
    DwellElapsed(AlarmId),
}

/// A finished task reported by [`MovementScheduler::advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    pub vehicle: VehicleId,
    pub action: ArrivalAction,
}

/// Lifetime counters, used by invariant checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub started: u64,
    pub cancelled: u64,
    pub completed: u64,
}

#[derive(Debug, Clone)]
struct Journey {
    path: Vec<GeoPoint>,
    /// Distance from the path start to each vertex (meters).
    cumulative_m: Vec<f64>,
    total_steps: u32,
    step: u32,
}

impl Journey {
    fn new(path: Vec<GeoPoint>, total_steps: u32) -> Self {
        let mut cumulative_m = Vec::with_capacity(path.len());
        let mut acc = 0.0;
        for (i, p) in path.iter().enumerate() {
            if i > 0 {
                acc += path[i - 1].distance_m(p);
            }
            cumulative_m.push(acc);
        }
        Self {
            path,
            cumulative_m,
            total_steps,
            step: 0,
        }
    }

    fn total_m(&self) -> f64 {
        self.cumulative_m.last().copied().unwrap_or(0.0)
    }

    fn destination(&self) -> Option<GeoPoint> {
        self.path.last().copied()
    }

    /// Point at a fraction of the total path length.
    fn point_at(&self, fraction: f64) -> Option<GeoPoint> {
        let total = self.total_m();
        if total <= 0.0 {
            return self.destination();
        }
        let target = total * fraction.clamp(0.0, 1.0);
        let idx = self.cumulative_m.partition_point(|d| *d < target);
        if idx == 0 {
            return self.path.first().copied();
        }
        if idx >= self.path.len() {
            return self.destination();
        }
        let seg_start = self.cumulative_m[idx - 1];
        let seg_len = self.cumulative_m[idx] - seg_start;
        let t = if seg_len > 0.0 {
            (target - seg_start) / seg_len
        } else {
            1.0
        };
        Some(self.path[idx - 1].lerp(&self.path[idx], t))
    }
}

#[derive(Debug, Clone)]
enum Activity {
    Travel(Journey),
    Dwell { remaining_ticks: u32 },
}

#[derive(Debug, Clone)]
struct Task {
    id: TaskId,
    activity: Activity,
    on_complete: ArrivalAction,
}

pub struct MovementScheduler {
    tick_secs: f64,
    tasks: BTreeMap<VehicleId, Task>,
    next_task: u64,
    stats: SchedulerStats,
}

impl MovementScheduler {
    pub fn new(tick_secs: f64) -> Self {
        Self {
            tick_secs,
            tasks: BTreeMap::new(),
            next_task: 0,
            stats: SchedulerStats::default(),
        }
    }

    /// Start a journey along `path` lasting about `duration_secs`.
    ///
    /// Any task the vehicle already has is cancelled first. An empty path
    /// completes on the next tick without moving the vehicle.
    pub fn start_travel(
        &mut self,
        vehicle: VehicleId,
        path: Vec<GeoPoint>,
        duration_secs: f64,
        on_complete: ArrivalAction,
    ) -> CancelHandle {
        let steps = self.steps_for(duration_secs);
        self.start(vehicle, Activity::Travel(Journey::new(path, steps)), on_complete)
    }

    /// Start an on-scene dwell lasting `duration_secs`.
    pub fn start_dwell(
        &mut self,
        vehicle: VehicleId,
        duration_secs: f64,
        alarm: AlarmId,
    ) -> CancelHandle {
        let remaining_ticks = self.steps_for(duration_secs);
        self.start(
            vehicle,
            Activity::Dwell { remaining_ticks },
            ArrivalAction::DwellElapsed(alarm),
        )
    }

    fn start(
        &mut self,
        vehicle: VehicleId,
        activity: Activity,
        on_complete: ArrivalAction,
    ) -> CancelHandle {
        self.cancel_vehicle(vehicle);
        self.next_task += 1;
        let id = TaskId(self.next_task);
        self.tasks.insert(
            vehicle,
            Task {
                id,
                activity,
                on_complete,
            },
        );
        self.stats.started += 1;
        tracing::trace!(%vehicle, task = id.0, ?on_complete, "task started");
        CancelHandle { vehicle, task: id }
    }

    fn steps_for(&self, duration_secs: f64) -> u32 {
        ((duration_secs / self.tick_secs).ceil() as u32).max(1)
    }

    /// Cancel the task the handle refers to. Returns false if that task is
    /// no longer live.
    pub fn cancel(&mut self, handle: CancelHandle) -> bool {
        match self.tasks.get(&handle.vehicle) {
            Some(task) if task.id == handle.task => self.cancel_vehicle(handle.vehicle),
            _ => false,
        }
    }

    /// Cancel whatever task the vehicle has. Returns whether one existed.
    pub fn cancel_vehicle(&mut self, vehicle: VehicleId) -> bool {
        match self.tasks.remove(&vehicle) {
            Some(task) => {
                self.stats.cancelled += 1;
                tracing::trace!(%vehicle, task = task.id.0, "task cancelled");
                true
            }
            None => false,
        }
    }

    pub fn has_task(&self, vehicle: VehicleId) -> bool {
        self.tasks.contains_key(&vehicle)
    }

    /// Handle of the vehicle's live task.
    pub fn handle(&self, vehicle: VehicleId) -> Option<CancelHandle> {
        self.tasks.get(&vehicle).map(|t| CancelHandle {
            vehicle,
            task: t.id,
        })
    }

    /// Action the vehicle's live task will report on completion.
    pub fn pending_action(&self, vehicle: VehicleId) -> Option<ArrivalAction> {
        self.tasks.get(&vehicle).map(|t| t.on_complete)
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// Drop every task without counting cancellations.
    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    /// Advance every task by one tick and move vehicles.
    ///
    /// Finished tasks are removed before the completions are returned, so
    /// the caller may start follow-up tasks immediately.
    pub fn advance(&mut self, world: &mut World, registry: &Registry) -> Vec<Completion> {
        let mut finished: Vec<VehicleId> = Vec::new();

        for (vehicle, task) in self.tasks.iter_mut() {
            match &mut task.activity {
                Activity::Travel(journey) => {
                    journey.step += 1;
                    let done = journey.step >= journey.total_steps;
                    let fraction = journey.step as f64 / journey.total_steps as f64;
                    let point = if done {
                        journey.destination()
                    } else {
                        journey.point_at(fraction)
                    };
                    if let (Some(point), Some(entity)) = (point, registry.vehicle(*vehicle)) {
                        if let Ok(mut state) = world.get::<&mut VehicleState>(entity) {
                            state.position = point;
                        }
                    }
                    if done {
                        finished.push(*vehicle);
                    }
                }
                Activity::Dwell { remaining_ticks } => {
                    *remaining_ticks = remaining_ticks.saturating_sub(1);
                    if *remaining_ticks == 0 {
                        finished.push(*vehicle);
                    }
                }
            }
        }

        finished
            .into_iter()
            .filter_map(|vehicle| self.finish(vehicle))
            .collect()
    }

    /// Complete a vehicle's task immediately, snapping it to the destination.
    pub fn complete_now(&mut self, world: &mut World, registry: &Registry, vehicle: VehicleId) -> Option<Completion> {
        if let Some(Activity::Travel(journey)) = self.tasks.get(&vehicle).map(|t| &t.activity) {
            if let (Some(point), Some(entity)) = (journey.destination(), registry.vehicle(vehicle)) {
                if let Ok(mut state) = world.get::<&mut VehicleState>(entity) {
                    state.position = point;
                }
            }
        }
        self.finish(vehicle)
    }

    fn finish(&mut self, vehicle: VehicleId) -> Option<Completion> {
        let task = self.tasks.remove(&vehicle)?;
        self.stats.completed += 1;
        Some(Completion {
            vehicle,
            action: task.on_complete,
        })
    }
}
