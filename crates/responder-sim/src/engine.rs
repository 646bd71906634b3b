//! Simulation engine: the core of the dispatcher.
//!
//! `SimulationEngine` owns the hecs ECS world, processes operator commands,
//! runs all systems, and produces `SimSnapshot`s. Completely headless, which
//! keeps it deterministic for a given seed and command stream.
//!
//! Commands can be queued for the next tick or applied directly through the
//! API methods. Both paths run on the caller's thread; nothing in here is
//! shared across threads.

use std::collections::VecDeque;

use hecs::World;

use responder_core::commands::DispatchCommand;
use responder_core::config::SimConfig;
use responder_core::enums::TerrainConstraint;
use responder_core::error::DispatchError;
use responder_core::state::{DispatchStats, MissionLogEntry, SimSnapshot};
use responder_core::types::{AlarmId, GeoPoint, SimTime, StationId, VehicleId};
use responder_terrain::TerrainOracle;

use crate::context::SimContext;
use crate::fleet::{self, FleetConfig};
use crate::providers::{PresentationSink, RouteProvider};
use crate::systems;
use crate::systems::movement::SchedulerStats;
use crate::systems::spawner::AlarmSchedule;

/// The simulation engine. Owns the ECS world and all sim state.
pub struct SimulationEngine {
    ctx: SimContext,
    command_queue: VecDeque<DispatchCommand>,
    paused: bool,
    alarm_schedule: AlarmSchedule,
    /// Mission log length at the last published snapshot.
    log_cursor: usize,
}

impl SimulationEngine {
    /// Create a new engine with no stations, the built-in terrain heuristic,
    /// straight-line routing and no presentation sink.
    pub fn new(config: SimConfig) -> Self {
        let alarm_schedule = AlarmSchedule::new(config.spawn.auto_interval_secs);
        Self {
            ctx: SimContext::new(config),
            command_queue: VecDeque::new(),
            paused: false,
            alarm_schedule,
            log_cursor: 0,
        }
    }

    pub fn with_oracle(mut self, oracle: Box<dyn TerrainOracle + Send>) -> Self {
        self.ctx.oracle = oracle;
        self
    }

    pub fn with_router(mut self, router: Box<dyn RouteProvider + Send>) -> Self {
        self.ctx.router = router;
        self
    }

    pub fn with_sink(mut self, sink: Box<dyn PresentationSink + Send>) -> Self {
        self.ctx.notifier.set_sink(sink);
        self
    }

    /// Queue an operator command for processing at the next tick boundary.
    pub fn queue_command(&mut self, command: DispatchCommand) {
        self.command_queue.push_back(command);
    }

    /// Queue multiple commands.
    pub fn queue_commands(&mut self, commands: impl IntoIterator<Item = DispatchCommand>) {
        self.command_queue.extend(commands);
    }

    /// Advance the simulation by one tick and return the resulting snapshot.
    pub fn tick(&mut self) -> SimSnapshot {
        self.process_commands();

        if !self.paused {
            self.run_systems();
            let dt = self.ctx.config.tick_secs();
            self.ctx.time.advance(dt);
            let purged = self.ctx.terrain_cache.purge_expired(self.ctx.now());
            if purged > 0 {
                tracing::trace!(purged, "expired terrain entries dropped");
            }
        }

        let events = self.ctx.notifier.drain();
        let log_start = self.log_start();
        self.log_cursor = self.ctx.mission_log.len();
        systems::snapshot::build_snapshot(&self.ctx, self.paused, events, log_start)
    }

    /// Current state without consuming pending events or log entries.
    pub fn snapshot(&self) -> SimSnapshot {
        systems::snapshot::build_snapshot(
            &self.ctx,
            self.paused,
            self.ctx.notifier.pending().to_vec(),
            self.log_start(),
        )
    }

    /// First mission log index not yet published.
    fn log_start(&self) -> usize {
        self.log_cursor.min(self.ctx.mission_log.len())
    }

    pub fn time(&self) -> SimTime {
        self.ctx.time
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn config(&self) -> &SimConfig {
        &self.ctx.config
    }

    /// Get a read-only reference to the ECS world.
    pub fn world(&self) -> &World {
        &self.ctx.world
    }

    pub fn mission_log(&self) -> &[MissionLogEntry] {
        &self.ctx.mission_log
    }

    pub fn stats(&self) -> DispatchStats {
        self.ctx.stats
    }

    pub fn scheduler_stats(&self) -> SchedulerStats {
        self.ctx.scheduler.stats()
    }

    pub fn context(&self) -> &SimContext {
        &self.ctx
    }

    // --- Dispatch API ---

    /// Spawn an alarm near `station`. `None` radius uses the configured default.
    pub fn create_alarm(
        &mut self,
        station: StationId,
        radius_km: Option<f64>,
        constraint: TerrainConstraint,
    ) -> Result<AlarmId, DispatchError> {
        let radius_km = radius_km.unwrap_or(self.ctx.config.spawn.default_radius_km);
        systems::alarms::create_alarm(&mut self.ctx, station, radius_km, constraint)
    }

    pub fn create_random_alarm(&mut self) -> Option<AlarmId> {
        systems::alarms::create_random_alarm(&mut self.ctx)
    }

    pub fn dispatch(&mut self, alarm: AlarmId, vehicles: &[VehicleId]) -> Result<(), DispatchError> {
        systems::dispatch::dispatch(&mut self.ctx, alarm, vehicles)
    }

    /// Close an alarm without waiting for arrivals. Unknown ids are ignored
    /// with a warning.
    pub fn resolve_manually(&mut self, alarm: AlarmId) -> bool {
        systems::alarms::resolve_manually(&mut self.ctx, alarm)
    }

    pub fn check_resolution(&mut self, alarm: AlarmId) -> bool {
        systems::alarms::check_resolution(&mut self.ctx, alarm)
    }

    pub fn start_patrol(&mut self, vehicle: VehicleId) -> Result<(), DispatchError> {
        systems::patrol::start_patrol(&mut self.ctx, vehicle)
    }

    pub fn stop_patrol(&mut self, vehicle: VehicleId) -> Result<(), DispatchError> {
        systems::patrol::stop_patrol(&mut self.ctx, vehicle)
    }

    pub fn send_home(&mut self, vehicle: VehicleId) -> Result<(), DispatchError> {
        systems::dispatch::send_home(&mut self.ctx, vehicle)
    }

    // --- Fleet ---

    pub fn add_station(&mut self, name: impl Into<String>, position: GeoPoint) -> StationId {
        fleet::add_station(&mut self.ctx, name.into(), position)
    }

    pub fn rename_station(
        &mut self,
        station: StationId,
        name: impl Into<String>,
    ) -> Result<(), DispatchError> {
        fleet::rename_station(&mut self.ctx, station, name.into())
    }

    pub fn remove_station(&mut self, station: StationId) -> Result<(), DispatchError> {
        fleet::remove_station(&mut self.ctx, station)
    }

    pub fn add_vehicle(
        &mut self,
        station: StationId,
        name: impl Into<String>,
        kind: impl Into<String>,
    ) -> Result<VehicleId, DispatchError> {
        fleet::add_vehicle(&mut self.ctx, station, name.into(), kind.into())
    }

    pub fn remove_vehicle(&mut self, vehicle: VehicleId) -> Result<(), DispatchError> {
        fleet::remove_vehicle(&mut self.ctx, vehicle)
    }

    pub fn load_fleet(&mut self, fleet: &FleetConfig) {
        fleet::load(&mut self.ctx, fleet);
        self.log_cursor = 0;
    }

    pub fn export_fleet(&self) -> FleetConfig {
        fleet::export(&self.ctx)
    }

    /// Drop every cached terrain classification. Returns how many were dropped.
    pub fn clear_terrain_cache(&mut self) -> usize {
        self.ctx.terrain_cache.clear()
    }

    /// Finish a vehicle's running task immediately, as if its timer ran out.
    #[cfg(test)]
    pub fn complete_task(&mut self, vehicle: VehicleId) -> bool {
        let completion =
            self.ctx
                .scheduler
                .complete_now(&mut self.ctx.world, &self.ctx.registry, vehicle);
        match completion {
            Some(completion) => {
                systems::dispatch::handle_completion(&mut self.ctx, completion);
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub fn context_mut(&mut self) -> &mut SimContext {
        &mut self.ctx
    }

    /// Process all queued commands.
    fn process_commands(&mut self) {
        while let Some(command) = self.command_queue.pop_front() {
            self.handle_command(command);
        }
    }

    /// Handle a single operator command. Rejections are logged and dropped.
    fn handle_command(&mut self, command: DispatchCommand) {
        let result = match command.clone() {
            DispatchCommand::CreateAlarm {
                station,
                radius_km,
                constraint,
            } => self.create_alarm(station, radius_km, constraint).map(|_| ()),
            DispatchCommand::CreateRandomAlarm => {
                if self.create_random_alarm().is_none() {
                    tracing::warn!("no stations to spawn a random alarm around");
                }
                Ok(())
            }
            DispatchCommand::Dispatch { alarm, vehicles } => self.dispatch(alarm, &vehicles),
            DispatchCommand::ResolveManually { alarm } => {
                self.resolve_manually(alarm);
                Ok(())
            }
            DispatchCommand::StartPatrol { vehicle } => self.start_patrol(vehicle),
            DispatchCommand::StopPatrol { vehicle } => self.stop_patrol(vehicle),
            DispatchCommand::SendHome { vehicle } => self.send_home(vehicle),
            DispatchCommand::AddStation { name, position } => {
                self.add_station(name, position);
                Ok(())
            }
            DispatchCommand::RenameStation { station, name } => self.rename_station(station, name),
            DispatchCommand::RemoveStation { station } => self.remove_station(station),
            DispatchCommand::AddVehicle {
                station,
                name,
                kind,
            } => self.add_vehicle(station, name, kind).map(|_| ()),
            DispatchCommand::RemoveVehicle { vehicle } => self.remove_vehicle(vehicle),
            DispatchCommand::ClearTerrainCache => {
                self.clear_terrain_cache();
                Ok(())
            }
            DispatchCommand::Pause => {
                self.paused = true;
                Ok(())
            }
            DispatchCommand::Resume => {
                self.paused = false;
                Ok(())
            }
        };
        if let Err(err) = result {
            tracing::warn!(?command, error = %err, "command rejected");
        }
    }

    /// Run all systems in order.
    fn run_systems(&mut self) {
        // 1. Periodic alarm spawning
        if self.alarm_schedule.poll(self.ctx.now()) {
            systems::alarms::create_random_alarm(&mut self.ctx);
        }
        // 2. Movement and dwell timers
        let completions = self
            .ctx
            .scheduler
            .advance(&mut self.ctx.world, &self.ctx.registry);
        // 3. State transitions for finished tasks
        for completion in completions {
            systems::dispatch::handle_completion(&mut self.ctx, completion);
        }
    }
}
