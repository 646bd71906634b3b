//! Mutable simulation state shared by the systems.
//!
//! The engine owns one `SimContext` and hands `&mut` to systems, which keeps
//! every mutation on a single execution context.

use hecs::{Entity, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use responder_core::components::{AlarmInfo, StationInfo, VehicleInfo, VehicleState};
use responder_core::config::SimConfig;
use responder_core::enums::{StatusTrigger, VehicleCategory};
use responder_core::error::DispatchError;
use responder_core::state::{DispatchStats, MissionLogEntry};
use responder_core::types::{AlarmId, GeoPoint, SimTime, StationId, VehicleId};
use responder_fsm::fsm::{self, StatusUpdate, VehicleContext};
use responder_fsm::profiles::{get_profile, travel_time_secs};
use responder_terrain::{NoOracle, TerrainClassificationCache, TerrainOracle};

use crate::providers::{NullSink, Notifier, RouteProvider, StraightLineRouter};
use crate::registry::Registry;
use crate::systems::movement::{ArrivalAction, CancelHandle, MovementScheduler};
use crate::systems::spawner::{AlarmCatalog, SpawnLocationResolver};

pub struct SimContext {
    pub world: World,
    pub registry: Registry,
    pub config: SimConfig,
    pub time: SimTime,
    pub rng: ChaCha8Rng,
    pub scheduler: MovementScheduler,
    pub terrain_cache: TerrainClassificationCache,
    pub oracle: Box<dyn TerrainOracle + Send>,
    pub router: Box<dyn RouteProvider + Send>,
    pub notifier: Notifier,
    pub catalog: AlarmCatalog,
    pub resolver: SpawnLocationResolver,
    pub mission_log: Vec<MissionLogEntry>,
    pub stats: DispatchStats,
}

impl SimContext {
    pub fn new(config: SimConfig) -> Self {
        Self {
            world: World::new(),
            registry: Registry::default(),
            time: SimTime::default(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            scheduler: MovementScheduler::new(config.tick_secs()),
            terrain_cache: TerrainClassificationCache::new(&config.terrain),
            oracle: Box::new(NoOracle),
            router: Box::new(StraightLineRouter),
            notifier: Notifier::new(Box::new(NullSink)),
            catalog: AlarmCatalog::from_config(&config),
            resolver: SpawnLocationResolver::new(&config.spawn),
            mission_log: Vec::new(),
            stats: DispatchStats::default(),
            config,
        }
    }

    pub fn now(&self) -> f64 {
        self.time.elapsed_secs
    }

    // --- Lookups ---

    pub fn vehicle_entity(&self, id: VehicleId) -> Result<Entity, DispatchError> {
        self.registry
            .vehicle(id)
            .ok_or(DispatchError::VehicleNotFound(id))
    }

    pub fn alarm_entity(&self, id: AlarmId) -> Result<Entity, DispatchError> {
        self.registry.alarm(id).ok_or(DispatchError::AlarmNotFound(id))
    }

    pub fn station_entity(&self, id: StationId) -> Result<Entity, DispatchError> {
        self.registry
            .station(id)
            .ok_or(DispatchError::StationNotFound(id))
    }

    pub fn station_position(&self, id: StationId) -> Option<GeoPoint> {
        let entity = self.registry.station(id)?;
        self.world.get::<&StationInfo>(entity).ok().map(|s| s.position)
    }

    pub fn vehicle_state(&self, id: VehicleId) -> Option<VehicleState> {
        let entity = self.registry.vehicle(id)?;
        self.world.get::<&VehicleState>(entity).ok().map(|s| (*s).clone())
    }

    pub fn vehicle_info(&self, id: VehicleId) -> Option<VehicleInfo> {
        let entity = self.registry.vehicle(id)?;
        self.world.get::<&VehicleInfo>(entity).ok().map(|s| (*s).clone())
    }

    pub fn alarm_info(&self, id: AlarmId) -> Option<AlarmInfo> {
        let entity = self.registry.alarm(id)?;
        self.world.get::<&AlarmInfo>(entity).ok().map(|a| (*a).clone())
    }

    pub fn alarm_is_active(&self, id: AlarmId) -> bool {
        self.registry.alarm(id).is_some()
    }

    /// Edit a vehicle's runtime state in place.
    pub fn update_vehicle_state(&mut self, id: VehicleId, f: impl FnOnce(&mut VehicleState)) {
        if let Some(entity) = self.registry.vehicle(id) {
            if let Ok(mut state) = self.world.get::<&mut VehicleState>(entity) {
                f(&mut state);
            }
        }
    }

    // --- Status transitions ---

    /// Check a trigger against the state machine without applying it.
    pub fn check_trigger(&self, vehicle: VehicleId, trigger: StatusTrigger) -> Result<(), DispatchError> {
        let state = self
            .vehicle_state(vehicle)
            .ok_or(DispatchError::VehicleNotFound(vehicle))?;
        fsm::next_status(state.status, trigger)
            .map(|_| ())
            .ok_or(DispatchError::InvalidTransition {
                vehicle,
                status: state.status,
                trigger,
            })
    }

    /// The only way a vehicle's status changes. Cancels the running task and
    /// clears patrol state when the state machine says so, then notifies.
    pub fn apply_trigger(
        &mut self,
        vehicle: VehicleId,
        trigger: StatusTrigger,
    ) -> Result<StatusUpdate, DispatchError> {
        let entity = self.vehicle_entity(vehicle)?;
        let has_task = self.scheduler.has_task(vehicle);
        let (info, state) = self
            .world
            .query_one_mut::<(&VehicleInfo, &mut VehicleState)>(entity)
            .map_err(|_| DispatchError::VehicleNotFound(vehicle))?;

        let update = fsm::evaluate(&VehicleContext {
            status: state.status,
            trigger,
            has_task,
        })
        .map_err(|err| DispatchError::InvalidTransition {
            vehicle,
            status: err.status,
            trigger: err.trigger,
        })?;

        if update.cancel_task {
            self.scheduler.cancel_vehicle(vehicle);
        }
        if update.clear_patrol {
            state.patrol_target = None;
        }
        let from = state.status;
        state.status = update.new_status;
        if update.status_changed {
            self.notifier.vehicle_status_changed(info, state, from);
        }
        Ok(update)
    }

    // --- Movement ---

    /// Path from `origin` to `destination` for a vehicle category. Aerial units
    /// fly direct; ground units ask the router and fall back to a direct line.
    pub fn plan_path(
        &mut self,
        category: VehicleCategory,
        origin: GeoPoint,
        destination: GeoPoint,
    ) -> Vec<GeoPoint> {
        if get_profile(category, &self.config).straight_line {
            return vec![origin, destination];
        }
        match self.router.route(origin, destination) {
            Ok(route) if route.coordinates.len() >= 2 => route.coordinates,
            Ok(_) => {
                tracing::warn!(%origin, %destination, "route has no geometry, moving in a direct line");
                self.stats.route_fallbacks += 1;
                vec![origin, destination]
            }
            Err(err) => {
                tracing::warn!(%origin, %destination, error = %err, "moving in a direct line");
                self.stats.route_fallbacks += 1;
                vec![origin, destination]
            }
        }
    }

    /// Start a journey from the vehicle's current position.
    pub fn start_journey(
        &mut self,
        vehicle: VehicleId,
        destination: GeoPoint,
        on_complete: ArrivalAction,
    ) -> Result<CancelHandle, DispatchError> {
        let info = self
            .vehicle_info(vehicle)
            .ok_or(DispatchError::VehicleNotFound(vehicle))?;
        let origin = self
            .vehicle_state(vehicle)
            .map(|s| s.position)
            .ok_or(DispatchError::VehicleNotFound(vehicle))?;
        let path = self.plan_path(info.category, origin, destination);
        let duration = travel_time_secs(info.category, &self.config);
        Ok(self
            .scheduler
            .start_travel(vehicle, path, duration, on_complete))
    }

    /// Send a vehicle to its home station.
    pub fn start_home_journey(&mut self, vehicle: VehicleId) -> Result<CancelHandle, DispatchError> {
        let home = self.home_position(vehicle)?;
        self.start_journey(vehicle, home, ArrivalAction::Home)
    }

    /// Put a vehicle exactly on its station.
    pub fn snap_home(&mut self, vehicle: VehicleId) -> Result<(), DispatchError> {
        let home = self.home_position(vehicle)?;
        self.update_vehicle_state(vehicle, |s| s.position = home);
        Ok(())
    }

    fn home_position(&self, vehicle: VehicleId) -> Result<GeoPoint, DispatchError> {
        let info = self
            .vehicle_info(vehicle)
            .ok_or(DispatchError::VehicleNotFound(vehicle))?;
        self.station_position(info.home)
            .ok_or(DispatchError::StationNotFound(info.home))
    }
}
