//! Headless run: build an engine from files, drive it for a while, report.

use std::path::Path;

use thiserror::Error;

use responder_core::config::{ConfigError, SimConfig};
use responder_core::state::{MissionLogEntry, SimSnapshot};
use responder_core::types::GeoPoint;
use responder_sim::fleet::{FleetConfig, StationConfig, VehicleConfig};
use responder_sim::{FleetError, SimulationEngine};
use responder_terrain::{LandMask, LandMaskError};

use crate::control::{self, ControlError};
use crate::game_loop::LoopOptions;
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Fleet(#[from] FleetError),
    #[error(transparent)]
    LandMask(#[from] LandMaskError),
    #[error(transparent)]
    Control(#[from] ControlError),
    #[error("failed to encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("simulation thread panicked")]
    LoopPanicked,
}

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub duration_secs: f64,
    pub realtime: bool,
    pub time_scale: f64,
    pub auto_dispatch: bool,
}

/// Engine with the given fleet and optional land mask.
pub fn build_engine(
    config: SimConfig,
    fleet: &FleetConfig,
    land_mask: Option<&Path>,
) -> Result<SimulationEngine, AppError> {
    let mut engine = SimulationEngine::new(config);
    if let Some(path) = land_mask {
        let mask = LandMask::from_file(path)?;
        engine = engine.with_oracle(Box::new(mask));
    }
    engine.load_fleet(fleet);
    Ok(engine)
}

/// Number of ticks covering `duration_secs`.
pub fn ticks_for(duration_secs: f64, config: &SimConfig) -> u64 {
    (duration_secs.max(0.0) / config.tick_secs()).ceil() as u64
}

/// Run the engine on the loop thread until the duration has elapsed.
/// Returns the engine and the final snapshot.
pub fn run(engine: SimulationEngine, options: RunOptions) -> Result<(SimulationEngine, SimSnapshot), AppError> {
    let max_ticks = ticks_for(options.duration_secs, engine.config());
    let state = AppState::new();
    let handle = control::start_simulation(
        &state,
        engine,
        LoopOptions {
            time_scale: options.time_scale,
            max_ticks: Some(max_ticks.max(1)),
            realtime: options.realtime,
            auto_dispatch: options.auto_dispatch,
        },
    )?;
    let engine = handle.join().map_err(|_| AppError::LoopPanicked)?;
    control::stop_simulation(&state)?;
    let snapshot = control::get_snapshot(&state)?.unwrap_or_else(|| engine.snapshot());
    Ok((engine, snapshot))
}

/// Two stations in Jutland with a mixed fleet.
pub fn demo_fleet() -> FleetConfig {
    let v = |name: &str, kind: &str| VehicleConfig {
        name: name.into(),
        kind: kind.into(),
    };
    FleetConfig {
        stations: vec![
            StationConfig {
                name: "Aarhus".into(),
                position: GeoPoint::new(56.1629, 10.2039),
                vehicles: vec![
                    v("Ambulance 1", "Ambulance"),
                    v("Engine 1", "Fire engine"),
                    v("Rescue Helicopter", "Helicopter"),
                ],
            },
            StationConfig {
                name: "Viborg".into(),
                position: GeoPoint::new(56.4532, 9.4020),
                vehicles: vec![v("Ambulance 2", "Ambulance"), v("Police 1", "Patrol car")],
            },
        ],
    }
}

/// Human-readable end-of-run report over the full mission log.
pub fn summary(snapshot: &SimSnapshot, mission_log: &[MissionLogEntry]) -> String {
    let mut out = format!(
        "t={} | alarms created {} resolved {} manual {} | dispatched {} | relaxed spawns {} | route fallbacks {}\n",
        snapshot.time.clock(),
        snapshot.stats.alarms_created,
        snapshot.stats.alarms_resolved,
        snapshot.stats.alarms_manually_resolved,
        snapshot.stats.vehicles_dispatched,
        snapshot.stats.relaxed_spawns,
        snapshot.stats.route_fallbacks,
    );
    for entry in mission_log {
        let vehicles = if entry.vehicles.is_empty() {
            "-".to_string()
        } else {
            entry.vehicles.join(", ")
        };
        out.push_str(&format!(
            "[{}] {} {}: {} ({})\n",
            entry.clock, entry.alarm_id, entry.kind, vehicles, entry.response
        ));
    }
    out.push_str(&format!("{} alarm(s) still active\n", snapshot.alarms.len()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_config() -> SimConfig {
        let mut config = SimConfig {
            tick_interval_ms: 1000,
            standard_travel_time_secs: 20.0,
            dwell_min_secs: 5.0,
            dwell_max_secs: 10.0,
            ..Default::default()
        };
        config.spawn.auto_interval_secs = Some(30.0);
        config
    }

    #[test]
    fn test_ticks_for_duration() {
        let config = quick_config();
        assert_eq!(ticks_for(60.0, &config), 60);
        assert_eq!(ticks_for(0.5, &config), 1);
        assert_eq!(ticks_for(-5.0, &config), 0);
    }

    #[test]
    fn test_headless_run_with_auto_dispatch_resolves_alarms() {
        let engine = build_engine(quick_config(), &demo_fleet(), None).unwrap();
        let (engine, snapshot) = run(
            engine,
            RunOptions {
                duration_secs: 600.0,
                realtime: false,
                time_scale: 1.0,
                auto_dispatch: true,
            },
        )
        .unwrap();

        assert_eq!(snapshot.time.tick, 600);
        assert!(snapshot.stats.alarms_created >= 19);
        assert!(
            snapshot.stats.alarms_resolved > 0,
            "Auto-dispatch should close alarms: {}",
            summary(&snapshot, engine.mission_log())
        );
        assert_eq!(engine.mission_log().len() as u64, snapshot.stats.alarms_resolved);
        assert_eq!(snapshot.log_len, engine.mission_log().len());
        assert!(summary(&snapshot, engine.mission_log()).contains("Ambulance"));
    }

    #[test]
    fn test_missing_land_mask_is_reported() {
        let err = build_engine(
            quick_config(),
            &demo_fleet(),
            Some(Path::new("/nonexistent/mask.json")),
        )
        .err()
        .unwrap();
        assert!(matches!(err, AppError::LandMask(_)));
    }
}
