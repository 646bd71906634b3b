//! Simulation configuration.
//!
//! Loaded from a JSON file with every field optional; missing fields take the
//! defaults in [`crate::constants`]. `RESPONDER_CONFIG_PATH` overrides the path.

use std::{
    env, fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::*;
use crate::types::BoundingBox;

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// RNG seed. Same seed and command stream reproduce a run exactly.
    pub seed: u64,
    pub tick_interval_ms: u64,
    pub standard_travel_time_secs: f64,
    pub aerial_time_factor: f64,
    pub dwell_min_secs: f64,
    pub dwell_max_secs: f64,
    pub spawn: SpawnConfig,
    pub terrain: TerrainConfig,
    pub patrol: PatrolConfig,
    /// Alarm type catalog. Entries may carry terrain tags.
    pub alarm_types: Vec<String>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            standard_travel_time_secs: DEFAULT_STANDARD_TRAVEL_TIME_SECS,
            aerial_time_factor: DEFAULT_AERIAL_TIME_FACTOR,
            dwell_min_secs: DEFAULT_DWELL_MIN_SECS,
            dwell_max_secs: DEFAULT_DWELL_MAX_SECS,
            spawn: SpawnConfig::default(),
            terrain: TerrainConfig::default(),
            patrol: PatrolConfig::default(),
            alarm_types: default_alarm_types(),
        }
    }
}

fn default_alarm_types() -> Vec<String> {
    [
        "Traffic accident",
        "Building fire",
        "Cardiac arrest",
        "Fall injury",
        "Gas leak",
        "Chimney fire",
        "Boat fire #only-on-water#",
        "Person overboard #only-on-water#",
        "Kitesurfer in distress #can-spawn-on-water#",
        "Oil spill #can-spawn-on-water#",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Alarm placement tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    pub attempts_per_type: u32,
    pub max_type_selections: u32,
    pub default_radius_km: f64,
    pub fallback_radius_km: f64,
    /// Spawn a random alarm every N simulated seconds. `None` disables.
    pub auto_interval_secs: Option<f64>,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            attempts_per_type: SPAWN_ATTEMPTS_PER_TYPE,
            max_type_selections: SPAWN_MAX_TYPE_SELECTIONS,
            default_radius_km: DEFAULT_SPAWN_RADIUS_KM,
            fallback_radius_km: SPAWN_FALLBACK_RADIUS_KM,
            auto_interval_secs: None,
        }
    }
}

/// Terrain classification cache tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    pub precision_decimals: u32,
    pub confirmed_ttl_secs: f64,
    pub heuristic_ttl_secs: f64,
    /// Points outside this box are assumed to be water when the oracle is silent.
    pub mainland: BoundingBox,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            precision_decimals: TERRAIN_KEY_PRECISION,
            confirmed_ttl_secs: TERRAIN_CONFIRMED_TTL_SECS,
            heuristic_ttl_secs: TERRAIN_HEURISTIC_TTL_SECS,
            mainland: BoundingBox {
                min_lat: MAINLAND_MIN_LAT,
                max_lat: MAINLAND_MAX_LAT,
                min_lng: MAINLAND_MIN_LNG,
                max_lng: MAINLAND_MAX_LNG,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatrolConfig {
    pub radius_km: f64,
    pub waypoint_attempts: u32,
}

impl Default for PatrolConfig {
    fn default() -> Self {
        Self {
            radius_km: PATROL_RADIUS_KM,
            waypoint_attempts: PATROL_WAYPOINT_ATTEMPTS,
        }
    }
}

impl SimConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        SimConfig::from_json_str(&contents)
    }

    /// Tick interval in seconds.
    pub fn tick_secs(&self) -> f64 {
        self.tick_interval_ms as f64 / 1000.0
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: &str| Err(ConfigError::Invalid(msg.to_string()));
        if self.tick_interval_ms == 0 {
            return invalid("tick_interval_ms must be positive");
        }
        if self.standard_travel_time_secs <= 0.0 {
            return invalid("standard_travel_time_secs must be positive");
        }
        if !(self.aerial_time_factor > 0.0 && self.aerial_time_factor <= 1.0) {
            return invalid("aerial_time_factor must be in (0, 1]");
        }
        if self.dwell_min_secs < 0.0 || self.dwell_min_secs > self.dwell_max_secs {
            return invalid("dwell bounds must satisfy 0 <= min <= max");
        }
        if self.spawn.attempts_per_type == 0 || self.spawn.max_type_selections == 0 {
            return invalid("spawn attempt budgets must be at least 1");
        }
        if self.spawn.default_radius_km <= 0.0 || self.spawn.fallback_radius_km <= 0.0 {
            return invalid("spawn radii must be positive");
        }
        if matches!(self.spawn.auto_interval_secs, Some(s) if s <= 0.0) {
            return invalid("spawn.auto_interval_secs must be positive");
        }
        if self.terrain.precision_decimals > 8 {
            return invalid("terrain.precision_decimals must be at most 8");
        }
        if self.terrain.heuristic_ttl_secs <= 0.0
            || self.terrain.confirmed_ttl_secs < self.terrain.heuristic_ttl_secs
        {
            return invalid("terrain TTLs must be positive with confirmed >= heuristic");
        }
        if !self.terrain.mainland.is_valid() {
            return invalid("terrain.mainland box is empty");
        }
        if self.patrol.radius_km <= 0.0 || self.patrol.waypoint_attempts == 0 {
            return invalid("patrol radius and attempts must be positive");
        }
        if self.alarm_types.is_empty() {
            return invalid("alarm_types must not be empty");
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Load the config named by `RESPONDER_CONFIG_PATH`, or defaults when unset.
///
/// A broken override is logged and replaced by defaults so the simulation
/// still starts.
pub fn load_from_env() -> SimConfig {
    let Some(path) = env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from) else {
        tracing::info!(target: "responder::config", "config.loaded=defaults");
        return SimConfig::default();
    };
    match SimConfig::from_file(&path) {
        Ok(config) => {
            tracing::info!(
                target: "responder::config",
                path = %path.display(),
                "config.loaded=file"
            );
            config
        }
        Err(err) => {
            tracing::warn!(
                target: "responder::config",
                path = %path.display(),
                error = %err,
                "config.load_failed"
            );
            SimConfig::default()
        }
    }
}
