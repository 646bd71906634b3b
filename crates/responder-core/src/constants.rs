//! Simulation constants and tuning defaults.
//!
//! Runtime values come from [`crate::config::SimConfig`]; these are its defaults
//! plus the physical constants that never change.

// --- Geography ---

/// Mean Earth radius used by the haversine formula (km).
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Kilometers per degree of latitude.
pub const KM_PER_DEGREE_LAT: f64 = 111.32;

// --- Timing ---

/// Movement tick interval in milliseconds.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 100;

/// Nominal duration of any ground journey, regardless of length (seconds).
pub const DEFAULT_STANDARD_TRAVEL_TIME_SECS: f64 = 60.0;

/// Aerial journeys take this fraction of the ground travel time.
pub const DEFAULT_AERIAL_TIME_FACTOR: f64 = 0.1;

/// Shortest on-scene dwell (seconds).
pub const DEFAULT_DWELL_MIN_SECS: f64 = 5.0;

/// Longest on-scene dwell (seconds).
pub const DEFAULT_DWELL_MAX_SECS: f64 = 300.0;

// --- Spawning ---

/// Samples drawn per alarm-type choice before giving up on that type.
pub const SPAWN_ATTEMPTS_PER_TYPE: u32 = 20;

/// Alarm types tried before the relaxed fallback placement.
pub const SPAWN_MAX_TYPE_SELECTIONS: u32 = 3;

/// Default spawn radius around a station (km).
pub const DEFAULT_SPAWN_RADIUS_KM: f64 = 10.0;

/// Radius of the relaxed fallback placement (km).
pub const SPAWN_FALLBACK_RADIUS_KM: f64 = 0.5;

/// Tag marking alarm types that must spawn on water.
pub const TAG_ONLY_ON_WATER: &str = "#only-on-water#";

/// Tag marking alarm types that may spawn on land or water.
pub const TAG_CAN_SPAWN_ON_WATER: &str = "#can-spawn-on-water#";

// --- Terrain cache ---

/// Decimal places kept in cache keys. 4 places is roughly 11 m.
pub const TERRAIN_KEY_PRECISION: u32 = 4;

/// Lifetime of oracle-confirmed classifications (seconds).
pub const TERRAIN_CONFIRMED_TTL_SECS: f64 = 86_400.0;

/// Lifetime of heuristic classifications (seconds).
pub const TERRAIN_HEURISTIC_TTL_SECS: f64 = 300.0;

/// Mainland box used by the heuristic (Denmark).
pub const MAINLAND_MIN_LAT: f64 = 54.56;
pub const MAINLAND_MAX_LAT: f64 = 57.75;
pub const MAINLAND_MIN_LNG: f64 = 8.07;
pub const MAINLAND_MAX_LNG: f64 = 12.69;

// --- Events ---

/// Undrained snapshot events kept when nothing ticks. Older ones are dropped.
pub const MAX_PENDING_EVENTS: usize = 4096;

// --- Patrol ---

/// Patrol waypoints are drawn within this radius of the home station (km).
pub const PATROL_RADIUS_KM: f64 = 5.0;

/// Waypoint samples tried before a ground unit patrols back to its station.
pub const PATROL_WAYPOINT_ATTEMPTS: u32 = 10;

// --- Config ---

/// Environment variable that points at a JSON config file.
pub const CONFIG_PATH_ENV: &str = "RESPONDER_CONFIG_PATH";
