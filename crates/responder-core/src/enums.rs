//! Enumeration types used throughout the simulation.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Vehicle operating status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleStatus {
    /// Parked at the home station, available.
    #[default]
    Standby,
    /// Driving or flying toward an alarm.
    EnRoute,
    /// On scene, dwelling before returning.
    AtIncident,
    /// Heading back to the home station. Still available for dispatch.
    ReturningHome,
    /// Moving between random waypoints near the home station.
    Patrolling,
}

impl VehicleStatus {
    /// Whether a vehicle in this status may be sent to a new alarm.
    pub fn is_dispatchable(self) -> bool {
        matches!(
            self,
            VehicleStatus::Standby | VehicleStatus::ReturningHome | VehicleStatus::Patrolling
        )
    }

    /// Short operator-facing label.
    pub fn label(self) -> &'static str {
        match self {
            VehicleStatus::Standby => "standby",
            VehicleStatus::EnRoute => "en route",
            VehicleStatus::AtIncident => "at incident",
            VehicleStatus::ReturningHome => "returning home",
            VehicleStatus::Patrolling => "patrolling",
        }
    }
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Vehicle category. Determines routing and speed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleCategory {
    /// Road vehicle: follows routed paths, stays on land.
    #[default]
    Ground,
    /// Helicopter: straight lines, faster, may cross water.
    Aerial,
}

/// Where an alarm is allowed to spawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerrainConstraint {
    #[default]
    LandOnly,
    WaterOnly,
    Either,
}

impl TerrainConstraint {
    /// Whether a classified coordinate satisfies this constraint.
    pub fn accepts(self, is_water: bool) -> bool {
        match self {
            TerrainConstraint::LandOnly => !is_water,
            TerrainConstraint::WaterOnly => is_water,
            TerrainConstraint::Either => true,
        }
    }
}

/// Events that drive a vehicle status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusTrigger {
    /// Assigned to an alarm.
    Dispatch,
    /// Reached the alarm position.
    Arrive,
    /// On-scene dwell finished.
    DwellElapsed,
    /// Reached the home station.
    ReachedHome,
    /// Operator started patrol.
    StartPatrol,
    /// Operator stopped patrol.
    StopPatrol,
    /// Reached a patrol waypoint.
    WaypointReached,
    /// Operator ordered the vehicle home.
    Recall,
    /// Forced reset (manual resolution, fleet reload).
    ForceStandby,
}

/// How long an alarm took from creation to resolution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ResponseTime {
    /// All dispatched vehicles arrived after `secs` of simulated time.
    Elapsed { secs: f64 },
    /// Closed by the operator.
    Manual,
}

impl fmt::Display for ResponseTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseTime::Elapsed { secs } => write!(f, "{}", crate::types::format_clock(*secs)),
            ResponseTime::Manual => f.write_str("manually resolved"),
        }
    }
}
