//! Category-specific movement profiles.

use responder_core::config::SimConfig;
use responder_core::enums::VehicleCategory;

/// Movement parameters for a vehicle category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementProfile {
    /// Fly directly instead of asking the route provider.
    pub straight_line: bool,
    /// Fraction of the standard travel time a journey takes.
    pub travel_time_factor: f64,
    /// Whether patrol waypoints may lie on water.
    pub can_cross_water: bool,
}

/// Get the movement profile for a given category.
pub fn get_profile(category: VehicleCategory, config: &SimConfig) -> MovementProfile {
    match category {
        VehicleCategory::Ground => MovementProfile {
            straight_line: false,
            travel_time_factor: 1.0,
            can_cross_water: false,
        },
        VehicleCategory::Aerial => MovementProfile {
            straight_line: true,
            travel_time_factor: config.aerial_time_factor,
            can_cross_water: true,
        },
    }
}

/// Infer the category from an operator-entered vehicle kind.
/// Anything that names a helicopter flies; everything else drives.
pub fn category_for_kind(kind: &str) -> VehicleCategory {
    let kind = kind.to_lowercase();
    if kind.contains("helikopter") || kind.contains("helicopter") {
        VehicleCategory::Aerial
    } else {
        VehicleCategory::Ground
    }
}

/// Travel duration in seconds for a category.
pub fn travel_time_secs(category: VehicleCategory, config: &SimConfig) -> f64 {
    config.standard_travel_time_secs * get_profile(category, config).travel_time_factor
}
