//! Dispatch simulation engine.
//!
//! Owns the hecs ECS world, runs systems at a fixed tick rate,
//! and produces SimSnapshots for observers.

pub mod context;
pub mod engine;
pub mod fleet;
pub mod providers;
pub mod registry;
pub mod systems;
pub mod world_setup;

pub use engine::SimulationEngine;
pub use fleet::{FleetConfig, FleetError};
pub use providers::{PresentationSink, RecordingSink, Route, RouteError, RouteProvider};
pub use responder_core as core;
