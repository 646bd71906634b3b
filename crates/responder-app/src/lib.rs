//! Headless runner for the dispatch simulator.
//!
//! Wires the simulation crates together behind a CLI, a real-time loop
//! thread and an optional automatic operator.

pub mod control;
pub mod game_loop;
pub mod logging;
pub mod operator;
pub mod runner;
pub mod state;

pub use responder_core as core;
