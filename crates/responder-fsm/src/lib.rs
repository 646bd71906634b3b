//! Vehicle state machine for responder.
//!
//! Implements the vehicle status transition table and category-driven
//! movement profiles.

pub mod fsm;
pub mod profiles;

pub use responder_core as core;
