//! Errors surfaced by the dispatch API.

use thiserror::Error;

use crate::enums::{StatusTrigger, VehicleStatus};
use crate::types::{AlarmId, StationId, VehicleId};

/// Rejection of an operator request. Rejected requests never mutate state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    #[error("{0} not found")]
    AlarmNotFound(AlarmId),
    #[error("{0} not found")]
    VehicleNotFound(VehicleId),
    #[error("{0} not found")]
    StationNotFound(StationId),
    #[error("{vehicle} cannot {trigger:?} while {status}")]
    InvalidTransition {
        vehicle: VehicleId,
        status: VehicleStatus,
        trigger: StatusTrigger,
    },
    #[error("dispatch needs at least one vehicle")]
    EmptyBatch,
    #[error("name {0:?} is blank")]
    InvalidName(String),
}
