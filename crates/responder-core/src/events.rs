//! Events emitted by the simulation for presentation feedback.

use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::types::{AlarmId, GeoPoint, VehicleId};

/// State changes reported to observers. Drained into each snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SimEvent {
    VehicleStatusChanged {
        vehicle: VehicleId,
        from: VehicleStatus,
        to: VehicleStatus,
    },
    AlarmCreated {
        alarm: AlarmId,
        kind: String,
        position: GeoPoint,
    },
    AlarmResolved {
        alarm: AlarmId,
        response: ResponseTime,
    },
}
