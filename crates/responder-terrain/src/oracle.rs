//! External terrain oracle interface.

use responder_core::types::GeoPoint;
use thiserror::Error;

/// Answer from a terrain oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerrainVerdict {
    Water,
    Land,
    /// The oracle has no authoritative answer for this point.
    Inconclusive,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    #[error("terrain oracle unavailable: {0}")]
    Unavailable(String),
}

/// Classifies coordinates as land or water.
///
/// Implementations must be idempotent and side-effect free; the cache may
/// ask the same question more than once.
pub trait TerrainOracle {
    fn classify(&self, point: GeoPoint) -> Result<TerrainVerdict, OracleError>;
}

/// Oracle that never knows. Every lookup falls through to the heuristic.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOracle;

impl TerrainOracle for NoOracle {
    fn classify(&self, _point: GeoPoint) -> Result<TerrainVerdict, OracleError> {
        Ok(TerrainVerdict::Inconclusive)
    }
}

impl<T: TerrainOracle + ?Sized> TerrainOracle for Box<T> {
    fn classify(&self, point: GeoPoint) -> Result<TerrainVerdict, OracleError> {
        (**self).classify(point)
    }
}
