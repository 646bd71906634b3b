//! Terrain classification for responder.
//!
//! Answers "is this coordinate water?" for alarm placement and patrol
//! waypoints: an oracle trait, a memoizing cache with expiry, the mainland
//! heuristic used when the oracle is silent, and a raster land mask oracle.

pub use responder_core as core;

pub mod cache;
pub mod heuristic;
pub mod land_mask;
pub mod oracle;

// Re-export key types for convenience.
pub use cache::{CacheStats, ClassificationSource, TerrainClassificationCache};
pub use heuristic::MainlandHeuristic;
pub use land_mask::{LandMask, LandMaskError, MaskHeader};
pub use oracle::{NoOracle, OracleError, TerrainOracle, TerrainVerdict};
