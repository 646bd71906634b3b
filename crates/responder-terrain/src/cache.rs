//! Memoized land/water classification with time-bounded expiry.
//!
//! Keys are coordinates rounded to a fixed number of decimals, which bounds
//! cardinality (4 decimals is about 11 m). Oracle answers live for the
//! confirmed TTL; heuristic answers expire quickly so they are replaced once
//! the oracle is reachable again.

use std::collections::HashMap;

use responder_core::config::TerrainConfig;
use responder_core::types::GeoPoint;

use crate::heuristic::MainlandHeuristic;
use crate::oracle::{TerrainOracle, TerrainVerdict};

/// Where a cached classification came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationSource {
    Oracle,
    Heuristic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheEntry {
    pub is_water: bool,
    pub source: ClassificationSource,
    /// Simulated time (seconds) after which the entry is stale.
    pub expires_at: f64,
}

/// Lookup counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub oracle_failures: u64,
    pub heuristic_fallbacks: u64,
}

pub struct TerrainClassificationCache {
    entries: HashMap<(i64, i64), CacheEntry>,
    scale: f64,
    confirmed_ttl_secs: f64,
    heuristic_ttl_secs: f64,
    heuristic: MainlandHeuristic,
    stats: CacheStats,
}

impl TerrainClassificationCache {
    pub fn new(config: &TerrainConfig) -> Self {
        Self {
            entries: HashMap::new(),
            scale: 10f64.powi(config.precision_decimals as i32),
            confirmed_ttl_secs: config.confirmed_ttl_secs,
            heuristic_ttl_secs: config.heuristic_ttl_secs,
            heuristic: MainlandHeuristic::new(config.mainland),
            stats: CacheStats::default(),
        }
    }

    /// Classify a coordinate. Returns true for water.
    ///
    /// Never fails: an unavailable or inconclusive oracle degrades to the
    /// mainland heuristic.
    pub fn classify(
        &mut self,
        point: GeoPoint,
        oracle: &dyn TerrainOracle,
        now_secs: f64,
    ) -> bool {
        let key = self.key(&point);
        if let Some(entry) = self.entries.get(&key) {
            if entry.expires_at > now_secs {
                self.stats.hits += 1;
                return entry.is_water;
            }
        }
        self.stats.misses += 1;

        let (is_water, source) = match oracle.classify(point) {
            Ok(TerrainVerdict::Water) => (true, ClassificationSource::Oracle),
            Ok(TerrainVerdict::Land) => (false, ClassificationSource::Oracle),
            Ok(TerrainVerdict::Inconclusive) => {
                self.stats.heuristic_fallbacks += 1;
                (self.heuristic.is_water(&point), ClassificationSource::Heuristic)
            }
            Err(err) => {
                tracing::debug!(%point, error = %err, "terrain oracle failed, using heuristic");
                self.stats.oracle_failures += 1;
                self.stats.heuristic_fallbacks += 1;
                (self.heuristic.is_water(&point), ClassificationSource::Heuristic)
            }
        };

        let ttl = match source {
            ClassificationSource::Oracle => self.confirmed_ttl_secs,
            ClassificationSource::Heuristic => self.heuristic_ttl_secs,
        };
        self.entries.insert(
            key,
            CacheEntry {
                is_water,
                source,
                expires_at: now_secs + ttl,
            },
        );
        is_water
    }

    /// Cached entry for a coordinate, stale or not.
    pub fn entry(&self, point: &GeoPoint) -> Option<&CacheEntry> {
        self.entries.get(&self.key(point))
    }

    /// Drop every entry. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let n = self.entries.len();
        self.entries.clear();
        tracing::info!(removed = n, "terrain cache cleared");
        n
    }

    /// Drop entries that expired at or before `now_secs`.
    pub fn purge_expired(&mut self, now_secs: f64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.expires_at > now_secs);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    fn key(&self, point: &GeoPoint) -> (i64, i64) {
        (
            (point.lat * self.scale).round() as i64,
            (point.lng * self.scale).round() as i64,
        )
    }
}
