//! Alarm placement: type catalog, location resolver, and periodic spawning.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

use responder_core::config::{SimConfig, SpawnConfig};
use responder_core::constants::{KM_PER_DEGREE_LAT, TAG_CAN_SPAWN_ON_WATER, TAG_ONLY_ON_WATER};
use responder_core::enums::TerrainConstraint;
use responder_core::types::GeoPoint;
use responder_terrain::{TerrainClassificationCache, TerrainOracle};

/// Generic type used when the catalog has nothing for a constraint.
const GENERIC_ALARM_TYPE: &str = "Alarm";

/// Draws that may land outside the radius before the resolver gives up on
/// drawing an in-radius point for the relaxed placement.
const MAX_DISC_DRAWS: u32 = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpawnError {
    #[error("no location satisfying {constraint:?} after {attempts} attempts")]
    Exhausted {
        constraint: TerrainConstraint,
        attempts: u32,
    },
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub struct AlarmType {
    /// Display text with tags stripped.
    pub text: String,
    pub constraint: TerrainConstraint,
}

impl AlarmType {
    /// Parse a catalog string. `#only-on-water#` means water only,
    /// `#can-spawn-on-water#` means either; untagged types are land only.
    pub fn parse(raw: &str) -> Self {
        let constraint = if raw.contains(TAG_ONLY_ON_WATER) {
            TerrainConstraint::WaterOnly
        } else if raw.contains(TAG_CAN_SPAWN_ON_WATER) {
            TerrainConstraint::Either
        } else {
            TerrainConstraint::LandOnly
        };
        Self {
            text: clean_alarm_text(raw),
            constraint,
        }
    }
}

/// Strip terrain tags and surrounding whitespace.
pub fn clean_alarm_text(raw: &str) -> String {
    raw.replace(TAG_ONLY_ON_WATER, "")
        .replace(TAG_CAN_SPAWN_ON_WATER, "")
        .trim()
        .to_string()
}

/// The set of alarm types the spawner draws from.
#[derive(Debug, Clone, Default)]
pub struct AlarmCatalog {
    pub types: Vec<AlarmType>,
}

impl AlarmCatalog {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            types: config.alarm_types.iter().map(|s| AlarmType::parse(s)).collect(),
        }
    }

    /// Uniformly random entry.
    pub fn pick(&self, rng: &mut ChaCha8Rng) -> Option<&AlarmType> {
        if self.types.is_empty() {
            return None;
        }
        self.types.get(rng.gen_range(0..self.types.len()))
    }

    /// Random display text among entries with exactly this constraint,
    /// or a generic label when none match.
    pub fn pick_text_for(&self, constraint: TerrainConstraint, rng: &mut ChaCha8Rng) -> String {
        let matching: Vec<&AlarmType> = self
            .types
            .iter()
            .filter(|t| t.constraint == constraint)
            .collect();
        if matching.is_empty() {
            return GENERIC_ALARM_TYPE.to_string();
        }
        matching[rng.gen_range(0..matching.len())].text.clone()
    }
}

/// Where the resolver put an alarm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: GeoPoint,
    /// True when the constraint could not be met and the relaxed fallback was used.
    pub relaxed: bool,
}

/// Finds coordinates near a station that satisfy a terrain constraint.
#[derive(Debug, Clone)]
pub struct SpawnLocationResolver {
    pub attempts_per_type: u32,
    pub fallback_radius_km: f64,
}

impl SpawnLocationResolver {
    pub fn new(config: &SpawnConfig) -> Self {
        Self {
            attempts_per_type: config.attempts_per_type,
            fallback_radius_km: config.fallback_radius_km,
        }
    }

    /// One jittered sample around `center`. Returns None when the draw lands
    /// outside the radius.
    ///
    /// The jitter spans `[-r, r]` km on both axes, converted to degrees with
    /// the longitude scale corrected for the center latitude.
    pub fn sample(&self, rng: &mut ChaCha8Rng, center: GeoPoint, radius_km: f64) -> Option<GeoPoint> {
        let km_per_deg_lng = KM_PER_DEGREE_LAT * center.lat.to_radians().cos();
        let d_lat = (rng.gen::<f64>() - 0.5) * 2.0 * radius_km / KM_PER_DEGREE_LAT;
        let d_lng = (rng.gen::<f64>() - 0.5) * 2.0 * radius_km / km_per_deg_lng;
        let candidate = GeoPoint::new(center.lat + d_lat, center.lng + d_lng);
        (center.distance_km(&candidate) <= radius_km).then_some(candidate)
    }

    /// Bounded search for a point satisfying `constraint`. First hit wins.
    #[allow(clippy::too_many_arguments)]
    pub fn try_resolve(
        &self,
        rng: &mut ChaCha8Rng,
        cache: &mut TerrainClassificationCache,
        oracle: &dyn TerrainOracle,
        now_secs: f64,
        center: GeoPoint,
        radius_km: f64,
        constraint: TerrainConstraint,
    ) -> Result<GeoPoint, SpawnError> {
        for _ in 0..self.attempts_per_type {
            let Some(candidate) = self.sample(rng, center, radius_km) else {
                continue;
            };
            if constraint == TerrainConstraint::Either {
                return Ok(candidate);
            }
            let is_water = cache.classify(candidate, oracle, now_secs);
            if constraint.accepts(is_water) {
                return Ok(candidate);
            }
        }
        Err(SpawnError::Exhausted {
            constraint,
            attempts: self.attempts_per_type,
        })
    }

    /// Land-biased placement close to the station: the first nearby draw
    /// classified as land, else the station itself. At most
    /// `attempts_per_type` draws are classified.
    pub fn relaxed(
        &self,
        rng: &mut ChaCha8Rng,
        cache: &mut TerrainClassificationCache,
        oracle: &dyn TerrainOracle,
        now_secs: f64,
        center: GeoPoint,
    ) -> GeoPoint {
        let mut classified = 0;
        for _ in 0..MAX_DISC_DRAWS {
            if classified >= self.attempts_per_type {
                break;
            }
            let Some(p) = self.sample(rng, center, self.fallback_radius_km) else {
                continue;
            };
            classified += 1;
            if !cache.classify(p, oracle, now_secs) {
                return p;
            }
        }
        center
    }

    /// Bounded search, then the relaxed fallback. Never fails.
    #[allow(clippy::too_many_arguments)]
    pub fn resolve(
        &self,
        rng: &mut ChaCha8Rng,
        cache: &mut TerrainClassificationCache,
        oracle: &dyn TerrainOracle,
        now_secs: f64,
        center: GeoPoint,
        radius_km: f64,
        constraint: TerrainConstraint,
    ) -> Placement {
        match self.try_resolve(rng, cache, oracle, now_secs, center, radius_km, constraint) {
            Ok(position) => Placement {
                position,
                relaxed: false,
            },
            Err(err) => {
                tracing::warn!(%center, error = %err, "spawn exhausted, using relaxed placement");
                Placement {
                    position: self.relaxed(rng, cache, oracle, now_secs, center),
                    relaxed: true,
                }
            }
        }
    }
}

/// Periodic random alarm generation.
#[derive(Debug, Clone, Default)]
pub struct AlarmSchedule {
    pub interval_secs: Option<f64>,
    pub next_due_secs: f64,
}

impl AlarmSchedule {
    pub fn new(interval_secs: Option<f64>) -> Self {
        Self {
            interval_secs,
            next_due_secs: interval_secs.unwrap_or(0.0),
        }
    }

    /// Whether an alarm is due at `now_secs`. Advances the schedule when it is.
    pub fn poll(&mut self, now_secs: f64) -> bool {
        let Some(interval) = self.interval_secs else {
            return false;
        };
        if now_secs + 1e-9 < self.next_due_secs {
            return false;
        }
        self.next_due_secs += interval;
        true
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use rand::SeedableRng;
    use responder_core::config::TerrainConfig;
    use responder_terrain::{NoOracle, OracleError, TerrainVerdict};

    use super::*;

    const STATION: GeoPoint = GeoPoint {
        lat: 55.6761,
        lng: 12.5683,
    };

    /// Reports water north of a latitude, land south of it.
    struct HalfPlaneOracle {
        water_north_of: f64,
        calls: Cell<u32>,
    }

    impl TerrainOracle for HalfPlaneOracle {
        fn classify(&self, point: GeoPoint) -> Result<TerrainVerdict, OracleError> {
            self.calls.set(self.calls.get() + 1);
            Ok(if point.lat > self.water_north_of {
                TerrainVerdict::Water
            } else {
                TerrainVerdict::Land
            })
        }
    }

    struct AlwaysWater;

    impl TerrainOracle for AlwaysWater {
        fn classify(&self, _point: GeoPoint) -> Result<TerrainVerdict, OracleError> {
            Ok(TerrainVerdict::Water)
        }
    }

    fn make_resolver() -> SpawnLocationResolver {
        SpawnLocationResolver::new(&SpawnConfig::default())
    }

    #[test]
    fn test_parse_tags() {
        let t = AlarmType::parse("Boat fire #only-on-water#");
        assert_eq!(t.text, "Boat fire");
        assert_eq!(t.constraint, TerrainConstraint::WaterOnly);
        let t = AlarmType::parse("Kitesurfer #can-spawn-on-water#");
        assert_eq!(t.constraint, TerrainConstraint::Either);
        let t = AlarmType::parse("Building fire");
        assert_eq!(t.constraint, TerrainConstraint::LandOnly);
        assert_eq!(t.text, "Building fire");
    }

    #[test]
    fn test_samples_stay_within_radius() {
        let resolver = make_resolver();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut inside = 0;
        for _ in 0..500 {
            if let Some(p) = resolver.sample(&mut rng, STATION, 10.0) {
                let d = STATION.distance_km(&p);
                assert!(d <= 10.0, "Sample {p} is {d} km away");
                inside += 1;
            }
        }
        // pi/4 of the square lies inside the circle.
        assert!(inside > 300, "Most samples should land inside the disc, got {inside}");
    }

    #[test]
    fn test_land_only_never_returns_water() {
        let resolver = make_resolver();
        let oracle = HalfPlaneOracle {
            water_north_of: STATION.lat,
            calls: Cell::new(0),
        };
        for seed in 0..50 {
            let mut cache = TerrainClassificationCache::new(&TerrainConfig::default());
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let placement = resolver.resolve(
                &mut rng,
                &mut cache,
                &oracle,
                0.0,
                STATION,
                10.0,
                TerrainConstraint::LandOnly,
            );
            assert!(!placement.relaxed, "Half the disc is land; 20 tries should find it");
            assert!(
                placement.position.lat <= STATION.lat,
                "Seed {seed}: {} is in the water half",
                placement.position
            );
        }
        assert!(oracle.calls.get() > 0);
    }

    #[test]
    fn test_exhaustion_falls_back_near_station() {
        let resolver = make_resolver();
        let mut cache = TerrainClassificationCache::new(&TerrainConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let err = resolver
            .try_resolve(
                &mut rng,
                &mut cache,
                &AlwaysWater,
                0.0,
                STATION,
                10.0,
                TerrainConstraint::LandOnly,
            )
            .unwrap_err();
        assert_eq!(
            err,
            SpawnError::Exhausted {
                constraint: TerrainConstraint::LandOnly,
                attempts: 20
            }
        );

        let placement = resolver.resolve(
            &mut rng,
            &mut cache,
            &AlwaysWater,
            0.0,
            STATION,
            10.0,
            TerrainConstraint::LandOnly,
        );
        assert!(placement.relaxed);
        assert_eq!(placement.position, STATION, "No land nearby, so the station itself");
    }

    #[test]
    fn test_relaxed_placement_prefers_land() {
        let resolver = make_resolver();
        let oracle = HalfPlaneOracle {
            water_north_of: STATION.lat,
            calls: Cell::new(0),
        };
        for seed in 0..30 {
            let mut cache = TerrainClassificationCache::new(&TerrainConfig::default());
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let p = resolver.relaxed(&mut rng, &mut cache, &oracle, 0.0, STATION);
            assert!(STATION.distance_km(&p) <= 0.5, "Seed {seed}: {p} is too far out");
            assert!(p.lat <= STATION.lat, "Seed {seed}: {p} is in the water half");
        }
        assert!(oracle.calls.get() <= 30 * 20, "Classification stays bounded");
    }

    #[test]
    fn test_either_skips_terrain_lookup() {
        let resolver = make_resolver();
        let mut cache = TerrainClassificationCache::new(&TerrainConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let p = resolver.try_resolve(
            &mut rng,
            &mut cache,
            &NoOracle,
            0.0,
            STATION,
            10.0,
            TerrainConstraint::Either,
        );
        assert!(p.is_ok());
        assert!(cache.is_empty(), "Either should not classify");
    }

    #[test]
    fn test_catalog_pick_for_constraint() {
        let catalog = AlarmCatalog::from_config(&SimConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..20 {
            let text = catalog.pick_text_for(TerrainConstraint::WaterOnly, &mut rng);
            assert!(
                text == "Boat fire" || text == "Person overboard",
                "Unexpected water type {text}"
            );
        }
        let empty = AlarmCatalog::default();
        assert_eq!(empty.pick_text_for(TerrainConstraint::LandOnly, &mut rng), "Alarm");
        assert!(empty.pick(&mut rng).is_none());
    }

    #[test]
    fn test_schedule_poll() {
        let mut schedule = AlarmSchedule::new(Some(30.0));
        assert!(!schedule.poll(0.0));
        assert!(!schedule.poll(29.9));
        assert!(schedule.poll(30.0));
        assert!(!schedule.poll(30.1), "Next alarm is due at 60s");
        assert!(schedule.poll(60.0));

        let mut off = AlarmSchedule::new(None);
        assert!(!off.poll(1_000.0));
    }
}
