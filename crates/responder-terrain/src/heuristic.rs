//! Deterministic fallback classification.

use responder_core::types::{BoundingBox, GeoPoint};

/// Approximates the mainland with a single box: inside is land, outside is water.
#[derive(Debug, Clone, Copy)]
pub struct MainlandHeuristic {
    pub mainland: BoundingBox,
}

impl MainlandHeuristic {
    pub fn new(mainland: BoundingBox) -> Self {
        Self { mainland }
    }

    pub fn is_water(&self, point: &GeoPoint) -> bool {
        !self.mainland.contains(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inside_box_is_land() {
        let h = MainlandHeuristic::new(BoundingBox {
            min_lat: 54.5,
            max_lat: 57.8,
            min_lng: 8.0,
            max_lng: 12.7,
        });
        assert!(!h.is_water(&GeoPoint::new(55.6761, 12.5683)), "Copenhagen is land");
        assert!(!h.is_water(&GeoPoint::new(56.1629, 10.2039)), "Aarhus is land");
        assert!(h.is_water(&GeoPoint::new(56.5, 6.0)), "North Sea is water");
        assert!(h.is_water(&GeoPoint::new(55.0, 14.5)), "Baltic east of Zealand is water");
    }
}
