//! Raster land mask oracle.
//!
//! A coarse elevation grid where cells above sea level are land. Points
//! outside the grid are inconclusive so the cache falls back to the heuristic.

use std::{fs, io, path::Path, path::PathBuf};

use responder_core::types::GeoPoint;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::oracle::{OracleError, TerrainOracle, TerrainVerdict};

/// Grid header metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaskHeader {
    /// Southwest corner latitude (degrees).
    pub origin_lat: f64,
    /// Southwest corner longitude (degrees).
    pub origin_lng: f64,
    /// Arc-seconds per grid cell.
    pub cell_size: f64,
    /// Number of columns (west to east).
    pub width: u32,
    /// Number of rows (north to south).
    pub height: u32,
}

impl MaskHeader {
    /// North edge latitude (degrees).
    pub fn north_lat(&self) -> f64 {
        self.origin_lat + (self.height as f64 * self.cell_size) / 3600.0
    }

    /// East edge longitude (degrees).
    pub fn east_lng(&self) -> f64 {
        self.origin_lng + (self.width as f64 * self.cell_size) / 3600.0
    }
}

/// On-disk layout of a land mask.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandMaskFile {
    pub header: MaskHeader,
    /// Elevation in meters, row-major (north-to-south, west-to-east).
    pub elevations: Vec<i16>,
}

#[derive(Debug, Error)]
pub enum LandMaskError {
    #[error("failed to read land mask from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse land mask: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("land mask expects {expected} cells, found {found}")]
    SizeMismatch { expected: usize, found: usize },
}

#[derive(Debug, Clone)]
pub struct LandMask {
    pub header: MaskHeader,
    elevations: Vec<i16>,
}

impl LandMask {
    pub fn new(header: MaskHeader, elevations: Vec<i16>) -> Result<Self, LandMaskError> {
        let expected = header.width as usize * header.height as usize;
        if elevations.len() != expected || expected == 0 {
            return Err(LandMaskError::SizeMismatch {
                expected,
                found: elevations.len(),
            });
        }
        Ok(Self { header, elevations })
    }

    pub fn from_json_str(json: &str) -> Result<Self, LandMaskError> {
        let file: LandMaskFile = serde_json::from_str(json)?;
        LandMask::new(file.header, file.elevations)
    }

    pub fn from_file(path: &Path) -> Result<Self, LandMaskError> {
        let contents = fs::read_to_string(path).map_err(|source| LandMaskError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mask = LandMask::from_json_str(&contents)?;
        tracing::info!(
            path = %path.display(),
            width = mask.header.width,
            height = mask.header.height,
            "land mask loaded"
        );
        Ok(mask)
    }

    /// Convert lat/lng to grid row/col (fractional).
    /// Returns None if outside grid bounds.
    fn geo_to_grid(&self, point: &GeoPoint) -> Option<(f64, f64)> {
        let h = &self.header;
        let col = (point.lng - h.origin_lng) * 3600.0 / h.cell_size;
        // Row 0 is the north edge.
        let row = (h.north_lat() - point.lat) * 3600.0 / h.cell_size;

        if col < 0.0 || row < 0.0 || col >= h.width as f64 || row >= h.height as f64 {
            return None;
        }
        Some((row, col))
    }

    fn raw_elevation(&self, row: usize, col: usize) -> i16 {
        self.elevations[row * self.header.width as usize + col]
    }

    /// Elevation at a point with bilinear interpolation, or None outside the grid.
    pub fn elevation_at(&self, point: &GeoPoint) -> Option<f32> {
        let (row, col) = self.geo_to_grid(point)?;
        let r0 = row.floor() as usize;
        let c0 = col.floor() as usize;
        let r1 = (r0 + 1).min(self.header.height as usize - 1);
        let c1 = (c0 + 1).min(self.header.width as usize - 1);

        let fr = row - r0 as f64;
        let fc = col - c0 as f64;

        let e00 = self.raw_elevation(r0, c0) as f64;
        let e01 = self.raw_elevation(r0, c1) as f64;
        let e10 = self.raw_elevation(r1, c0) as f64;
        let e11 = self.raw_elevation(r1, c1) as f64;

        let top = e00 * (1.0 - fc) + e01 * fc;
        let bot = e10 * (1.0 - fc) + e11 * fc;
        Some((top * (1.0 - fr) + bot * fr) as f32)
    }
}

impl TerrainOracle for LandMask {
    fn classify(&self, point: GeoPoint) -> Result<TerrainVerdict, OracleError> {
        Ok(match self.elevation_at(&point) {
            Some(e) if e > 0.0 => TerrainVerdict::Land,
            Some(_) => TerrainVerdict::Water,
            None => TerrainVerdict::Inconclusive,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 5×5 grid, 36 arc-seconds per cell, land block in the middle.
    fn make_test_mask() -> LandMask {
        #[rustfmt::skip]
        let elevations: Vec<i16> = vec![
            0,   0,   0,   0,   0,
            0,  50,  50,  50,   0,
            0,  50, 100,  50,   0,
            0,  50,  50,  50,   0,
            0,   0,   0,   0,   0,
        ];
        LandMask::new(
            MaskHeader {
                origin_lat: 55.0,
                origin_lng: 11.0,
                cell_size: 36.0,
                width: 5,
                height: 5,
            },
            elevations,
        )
        .unwrap()
    }

    fn cell_center(mask: &LandMask, row: f64, col: f64) -> GeoPoint {
        let h = &mask.header;
        GeoPoint::new(
            h.north_lat() - row * h.cell_size / 3600.0,
            h.origin_lng + col * h.cell_size / 3600.0,
        )
    }

    #[test]
    fn test_peak_is_land() {
        let mask = make_test_mask();
        let peak = cell_center(&mask, 2.0, 2.0);
        let e = mask.elevation_at(&peak).unwrap();
        assert!((e - 100.0).abs() < 1.0, "Peak elevation should be ~100m, got {e}");
        assert_eq!(mask.classify(peak).unwrap(), TerrainVerdict::Land);
    }

    #[test]
    fn test_bilinear_interpolation() {
        let mask = make_test_mask();
        // Between row 1 (50m) and row 2 (100m) in the center column.
        let e = mask.elevation_at(&cell_center(&mask, 1.5, 2.0)).unwrap();
        assert!((e - 75.0).abs() < 1.0, "Interpolated elevation should be ~75m, got {e}");
    }

    #[test]
    fn test_edge_is_water() {
        let mask = make_test_mask();
        let edge = cell_center(&mask, 4.5, 0.1);
        assert_eq!(mask.classify(edge).unwrap(), TerrainVerdict::Water);
    }

    #[test]
    fn test_outside_grid_is_inconclusive() {
        let mask = make_test_mask();
        let far = GeoPoint::new(56.0, 12.0);
        assert_eq!(mask.classify(far).unwrap(), TerrainVerdict::Inconclusive);
    }

    #[test]
    fn test_size_mismatch_rejected() {
        let header = MaskHeader {
            origin_lat: 55.0,
            origin_lng: 11.0,
            cell_size: 36.0,
            width: 3,
            height: 3,
        };
        let err = LandMask::new(header, vec![0; 4]).unwrap_err();
        assert!(matches!(err, LandMaskError::SizeMismatch { expected: 9, found: 4 }));
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "header": {"origin_lat": 55.0, "origin_lng": 11.0, "cell_size": 36.0, "width": 2, "height": 1},
            "elevations": [0, 10]
        }"#;
        let mask = LandMask::from_json_str(json).unwrap();
        assert_eq!(mask.header.width, 2);
    }
}
