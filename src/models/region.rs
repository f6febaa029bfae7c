use crate::constants::*;
use crate::models::Coordinates;
use serde::{Deserialize, Serialize};

/// Rectangular acceptance window for resolved places.
///
/// Shared by geocoding (candidate selection and the bounded search strategy)
/// and by callers that need to tell whether a start point lies in the
/// operating area.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RegionBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl RegionBounds {
    pub fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Result<Self, String> {
        if !(min_lat < max_lat && min_lon < max_lon) {
            return Err(format!(
                "Invalid region bounds: lat {}..{}, lon {}..{}",
                min_lat, max_lat, min_lon, max_lon
            ));
        }
        Ok(RegionBounds {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        })
    }

    /// Inclusive on every edge.
    pub fn contains(&self, point: &Coordinates) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.lat)
            && (self.min_lon..=self.max_lon).contains(&point.lng)
    }
}

impl Default for RegionBounds {
    fn default() -> Self {
        RegionBounds {
            min_lat: DEFAULT_REGION_MIN_LAT,
            max_lat: DEFAULT_REGION_MAX_LAT,
            min_lon: DEFAULT_REGION_MIN_LON,
            max_lon: DEFAULT_REGION_MAX_LON,
        }
    }
}
