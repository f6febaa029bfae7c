use crate::constants::*;
use crate::error::{AppError, Result};
use crate::models::Coordinates;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Requested route topology.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RouteShape {
    /// Closed ring returning to the start.
    #[default]
    Loop,
    /// Point-to-point leg; the return is implied.
    OutAndBack,
}

impl RouteShape {
    /// Initial adjustment factor, bucketed on the distance this shape actually spans.
    ///
    /// Loops bucket on the full target; out-and-back buckets on the outbound half.
    pub fn base_adjustment_factor(&self, target_distance_km: f64) -> f64 {
        match self {
            RouteShape::Loop => {
                bucketed_factor(target_distance_km, LOOP_FACTOR_SHORT)
            }
            RouteShape::OutAndBack => {
                bucketed_factor(target_distance_km / 2.0, OUT_AND_BACK_FACTOR_SHORT)
            }
        }
    }
}

fn bucketed_factor(distance_km: f64, short_factor: f64) -> f64 {
    if distance_km <= SHORT_ROUTE_MAX_KM {
        short_factor
    } else if distance_km <= MEDIUM_ROUTE_MAX_KM {
        FACTOR_MEDIUM
    } else {
        FACTOR_LONG
    }
}

impl fmt::Display for RouteShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RouteShape::Loop => write!(f, "loop"),
            RouteShape::OutAndBack => write!(f, "out_and_back"),
        }
    }
}

impl FromStr for RouteShape {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "loop" | "boucle" => Ok(RouteShape::Loop),
            "out_and_back" | "out-and-back" | "roundtrip" | "aller-retour" => {
                Ok(RouteShape::OutAndBack)
            }
            _ => Err(format!("Invalid route type: '{}'", s)),
        }
    }
}

/// One convergence run's input. Owned by the caller, never persisted.
#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub start: Coordinates,
    pub target_distance_km: f64,
    pub shape: RouteShape,
    /// Routing-profile key understood by the directions provider (e.g. `foot-hiking`).
    pub profile: String,
}

impl RouteRequest {
    pub fn new(
        start: Coordinates,
        target_distance_km: f64,
        shape: RouteShape,
        profile: impl Into<String>,
    ) -> Self {
        RouteRequest {
            start,
            target_distance_km,
            shape,
            profile: profile.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_target_distance(self.target_distance_km)
    }
}

pub fn validate_target_distance(target_distance_km: f64) -> Result<()> {
    if !target_distance_km.is_finite() || target_distance_km <= 0.0 {
        return Err(AppError::BlankInput(format!(
            "Target distance must be a positive number of kilometers, got {}",
            target_distance_km
        )));
    }
    Ok(())
}

/// Body of `POST /routes/generate`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRouteRequest {
    /// Free-text town or village name.
    pub location: String,
    pub distance_km: f64,
    #[serde(default)]
    pub route_type: Option<String>,
    #[serde(default)]
    pub activity_type: Option<String>,
}

impl GenerateRouteRequest {
    /// Absent route type means a loop.
    pub fn shape(&self) -> std::result::Result<RouteShape, String> {
        match self.route_type.as_deref() {
            Some(raw) if !raw.trim().is_empty() => raw.parse(),
            _ => Ok(RouteShape::default()),
        }
    }

    pub fn activity(&self) -> &str {
        self.activity_type.as_deref().unwrap_or("hiking")
    }
}

/// Realized route returned by the directions provider.
#[derive(Debug, Clone, PartialEq)]
pub struct Directions {
    /// Path geometry as returned by the provider.
    pub geometry: Vec<Coordinates>,
    pub distance_km: f64,
    pub ascent_m: f64,
}

/// Outcome of a single synthesize -> request -> measure attempt.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RouteCandidate {
    pub attempt_index: usize,
    /// Points submitted to the provider.
    pub sample_points: Vec<Coordinates>,
    /// Path geometry returned by the provider.
    pub geometry: Vec<Coordinates>,
    pub measured_distance_km: f64,
    pub ascent_m: f64,
    pub absolute_error_km: f64,
    pub percent_error: f64,
}

impl RouteCandidate {
    pub fn measure(
        attempt_index: usize,
        sample_points: Vec<Coordinates>,
        directions: Directions,
        target_distance_km: f64,
    ) -> Self {
        let absolute_error_km = (directions.distance_km - target_distance_km).abs();
        RouteCandidate {
            attempt_index,
            sample_points,
            geometry: directions.geometry,
            measured_distance_km: directions.distance_km,
            ascent_m: directions.ascent_m,
            absolute_error_km,
            percent_error: absolute_error_km / target_distance_km * 100.0,
        }
    }
}
