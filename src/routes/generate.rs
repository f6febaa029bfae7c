use crate::error::{AppError, Result};
use crate::models::{Coordinates, GenerateRouteRequest, GeocodeResult, RouteCandidate};
use crate::services::route_generator::GeneratedRoute;
use crate::AppState;
use axum::{extract::State, Json};
use geojson::{Feature, Geometry};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;

#[derive(Debug, Serialize)]
pub struct GenerateRouteResponse {
    pub location: GeocodeResult,
    pub profile: String,
    pub route: RouteSummary,
}

#[derive(Debug, Serialize)]
pub struct RouteSummary {
    pub distance_km: f64,
    pub ascent_m: f64,
    pub absolute_error_km: f64,
    pub percent_error: f64,
    /// Directions requests made, failed ones included.
    pub attempts: usize,
    pub within_tolerance: bool,
    pub sample_points: Vec<Coordinates>,
    pub geometry: Feature,
}

/// POST /routes/generate
/// Resolve a place name and generate a loop or out-and-back near the target distance
pub async fn generate_route(
    State(state): State<Arc<AppState>>,
    Json(request): Json<GenerateRouteRequest>,
) -> Result<Json<GenerateRouteResponse>> {
    let shape = request.shape().map_err(AppError::InvalidRequest)?;

    tracing::info!(
        location = %request.location,
        distance_km = request.distance_km,
        shape = %shape,
        activity = %request.activity(),
        "Route request: '{}', {:.1}km, {}",
        request.location, request.distance_km, shape
    );

    let generated = state
        .route_generator
        .generate(&request.location, request.distance_km, shape, request.activity())
        .await?;

    Ok(Json(GenerateRouteResponse::from(generated)))
}

impl From<GeneratedRoute> for GenerateRouteResponse {
    fn from(generated: GeneratedRoute) -> Self {
        let outcome = generated.outcome;
        let candidate = outcome.candidate;
        GenerateRouteResponse {
            location: generated.location,
            profile: generated.profile,
            route: RouteSummary {
                distance_km: candidate.measured_distance_km,
                ascent_m: candidate.ascent_m,
                absolute_error_km: candidate.absolute_error_km,
                percent_error: candidate.percent_error,
                attempts: outcome.state.attempts_made,
                within_tolerance: outcome.within_tolerance,
                geometry: path_feature(&candidate),
                sample_points: candidate.sample_points,
            },
        }
    }
}

/// Route path as a GeoJSON LineString feature.
pub fn path_feature(candidate: &RouteCandidate) -> Feature {
    let line = candidate
        .geometry
        .iter()
        .map(|c| c.to_lng_lat().to_vec())
        .collect();

    let mut properties = Map::new();
    properties.insert(
        "distance_km".to_string(),
        JsonValue::from(candidate.measured_distance_km),
    );
    properties.insert("ascent_m".to_string(), JsonValue::from(candidate.ascent_m));
    properties.insert(
        "attempt".to_string(),
        JsonValue::from(candidate.attempt_index + 1),
    );

    Feature {
        geometry: Some(Geometry::new(geojson::Value::LineString(line))),
        properties: Some(properties),
        id: None,
        bbox: None,
        foreign_members: None,
    }
}
