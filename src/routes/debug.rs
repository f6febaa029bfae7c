use crate::constants::{HEALTH_CHECK_PLACE, SMOKE_TEST_DISTANCE_KM};
use crate::models::RouteShape;
use crate::AppState;
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// GET /debug/health - Check that the geocoding provider answers
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    let mut status = json!({
        "status": "ok",
        "checks": {
            "ors_api_key": state.ors_key_hint,
        }
    });

    // Check provider with one search
    match state.route_generator.resolver().check_provider().await {
        Ok(count) => {
            status["checks"]["geocoding"] = json!("ok");
            status["checks"]["geocoding_results"] = json!(count);
        }
        Err(e) => {
            status["checks"]["geocoding"] = json!({"error": e.to_string()});
            status["status"] = json!("error");
        }
    }

    let region = state.route_generator.resolver().region();
    status["checks"]["region"] = json!({
        "min_lat": region.min_lat,
        "max_lat": region.max_lat,
        "min_lon": region.min_lon,
        "max_lon": region.max_lon,
    });

    Json(status)
}

#[derive(Debug, Deserialize)]
pub struct SmokeTestParams {
    pub location: Option<String>,
    pub distance_km: Option<f64>,
}

/// GET /debug/test-route - Geocode and generate a short loop end to end
pub async fn test_route(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SmokeTestParams>,
) -> Json<Value> {
    let location = params
        .location
        .unwrap_or_else(|| HEALTH_CHECK_PLACE.to_string());
    let distance_km = params.distance_km.unwrap_or(SMOKE_TEST_DISTANCE_KM);

    let result = state
        .route_generator
        .generate(&location, distance_km, RouteShape::Loop, "hiking")
        .await;

    match result {
        Ok(route) => {
            let candidate = &route.outcome.candidate;
            Json(json!({
                "status": "ok",
                "location": route.location,
                "profile": route.profile,
                "distance_km": candidate.measured_distance_km,
                "percent_error": candidate.percent_error,
                "attempts": route.outcome.state.attempts_made,
                "within_tolerance": route.outcome.within_tolerance,
                "path_points": candidate.geometry.len(),
            }))
        }
        Err(e) => {
            tracing::warn!(location = %location, error = %e, "Smoke-test route failed: {}", e);
            Json(json!({
                "status": "error",
                "location": location,
                "error": e.to_string(),
            }))
        }
    }
}
