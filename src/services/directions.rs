use crate::constants::*;
use crate::error::{AppError, Result};
use crate::models::{Coordinates, Directions};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Issues one routing request for an ordered list of sample points.
#[async_trait]
pub trait DirectionsProvider: Send + Sync {
    async fn request_directions(
        &self,
        points: &[Coordinates],
        profile: &str,
    ) -> Result<Directions>;
}

/// OpenRouteService directions client (GeoJSON flavour).
#[derive(Clone)]
pub struct OrsDirectionsClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OrsDirectionsClient {
    pub fn new(api_key: String, base_url: String) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(AppError::Configuration(
                "OpenRouteService API key is not set".to_string(),
            ));
        }
        Ok(OrsDirectionsClient {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, profile: &str) -> String {
        format!("{}/v2/directions/{}/geojson", self.base_url, profile)
    }
}

#[derive(Debug, Serialize)]
struct DirectionsPayload {
    coordinates: Vec<[f64; 2]>,
    instructions: bool,
    language: &'static str,
    geometry: bool,
    format: &'static str,
}

#[async_trait]
impl DirectionsProvider for OrsDirectionsClient {
    async fn request_directions(
        &self,
        points: &[Coordinates],
        profile: &str,
    ) -> Result<Directions> {
        let payload = DirectionsPayload {
            coordinates: points.iter().map(Coordinates::to_lng_lat).collect(),
            instructions: true,
            language: "fr",
            geometry: true,
            format: "geojson",
        };

        tracing::debug!(
            points = points.len(),
            profile = %profile,
            "Directions request: {} points, profile {}",
            points.len(), profile
        );

        let response = self
            .client
            .post(self.endpoint(profile))
            .header(AUTHORIZATION, &self.api_key)
            .header(ACCEPT, "application/json, application/geo+json")
            .json(&payload)
            .timeout(Duration::from_secs(DIRECTIONS_TIMEOUT_SECONDS))
            .send()
            .await
            .map_err(|e| {
                let reason = if e.is_timeout() { "timed out" } else { "failed" };
                tracing::error!(error = %e, "Directions request {}", reason);
                AppError::Connectivity(format!("Directions request {}: {}", reason, e))
            })?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Connectivity(format!("Failed to read directions body: {}", e)))?;

        let directions = parse_directions_body(status, content_type.as_deref(), &body)?;
        tracing::info!(
            distance_km = %format!("{:.2}", directions.distance_km),
            ascent_m = %format!("{:.0}", directions.ascent_m),
            path_points = directions.geometry.len(),
            "Directions response: {:.2}km, {} path points",
            directions.distance_km, directions.geometry.len()
        );
        Ok(directions)
    }
}

// ORS response types

#[derive(Debug, Deserialize)]
struct OrsFeatureCollection {
    #[serde(default)]
    features: Vec<OrsFeature>,
}

#[derive(Debug, Deserialize)]
struct OrsFeature {
    geometry: Option<OrsLineString>,
    properties: Option<OrsRouteProperties>,
}

#[derive(Debug, Deserialize)]
struct OrsLineString {
    #[serde(default)]
    coordinates: Vec<Vec<f64>>, // [lng, lat] or [lng, lat, ele]
}

#[derive(Debug, Deserialize)]
struct OrsRouteProperties {
    #[serde(default)]
    segments: Vec<OrsSegment>,
}

#[derive(Debug, Deserialize)]
struct OrsSegment {
    distance: f64, // meters
    #[serde(default)]
    ascent: Option<f64>,
}

/// Validate a directions response and extract geometry, distance and ascent.
///
/// Checks run in order: status, content type, JSON syntax, path feature,
/// segment data. Each failure maps to its own error kind.
pub fn parse_directions_body(
    status: StatusCode,
    content_type: Option<&str>,
    body: &str,
) -> Result<Directions> {
    if status != StatusCode::OK {
        tracing::error!(
            status = %status,
            "Directions API HTTP error {}: {}",
            status,
            truncate(body, 300)
        );
        return Err(AppError::Connectivity(format!(
            "Directions service returned HTTP {}",
            status.as_u16()
        )));
    }

    let content_type = content_type.unwrap_or_default();
    if !content_type.contains("application/json") && !content_type.contains("application/geo+json")
    {
        tracing::error!(content_type = %content_type, "Directions response is not JSON");
        return Err(AppError::Format(format!(
            "Unexpected content type '{}'",
            content_type
        )));
    }

    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| AppError::Format(format!("Failed to parse directions body: {}", e)))?;

    let collection: OrsFeatureCollection = serde_json::from_value(value)
        .map_err(|e| AppError::Structure(format!("Unexpected directions layout: {}", e)))?;

    let feature = collection
        .features
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Structure("Directions response has no route".to_string()))?;

    let segment = feature
        .properties
        .and_then(|p| p.segments.into_iter().next())
        .ok_or_else(|| AppError::Structure("Route has no segment data".to_string()))?;

    let geometry: Vec<Coordinates> = feature
        .geometry
        .map(|g| {
            g.coordinates
                .iter()
                .filter_map(|position| Coordinates::from_position(position))
                .collect()
        })
        .unwrap_or_default();

    if geometry.is_empty() {
        return Err(AppError::Structure(
            "Route has no usable path geometry".to_string(),
        ));
    }

    Ok(Directions {
        geometry,
        distance_km: segment.distance / 1000.0,
        ascent_m: segment.ascent.unwrap_or(0.0),
    })
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
