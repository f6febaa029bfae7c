use crate::constants::*;
use crate::error::{AppError, Result};
use crate::models::{Coordinates, GeocodeCandidate, GeocodeResult, GeocodeSource, RegionBounds};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// One geocoding search: free text plus result filters.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeQuery {
    pub text: String,
    pub layers: &'static str,
    pub boundary_rect: Option<RegionBounds>,
}

impl GeocodeQuery {
    /// Query-string parameters in provider order.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("text", self.text.clone()),
            ("size", GEOCODING_RESULT_SIZE.to_string()),
            ("layers", self.layers.to_string()),
            ("boundary.country", GEOCODING_COUNTRY.to_string()),
        ];
        if let Some(rect) = self.boundary_rect {
            params.push(("boundary.rect.min_lon", rect.min_lon.to_string()));
            params.push(("boundary.rect.min_lat", rect.min_lat.to_string()));
            params.push(("boundary.rect.max_lon", rect.max_lon.to_string()));
            params.push(("boundary.rect.max_lat", rect.max_lat.to_string()));
        }
        params
    }
}

#[async_trait]
pub trait GeocodingProvider: Send + Sync {
    /// Candidates in provider ranking order.
    async fn search(&self, query: &GeocodeQuery) -> Result<Vec<GeocodeCandidate>>;
}

/// OpenRouteService (Pelias) geocoding search.
#[derive(Clone)]
pub struct OrsGeocoder {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OrsGeocoder {
    pub fn new(api_key: String, base_url: String) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(AppError::Configuration(
                "OpenRouteService API key is not set".to_string(),
            ));
        }
        Ok(OrsGeocoder {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl GeocodingProvider for OrsGeocoder {
    async fn search(&self, query: &GeocodeQuery) -> Result<Vec<GeocodeCandidate>> {
        let response = self
            .client
            .get(format!("{}/geocode/search", self.base_url))
            .header(AUTHORIZATION, &self.api_key)
            .header(ACCEPT, "application/json, application/geo+json")
            .query(&query.params())
            .timeout(Duration::from_secs(GEOCODING_TIMEOUT_SECONDS))
            .send()
            .await
            .map_err(|e| AppError::Connectivity(format!("Geocoding request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::Connectivity(format!("Failed to read geocoding body: {}", e)))?;

        parse_geocode_body(status, &body)
    }
}

#[derive(Debug, Deserialize)]
struct PeliasResponse {
    #[serde(default)]
    features: Vec<PeliasFeature>,
}

#[derive(Debug, Deserialize)]
struct PeliasFeature {
    geometry: Option<PeliasPoint>,
    #[serde(default)]
    properties: PeliasProperties,
}

#[derive(Debug, Deserialize)]
struct PeliasPoint {
    #[serde(default)]
    coordinates: Vec<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct PeliasProperties {
    name: Option<String>,
    region: Option<String>,
}

/// Features without usable coordinates are dropped.
pub fn parse_geocode_body(status: StatusCode, body: &str) -> Result<Vec<GeocodeCandidate>> {
    if status != StatusCode::OK {
        return Err(AppError::Connectivity(format!(
            "Geocoding service returned HTTP {}",
            status.as_u16()
        )));
    }

    let response: PeliasResponse = serde_json::from_str(body)
        .map_err(|e| AppError::Format(format!("Failed to parse geocoding body: {}", e)))?;

    Ok(response
        .features
        .into_iter()
        .filter_map(|feature| {
            let coordinates = Coordinates::from_position(&feature.geometry?.coordinates)?;
            Some(GeocodeCandidate {
                coordinates,
                name: feature.properties.name,
                region: feature.properties.region,
            })
        })
        .collect())
}

/// Resolves place names to coordinates inside the operating region.
///
/// Never fails for non-blank input: provider trouble degrades to the fallback
/// coordinate, flagged through [`GeocodeSource::Fallback`].
pub struct GeocodingResolver {
    provider: Arc<dyn GeocodingProvider>,
    region: RegionBounds,
    known_places: HashMap<String, Coordinates>,
    fallback: Coordinates,
}

impl GeocodingResolver {
    pub fn new(provider: Arc<dyn GeocodingProvider>, region: RegionBounds) -> Self {
        let known_places = KNOWN_PLACES
            .iter()
            .map(|(name, lat, lng)| (name.to_string(), Coordinates { lat: *lat, lng: *lng }))
            .collect();

        GeocodingResolver {
            provider,
            region,
            known_places,
            fallback: Coordinates {
                lat: FALLBACK_LAT,
                lng: FALLBACK_LNG,
            },
        }
    }

    /// Replace the built-in table. Keys are normalized like user input.
    pub fn with_known_places(mut self, places: HashMap<String, Coordinates>) -> Self {
        self.known_places = places
            .into_iter()
            .map(|(name, coords)| (normalize_place_name(&name).to_lowercase(), coords))
            .collect();
        self
    }

    pub fn with_fallback(mut self, fallback: Coordinates) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn region(&self) -> &RegionBounds {
        &self.region
    }

    /// Single unbounded search for diagnostics; returns the candidate count.
    pub async fn check_provider(&self) -> Result<usize> {
        let query = GeocodeQuery {
            text: HEALTH_CHECK_PLACE.to_string(),
            layers: "locality",
            boundary_rect: None,
        };
        let candidates = self.provider.search(&query).await?;
        Ok(candidates.len())
    }

    /// Search strategies, tried in order.
    fn strategies(&self, normalized: &str) -> [GeocodeQuery; 3] {
        [
            GeocodeQuery {
                text: normalized.to_string(),
                layers: "locality,borough,neighbourhood,county",
                boundary_rect: None,
            },
            GeocodeQuery {
                text: format!("{}, {}", normalized, REGION_QUERY_SUFFIX),
                layers: "locality,borough,neighbourhood,county,address",
                boundary_rect: None,
            },
            GeocodeQuery {
                text: normalized.to_string(),
                layers: "locality,borough,neighbourhood,county,address",
                boundary_rect: Some(self.region),
            },
        ]
    }

    pub async fn resolve(&self, place_name: &str) -> Result<GeocodeResult> {
        let normalized = normalize_place_name(place_name);
        if normalized.is_empty() {
            return Err(AppError::BlankInput(
                "Please enter a valid town or village name".to_string(),
            ));
        }

        if let Some(coordinates) = self.known_places.get(&normalized.to_lowercase()) {
            tracing::info!(place = %normalized, "Using pre-baked coordinates for known place");
            return Ok(GeocodeResult {
                coordinates: *coordinates,
                display_name: Some(normalized),
                region: None,
                in_region: self.region.contains(coordinates),
                source: GeocodeSource::KnownPlace,
            });
        }

        let strategies = self.strategies(&normalized);
        let last_index = strategies.len() - 1;

        for (index, query) in strategies.iter().enumerate() {
            let strategy = index + 1;
            tracing::info!(strategy, text = %query.text, "Trying geocoding strategy {}", strategy);

            let candidates = match self.provider.search(query).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    tracing::warn!(
                        strategy,
                        error = %e,
                        "Geocoding strategy {} failed: {}",
                        strategy, e
                    );
                    continue;
                }
            };

            if candidates.is_empty() {
                tracing::warn!(strategy, "No geocoding results for strategy {}", strategy);
                continue;
            }

            let in_region = candidates
                .iter()
                .find(|c| self.region.contains(&c.coordinates));
            if let Some(candidate) = in_region {
                tracing::info!(
                    strategy,
                    name = ?candidate.name,
                    region = ?candidate.region,
                    lat = candidate.coordinates.lat,
                    lng = candidate.coordinates.lng,
                    "Geocoded '{}' inside region",
                    normalized
                );
                return Ok(Self::from_candidate(
                    candidate.clone(),
                    true,
                    GeocodeSource::Provider { strategy },
                ));
            }

            if index == last_index {
                let candidate = candidates[0].clone();
                tracing::warn!(
                    strategy,
                    name = ?candidate.name,
                    region = ?candidate.region,
                    "No in-region match for '{}', using first result",
                    normalized
                );
                return Ok(Self::from_candidate(
                    candidate,
                    false,
                    GeocodeSource::BestEffort { strategy },
                ));
            }

            tracing::warn!(strategy, "No in-region match for strategy {}", strategy);
        }

        tracing::warn!(
            place = %normalized,
            lat = self.fallback.lat,
            lng = self.fallback.lng,
            "All geocoding strategies failed, substituting fallback coordinates"
        );
        Ok(GeocodeResult {
            coordinates: self.fallback,
            display_name: None,
            region: None,
            in_region: self.region.contains(&self.fallback),
            source: GeocodeSource::Fallback,
        })
    }

    fn from_candidate(
        candidate: GeocodeCandidate,
        in_region: bool,
        source: GeocodeSource,
    ) -> GeocodeResult {
        GeocodeResult {
            coordinates: candidate.coordinates,
            display_name: candidate.name,
            region: candidate.region,
            in_region,
            source,
        }
    }
}

/// Trim and turn hyphens into spaces ("Saint-Brieuc" -> "Saint Brieuc").
pub fn normalize_place_name(name: &str) -> String {
    name.trim().replace('-', " ")
}
