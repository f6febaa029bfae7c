pub mod convergence;
pub mod shape;

use crate::config::{ActivityProfiles, Config, ConvergenceConfig};
use crate::error::Result;
use crate::models::route::validate_target_distance;
use crate::models::{GeocodeResult, RegionBounds, RouteRequest, RouteShape};
use crate::services::directions::{DirectionsProvider, OrsDirectionsClient};
use crate::services::geocoding::{GeocodingProvider, GeocodingResolver, OrsGeocoder};
use std::sync::Arc;

pub use convergence::{ConvergenceOutcome, ConvergenceState, DistanceConvergenceController};
pub use shape::{ConstantJitter, JitterSource, ShapeSample, ShapeSynthesizer};

/// A resolved start point plus the converged route.
#[derive(Debug, Clone)]
pub struct GeneratedRoute {
    pub location: GeocodeResult,
    pub profile: String,
    pub outcome: ConvergenceOutcome,
}

/// Place name + distance + shape + activity in, best route candidate out.
pub struct RouteGenerator {
    resolver: GeocodingResolver,
    controller: DistanceConvergenceController,
    profiles: ActivityProfiles,
}

impl RouteGenerator {
    pub fn new(
        geocoder: Arc<dyn GeocodingProvider>,
        directions: Arc<dyn DirectionsProvider>,
        region: RegionBounds,
        convergence: ConvergenceConfig,
    ) -> Self {
        RouteGenerator {
            resolver: GeocodingResolver::new(geocoder, region),
            controller: DistanceConvergenceController::new(directions, convergence),
            profiles: ActivityProfiles::default(),
        }
    }

    /// Wire the OpenRouteService clients. Fails on a missing credential.
    pub fn from_config(config: &Config) -> Result<Self> {
        let geocoder = OrsGeocoder::new(config.ors_api_key.clone(), config.ors_base_url.clone())?;
        let directions =
            OrsDirectionsClient::new(config.ors_api_key.clone(), config.ors_base_url.clone())?;

        Ok(Self::new(
            Arc::new(geocoder),
            Arc::new(directions),
            config.region,
            config.convergence.clone(),
        ))
    }

    pub fn with_resolver(mut self, resolver: GeocodingResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_profiles(mut self, profiles: ActivityProfiles) -> Self {
        self.profiles = profiles;
        self
    }

    pub fn resolver(&self) -> &GeocodingResolver {
        &self.resolver
    }

    pub async fn generate(
        &self,
        place_name: &str,
        target_distance_km: f64,
        shape: RouteShape,
        activity: &str,
    ) -> Result<GeneratedRoute> {
        validate_target_distance(target_distance_km)?;

        let location = self.resolver.resolve(place_name).await?;
        if location.fell_back() {
            tracing::warn!(
                place = %place_name,
                "Generating from fallback coordinates; '{}' could not be resolved",
                place_name
            );
        } else if !location.in_region {
            tracing::warn!(
                place = %place_name,
                lat = location.coordinates.lat,
                lng = location.coordinates.lng,
                "Start point lies outside the operating region"
            );
        }

        let profile = self.profiles.profile_for(activity).to_string();
        tracing::info!(activity = %activity, profile = %profile, "Selected routing profile");

        let request = RouteRequest::new(
            location.coordinates,
            target_distance_km,
            shape,
            profile.clone(),
        );
        let mut synthesizer = ShapeSynthesizer::from_entropy();
        let outcome = self.controller.converge(&request, &mut synthesizer).await?;

        Ok(GeneratedRoute {
            location,
            profile,
            outcome,
        })
    }
}
