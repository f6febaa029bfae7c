use async_trait::async_trait;
use randobreizh::config::ConvergenceConfig;
use randobreizh::models::{Coordinates, Directions, GeocodeCandidate, RegionBounds};
use randobreizh::services::directions::DirectionsProvider;
use randobreizh::services::geocoding::{GeocodeQuery, GeocodingProvider};
use randobreizh::services::route_generator::RouteGenerator;
use randobreizh::{AppError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Directions mock replaying scripted distances (`None` = transport failure).
/// The last step repeats once the script runs out.
#[allow(dead_code)]
pub struct ScriptedDirections {
    script: Vec<Option<f64>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<(Vec<Coordinates>, String)>>,
}

#[allow(dead_code)]
impl ScriptedDirections {
    pub fn new(script: Vec<Option<f64>>) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Always returns the same distance.
    pub fn constant(distance_km: f64) -> Arc<Self> {
        Self::new(vec![Some(distance_km)])
    }

    /// Always fails with a connectivity error.
    pub fn failing() -> Arc<Self> {
        Self::new(vec![None])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Sample points and profile of every request, in order.
    pub fn requests(&self) -> Vec<(Vec<Coordinates>, String)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl DirectionsProvider for ScriptedDirections {
    async fn request_directions(
        &self,
        points: &[Coordinates],
        profile: &str,
    ) -> Result<Directions> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .unwrap()
            .push((points.to_vec(), profile.to_string()));

        let step = self
            .script
            .get(call)
            .or_else(|| self.script.last())
            .copied()
            .flatten();

        match step {
            Some(distance_km) => Ok(Directions {
                geometry: points.to_vec(),
                distance_km,
                ascent_m: 42.0,
            }),
            None => Err(AppError::Connectivity(
                "Directions request failed: connection refused".to_string(),
            )),
        }
    }
}

/// Geocoding mock replaying one scripted answer per search (`None` = failure).
/// Searches past the end of the script return no candidates.
#[allow(dead_code)]
pub struct ScriptedGeocoder {
    script: Vec<Option<Vec<GeocodeCandidate>>>,
    queries: Mutex<Vec<GeocodeQuery>>,
}

#[allow(dead_code)]
impl ScriptedGeocoder {
    pub fn new(script: Vec<Option<Vec<GeocodeCandidate>>>) -> Arc<Self> {
        Arc::new(Self {
            script,
            queries: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Self::new(vec![None, None, None])
    }

    pub fn calls(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    pub fn queries(&self) -> Vec<GeocodeQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl GeocodingProvider for ScriptedGeocoder {
    async fn search(&self, query: &GeocodeQuery) -> Result<Vec<GeocodeCandidate>> {
        let call = {
            let mut queries = self.queries.lock().unwrap();
            queries.push(query.clone());
            queries.len() - 1
        };

        match self.script.get(call) {
            Some(Some(candidates)) => Ok(candidates.clone()),
            Some(None) => Err(AppError::Connectivity(
                "Geocoding request failed: timed out".to_string(),
            )),
            None => Ok(Vec::new()),
        }
    }
}

/// Build a geocoding candidate
#[allow(dead_code)]
pub fn candidate(name: &str, lat: f64, lng: f64) -> GeocodeCandidate {
    GeocodeCandidate {
        coordinates: Coordinates::new(lat, lng).unwrap(),
        name: Some(name.to_string()),
        region: Some("Bretagne".to_string()),
    }
}

/// Generator over mocks with the default Brittany region and convergence settings
#[allow(dead_code)]
pub fn test_generator(
    geocoder: Arc<ScriptedGeocoder>,
    directions: Arc<ScriptedDirections>,
) -> RouteGenerator {
    RouteGenerator::new(
        geocoder,
        directions,
        RegionBounds::default(),
        ConvergenceConfig::default(),
    )
}
