use crate::models::Coordinates;
use serde::Serialize;

/// Where a resolved coordinate came from.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeocodeSource {
    /// Matched the built-in table; no network call was made.
    KnownPlace,
    /// First in-region candidate of a provider strategy (1-based).
    Provider { strategy: usize },
    /// Out-of-region candidate accepted from the last strategy.
    BestEffort { strategy: usize },
    /// Every strategy failed; the configured fallback coordinate was substituted.
    Fallback,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GeocodeResult {
    pub coordinates: Coordinates,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub in_region: bool,
    pub source: GeocodeSource,
}

impl GeocodeResult {
    /// True when the coordinate is a substitute rather than a match for the query.
    pub fn fell_back(&self) -> bool {
        self.source == GeocodeSource::Fallback
    }
}

/// One candidate returned by a geocoding provider.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeCandidate {
    pub coordinates: Coordinates,
    pub name: Option<String>,
    pub region: Option<String>,
}
