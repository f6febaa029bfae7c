//! Stable application-wide constants.
//!
//! Values here are structural invariants, empirically tuned coefficients, and
//! default fallbacks for env-var-based configuration. They should rarely change.
//! For knobs that benefit from runtime experimentation, see
//! [`ConvergenceConfig`](crate::config::ConvergenceConfig) instead.

// --- Server defaults (used when HOST / PORT env vars are absent) ---

/// Default bind address for the HTTP server.
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default port for the HTTP server.
pub const DEFAULT_PORT: &str = "3000";

// --- Provider defaults ---

/// Default OpenRouteService base URL. Overridden by `ORS_BASE_URL`.
pub const DEFAULT_ORS_BASE_URL: &str = "https://api.openrouteservice.org";
/// Timeout for a single geocoding query.
pub const GEOCODING_TIMEOUT_SECONDS: u64 = 15;
/// Timeout for a single directions request.
pub const DIRECTIONS_TIMEOUT_SECONDS: u64 = 20;
/// Routing profile used when the activity is unknown.
pub const DEFAULT_ROUTING_PROFILE: &str = "foot-hiking";

// --- Region (Brittany, slightly widened to include border areas) ---

pub const DEFAULT_REGION_MIN_LAT: f64 = 47.0;
pub const DEFAULT_REGION_MAX_LAT: f64 = 49.0;
pub const DEFAULT_REGION_MIN_LON: f64 = -5.2;
pub const DEFAULT_REGION_MAX_LON: f64 = -0.8;

/// Name appended to the query by the second geocoding strategy.
pub const REGION_QUERY_SUFFIX: &str = "Bretagne, France";
/// ISO country filter sent with every geocoding query.
pub const GEOCODING_COUNTRY: &str = "FRA";
/// Candidates requested per geocoding query.
pub const GEOCODING_RESULT_SIZE: u32 = 5;

/// Place searched by the health check and used by the smoke-test route.
pub const HEALTH_CHECK_PLACE: &str = "Rennes";
/// Distance of the smoke-test route.
pub const SMOKE_TEST_DISTANCE_KM: f64 = 5.0;

/// Coordinate (lat, lng) returned when every geocoding strategy fails: Rennes.
pub const FALLBACK_LAT: f64 = 48.1173;
pub const FALLBACK_LNG: f64 = -1.6743;

/// Pre-baked coordinates (normalized name, lat, lng) that bypass the provider.
pub const KNOWN_PLACES: [(&str, f64, f64); 6] = [
    ("saint brieuc", 48.5134, -2.7849),
    ("rennes", 48.1173, -1.6743),
    ("brest", 48.3904, -4.4860),
    ("quimper", 47.9960, -4.0972),
    ("vannes", 47.6586, -2.7600),
    ("lorient", 47.7486, -3.3800),
];

// --- Degree conversion ---

/// Kilometers per degree of latitude (and of longitude at the equator).
pub const KM_PER_DEGREE: f64 = 111.0;
/// Below this cos(latitude) the longitude scale collapses; use the coarse scale.
pub const MIN_LONGITUDE_SCALE: f64 = 0.1;
/// Coarse kilometers per degree of longitude near the poles.
pub const COARSE_KM_PER_LONGITUDE_DEGREE: f64 = 11.1;

// --- Shape synthesis ---
// Distance-bucketed compensation between straight-line geometry and routed
// path length. Empirical values.

pub const SHORT_ROUTE_MAX_KM: f64 = 3.0;
pub const MEDIUM_ROUTE_MAX_KM: f64 = 10.0;
pub const LOOP_FACTOR_SHORT: f64 = 1.3;
pub const OUT_AND_BACK_FACTOR_SHORT: f64 = 1.4;
pub const FACTOR_MEDIUM: f64 = 1.7;
pub const FACTOR_LONG: f64 = 2.0;

/// Number of points placed on the loop ellipse (start is added at both ends).
pub const LOOP_RING_POINTS: usize = 8;
/// Uniform jitter applied to each ring point, as a fraction of the local radius.
pub const LOOP_JITTER_FRACTION: f64 = 0.05;

/// Intermediate points between start and far point of an out-and-back.
pub const OUT_AND_BACK_INTERMEDIATE_POINTS: usize = 3;
/// Peak of the parabolic jitter taper `k * f * (1 - f)`.
pub const OUT_AND_BACK_JITTER_TAPER: f64 = 0.08;
/// Starts west of this longitude avoid heading straight out to sea.
pub const WESTERN_BAND_MAX_LNG: f64 = -3.0;

// --- Distance convergence ---

/// Attempts per convergence run. Overridden by `ROUTE_MAX_ATTEMPTS`.
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;
/// Acceptable relative error in percent. Overridden by `ROUTE_TOLERANCE_PCT`.
pub const DEFAULT_TOLERANCE_PCT: f64 = 15.0;
/// Lower bound on the per-step factor correction ratio.
pub const CORRECTION_RATIO_MIN: f64 = 0.7;
/// Upper bound on the per-step factor correction ratio.
pub const CORRECTION_RATIO_MAX: f64 = 1.5;
/// Factor multiplier applied when no attempt has succeeded yet.
pub const EXPLORATORY_WIDENING: f64 = 1.2;
