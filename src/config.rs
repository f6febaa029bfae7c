use crate::constants::*;
use crate::error::{AppError, Result};
use crate::models::RegionBounds;
use std::collections::HashMap;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub ors_api_key: String,
    pub ors_base_url: String,
    pub region: RegionBounds,
    pub convergence: ConvergenceConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceConfig {
    /// Synthesize -> request -> measure cycles per run
    pub max_attempts: usize,

    /// Relative distance error (percent) at which an attempt is accepted immediately
    pub tolerance_pct: f64,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            tolerance_pct: DEFAULT_TOLERANCE_PCT,
        }
    }
}

impl ConvergenceConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            max_attempts: env_or("ROUTE_MAX_ATTEMPTS", defaults.max_attempts)?,
            tolerance_pct: env_or("ROUTE_TOLERANCE_PCT", defaults.tolerance_pct)?,
        };

        if config.max_attempts == 0 {
            return Err(AppError::Configuration(
                "ROUTE_MAX_ATTEMPTS must be at least 1".to_string(),
            ));
        }
        if !(config.tolerance_pct > 0.0 && config.tolerance_pct <= 100.0) {
            return Err(AppError::Configuration(
                "ROUTE_TOLERANCE_PCT must be between 0 and 100".to_string(),
            ));
        }

        Ok(config)
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let ors_api_key = env::var("ORS_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AppError::Configuration("ORS_API_KEY must be set".to_string()))?;

        let region = RegionBounds::new(
            env_or("REGION_MIN_LAT", DEFAULT_REGION_MIN_LAT)?,
            env_or("REGION_MAX_LAT", DEFAULT_REGION_MAX_LAT)?,
            env_or("REGION_MIN_LON", DEFAULT_REGION_MIN_LON)?,
            env_or("REGION_MAX_LON", DEFAULT_REGION_MAX_LON)?,
        )
        .map_err(AppError::Configuration)?;

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port: env_or("PORT", DEFAULT_PORT.to_string())?
                .parse()
                .map_err(|_| AppError::Configuration("Invalid PORT".to_string()))?,
            ors_api_key,
            ors_base_url: env::var("ORS_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_ORS_BASE_URL.to_string()),
            region,
            convergence: ConvergenceConfig::from_env()?,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Show only the first four characters of a credential.
pub fn mask_secret(secret: &str) -> String {
    let secret = secret.trim();
    if secret.is_empty() {
        return "not set".to_string();
    }
    let prefix: String = secret.chars().take(4).collect();
    format!("{}...", prefix)
}

fn env_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Configuration(format!("Invalid {}", name))),
        Err(_) => Ok(default),
    }
}

/// Maps user-facing activity names to directions-provider routing profiles.
#[derive(Debug, Clone)]
pub struct ActivityProfiles {
    profiles: HashMap<String, String>,
    default_profile: String,
}

impl ActivityProfiles {
    pub fn new(profiles: HashMap<String, String>, default_profile: impl Into<String>) -> Self {
        Self {
            profiles: profiles
                .into_iter()
                .map(|(activity, profile)| (activity.to_lowercase(), profile))
                .collect(),
            default_profile: default_profile.into(),
        }
    }

    /// Unknown activities route with the default profile.
    pub fn profile_for(&self, activity: &str) -> &str {
        self.profiles
            .get(&activity.trim().to_lowercase())
            .map(String::as_str)
            .unwrap_or(&self.default_profile)
    }
}

impl Default for ActivityProfiles {
    fn default() -> Self {
        let profiles = [
            ("hiking", "foot-hiking"),
            ("trail", "foot-hiking"),
            ("running", "foot-walking"),
            ("walking", "foot-walking"),
        ]
        .into_iter()
        .map(|(a, p)| (a.to_string(), p.to_string()))
        .collect();

        Self::new(profiles, DEFAULT_ROUTING_PROFILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for name in [
            "ORS_API_KEY",
            "ORS_BASE_URL",
            "HOST",
            "PORT",
            "REGION_MIN_LAT",
            "REGION_MAX_LAT",
            "REGION_MIN_LON",
            "REGION_MAX_LON",
            "ROUTE_MAX_ATTEMPTS",
            "ROUTE_TOLERANCE_PCT",
        ] {
            env::remove_var(name);
        }
    }

    #[test]
    #[serial]
    fn test_missing_api_key_is_configuration_error() {
        clear_env();
        env::set_var("ORS_API_KEY", "   ");
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_defaults_when_only_key_is_set() {
        clear_env();
        env::set_var("ORS_API_KEY", "test-key");
        let config = Config::from_env().unwrap();
        assert_eq!(config.ors_base_url, DEFAULT_ORS_BASE_URL);
        assert_eq!(config.region, RegionBounds::default());
        assert_eq!(config.convergence, ConvergenceConfig::default());
        assert_eq!(config.server_address(), "0.0.0.0:3000");
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_convergence_values_rejected() {
        clear_env();
        env::set_var("ROUTE_MAX_ATTEMPTS", "0");
        assert!(ConvergenceConfig::from_env().is_err());
        env::set_var("ROUTE_MAX_ATTEMPTS", "many");
        assert!(ConvergenceConfig::from_env().is_err());
        clear_env();
        env::set_var("ROUTE_TOLERANCE_PCT", "-5");
        assert!(ConvergenceConfig::from_env().is_err());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_inverted_region_rejected() {
        clear_env();
        env::set_var("ORS_API_KEY", "test-key");
        env::set_var("REGION_MIN_LAT", "50.0");
        assert!(matches!(
            Config::from_env().unwrap_err(),
            AppError::Configuration(_)
        ));
        clear_env();
    }

    #[test]
    fn test_activity_profiles() {
        let profiles = ActivityProfiles::default();
        assert_eq!(profiles.profile_for("hiking"), "foot-hiking");
        assert_eq!(profiles.profile_for("Trail"), "foot-hiking");
        assert_eq!(profiles.profile_for("running"), "foot-walking");
        assert_eq!(profiles.profile_for("kayak"), "foot-hiking");
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("5b3ce3597851110001cf6248"), "5b3c...");
        assert_eq!(mask_secret("ab"), "ab...");
        assert_eq!(mask_secret("  "), "not set");
    }
}
