//! Runtime configuration.
//!
//! All externally tunable behavior is environment-style: the geocoding
//! credential, the cache bounds, the district dataset path, the geocoding
//! timeout and the listen address. [`Config::from_env`] reads the
//! variables; the `with_` setters allow overrides (e.g. from CLI flags).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::cache::CacheConfig;

/// Geocoding API credential.
pub const ENV_GOOGLE_MAPS_API_KEY: &str = "GOOGLE_MAPS_API_KEY";
/// Maximum number of cache entries.
pub const ENV_CACHE_MAX: &str = "CACHE_MAX";
/// Maximum cache entry age in milliseconds.
pub const ENV_CACHE_MAX_AGE: &str = "CACHE_MAX_AGE";
/// Path to the district GeoJSON dataset.
pub const ENV_DISTRICTS_FILE: &str = "DISTRICTS_FILE";
/// Per-call geocoding timeout in seconds.
pub const ENV_GEOCODING_TIMEOUT: &str = "GEOCODING_TIMEOUT";
/// HTTP listen address.
pub const ENV_BIND_ADDR: &str = "BIND_ADDR";

const DEFAULT_DISTRICTS_FILE: &str = "data/formatted-districts.json";
const DEFAULT_GEOCODING_TIMEOUT_SECS: u64 = 30;
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Errors raised while reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: \"{value}\"")]
    Invalid { name: &'static str, value: String },
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Google Maps API key. Empty by default; serving requires a key.
    pub google_maps_api_key: String,
    /// Cache bounds (entry count and age).
    pub cache: CacheConfig,
    /// Path to the district GeoJSON dataset.
    pub districts_file: PathBuf,
    /// Per-call geocoding timeout.
    pub geocoding_timeout: Duration,
    /// HTTP listen address.
    pub bind_addr: SocketAddr,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            google_maps_api_key: String::new(),
            cache: CacheConfig::default(),
            districts_file: PathBuf::from(DEFAULT_DISTRICTS_FILE),
            geocoding_timeout: Duration::from_secs(DEFAULT_GEOCODING_TIMEOUT_SECS),
            // The literal is a valid socket address.
            bind_addr: DEFAULT_BIND_ADDR.parse().expect("default bind address"),
        }
    }
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// Unset variables fall back to defaults; validate the credential with
    /// [`ensure_api_key`](Self::ensure_api_key) once overrides are applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    fn from_vars<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(key) = get(ENV_GOOGLE_MAPS_API_KEY) {
            config.google_maps_api_key = key;
        }

        if let Some(value) = get(ENV_CACHE_MAX) {
            let max_entries = parse(ENV_CACHE_MAX, &value)?;
            config.cache = config.cache.with_max_entries(max_entries);
        }
        if let Some(value) = get(ENV_CACHE_MAX_AGE) {
            let millis: u64 = parse(ENV_CACHE_MAX_AGE, &value)?;
            config.cache = config.cache.with_max_age(Duration::from_millis(millis));
        }
        if let Some(value) = get(ENV_DISTRICTS_FILE) {
            config.districts_file = PathBuf::from(value);
        }
        if let Some(value) = get(ENV_GEOCODING_TIMEOUT) {
            let secs: u64 = parse(ENV_GEOCODING_TIMEOUT, &value)?;
            config.geocoding_timeout = Duration::from_secs(secs);
        }
        if let Some(value) = get(ENV_BIND_ADDR) {
            config.bind_addr = parse(ENV_BIND_ADDR, &value)?;
        }

        Ok(config)
    }

    /// Validates that a geocoding credential is present. Serving without
    /// one would fail every lookup, so startup should reject it.
    pub fn ensure_api_key(&self) -> Result<(), ConfigError> {
        if self.google_maps_api_key.is_empty() {
            return Err(ConfigError::Missing(ENV_GOOGLE_MAPS_API_KEY));
        }
        Ok(())
    }

    /// Sets the geocoding credential.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.google_maps_api_key = api_key.into();
        self
    }

    /// Sets the district dataset path.
    pub fn with_districts_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.districts_file = path.into();
        self
    }

    /// Sets the listen address.
    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Sets the per-call geocoding timeout.
    pub fn with_geocoding_timeout(mut self, timeout: Duration) -> Self {
        self.geocoding_timeout = timeout;
        self
    }

    /// Sets the cache bounds.
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }
}

fn parse<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn from_map(map: &HashMap<String, String>) -> Result<Config, ConfigError> {
        Config::from_vars(|name| map.get(name).cloned())
    }

    #[test]
    fn test_missing_api_key_fails_validation() {
        let config = from_map(&vars(&[])).unwrap();
        let err = config.ensure_api_key().unwrap_err();
        assert!(matches!(err, ConfigError::Missing(ENV_GOOGLE_MAPS_API_KEY)));

        let config = config.with_api_key("key");
        assert!(config.ensure_api_key().is_ok());
    }

    #[test]
    fn test_defaults_applied() {
        let config = from_map(&vars(&[(ENV_GOOGLE_MAPS_API_KEY, "key")])).unwrap();
        assert_eq!(config.google_maps_api_key, "key");
        assert_eq!(config.cache.max_entries, crate::cache::DEFAULT_MAX_ENTRIES);
        assert_eq!(config.geocoding_timeout, Duration::from_secs(30));
        assert_eq!(config.bind_addr.port(), 3000);
    }

    #[test]
    fn test_all_variables_parsed() {
        let config = from_map(&vars(&[
            (ENV_GOOGLE_MAPS_API_KEY, "key"),
            (ENV_CACHE_MAX, "5"),
            (ENV_CACHE_MAX_AGE, "2500"),
            (ENV_DISTRICTS_FILE, "/srv/districts.json"),
            (ENV_GEOCODING_TIMEOUT, "7"),
            (ENV_BIND_ADDR, "0.0.0.0:8080"),
        ]))
        .unwrap();

        assert_eq!(config.cache.max_entries, 5);
        assert_eq!(config.cache.max_age, Duration::from_millis(2500));
        assert_eq!(config.districts_file, PathBuf::from("/srv/districts.json"));
        assert_eq!(config.geocoding_timeout, Duration::from_secs(7));
        assert_eq!(config.bind_addr.port(), 8080);
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let err = from_map(&vars(&[
            (ENV_GOOGLE_MAPS_API_KEY, "key"),
            (ENV_CACHE_MAX, "many"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: ENV_CACHE_MAX,
                ..
            }
        ));
    }

    #[test]
    fn test_builder_overrides() {
        let config = Config::default()
            .with_api_key("cli-key")
            .with_districts_file("/tmp/d.json");
        assert_eq!(config.google_maps_api_key, "cli-key");
        assert_eq!(config.districts_file, PathBuf::from("/tmp/d.json"));
    }
}
