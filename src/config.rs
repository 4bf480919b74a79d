use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{Result, ScrubError};

pub const DEFAULT_GEOCODE_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// Environment variable holding the geocoding credential. The key is always
/// supplied by the caller; it is never compiled into the binary.
pub const API_KEY_ENV: &str = "GEOCODE_API_KEY";

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub geocoder: GeocoderConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocoderConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Minimum spacing between consecutive geocoding requests
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_endpoint() -> String {
    DEFAULT_GEOCODE_ENDPOINT.to_string()
}

fn default_delay_ms() -> u64 {
    200
}

fn default_timeout_seconds() -> u64 {
    10
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            delay_ms: default_delay_ms(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Config {
    /// Loads `config.toml` from the working directory when present,
    /// defaults otherwise.
    pub fn load() -> Result<Self> {
        let config_path = "config.toml";
        if !Path::new(config_path).exists() {
            return Ok(Self::default());
        }
        let config_content = fs::read_to_string(config_path)
            .map_err(|e| ScrubError::Config(format!("Failed to read config file '{config_path}': {e}")))?;

        let config: Config = toml::from_str(&config_content)?;
        Ok(config)
    }
}

/// Resolve the geocoding API credential: an explicit flag wins over the
/// environment.
pub fn resolve_api_key(flag: Option<String>) -> Result<String> {
    if let Some(key) = flag {
        if !key.trim().is_empty() {
            return Ok(key);
        }
    }
    match std::env::var(API_KEY_ENV) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ScrubError::Config(format!(
            "no geocoding API key: pass --api-key or set {API_KEY_ENV}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geocoder_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.geocoder.endpoint, DEFAULT_GEOCODE_ENDPOINT);
        assert_eq!(config.geocoder.delay_ms, 200);
        assert_eq!(config.geocoder.timeout_seconds, 10);
    }

    #[test]
    fn test_partial_geocoder_section() {
        let config: Config = toml::from_str("[geocoder]\ndelay_ms = 500\n").unwrap();
        assert_eq!(config.geocoder.delay_ms, 500);
        assert_eq!(config.geocoder.endpoint, DEFAULT_GEOCODE_ENDPOINT);
    }

    #[test]
    fn test_api_key_flag_wins() {
        let key = resolve_api_key(Some("from-flag".to_string())).unwrap();
        assert_eq!(key, "from-flag");
    }

    #[test]
    fn test_blank_flag_is_rejected() {
        std::env::remove_var(API_KEY_ENV);
        assert!(resolve_api_key(Some("   ".to_string())).is_err());
    }
}
