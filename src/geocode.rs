use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::GeocoderConfig;
use crate::error::{Result, ScrubError};

/// One entry of the geocoder's address breakdown.
#[derive(Debug, Clone, Deserialize)]
pub struct AddressComponent {
    pub long_name: String,
    pub short_name: String,
    pub types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    address_components: Vec<AddressComponent>,
}

/// Port to the external geocoding service. This is the only seam that
/// touches the network; tests drop in a deterministic fake.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Resolve a single-line address to the first result's components.
    async fn lookup(&self, address: &str) -> Result<Vec<AddressComponent>>;
}

/// Geocoder backed by the Google Maps Geocoding API.
pub struct GoogleGeocoder {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GoogleGeocoder {
    pub fn new(api_key: String, config: &GeocoderConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn lookup(&self, address: &str) -> Result<Vec<AddressComponent>> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("address", address), ("key", self.api_key.as_str())])
            .send()
            .await?;
        let body: GeocodeResponse = response.json().await?;
        if body.status != "OK" {
            return Err(ScrubError::Api {
                message: format!("geocode status {}", body.status),
            });
        }
        let first = body.results.into_iter().next().ok_or_else(|| ScrubError::Api {
            message: "geocode returned no results".to_string(),
        })?;
        debug!("Geocoded '{}' into {} components", address, first.address_components.len());
        Ok(first.address_components)
    }
}

/// Enforces a minimum spacing between geocoding calls. The external quota
/// is shared across the whole run, so one throttle instance guards every
/// lookup regardless of how many files are in flight.
pub struct Throttle {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    /// Waits until the configured interval has passed since the previous
    /// acquire, then claims the slot. Holding the lock across the sleep
    /// serializes concurrent callers.
    pub async fn acquire(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// The four address fields written back after a lookup. `ERROR` markers tag
/// failed lookups so operators can inspect them; the row itself is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedAddress {
    pub address1: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

pub const ERROR_SENTINEL: &str = "ERROR";

impl ValidatedAddress {
    /// Sentinel for a rejected lookup (non-OK service status).
    pub fn error() -> Self {
        Self::tagged(ERROR_SENTINEL.to_string())
    }

    /// Sentinel carrying the failure text of a transport or parse error.
    pub fn error_tagged(detail: &str) -> Self {
        Self::tagged(format!("{ERROR_SENTINEL}: {detail}"))
    }

    fn tagged(marker: String) -> Self {
        Self {
            address1: marker.clone(),
            city: marker.clone(),
            state: marker.clone(),
            zip: marker,
        }
    }

    pub fn is_error(&self) -> bool {
        self.address1.starts_with(ERROR_SENTINEL)
    }
}

/// Composes full addresses, drives the geocoder through the shared
/// throttle, and maps failures to the ERROR sentinel.
pub struct AddressValidator {
    geocoder: Box<dyn Geocoder>,
    throttle: Throttle,
}

impl AddressValidator {
    pub fn new(geocoder: Box<dyn Geocoder>, min_delay: Duration) -> Self {
        Self {
            geocoder,
            throttle: Throttle::new(min_delay),
        }
    }

    /// Single-line address from the parts, empty ones omitted.
    pub fn compose_address(parts: &[&str]) -> String {
        parts
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// One throttled lookup. Failures tag the result instead of erroring,
    /// so the caller's row is never dropped.
    pub async fn validate(&self, full_address: &str) -> ValidatedAddress {
        self.throttle.acquire().await;
        match self.geocoder.lookup(full_address).await {
            Ok(components) => parse_components(&components),
            Err(ScrubError::Api { message }) => {
                warn!("Geocoder rejected '{}': {}", full_address, message);
                ValidatedAddress::error()
            }
            Err(e) => {
                warn!("Geocode request failed for '{}': {}", full_address, e);
                ValidatedAddress::error_tagged(&e.to_string())
            }
        }
    }
}

/// Extracts the writable address fields from a component list. Missing
/// components yield empty strings.
fn parse_components(components: &[AddressComponent]) -> ValidatedAddress {
    let street_number = component(components, "street_number", false);
    let route = component(components, "route", false);
    let address1 = format!("{street_number} {route}").trim().to_string();
    ValidatedAddress {
        address1,
        city: component(components, "locality", false),
        state: component(components, "administrative_area_level_1", true),
        zip: component(components, "postal_code", false),
    }
}

/// First component carrying the given type; empty string when absent.
fn component(components: &[AddressComponent], type_name: &str, use_short_name: bool) -> String {
    components
        .iter()
        .find(|c| c.types.iter().any(|t| t == type_name))
        .map(|c| {
            if use_short_name {
                c.short_name.clone()
            } else {
                c.long_name.clone()
            }
        })
        .unwrap_or_default()
}
