//! Google Maps geocoding provider.
//!
//! Uses the Google Maps Platform geocoding API with authentication via API
//! key. Requires users to have their own Google Cloud Platform account and
//! an API key with the Geocoding API enabled.
//!
//! # API Endpoint
//!
//! `https://maps.googleapis.com/maps/api/geocode/json?key={API_KEY}&address={ADDRESS}`
//!
//! Both parameters are percent-encoded with the `!'()*` characters escaped
//! in addition to standard query encoding.
//!
//! # Response shape
//!
//! A JSON body with a `results` array; each candidate carries
//! `formatted_address`, `geometry.location.{lat,lng}` and an
//! `address_components` array of `{short_name, types}` entries. Only the
//! first candidate is consumed.

use serde::Deserialize;

use crate::geocode::encode::encode_uri_component;
use crate::geocode::http::{AsyncHttpClient, HttpError};
use crate::geocode::{GeocodeError, GeocodeResult, GeocodingProvider, CODE_NO_RESULTS};

/// Base URL of the Google geocoding endpoint.
const GEOCODE_BASE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";

/// Component tag identifying a postal code.
const POSTAL_CODE_TYPE: &str = "postal_code";

/// Placeholder when the backend returns no postal code.
const NOT_AVAILABLE: &str = "N/A";

/// Prepared request for the Google geocoding endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleRequest {
    address: String,
}

/// Raw geocoding response body, reduced to the fields we consume.
#[derive(Debug, Deserialize)]
pub struct GoogleResponse {
    #[serde(default)]
    results: Vec<GoogleCandidate>,
}

#[derive(Debug, Deserialize)]
struct GoogleCandidate {
    #[serde(default)]
    address_components: Vec<AddressComponent>,
    formatted_address: String,
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct AddressComponent {
    short_name: String,
    #[serde(default)]
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Location,
}

#[derive(Debug, Deserialize)]
struct Location {
    lat: f64,
    lng: f64,
}

/// Google Maps geocoding provider.
///
/// Generic over the HTTP client so tests can inject a mock transport.
/// Multiple instances with different API keys can be stacked in a
/// [`ProviderChain`](crate::geocode::ProviderChain) for credential
/// fallback.
pub struct GoogleMapsProvider<C: AsyncHttpClient> {
    http_client: C,
    api_key: String,
    base_url: String,
}

impl<C: AsyncHttpClient> GoogleMapsProvider<C> {
    /// Creates a provider talking to the public Google endpoint.
    ///
    /// # Arguments
    ///
    /// * `http_client` - HTTP client for making requests
    /// * `api_key` - Google Maps Platform API key
    pub fn new(http_client: C, api_key: String) -> Self {
        Self::with_base_url(http_client, api_key, GEOCODE_BASE_URL.to_string())
    }

    /// Creates a provider against a custom endpoint base URL.
    ///
    /// Intended for pointing the provider at a stub server in tests or at
    /// a proxy in restricted environments.
    pub fn with_base_url(http_client: C, api_key: String, base_url: String) -> Self {
        Self {
            http_client,
            api_key,
            base_url,
        }
    }

    /// Builds the lookup URL for the given prepared address.
    fn build_url(&self, address: &str) -> String {
        format!(
            "{}?key={}&address={}",
            self.base_url,
            encode_uri_component(&self.api_key),
            encode_uri_component(address)
        )
    }
}

impl<C: AsyncHttpClient> GeocodingProvider for GoogleMapsProvider<C> {
    type Request = GoogleRequest;
    type Raw = GoogleResponse;

    fn name(&self) -> &str {
        "Google Maps"
    }

    fn prepare_address(&self, address: &str) -> GoogleRequest {
        GoogleRequest {
            address: address.trim().to_string(),
        }
    }

    async fn execute_lookup(&self, request: GoogleRequest) -> Result<GoogleResponse, GeocodeError> {
        let url = self.build_url(&request.address);
        let body = self.http_client.get(&url).await.map_err(|e| match &e {
            HttpError::Status { status, .. } => {
                GeocodeError::new(status.to_string(), e.to_string(), &request.address)
            }
            HttpError::Transport(_) => GeocodeError::unknown(e.to_string(), &request.address),
        })?;

        serde_json::from_slice(&body).map_err(|e| {
            GeocodeError::unknown(
                format!("malformed response body: {}", e),
                &request.address,
            )
        })
    }

    fn parse_result(&self, raw: GoogleResponse, address: &str) -> Result<GeocodeResult, GeocodeError> {
        // Always take the first candidate when the backend returns several.
        let Some(candidate) = raw.results.into_iter().next() else {
            return Err(GeocodeError::new(
                CODE_NO_RESULTS,
                "no results returned",
                address,
            ));
        };

        // The postal code is the component tagged solely as postal_code.
        let post_code = candidate
            .address_components
            .iter()
            .find(|c| c.types.len() == 1 && c.types[0] == POSTAL_CODE_TYPE)
            .map(|c| c.short_name.clone())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        Ok(GeocodeResult {
            address: candidate.formatted_address,
            lat: candidate.geometry.location.lat,
            lng: candidate.geometry.location.lng,
            post_code,
        })
    }
}
