//! Geocoding provider abstraction
//!
//! This module provides traits and implementations for resolving free-text
//! addresses into geographic coordinates via external geocoding backends.
//!
//! A backend is described by the [`GeocodingProvider`] trait: it prepares a
//! provider-specific request from the raw address, executes the remote
//! lookup, and parses the raw response into a [`GeocodeResult`]. The
//! [`ProviderChain`] tries an ordered list of provider instances until one
//! succeeds, so transient backend faults (quota exhaustion, bad
//! credentials) never change the caller contract.

mod chain;
mod encode;
mod google;
mod http;

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use chain::ProviderChain;
pub use google::GoogleMapsProvider;
pub use http::{AsyncHttpClient, HttpError, ReqwestClient};

#[cfg(test)]
pub use http::tests::MockHttpClient;

/// Error code used when the backend supplies no code of its own.
pub const CODE_UNKNOWN: &str = "UNKNOWN";

/// Error code for a lookup that succeeded but returned zero candidates.
pub const CODE_NO_RESULTS: &str = "NO_RESULTS";

/// Result of a forward geocoding lookup.
///
/// Produced by a provider from the first candidate the backend returns;
/// immutable once constructed. `post_code` is `"N/A"` when the backend
/// supplies no postal-code component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    /// Full address as normalized by the backend.
    pub address: String,
    /// Latitude of the address.
    pub lat: f64,
    /// Longitude of the address.
    pub lng: f64,
    /// Postal code, or `"N/A"` if the backend did not return one.
    #[serde(rename = "postCode")]
    pub post_code: String,
}

/// Error raised by geocoding operations.
///
/// Every failure in the prepare/lookup/parse sequence is wrapped into this
/// one type, carrying the backend-supplied code (or [`CODE_UNKNOWN`]), the
/// underlying message, and the original user-entered address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("geocoding failed with code {code} for \"{address}\": {message}")]
pub struct GeocodeError {
    /// Backend-supplied error code, or `UNKNOWN` / `NO_RESULTS`.
    pub code: String,
    /// Underlying error message.
    pub message: String,
    /// The address that caused this error.
    pub address: String,
}

impl GeocodeError {
    /// Creates an error with an explicit code.
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            address: address.into(),
        }
    }

    /// Creates an error with the [`CODE_UNKNOWN`] code.
    pub fn unknown(message: impl Into<String>, address: impl Into<String>) -> Self {
        Self::new(CODE_UNKNOWN, message, address)
    }

    /// Stamps the original user-entered address onto the error.
    fn for_address(mut self, address: &str) -> Self {
        self.address = address.to_string();
        self
    }
}

/// Capability contract for a geocoding backend.
///
/// Implementations supply the three backend-specific steps; the provided
/// [`get_coordinates_by_address`](Self::get_coordinates_by_address) entry
/// point sequences them and uniformly wraps any failure into a
/// [`GeocodeError`] carrying the original address.
///
/// Futures are required to be `Send` so providers compose with the
/// concurrent request handling in the server layer.
pub trait GeocodingProvider: Send + Sync {
    /// Provider-specific request representation.
    type Request: Send;

    /// Raw result returned by the backend before parsing.
    type Raw: Send;

    /// Human-readable provider name, used in failure logs.
    fn name(&self) -> &str;

    /// Normalizes the free-text address into a provider-specific request.
    fn prepare_address(&self, address: &str) -> Self::Request;

    /// Performs the remote lookup. The only suspension point of a
    /// geocoding call; transport failures, non-success statuses and
    /// backend-reported faults reject with a structured error.
    fn execute_lookup(
        &self,
        request: Self::Request,
    ) -> impl Future<Output = Result<Self::Raw, GeocodeError>> + Send;

    /// Extracts a [`GeocodeResult`] from the first candidate of the raw
    /// backend result. Rejects with code [`CODE_NO_RESULTS`] when the
    /// backend returned zero candidates.
    fn parse_result(&self, raw: Self::Raw, address: &str) -> Result<GeocodeResult, GeocodeError>;

    /// Resolves coordinates for a user-entered address.
    ///
    /// Sequences prepare → lookup → parse. Any failure from any step is
    /// surfaced as a [`GeocodeError`] stamped with the original address.
    fn get_coordinates_by_address(
        &self,
        address: &str,
    ) -> impl Future<Output = Result<GeocodeResult, GeocodeError>> + Send {
        async move {
            let request = self.prepare_address(address);
            let raw = self
                .execute_lookup(request)
                .await
                .map_err(|e| e.for_address(address))?;
            self.parse_result(raw, address)
                .map_err(|e| e.for_address(address))
        }
    }
}
