//! Provider fallback chain.
//!
//! Resolves an address by trying an ordered list of provider instances
//! until one succeeds. Callers never see partial failures, only the final
//! success or an aggregate failure with code `UNKNOWN`.

use tracing::{debug, warn};

use crate::geocode::{GeocodeError, GeocodeResult, GeocodingProvider};

/// Ordered list of geocoding provider instances tried in fixed order.
///
/// Typical use stacks several credentialed instances of the same backend,
/// so quota exhaustion or a bad key on one instance degrades to the next
/// instead of failing the lookup.
pub struct ProviderChain<P> {
    providers: Vec<P>,
}

impl<P: GeocodingProvider> ProviderChain<P> {
    /// Creates a chain. The vector order is the fallback order.
    pub fn new(providers: Vec<P>) -> Self {
        Self { providers }
    }

    /// Number of provider instances in the chain.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Test accessor for a chain member.
    #[cfg(test)]
    pub(crate) fn provider(&self, index: usize) -> &P {
        &self.providers[index]
    }

    /// Resolves an address through the chain.
    ///
    /// Returns the first provider's successful result. Failures are logged
    /// with the provider name and swallowed until the chain is exhausted,
    /// at which point an error with code `UNKNOWN` identifies the address
    /// no provider could resolve.
    pub async fn resolve(&self, address: &str) -> Result<GeocodeResult, GeocodeError> {
        for provider in &self.providers {
            match provider.get_coordinates_by_address(address).await {
                Ok(result) => {
                    debug!(provider = provider.name(), "address resolved");
                    return Ok(result);
                }
                Err(error) => {
                    warn!(provider = provider.name(), %error, "geocoding provider failed");
                }
            }
        }

        Err(GeocodeError::unknown(
            format!("no provider can resolve this address: {}", address),
            address,
        ))
    }
}
