//! Locate orchestration: cache, provider chain, district index.
//!
//! [`Locator`] is the single externally consumed operation of this crate.
//! A `locate` call checks the result cache, resolves the address through
//! the provider chain, classifies the resolved point against the district
//! index, and stores the outcome back in the cache.
//!
//! Geocoding-layer faults are downgraded to a `status: ERROR` result and
//! never cached, so the next call for the same address retries. A district
//! dataset that cannot be loaded is a process-level fault and surfaces as
//! [`LocateError`] instead; the load outcome is memoized and not retried.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{error, info};

use crate::cache::{compose_key, CacheConfig, ResultCache};
use crate::district::{DistrictError, DistrictIndex, GeoPoint};
use crate::geocode::{GeocodeResult, GeocodingProvider, ProviderChain};

/// Cache operation tag for locate results.
const LOCATE_CACHE_OP: &str = "geo-locate";

/// Outcome classification of a locate call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocateStatus {
    /// Address resolved and the point lies in a known district.
    #[serde(rename = "OK")]
    Ok,
    /// Address resolved but the point lies outside every district.
    #[serde(rename = "NOT_FOUND")]
    NotFound,
    /// The address could not be resolved.
    #[serde(rename = "ERROR")]
    Error,
}

/// Resolved location: the geocoding result plus the service area.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(flatten)]
    pub geocode: GeocodeResult,
    /// Name of the containing district; present only when status is OK.
    #[serde(rename = "serviceArea", skip_serializing_if = "Option::is_none")]
    pub service_area: Option<String>,
}

/// Response payload of a locate call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocateResult {
    pub status: LocateStatus,
    /// Search id as supplied by the caller. A cache hit returns the STORED
    /// payload, so this may be the id of an earlier identical lookup.
    pub search: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

/// Process-level faults a locate call cannot downgrade to an ERROR result.
#[derive(Debug, Error)]
pub enum LocateError {
    /// The district dataset could not be loaded. Memoized; the process
    /// must be restarted with a valid dataset.
    #[error("district index unavailable: {0}")]
    DistrictIndex(String),
}

/// Composes provider chain, district index and result cache into the
/// `locate` operation.
///
/// The district index is loaded lazily on first use behind a
/// single-initialization cell, so concurrent first callers cannot race to
/// reload it or observe a partially built index. Call
/// [`preload_districts`](Self::preload_districts) at startup to fail fast
/// on a bad dataset instead of failing the first request.
pub struct Locator<P> {
    chain: ProviderChain<P>,
    cache: ResultCache<LocateResult>,
    districts_file: PathBuf,
    districts: OnceCell<Result<DistrictIndex, DistrictError>>,
}

impl<P: GeocodingProvider> Locator<P> {
    /// Creates a locator over the given chain, dataset path and cache
    /// bounds.
    pub fn new(
        chain: ProviderChain<P>,
        districts_file: impl Into<PathBuf>,
        cache_config: CacheConfig,
    ) -> Self {
        Self {
            chain,
            cache: ResultCache::new(cache_config),
            districts_file: districts_file.into(),
            districts: OnceCell::new(),
        }
    }

    /// Returns the district index, loading it on first use. The load
    /// outcome (success or failure) is memoized for the process lifetime.
    async fn district_index(&self) -> Result<&DistrictIndex, LocateError> {
        let loaded = self
            .districts
            .get_or_init(|| async { DistrictIndex::load(&self.districts_file) })
            .await;
        loaded
            .as_ref()
            .map_err(|e| LocateError::DistrictIndex(e.to_string()))
    }

    /// Eagerly loads the district index so a missing or malformed dataset
    /// fails the process at startup instead of the first request.
    pub async fn preload_districts(&self) -> Result<(), LocateError> {
        self.district_index().await.map(|_| ())
    }

    /// Locates the service area and geocoding details for a user-entered
    /// address.
    ///
    /// Returns the cached result for an identical address when present
    /// (including its original `search` id). Otherwise resolves through
    /// the provider chain and the district index, caching OK and
    /// NOT_FOUND outcomes. Geocoding failures yield a `status: ERROR`
    /// result carrying only the search id; they are not cached.
    pub async fn locate(&self, search: &str, address: &str) -> Result<LocateResult, LocateError> {
        info!(search, address, "locating service area");

        let key = compose_key(LOCATE_CACHE_OP, &[address]);
        if let Some(cached) = self.cache.get(&key) {
            // A cached ERROR is not a valid hit; fall through and retry.
            if cached.status != LocateStatus::Error {
                info!(search, "served from cache");
                return Ok(cached);
            }
        }

        let geocoded = match self.chain.resolve(address).await {
            Ok(result) => result,
            Err(err) => {
                error!(search, error = %err, "geocoding failed");
                return Ok(LocateResult {
                    status: LocateStatus::Error,
                    search: search.to_string(),
                    location: None,
                });
            }
        };

        let index = self.district_index().await?;
        let point = GeoPoint {
            lat: geocoded.lat,
            lng: geocoded.lng,
        };
        let service_area = index.find_district(point).map(str::to_string);

        let status = if service_area.is_some() {
            LocateStatus::Ok
        } else {
            LocateStatus::NotFound
        };
        let result = LocateResult {
            status,
            search: search.to_string(),
            location: Some(Location {
                geocode: geocoded,
                service_area,
            }),
        };

        self.cache.set(key, result.clone());
        info!(search, status = ?result.status, "search completed");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocode::testing::ScriptedProvider;
    use crate::geocode::GeocodeError;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    /// Dataset with a single unit-square district named "Center".
    fn districts_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            br#"{
                "type": "FeatureCollection",
                "features": [
                    {
                        "type": "Feature",
                        "properties": {"Name": "Center"},
                        "geometry": {
                            "type": "Polygon",
                            "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]
                        }
                    }
                ]
            }"#,
        )
        .unwrap();
        file
    }

    fn geocoded_at(lat: f64, lng: f64) -> GeocodeResult {
        GeocodeResult {
            address: "1 Main St, Springfield".to_string(),
            lat,
            lng,
            post_code: "12345".to_string(),
        }
    }

    fn locator_with(
        providers: Vec<ScriptedProvider>,
        file: &NamedTempFile,
    ) -> Locator<ScriptedProvider> {
        Locator::new(
            ProviderChain::new(providers),
            file.path(),
            CacheConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_district_match_is_ok_with_service_area() {
        let file = districts_file();
        let locator = locator_with(
            vec![ScriptedProvider::succeeding("p", geocoded_at(0.5, 0.5))],
            &file,
        );

        let result = locator.locate("search-1", "1 Main St").await.unwrap();
        assert_eq!(result.status, LocateStatus::Ok);
        assert_eq!(result.search, "search-1");
        let location = result.location.unwrap();
        assert_eq!(location.service_area.as_deref(), Some("Center"));
        assert_eq!(location.geocode, geocoded_at(0.5, 0.5));
    }

    #[tokio::test]
    async fn test_no_district_match_is_not_found_without_service_area() {
        let file = districts_file();
        let locator = locator_with(
            vec![ScriptedProvider::succeeding("p", geocoded_at(40.0, 40.0))],
            &file,
        );

        let result = locator.locate("search-2", "far away").await.unwrap();
        assert_eq!(result.status, LocateStatus::NotFound);
        let location = result.location.unwrap();
        assert_eq!(location.service_area, None);
    }

    #[tokio::test]
    async fn test_geocoding_exhaustion_is_error_without_location() {
        let file = districts_file();
        let locator = locator_with(
            vec![ScriptedProvider::failing(
                "p",
                GeocodeError::new("403", "bad key", "x"),
            )],
            &file,
        );

        let result = locator.locate("search-3", "1 Main St").await.unwrap();
        assert_eq!(result.status, LocateStatus::Error);
        assert_eq!(result.search, "search-3");
        assert!(result.location.is_none());
    }

    #[tokio::test]
    async fn test_error_results_are_not_cached() {
        let file = districts_file();
        let locator = locator_with(
            vec![ScriptedProvider::failing(
                "p",
                GeocodeError::new("403", "bad key", "x"),
            )],
            &file,
        );

        locator.locate("a", "1 Main St").await.unwrap();
        locator.locate("b", "1 Main St").await.unwrap();

        // Both calls went to the provider; nothing was served from cache.
        assert_eq!(locator.chain_provider_calls(0), 2);
    }

    #[tokio::test]
    async fn test_cache_hit_returns_first_search_id() {
        let file = districts_file();
        let locator = locator_with(
            vec![ScriptedProvider::succeeding("p", geocoded_at(0.5, 0.5))],
            &file,
        );

        let first = locator.locate("first-id", "1 Main St").await.unwrap();
        let second = locator.locate("second-id", "1 Main St").await.unwrap();

        // Identical location content, but the cached payload keeps the
        // FIRST caller's search id.
        assert_eq!(first.location, second.location);
        assert_eq!(second.search, "first-id");
        assert_eq!(locator.chain_provider_calls(0), 1);
    }

    #[tokio::test]
    async fn test_distinct_addresses_are_distinct_cache_entries() {
        let file = districts_file();
        let locator = locator_with(
            vec![ScriptedProvider::succeeding("p", geocoded_at(0.5, 0.5))],
            &file,
        );

        locator.locate("a", "1 Main St").await.unwrap();
        locator.locate("b", "2 Side St").await.unwrap();
        assert_eq!(locator.chain_provider_calls(0), 2);
    }

    #[tokio::test]
    async fn test_expired_cache_entry_forces_re_resolution() {
        let file = districts_file();
        let locator = Locator::new(
            ProviderChain::new(vec![ScriptedProvider::succeeding(
                "p",
                geocoded_at(0.5, 0.5),
            )]),
            file.path(),
            CacheConfig::default().with_max_age(std::time::Duration::from_millis(20)),
        );

        locator.locate("a", "1 Main St").await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(40)).await;
        let second = locator.locate("b", "1 Main St").await.unwrap();

        assert_eq!(second.search, "b");
        assert_eq!(locator.chain_provider_calls(0), 2);
    }

    #[tokio::test]
    async fn test_missing_dataset_is_a_process_fault() {
        let locator = Locator::new(
            ProviderChain::new(vec![ScriptedProvider::succeeding(
                "p",
                geocoded_at(0.5, 0.5),
            )]),
            "/nonexistent/districts.json",
            CacheConfig::default(),
        );

        let err = locator.locate("a", "1 Main St").await.unwrap_err();
        assert!(matches!(err, LocateError::DistrictIndex(_)));

        // The failure is memoized, not retried.
        let err = locator.preload_districts().await.unwrap_err();
        assert!(matches!(err, LocateError::DistrictIndex(_)));
    }

    #[tokio::test]
    async fn test_preload_succeeds_on_valid_dataset() {
        let file = districts_file();
        let locator = locator_with(
            vec![ScriptedProvider::succeeding("p", geocoded_at(0.5, 0.5))],
            &file,
        );
        locator.preload_districts().await.unwrap();
    }

    #[test]
    fn test_result_serialization_shapes() {
        let ok = LocateResult {
            status: LocateStatus::Ok,
            search: "s".to_string(),
            location: Some(Location {
                geocode: geocoded_at(0.5, 0.5),
                service_area: Some("Center".to_string()),
            }),
        };
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["status"], "OK");
        assert_eq!(json["location"]["postCode"], "12345");
        assert_eq!(json["location"]["serviceArea"], "Center");

        let not_found = LocateResult {
            status: LocateStatus::NotFound,
            search: "s".to_string(),
            location: Some(Location {
                geocode: geocoded_at(0.5, 0.5),
                service_area: None,
            }),
        };
        let json = serde_json::to_value(&not_found).unwrap();
        assert_eq!(json["status"], "NOT_FOUND");
        assert!(json["location"].get("serviceArea").is_none());

        let error = LocateResult {
            status: LocateStatus::Error,
            search: "s".to_string(),
            location: None,
        };
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["status"], "ERROR");
        assert!(json.get("location").is_none());
    }

    impl Locator<ScriptedProvider> {
        /// Test accessor: invocation count of the chain's n-th provider.
        fn chain_provider_calls(&self, index: usize) -> usize {
            self.chain.provider(index).call_count()
        }
    }
}
