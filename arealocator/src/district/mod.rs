//! District index for service-area lookups.
//!
//! Loads a static GeoJSON FeatureCollection of named districts once and
//! answers "which district contains this point" queries against it. The
//! index is immutable after loading and can be shared across request
//! handlers without locking.
//!
//! Only `Polygon` and `MultiPolygon` features are indexed; other geometry
//! types are skipped, preserving dataset order among the remaining
//! features. Overlapping districts are not an error: the first containing
//! feature in stored order wins.

mod geometry;

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use geometry::AreaGeometry;
pub use geometry::GeoPoint;

/// Errors raised while loading the district dataset.
///
/// A load fault is a process-level fault: the dataset is a static input
/// and a missing or malformed file is never silently defaulted.
#[derive(Debug, Error)]
pub enum DistrictError {
    #[error("failed to read district data: {0}")]
    Io(#[from] std::io::Error),

    #[error("district data is not valid GeoJSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed district data: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
struct RawCollection {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    features: Vec<RawFeature>,
}

#[derive(Debug, Deserialize)]
struct RawFeature {
    geometry: Option<RawGeometry>,
    // GeoJSON allows a null properties member.
    #[serde(default)]
    properties: Option<RawProperties>,
}

#[derive(Debug, Default, Deserialize)]
struct RawProperties {
    #[serde(rename = "Name")]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum RawGeometry {
    Polygon { coordinates: Vec<Vec<Vec<f64>>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Vec<f64>>>> },
    #[serde(other)]
    Other,
}

#[derive(Debug)]
struct District {
    name: String,
    geometry: AreaGeometry,
}

/// Immutable in-memory index of named district polygons.
#[derive(Debug)]
pub struct DistrictIndex {
    districts: Vec<District>,
}

impl DistrictIndex {
    /// Loads the index from a GeoJSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DistrictError> {
        let bytes = std::fs::read(path)?;
        Self::from_slice(&bytes)
    }

    /// Builds the index from raw GeoJSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DistrictError> {
        let raw: RawCollection = serde_json::from_slice(bytes)?;
        if raw.kind != "FeatureCollection" {
            return Err(DistrictError::Invalid(format!(
                "expected a FeatureCollection, got \"{}\"",
                raw.kind
            )));
        }

        let mut districts = Vec::new();
        for (position, feature) in raw.features.into_iter().enumerate() {
            let geometry = match feature.geometry {
                Some(RawGeometry::Polygon { coordinates }) => AreaGeometry::polygon(coordinates),
                Some(RawGeometry::MultiPolygon { coordinates }) => {
                    AreaGeometry::multi_polygon(coordinates)
                }
                // Non-areal geometries cannot be service areas.
                Some(RawGeometry::Other) | None => continue,
            }
            .map_err(|e| DistrictError::Invalid(format!("feature {}: {}", position, e)))?;

            let name = feature.properties.and_then(|p| p.name).ok_or_else(|| {
                DistrictError::Invalid(format!("feature {} has no Name property", position))
            })?;

            districts.push(District { name, geometry });
        }

        info!(districts = districts.len(), "district index loaded");
        Ok(Self { districts })
    }

    /// Finds the district containing the given point.
    ///
    /// Returns the name of the first containing feature in dataset order,
    /// or `None` when no district contains the point.
    pub fn find_district(&self, point: GeoPoint) -> Option<&str> {
        self.districts
            .iter()
            .find(|district| district.geometry.contains(point))
            .map(|district| district.name.as_str())
    }

    /// Number of indexed districts.
    pub fn len(&self) -> usize {
        self.districts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.districts.is_empty()
    }
}
