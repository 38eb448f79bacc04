//! Planar point-in-polygon containment.
//!
//! Implements the standard ray-casting (even-odd) rule on planar
//! (lng, lat) coordinates. Interior rings count as holes: crossing parity
//! is accumulated over every ring of a polygon.

/// A geographic point in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Areal geometry of a district feature.
#[derive(Debug, Clone)]
pub(crate) enum AreaGeometry {
    Polygon(PolygonRings),
    MultiPolygon(Vec<PolygonRings>),
}

/// Rings of a single polygon: the exterior ring followed by any holes.
#[derive(Debug, Clone)]
pub(crate) struct PolygonRings {
    rings: Vec<Vec<(f64, f64)>>,
}

impl PolygonRings {
    /// Builds a polygon from GeoJSON ring coordinates.
    ///
    /// Positions are `[lng, lat, ...]` arrays; extra ordinates (altitude)
    /// are ignored. Rejects rings with fewer than four positions or
    /// positions with fewer than two ordinates.
    pub(crate) fn from_coordinates(rings: Vec<Vec<Vec<f64>>>) -> Result<Self, String> {
        let mut converted = Vec::with_capacity(rings.len());
        for ring in rings {
            if ring.len() < 4 {
                return Err(format!(
                    "ring has {} positions, a closed ring needs at least 4",
                    ring.len()
                ));
            }
            let mut points = Vec::with_capacity(ring.len());
            for position in ring {
                let [lng, lat, ..] = position[..] else {
                    return Err("position has fewer than 2 ordinates".to_string());
                };
                points.push((lng, lat));
            }
            converted.push(points);
        }
        Ok(Self { rings: converted })
    }

    /// Even-odd containment: parity of ray crossings over every ring.
    fn contains(&self, lng: f64, lat: f64) -> bool {
        let mut inside = false;
        for ring in &self.rings {
            if ray_crossings_odd(ring, lng, lat) {
                inside = !inside;
            }
        }
        inside
    }
}

impl AreaGeometry {
    pub(crate) fn polygon(coordinates: Vec<Vec<Vec<f64>>>) -> Result<Self, String> {
        PolygonRings::from_coordinates(coordinates).map(AreaGeometry::Polygon)
    }

    pub(crate) fn multi_polygon(coordinates: Vec<Vec<Vec<Vec<f64>>>>) -> Result<Self, String> {
        let polygons = coordinates
            .into_iter()
            .map(PolygonRings::from_coordinates)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(AreaGeometry::MultiPolygon(polygons))
    }

    /// Whether the point lies inside this geometry.
    pub(crate) fn contains(&self, point: GeoPoint) -> bool {
        match self {
            AreaGeometry::Polygon(polygon) => polygon.contains(point.lng, point.lat),
            AreaGeometry::MultiPolygon(polygons) => polygons
                .iter()
                .any(|polygon| polygon.contains(point.lng, point.lat)),
        }
    }
}

/// Casts a ray towards +x and reports whether it crosses the ring an odd
/// number of times.
fn ray_crossings_odd(ring: &[(f64, f64)], x: f64, y: f64) -> bool {
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];
        let crosses =
            ((yi > y) != (yj > y)) && (x < (xj - xi) * (y - yi) / (yj - yi) + xi);
        if crosses {
            inside = !inside;
        }
        j = i;
    }
    inside
}
