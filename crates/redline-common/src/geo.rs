//! Geographic value types shared by the client and the service seam.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt;

/// A point on the map. No range validation: values come straight from the
/// wire or from a map click, and unparseable wire values become NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoCoordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    /// Within `tolerance` degrees on both axes.
    pub fn approx_eq(&self, other: &GeoCoordinate, tolerance: f64) -> bool {
        (self.latitude - other.latitude).abs() <= tolerance
            && (self.longitude - other.longitude).abs() <= tolerance
    }

    /// Wire form of the coordinate, `(lat, lng)`.
    ///
    /// `f64`'s `Display` is the shortest string that parses back to the same
    /// value, so no precision is lost on the way to the service.
    pub fn to_wire(&self) -> (String, String) {
        (self.latitude.to_string(), self.longitude.to_string())
    }
}

impl fmt::Display for GeoCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

/// Rectangle used to scope an overlay fetch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_long: f64,
    pub max_long: f64,
}

impl BoundingBox {
    /// The whole globe; used for the default overlay on mount.
    pub const WORLD: BoundingBox = BoundingBox {
        min_lat: -90.0,
        max_lat: 90.0,
        min_long: -180.0,
        max_long: 180.0,
    };

    pub const fn new(min_lat: f64, max_lat: f64, min_long: f64, max_long: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_long,
            max_long,
        }
    }

    /// Inclusive on every edge.
    pub fn contains(&self, coord: &GeoCoordinate) -> bool {
        coord.latitude >= self.min_lat
            && coord.latitude <= self.max_lat
            && coord.longitude >= self.min_long
            && coord.longitude <= self.max_long
    }

    /// Query parameters in the order the service documents them.
    pub fn query_params(&self) -> [(&'static str, String); 4] {
        [
            ("minLat", self.min_lat.to_string()),
            ("maxLat", self.max_lat.to_string()),
            ("minLong", self.min_long.to_string()),
            ("maxLong", self.max_long.to_string()),
        ]
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::WORLD
    }
}

/// Identifier handed to us by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(SmolStr);

impl UserId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(SmolStr::new(id))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(SmolStr::from(id))
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_form_is_shortest_round_trip() {
        let coord = GeoCoordinate::new(23.0, -71.4128);
        assert_eq!(coord.to_wire(), ("23".to_string(), "-71.4128".to_string()));

        let precise = GeoCoordinate::new(41.824000000000005, 0.1);
        let (lat, _) = precise.to_wire();
        assert_eq!(lat.parse::<f64>().unwrap(), 41.824000000000005);
    }

    #[test]
    fn test_world_contains_edges() {
        assert!(BoundingBox::WORLD.contains(&GeoCoordinate::new(90.0, -180.0)));
        assert!(!BoundingBox::WORLD.contains(&GeoCoordinate::new(90.5, 0.0)));
    }

    #[test]
    fn test_nan_is_never_contained() {
        assert!(!BoundingBox::WORLD.contains(&GeoCoordinate::new(f64::NAN, 0.0)));
    }

    #[test]
    fn test_world_query_params() {
        let params = BoundingBox::WORLD.query_params();
        assert_eq!(params[0], ("minLat", "-90".to_string()));
        assert_eq!(params[3], ("maxLong", "180".to_string()));
    }
}
