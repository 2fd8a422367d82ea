//! Geographic coordinates accepted by submission requests.

use geo::Coord;
use serde::{Deserialize, Serialize};

/// A WGS84 position expressed as latitude and longitude in degrees.
///
/// On the wire a coordinate is a two-element array `[lat, lng]`, matching the
/// submission payload. Conversion into [`geo::Coord`] follows the `geo`
/// convention of `x = longitude`, `y = latitude`.
///
/// # Examples
/// ```
/// use convoy_core::Coordinate;
///
/// let depot: Coordinate = serde_json::from_str("[35.0527, -89.8502]")?;
/// assert_eq!(depot, Coordinate::new(35.0527, -89.8502));
/// assert!(depot.is_valid());
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    /// Latitude in degrees, within `[-90, 90]`.
    pub lat: f64,
    /// Longitude in degrees, within `[-180, 180]`.
    pub lng: f64,
}

impl Coordinate {
    /// Construct a coordinate from latitude and longitude.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Return whether both components are finite and inside WGS84 bounds.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Format as `lat,lng`, the form distance-matrix services expect.
    #[must_use]
    pub fn to_query_value(&self) -> String {
        format!("{},{}", self.lat, self.lng)
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Self { lat, lng }
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(value: Coordinate) -> Self {
        [value.lat, value.lng]
    }
}

impl From<Coordinate> for Coord<f64> {
    fn from(value: Coordinate) -> Self {
        Self {
            x: value.lng,
            y: value.lat,
        }
    }
}
