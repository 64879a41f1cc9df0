//! Validated WGS84 positions.

use geo::Coord;
use serde::{Deserialize, Serialize};

use crate::query::QueryValidationError;

/// A WGS84 position with latitude in `[-90, 90]` and longitude in
/// `[-180, 180]`.
///
/// The wrapped [`Coord`] follows the `geo` convention of `x = longitude` and
/// `y = latitude`.
///
/// # Examples
/// ```
/// use waystation_core::GeoPoint;
///
/// let point = GeoPoint::new(40.7128, -74.0060)?;
/// assert_eq!(point.latitude(), 40.7128);
/// assert_eq!(point.coord().x, -74.0060);
/// # Ok::<(), waystation_core::QueryValidationError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPoint", into = "RawPoint")]
pub struct GeoPoint {
    coord: Coord<f64>,
}

impl GeoPoint {
    /// Validate and construct a point from latitude and longitude in degrees.
    ///
    /// # Errors
    /// Returns [`QueryValidationError::Latitude`] or
    /// [`QueryValidationError::Longitude`] when a component is out of range
    /// or not finite.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, QueryValidationError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(QueryValidationError::Latitude { value: latitude });
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(QueryValidationError::Longitude { value: longitude });
        }
        Ok(Self {
            coord: Coord {
                x: longitude,
                y: latitude,
            },
        })
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.coord.y
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.coord.x
    }

    /// The position as a `geo` coordinate (`x = longitude`, `y = latitude`).
    #[must_use]
    pub const fn coord(&self) -> Coord<f64> {
        self.coord
    }
}

#[derive(Serialize, Deserialize)]
struct RawPoint {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawPoint> for GeoPoint {
    type Error = QueryValidationError;

    fn try_from(raw: RawPoint) -> Result<Self, Self::Error> {
        Self::new(raw.latitude, raw.longitude)
    }
}

impl From<GeoPoint> for RawPoint {
    fn from(point: GeoPoint) -> Self {
        Self {
            latitude: point.latitude(),
            longitude: point.longitude(),
        }
    }
}
