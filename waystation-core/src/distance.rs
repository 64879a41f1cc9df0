//! Great-circle distance between WGS84 positions.
//!
//! Both search engines measure candidates with [`distance_meters`]. The
//! haversine formula is evaluated directly rather than through
//! `geo::Haversine` because results must be reproducible against a fixed
//! Earth radius of 6 371 000 m, whereas `geo` uses the IUGG mean radius.

use geo::Coord;

use crate::GeoPoint;

/// Earth radius used for every distance computation, in metres.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Haversine distance in metres between two coordinates in degrees.
///
/// Coordinates follow the `geo` convention (`x = longitude`,
/// `y = latitude`). The result is symmetric, zero for identical inputs and
/// grows with angular separation.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use waystation_core::distance::distance_between;
///
/// let metres = distance_between(Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 0.0 });
/// assert!((metres - 111_195.0).abs() < 50.0);
/// ```
#[must_use]
pub fn distance_between(a: Coord<f64>, b: Coord<f64>) -> f64 {
    let phi1 = a.y.to_radians();
    let phi2 = b.y.to_radians();
    let delta_phi = (b.y - a.y).to_radians();
    let delta_lambda = (b.x - a.x).to_radians();

    let h = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Haversine distance in metres between two validated points.
#[must_use]
pub fn distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    distance_between(a.coord(), b.coord())
}
