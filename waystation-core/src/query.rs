//! Validated search requests and their results.
//!
//! Query types keep their fields private and are only built through
//! constructors that reject out-of-range values. The engines therefore never
//! observe an invalid radius, page size or detour budget, and never clamp.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{GeoPoint, Restroom};

/// Accepted search radius, in metres.
pub const RADIUS_RANGE_METERS: RangeInclusive<f64> = 100.0..=50_000.0;
/// Accepted page size for radius searches.
pub const RADIUS_LIMIT_RANGE: RangeInclusive<usize> = 1..=200;
/// Accepted minimum-rating threshold.
pub const MIN_RATING_RANGE: RangeInclusive<f64> = 1.0..=5.0;
/// Accepted detour budget, in minutes.
pub const DETOUR_MINUTES_RANGE: RangeInclusive<u32> = 1..=30;
/// Accepted result cap for route searches.
pub const ROUTE_LIMIT_RANGE: RangeInclusive<usize> = 1..=50;

/// Default radius when callers do not specify one.
pub const DEFAULT_RADIUS_METERS: f64 = 5_000.0;
/// Default page size for radius searches.
pub const DEFAULT_RADIUS_LIMIT: usize = 50;
/// Default detour budget for route searches.
pub const DEFAULT_DETOUR_MINUTES: u32 = 10;
/// Default result cap for route searches.
pub const DEFAULT_ROUTE_LIMIT: usize = 20;

/// Reasons a query or coordinate was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum QueryValidationError {
    /// Latitude outside `[-90, 90]`.
    #[error("latitude {value} is outside [-90, 90]")]
    Latitude {
        /// Rejected latitude.
        value: f64,
    },
    /// Longitude outside `[-180, 180]`.
    #[error("longitude {value} is outside [-180, 180]")]
    Longitude {
        /// Rejected longitude.
        value: f64,
    },
    /// Radius outside `[100, 50000]` metres.
    #[error("radius {value} m is outside [100, 50000]")]
    Radius {
        /// Rejected radius.
        value: f64,
    },
    /// Page size outside the accepted range.
    #[error("limit {value} is outside [{min}, {max}]")]
    Limit {
        /// Rejected limit.
        value: usize,
        /// Smallest accepted limit.
        min: usize,
        /// Largest accepted limit.
        max: usize,
    },
    /// Minimum rating outside `[1, 5]`.
    #[error("minimum rating {value} is outside [1, 5]")]
    MinRating {
        /// Rejected threshold.
        value: f64,
    },
    /// Detour budget outside `[1, 30]` minutes.
    #[error("detour budget {value} min is outside [1, 30]")]
    DetourMinutes {
        /// Rejected budget.
        value: u32,
    },
}

fn check_limit(value: usize, range: &RangeInclusive<usize>) -> Result<usize, QueryValidationError> {
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(QueryValidationError::Limit {
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

fn check_min_rating(value: f64) -> Result<f64, QueryValidationError> {
    if MIN_RATING_RANGE.contains(&value) {
        Ok(value)
    } else {
        Err(QueryValidationError::MinRating { value })
    }
}

/// Proximity search around a point.
///
/// # Examples
/// ```
/// use waystation_core::{GeoPoint, RadiusQuery};
///
/// let query = RadiusQuery::new(GeoPoint::new(40.7128, -74.0060)?, 1_000.0, 10, 0)?
///     .with_min_rating(3.5)?
///     .free_only();
/// assert_eq!(query.radius_m(), 1_000.0);
/// assert!(query.is_first_page());
/// # Ok::<(), waystation_core::QueryValidationError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RadiusQuery {
    point: GeoPoint,
    radius_m: f64,
    min_rating: Option<f64>,
    wheelchair: Option<bool>,
    gender_neutral: Option<bool>,
    baby_changing: Option<bool>,
    free_only: bool,
    limit: usize,
    offset: usize,
}

impl RadiusQuery {
    /// Validate radius and page size.
    ///
    /// # Errors
    /// Returns [`QueryValidationError::Radius`] or
    /// [`QueryValidationError::Limit`] when out of range.
    pub fn new(
        point: GeoPoint,
        radius_m: f64,
        limit: usize,
        offset: usize,
    ) -> Result<Self, QueryValidationError> {
        if !RADIUS_RANGE_METERS.contains(&radius_m) {
            return Err(QueryValidationError::Radius { value: radius_m });
        }
        Ok(Self {
            point,
            radius_m,
            min_rating: None,
            wheelchair: None,
            gender_neutral: None,
            baby_changing: None,
            free_only: false,
            limit: check_limit(limit, &RADIUS_LIMIT_RANGE)?,
            offset,
        })
    }

    /// Require `avg_overall >= min_rating`.
    ///
    /// # Errors
    /// Returns [`QueryValidationError::MinRating`] outside `[1, 5]`.
    pub fn with_min_rating(mut self, min_rating: f64) -> Result<Self, QueryValidationError> {
        self.min_rating = Some(check_min_rating(min_rating)?);
        Ok(self)
    }

    /// `true` keeps full or partial accessibility; `false` keeps only
    /// restrooms reported as not accessible.
    #[must_use]
    pub const fn with_wheelchair(mut self, accessible: bool) -> Self {
        self.wheelchair = Some(accessible);
        self
    }

    /// Require the gender-neutral flag to equal `gender_neutral`.
    #[must_use]
    pub const fn with_gender_neutral(mut self, gender_neutral: bool) -> Self {
        self.gender_neutral = Some(gender_neutral);
        self
    }

    /// Require the baby-changing flag to equal `baby_changing`.
    #[must_use]
    pub const fn with_baby_changing(mut self, baby_changing: bool) -> Self {
        self.baby_changing = Some(baby_changing);
        self
    }

    /// Exclude restrooms that charge a fee.
    #[must_use]
    pub const fn free_only(mut self) -> Self {
        self.free_only = true;
        self
    }

    /// Search centre.
    #[must_use]
    pub const fn point(&self) -> GeoPoint {
        self.point
    }

    /// Search radius in metres.
    #[must_use]
    pub const fn radius_m(&self) -> f64 {
        self.radius_m
    }

    /// Minimum overall rating, if any.
    #[must_use]
    pub const fn min_rating(&self) -> Option<f64> {
        self.min_rating
    }

    /// Wheelchair filter, if any.
    #[must_use]
    pub const fn wheelchair(&self) -> Option<bool> {
        self.wheelchair
    }

    /// Gender-neutral filter, if any.
    #[must_use]
    pub const fn gender_neutral(&self) -> Option<bool> {
        self.gender_neutral
    }

    /// Baby-changing filter, if any.
    #[must_use]
    pub const fn baby_changing(&self) -> Option<bool> {
        self.baby_changing
    }

    /// Whether paid restrooms are excluded.
    #[must_use]
    pub const fn is_free_only(&self) -> bool {
        self.free_only
    }

    /// Page size.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }

    /// Number of hits skipped before the page starts.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Whether this request asks for the first page, the only cacheable one.
    #[must_use]
    pub const fn is_first_page(&self) -> bool {
        self.offset == 0
    }
}

/// Search for restrooms reachable with a bounded detour between two points.
///
/// # Examples
/// ```
/// use waystation_core::{GeoPoint, RouteQuery};
///
/// let origin = GeoPoint::new(40.71, -74.00)?;
/// let destination = GeoPoint::new(40.76, -73.98)?;
/// let query = RouteQuery::new(origin, destination, 10, 20)?.requiring_wheelchair_access();
/// assert_eq!(query.max_detour_minutes(), 10);
/// assert!(RouteQuery::new(origin, destination, 31, 20).is_err());
/// # Ok::<(), waystation_core::QueryValidationError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RouteQuery {
    origin: GeoPoint,
    destination: GeoPoint,
    max_detour_minutes: u32,
    min_rating: Option<f64>,
    wheelchair_required: bool,
    limit: usize,
}

impl RouteQuery {
    /// Validate the detour budget and result cap.
    ///
    /// # Errors
    /// Returns [`QueryValidationError::DetourMinutes`] or
    /// [`QueryValidationError::Limit`] when out of range.
    pub fn new(
        origin: GeoPoint,
        destination: GeoPoint,
        max_detour_minutes: u32,
        limit: usize,
    ) -> Result<Self, QueryValidationError> {
        if !DETOUR_MINUTES_RANGE.contains(&max_detour_minutes) {
            return Err(QueryValidationError::DetourMinutes {
                value: max_detour_minutes,
            });
        }
        Ok(Self {
            origin,
            destination,
            max_detour_minutes,
            min_rating: None,
            wheelchair_required: false,
            limit: check_limit(limit, &ROUTE_LIMIT_RANGE)?,
        })
    }

    /// Require `avg_overall >= min_rating`.
    ///
    /// # Errors
    /// Returns [`QueryValidationError::MinRating`] outside `[1, 5]`.
    pub fn with_min_rating(mut self, min_rating: f64) -> Result<Self, QueryValidationError> {
        self.min_rating = Some(check_min_rating(min_rating)?);
        Ok(self)
    }

    /// Keep only restrooms with full or partial wheelchair access.
    #[must_use]
    pub const fn requiring_wheelchair_access(mut self) -> Self {
        self.wheelchair_required = true;
        self
    }

    /// Start of the trip.
    #[must_use]
    pub const fn origin(&self) -> GeoPoint {
        self.origin
    }

    /// End of the trip.
    #[must_use]
    pub const fn destination(&self) -> GeoPoint {
        self.destination
    }

    /// Largest acceptable detour in minutes.
    #[must_use]
    pub const fn max_detour_minutes(&self) -> u32 {
        self.max_detour_minutes
    }

    /// Minimum overall rating, if any.
    #[must_use]
    pub const fn min_rating(&self) -> Option<f64> {
        self.min_rating
    }

    /// Whether full or partial wheelchair access is required.
    #[must_use]
    pub const fn wheelchair_required(&self) -> bool {
        self.wheelchair_required
    }

    /// Maximum number of hits.
    #[must_use]
    pub const fn limit(&self) -> usize {
        self.limit
    }
}

/// A radius-search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// The matching restroom.
    pub restroom: Restroom,
    /// Great-circle distance from the query point, in metres.
    pub distance_m: f64,
}

/// A route-search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteHit {
    /// The matching restroom.
    pub restroom: Restroom,
    /// Estimated detour, in whole seconds rounded toward zero.
    pub detour_secs: u32,
}
