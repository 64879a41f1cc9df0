//! The searchable restroom record.
//!
//! A [`Restroom`] groups its location, descriptive attributes, lifecycle
//! flags and cached rating aggregates. The aggregates are read-only here;
//! they change only through [`EntityStore::update_aggregates`] as driven by
//! the [`RatingAggregator`].
//!
//! [`EntityStore::update_aggregates`]: crate::EntityStore::update_aggregates
//! [`RatingAggregator`]: crate::RatingAggregator

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{GeoPoint, RatingAggregates};

/// Opaque identifier of a restroom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RestroomId(pub u64);

impl fmt::Display for RestroomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Wheelchair accessibility reported for a restroom.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessibilityLevel {
    /// Step-free access with accessible fixtures.
    Full,
    /// Some accessible features.
    Partial,
    /// Not wheelchair accessible.
    None,
    /// No information available.
    #[default]
    Unknown,
}

impl AccessibilityLevel {
    /// Whether the level counts as wheelchair accessible for filtering.
    #[must_use]
    pub const fn is_accessible(self) -> bool {
        matches!(self, Self::Full | Self::Partial)
    }

    /// Stable text form used for persistence.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Partial => "partial",
            Self::None => "none",
            Self::Unknown => "unknown",
        }
    }

    /// Parse the persisted text form; unrecognised values map to
    /// [`AccessibilityLevel::Unknown`].
    #[must_use]
    pub fn from_stored(value: &str) -> Self {
        match value {
            "full" => Self::Full,
            "partial" => Self::Partial,
            "none" => Self::None,
            _ => Self::Unknown,
        }
    }
}

/// Fixed attribute flags describing a restroom.
///
/// `None` on an optional flag means the amenity has not been reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestroomAttributes {
    /// Wheelchair accessibility.
    pub wheelchair: AccessibilityLevel,
    /// Open to every gender.
    pub gender_neutral: Option<bool>,
    /// Single-occupancy room shared by all genders.
    pub unisex: Option<bool>,
    /// Baby-changing facilities available.
    pub baby_changing: Option<bool>,
    /// Inside a building.
    pub indoor: bool,
    /// Entry costs money.
    pub requires_fee: bool,
    /// Entry fee in local currency, when known.
    pub fee_amount: Option<f64>,
    /// Soap provided.
    pub has_soap: Option<bool>,
    /// Toilet paper provided.
    pub has_toilet_paper: Option<bool>,
    /// Hand dryer installed.
    pub has_hand_dryer: Option<bool>,
    /// Paper towels provided.
    pub has_paper_towels: Option<bool>,
    /// Hot water available.
    pub has_hot_water: Option<bool>,
    /// Mirror installed.
    pub has_mirror: Option<bool>,
}

impl Default for RestroomAttributes {
    fn default() -> Self {
        Self {
            wheelchair: AccessibilityLevel::Unknown,
            gender_neutral: None,
            unisex: None,
            baby_changing: None,
            indoor: true,
            requires_fee: false,
            fee_amount: None,
            has_soap: None,
            has_toilet_paper: None,
            has_hand_dryer: None,
            has_paper_towels: None,
            has_hot_water: None,
            has_mirror: None,
        }
    }
}

/// Lifecycle flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestroomStatus {
    /// Listed in the directory. Inactive restrooms never appear in searches.
    pub active: bool,
    /// Confirmed by a moderator.
    pub verified: bool,
    /// Closed for now but expected to reopen.
    pub temporarily_closed: bool,
    /// Closed for good. Never appears in searches.
    pub permanently_closed: bool,
}

impl Default for RestroomStatus {
    fn default() -> Self {
        Self {
            active: true,
            verified: false,
            temporarily_closed: false,
            permanently_closed: false,
        }
    }
}

impl RestroomStatus {
    /// Whether the restroom may appear in search results at all.
    #[must_use]
    pub const fn is_searchable(&self) -> bool {
        self.active && !self.permanently_closed
    }
}

/// Where a restroom listing came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestroomSource {
    /// Imported from OpenStreetMap.
    Osm,
    /// Imported from a third-party directory.
    ThirdParty,
    /// Published by a city authority.
    City,
    /// Submitted by a user.
    #[default]
    User,
    /// Imported from Google Places.
    Google,
    /// Merged from several listings.
    Merged,
}

/// Descriptive, human-facing details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestroomDetails {
    /// Display name.
    pub name: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// Postal address.
    pub address: Option<String>,
    /// City name.
    pub city: Option<String>,
    /// Country name.
    pub country: Option<String>,
    /// Opening hours keyed by day, for example `"mon" => "08:00-20:00"`.
    pub operating_hours: Option<BTreeMap<String, String>>,
    /// Origin of the listing.
    pub source: RestroomSource,
}

/// A restroom listed in the directory.
///
/// # Examples
/// ```
/// use waystation_core::{GeoPoint, Restroom, RestroomId};
///
/// let location = GeoPoint::new(51.5, -0.12)?;
/// let restroom = Restroom::new(RestroomId(7), location);
/// assert!(restroom.status.is_searchable());
/// assert_eq!(restroom.ratings().review_count(), 0);
/// # Ok::<(), waystation_core::QueryValidationError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restroom {
    /// Unique identifier.
    pub id: RestroomId,
    /// Position of the entrance.
    pub location: GeoPoint,
    /// Name, address and provenance.
    #[serde(default)]
    pub details: RestroomDetails,
    /// Amenity flags used by search filters.
    #[serde(default)]
    pub attributes: RestroomAttributes,
    /// Lifecycle flags.
    #[serde(default)]
    pub status: RestroomStatus,
    #[serde(default)]
    ratings: RatingAggregates,
}

impl Restroom {
    /// Construct an active restroom with default attributes and no ratings.
    #[must_use]
    pub fn new(id: RestroomId, location: GeoPoint) -> Self {
        Self {
            id,
            location,
            details: RestroomDetails::default(),
            attributes: RestroomAttributes::default(),
            status: RestroomStatus::default(),
            ratings: RatingAggregates::default(),
        }
    }

    /// Rehydrate a persisted restroom together with its stored aggregates.
    ///
    /// Intended for [`EntityStore`](crate::EntityStore) implementations; new
    /// aggregates are produced by the rating aggregator, never by callers.
    #[must_use]
    pub const fn from_parts(
        id: RestroomId,
        location: GeoPoint,
        details: RestroomDetails,
        attributes: RestroomAttributes,
        status: RestroomStatus,
        ratings: RatingAggregates,
    ) -> Self {
        Self {
            id,
            location,
            details,
            attributes,
            status,
            ratings,
        }
    }

    /// Replace the attribute group.
    #[must_use]
    pub fn with_attributes(mut self, attributes: RestroomAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Replace the lifecycle flags.
    #[must_use]
    pub fn with_status(mut self, status: RestroomStatus) -> Self {
        self.status = status;
        self
    }

    /// Replace the descriptive details.
    #[must_use]
    pub fn with_details(mut self, details: RestroomDetails) -> Self {
        self.details = details;
        self
    }

    /// Cached rating aggregates.
    #[must_use]
    pub const fn ratings(&self) -> &RatingAggregates {
        &self.ratings
    }

    #[cfg(any(test, feature = "test-support"))]
    pub(crate) fn set_ratings(&mut self, ratings: RatingAggregates) {
        self.ratings = ratings;
    }
}
