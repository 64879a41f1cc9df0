//! Data access traits for restrooms and their reviews.
//!
//! The [`EntityStore`] trait is the only way the search engines and the
//! rating aggregator reach persisted data. Candidates are selected with an
//! [`EntityFilter`], whose [`EntityFilter::matches`] method is the reference
//! predicate every backend must agree with.

use std::error::Error as StdError;
use std::sync::Arc;

use geo::{Intersects, Rect};
use thiserror::Error;

use crate::{RadiusQuery, RatingAggregates, Restroom, RestroomId, Review};

#[cfg(feature = "store-sqlite")]
mod sqlite;

#[cfg(feature = "store-sqlite")]
pub use sqlite::{SqliteEntityStore, SqliteStoreError};

/// Errors surfaced by [`EntityStore`] implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The referenced restroom does not exist.
    #[error("restroom {id} not found")]
    NotFound {
        /// Identifier that failed to resolve.
        id: RestroomId,
    },
    /// The backing store failed.
    #[error("entity store backend failed: {source}")]
    Backend {
        /// Backend-specific failure.
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl StoreError {
    /// Wrap a backend-specific failure.
    pub fn backend<E>(source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Backend {
            source: Box::new(source),
        }
    }
}

/// Candidate selection passed to [`EntityStore::find_active_entities`].
///
/// Every filter always requires `active && !permanently_closed`. The
/// optional fields narrow the set further. `bbox` bounds are inclusive and
/// use `x = longitude`, `y = latitude`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EntityFilter {
    /// Keep restrooms with `avg_overall >= min_rating`.
    pub min_rating: Option<f64>,
    /// `Some(true)` keeps full or partial access, `Some(false)` keeps
    /// restrooms reported as not accessible.
    pub wheelchair: Option<bool>,
    /// Exact match on the gender-neutral flag.
    pub gender_neutral: Option<bool>,
    /// Exact match on the baby-changing flag.
    pub baby_changing: Option<bool>,
    /// Exclude restrooms that charge a fee.
    pub free_only: bool,
    /// Inclusive bounding box on the restroom location.
    pub bbox: Option<Rect<f64>>,
    /// Maximum number of candidates, applied after ordering by id.
    pub limit: Option<usize>,
}

impl EntityFilter {
    /// Whether `restroom` satisfies the filter, ignoring `limit`.
    ///
    /// # Examples
    /// ```
    /// use waystation_core::{EntityFilter, GeoPoint, Restroom, RestroomId};
    ///
    /// let restroom = Restroom::new(RestroomId(1), GeoPoint::new(0.0, 0.0)?);
    /// assert!(EntityFilter::default().matches(&restroom));
    /// let rated = EntityFilter { min_rating: Some(3.0), ..EntityFilter::default() };
    /// assert!(!rated.matches(&restroom));
    /// # Ok::<(), waystation_core::QueryValidationError>(())
    /// ```
    #[must_use]
    pub fn matches(&self, restroom: &Restroom) -> bool {
        let attributes = &restroom.attributes;
        restroom.status.is_searchable()
            && self
                .min_rating
                .is_none_or(|min| restroom.ratings().avg_overall() >= min)
            && self.wheelchair.is_none_or(|wanted| {
                if wanted {
                    attributes.wheelchair.is_accessible()
                } else {
                    attributes.wheelchair == crate::AccessibilityLevel::None
                }
            })
            && self
                .gender_neutral
                .is_none_or(|wanted| attributes.gender_neutral == Some(wanted))
            && self
                .baby_changing
                .is_none_or(|wanted| attributes.baby_changing == Some(wanted))
            && (!self.free_only || !attributes.requires_fee)
            && self
                .bbox
                .is_none_or(|bbox| bbox.intersects(&restroom.location.coord()))
    }
}

impl From<&RadiusQuery> for EntityFilter {
    fn from(query: &RadiusQuery) -> Self {
        Self {
            min_rating: query.min_rating(),
            wheelchair: query.wheelchair(),
            gender_neutral: query.gender_neutral(),
            baby_changing: query.baby_changing(),
            free_only: query.is_free_only(),
            bbox: None,
            limit: None,
        }
    }
}

/// Access to persisted restrooms and reviews.
///
/// Implementations must be safe to share between threads; the aggregation
/// worker calls into the store from the blocking pool while searches run
/// concurrently.
pub trait EntityStore: Send + Sync {
    /// Return searchable restrooms satisfying `filter`, ordered by ascending
    /// id and truncated to `filter.limit`.
    fn find_active_entities(&self, filter: &EntityFilter) -> Result<Vec<Restroom>, StoreError>;

    /// Look up a restroom regardless of its status.
    fn get_by_id(&self, id: RestroomId) -> Result<Option<Restroom>, StoreError>;

    /// Overwrite the cached aggregates of a restroom in one write.
    ///
    /// Returns [`StoreError::NotFound`] when the restroom does not exist.
    fn update_aggregates(
        &self,
        id: RestroomId,
        aggregates: RatingAggregates,
    ) -> Result<(), StoreError>;

    /// All current reviews of a restroom, ordered by review id.
    fn fetch_reviews(&self, id: RestroomId) -> Result<Vec<Review>, StoreError>;
}

impl<S> EntityStore for Arc<S>
where
    S: EntityStore + ?Sized,
{
    fn find_active_entities(&self, filter: &EntityFilter) -> Result<Vec<Restroom>, StoreError> {
        (**self).find_active_entities(filter)
    }

    fn get_by_id(&self, id: RestroomId) -> Result<Option<Restroom>, StoreError> {
        (**self).get_by_id(id)
    }

    fn update_aggregates(
        &self,
        id: RestroomId,
        aggregates: RatingAggregates,
    ) -> Result<(), StoreError> {
        (**self).update_aggregates(id, aggregates)
    }

    fn fetch_reviews(&self, id: RestroomId) -> Result<Vec<Review>, StoreError> {
        (**self).fetch_reviews(id)
    }
}

impl<S> EntityStore for &S
where
    S: EntityStore + ?Sized,
{
    fn find_active_entities(&self, filter: &EntityFilter) -> Result<Vec<Restroom>, StoreError> {
        (**self).find_active_entities(filter)
    }

    fn get_by_id(&self, id: RestroomId) -> Result<Option<Restroom>, StoreError> {
        (**self).get_by_id(id)
    }

    fn update_aggregates(
        &self,
        id: RestroomId,
        aggregates: RatingAggregates,
    ) -> Result<(), StoreError> {
        (**self).update_aggregates(id, aggregates)
    }

    fn fetch_reviews(&self, id: RestroomId) -> Result<Vec<Review>, StoreError> {
        (**self).fetch_reviews(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MemoryStore, restroom_at};
    use crate::{AccessibilityLevel, RestroomAttributes, RestroomStatus};
    use geo::Coord;
    use rstest::rstest;

    fn with_attributes(attributes: RestroomAttributes) -> Restroom {
        restroom_at(1, 0.0, 0.0).with_attributes(attributes)
    }

    #[rstest]
    #[case(RestroomStatus::default(), true)]
    #[case(RestroomStatus { active: false, ..RestroomStatus::default() }, false)]
    #[case(RestroomStatus { permanently_closed: true, ..RestroomStatus::default() }, false)]
    fn base_predicate_requires_searchable_status(
        #[case] status: RestroomStatus,
        #[case] expected: bool,
    ) {
        let restroom = restroom_at(1, 0.0, 0.0).with_status(status);
        assert_eq!(EntityFilter::default().matches(&restroom), expected);
    }

    #[rstest]
    #[case(AccessibilityLevel::Full, Some(true), true)]
    #[case(AccessibilityLevel::Partial, Some(true), true)]
    #[case(AccessibilityLevel::None, Some(true), false)]
    #[case(AccessibilityLevel::Unknown, Some(true), false)]
    #[case(AccessibilityLevel::None, Some(false), true)]
    #[case(AccessibilityLevel::Unknown, Some(false), false)]
    #[case(AccessibilityLevel::Full, Some(false), false)]
    #[case(AccessibilityLevel::Unknown, None, true)]
    fn wheelchair_filter(
        #[case] level: AccessibilityLevel,
        #[case] wanted: Option<bool>,
        #[case] expected: bool,
    ) {
        let restroom = with_attributes(RestroomAttributes {
            wheelchair: level,
            ..RestroomAttributes::default()
        });
        let filter = EntityFilter {
            wheelchair: wanted,
            ..EntityFilter::default()
        };
        assert_eq!(filter.matches(&restroom), expected);
    }

    #[rstest]
    #[case(Some(true), Some(true), true)]
    #[case(Some(false), Some(true), false)]
    #[case(None, Some(true), false)]
    #[case(None, Some(false), false)]
    #[case(None, None, true)]
    fn boolean_flags_match_exactly(
        #[case] stored: Option<bool>,
        #[case] wanted: Option<bool>,
        #[case] expected: bool,
    ) {
        let restroom = with_attributes(RestroomAttributes {
            gender_neutral: stored,
            baby_changing: stored,
            ..RestroomAttributes::default()
        });
        let by_gender = EntityFilter {
            gender_neutral: wanted,
            ..EntityFilter::default()
        };
        let by_changing = EntityFilter {
            baby_changing: wanted,
            ..EntityFilter::default()
        };
        assert_eq!(by_gender.matches(&restroom), expected);
        assert_eq!(by_changing.matches(&restroom), expected);
    }

    #[rstest]
    fn free_only_excludes_paid_restrooms() {
        let paid = with_attributes(RestroomAttributes {
            requires_fee: true,
            ..RestroomAttributes::default()
        });
        let filter = EntityFilter {
            free_only: true,
            ..EntityFilter::default()
        };
        assert!(!filter.matches(&paid));
        assert!(filter.matches(&restroom_at(2, 0.0, 0.0)));
    }

    #[rstest]
    #[case(1.0, 1.0, true)]
    #[case(-1.0, -1.0, true)]
    #[case(1.0000001, 0.0, false)]
    fn bbox_is_inclusive(#[case] lat: f64, #[case] lon: f64, #[case] expected: bool) {
        let filter = EntityFilter {
            bbox: Some(Rect::new(
                Coord { x: -1.0, y: -1.0 },
                Coord { x: 1.0, y: 1.0 },
            )),
            ..EntityFilter::default()
        };
        assert_eq!(filter.matches(&restroom_at(1, lat, lon)), expected);
    }

    #[rstest]
    fn memory_store_orders_by_id_before_limiting() {
        let store = MemoryStore::with_restrooms([
            restroom_at(3, 0.0, 0.0),
            restroom_at(1, 0.0, 0.0),
            restroom_at(2, 0.0, 0.0),
        ]);
        let filter = EntityFilter {
            limit: Some(2),
            ..EntityFilter::default()
        };
        let ids: Vec<_> = store
            .find_active_entities(&filter)
            .expect("memory store never fails")
            .into_iter()
            .map(|restroom| restroom.id)
            .collect();
        assert_eq!(ids, vec![RestroomId(1), RestroomId(2)]);
    }

    #[rstest]
    fn updating_missing_restroom_is_not_found() {
        let store = MemoryStore::default();
        let err = store
            .update_aggregates(RestroomId(9), RatingAggregates::default())
            .expect_err("missing restroom");
        assert!(matches!(err, StoreError::NotFound { id: RestroomId(9) }));
    }
}
