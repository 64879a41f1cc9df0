//! Maintenance of cached rating aggregates.
//!
//! [`RatingAggregator`] is the only writer of a restroom's averages and
//! review count. It recomputes them from the full current review set, so
//! the result converges regardless of how many review changes it missed.
//! [`spawn_aggregation_worker`] runs it off the request path.

use log::debug;
use thiserror::Error;

use crate::{EntityStore, RatingAggregates, RestroomId, StoreError};

mod worker;

pub use worker::{AggregationQueue, spawn_aggregation_worker};

/// Result of a single recomputation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecomputeOutcome {
    /// New aggregates were written.
    Updated(RatingAggregates),
    /// The restroom has no reviews; stored aggregates were left untouched.
    NoReviews,
    /// The restroom no longer exists.
    MissingRestroom,
}

/// Errors returned when recomputation is dispatched through the worker.
#[derive(Debug, Error)]
pub enum AggregationError {
    /// The store failed while reading reviews or writing aggregates.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The recomputation task panicked or was cancelled.
    #[error("aggregation task failed: {0}")]
    Task(#[source] tokio::task::JoinError),
    /// The worker is no longer accepting jobs.
    #[error("aggregation worker has stopped")]
    WorkerStopped,
}

/// Recomputes cached aggregates from a restroom's reviews.
///
/// # Examples
/// ```
/// use waystation_core::{
///     AuthorId, GeoPoint, RatingAggregator, RecomputeOutcome, Restroom, RestroomId, Review,
///     ReviewId, ReviewScores,
/// };
/// use waystation_core::test_support::MemoryStore;
///
/// let store = MemoryStore::with_restrooms([Restroom::new(RestroomId(1), GeoPoint::new(0.0, 0.0)?)]);
/// let scores = ReviewScores::from_raw([4, 5, 3, 4, 5, 4]).expect("valid scores");
/// store.add_review(Review::new(ReviewId(1), RestroomId(1), AuthorId(7), scores, None).expect("valid review"));
///
/// let aggregator = RatingAggregator::new(store);
/// let outcome = aggregator.recompute_aggregates(RestroomId(1)).expect("store available");
/// assert!(matches!(outcome, RecomputeOutcome::Updated(a) if a.avg_cleanliness() == 4.0));
/// # Ok::<(), waystation_core::QueryValidationError>(())
/// ```
#[derive(Debug)]
pub struct RatingAggregator<S> {
    store: S,
}

impl<S> RatingAggregator<S>
where
    S: EntityStore,
{
    /// Build an aggregator over `store`.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// The store reviews are read from and aggregates written to.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Recompute and persist the aggregates of `id`.
    ///
    /// Reviews are read first. An empty review set leaves the stored
    /// aggregates as they were. A restroom that vanished, before or during
    /// the write, yields [`RecomputeOutcome::MissingRestroom`].
    ///
    /// # Errors
    /// Propagates store failures other than a missing restroom.
    pub fn recompute_aggregates(&self, id: RestroomId) -> Result<RecomputeOutcome, StoreError> {
        let reviews = self.store.fetch_reviews(id)?;
        let Some(aggregates) = RatingAggregates::from_reviews(&reviews) else {
            debug!("restroom {id} has no reviews; aggregates left unchanged");
            return Ok(RecomputeOutcome::NoReviews);
        };
        if self.store.get_by_id(id)?.is_none() {
            debug!("restroom {id} disappeared before aggregation");
            return Ok(RecomputeOutcome::MissingRestroom);
        }
        match self.store.update_aggregates(id, aggregates) {
            Ok(()) => {
                debug!(
                    "restroom {id} aggregates updated from {} reviews",
                    aggregates.review_count()
                );
                Ok(RecomputeOutcome::Updated(aggregates))
            }
            Err(StoreError::NotFound { .. }) => Ok(RecomputeOutcome::MissingRestroom),
            Err(error) => Err(error),
        }
    }
}
