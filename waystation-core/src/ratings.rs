//! Cached rating aggregates.
//!
//! [`RatingAggregates`] is a materialised view over a restroom's reviews.
//! Its fields are private: values originate either from
//! [`RatingAggregates::from_reviews`] or, when a store rehydrates a
//! persisted row, from [`RatingAggregates::restore`].

use serde::{Deserialize, Serialize};

use crate::{Rating, Review};

/// Mean scores across a restroom's reviews plus the review count.
///
/// With no reviews every average is `0.0` and the count is zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingAggregates {
    cleanliness: f64,
    lighting: f64,
    safety: f64,
    privacy: f64,
    accessibility: f64,
    overall: f64,
    review_count: u32,
}

/// Per-dimension averages in storage order: cleanliness, lighting, safety,
/// privacy, accessibility, overall.
pub type Averages = [f64; 6];

impl RatingAggregates {
    /// Compute the arithmetic mean of every dimension over `reviews`.
    ///
    /// Returns `None` for an empty slice so callers decide what an empty
    /// review set means for the cached values.
    ///
    /// # Examples
    /// ```
    /// use waystation_core::{
    ///     AuthorId, RatingAggregates, RestroomId, Review, ReviewId, ReviewScores,
    /// };
    ///
    /// let scores = ReviewScores::from_raw([4, 5, 3, 4, 5, 4])?;
    /// let review = Review::new(ReviewId(1), RestroomId(1), AuthorId(9), scores, None)
    ///     .expect("no comment");
    /// let aggregates = RatingAggregates::from_reviews(&[review]).expect("one review");
    /// assert_eq!(aggregates.avg_lighting(), 5.0);
    /// assert_eq!(aggregates.review_count(), 1);
    /// assert!(RatingAggregates::from_reviews(&[]).is_none());
    /// # Ok::<(), waystation_core::RatingError>(())
    /// ```
    #[must_use]
    pub fn from_reviews(reviews: &[Review]) -> Option<Self> {
        if reviews.is_empty() {
            return None;
        }
        let review_count = u32::try_from(reviews.len()).ok()?;
        let mean = |select: fn(&Review) -> Rating| -> f64 {
            let total: u64 = reviews
                .iter()
                .map(|review| u64::from(select(review).get()))
                .sum();
            // Totals stay far below 2^53 so the conversion is exact.
            total as f64 / f64::from(review_count)
        };
        Some(Self {
            cleanliness: mean(|r| r.scores.cleanliness),
            lighting: mean(|r| r.scores.lighting),
            safety: mean(|r| r.scores.safety),
            privacy: mean(|r| r.scores.privacy),
            accessibility: mean(|r| r.scores.accessibility),
            overall: mean(|r| r.scores.overall),
            review_count,
        })
    }

    /// Rebuild aggregates from persisted values.
    ///
    /// Stores call this when hydrating a row written earlier through
    /// [`EntityStore::update_aggregates`](crate::EntityStore::update_aggregates).
    #[must_use]
    pub const fn restore(averages: Averages, review_count: u32) -> Self {
        let [cleanliness, lighting, safety, privacy, accessibility, overall] = averages;
        Self {
            cleanliness,
            lighting,
            safety,
            privacy,
            accessibility,
            overall,
            review_count,
        }
    }

    /// All six averages in storage order.
    #[must_use]
    pub const fn averages(&self) -> Averages {
        [
            self.cleanliness,
            self.lighting,
            self.safety,
            self.privacy,
            self.accessibility,
            self.overall,
        ]
    }

    /// Mean cleanliness score.
    #[must_use]
    pub const fn avg_cleanliness(&self) -> f64 {
        self.cleanliness
    }

    /// Mean lighting score.
    #[must_use]
    pub const fn avg_lighting(&self) -> f64 {
        self.lighting
    }

    /// Mean safety score.
    #[must_use]
    pub const fn avg_safety(&self) -> f64 {
        self.safety
    }

    /// Mean privacy score.
    #[must_use]
    pub const fn avg_privacy(&self) -> f64 {
        self.privacy
    }

    /// Mean accessibility score.
    #[must_use]
    pub const fn avg_accessibility(&self) -> f64 {
        self.accessibility
    }

    /// Mean overall score.
    #[must_use]
    pub const fn avg_overall(&self) -> f64 {
        self.overall
    }

    /// Number of reviews behind the averages.
    #[must_use]
    pub const fn review_count(&self) -> u32 {
        self.review_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AuthorId, RestroomId, ReviewId, ReviewScores};
    use rstest::{fixture, rstest};

    fn review(id: u64, raw: [u8; 6]) -> Review {
        let scores = ReviewScores::from_raw(raw).expect("valid scores");
        Review::new(ReviewId(id), RestroomId(1), AuthorId(id), scores, None)
            .expect("valid review")
    }

    #[fixture]
    fn first_review() -> Review {
        review(1, [4, 5, 3, 4, 5, 4])
    }

    #[rstest]
    fn single_review_sets_every_average(first_review: Review) {
        let aggregates = RatingAggregates::from_reviews(&[first_review]).expect("one review");
        assert_eq!(aggregates.averages(), [4.0, 5.0, 3.0, 4.0, 5.0, 4.0]);
        assert_eq!(aggregates.review_count(), 1);
    }

    #[rstest]
    fn two_reviews_average_each_dimension(first_review: Review) {
        let reviews = [first_review, review(2, [2; 6])];
        let aggregates = RatingAggregates::from_reviews(&reviews).expect("two reviews");
        assert_eq!(aggregates.avg_cleanliness(), 3.0);
        assert_eq!(aggregates.avg_lighting(), 3.5);
        assert_eq!(aggregates.avg_safety(), 2.5);
        assert_eq!(aggregates.avg_privacy(), 3.0);
        assert_eq!(aggregates.avg_accessibility(), 3.5);
        assert_eq!(aggregates.avg_overall(), 3.0);
        assert_eq!(aggregates.review_count(), 2);
    }

    #[rstest]
    fn empty_review_set_has_no_aggregates() {
        assert!(RatingAggregates::from_reviews(&[]).is_none());
    }

    #[rstest]
    fn default_aggregates_are_zeroed() {
        let aggregates = RatingAggregates::default();
        assert_eq!(aggregates.averages(), [0.0; 6]);
        assert_eq!(aggregates.review_count(), 0);
    }

    #[rstest]
    fn restore_preserves_storage_order() {
        let restored = RatingAggregates::restore([1.0, 2.0, 3.0, 4.0, 5.0, 4.5], 7);
        assert_eq!(restored.avg_privacy(), 4.0);
        assert_eq!(restored.avg_overall(), 4.5);
        assert_eq!(restored.review_count(), 7);
    }
}
