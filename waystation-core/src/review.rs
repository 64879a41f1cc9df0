//! Community reviews and their validated ratings.

use std::fmt;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::RestroomId;

/// Maximum length of a review comment, in characters.
pub const MAX_COMMENT_CHARS: usize = 1000;

/// Identifier of a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewId(pub u64);

impl fmt::Display for ReviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a review's author, as issued by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorId(pub u64);

impl fmt::Display for AuthorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors returned by [`Rating::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RatingError {
    /// The score was outside `1..=5`.
    #[error("rating {value} is outside the range 1..=5")]
    OutOfRange {
        /// Rejected score.
        value: u8,
    },
}

/// A single score in `1..=5`.
///
/// # Examples
/// ```
/// use waystation_core::Rating;
///
/// assert_eq!(Rating::new(4)?.get(), 4);
/// assert!(Rating::new(0).is_err());
/// # Ok::<(), waystation_core::RatingError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    /// Validate a raw score.
    ///
    /// # Errors
    /// Returns [`RatingError::OutOfRange`] for values outside `1..=5`.
    pub const fn new(value: u8) -> Result<Self, RatingError> {
        if value >= 1 && value <= 5 {
            Ok(Self(value))
        } else {
            Err(RatingError::OutOfRange { value })
        }
    }

    /// The raw score.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = RatingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

/// The six rating dimensions captured by every review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewScores {
    /// Cleanliness score.
    pub cleanliness: Rating,
    /// Lighting score.
    pub lighting: Rating,
    /// Safety score.
    pub safety: Rating,
    /// Privacy score.
    pub privacy: Rating,
    /// Accessibility score.
    pub accessibility: Rating,
    /// Overall score.
    pub overall: Rating,
}

impl ReviewScores {
    /// Validate six raw scores given in the order cleanliness, lighting,
    /// safety, privacy, accessibility, overall.
    ///
    /// # Errors
    /// Returns the first [`RatingError`] encountered.
    pub fn from_raw(raw: [u8; 6]) -> Result<Self, RatingError> {
        let [cleanliness, lighting, safety, privacy, accessibility, overall] = raw;
        Ok(Self {
            cleanliness: Rating::new(cleanliness)?,
            lighting: Rating::new(lighting)?,
            safety: Rating::new(safety)?,
            privacy: Rating::new(privacy)?,
            accessibility: Rating::new(accessibility)?,
            overall: Rating::new(overall)?,
        })
    }

    /// Scores set to the same value in every dimension.
    #[must_use]
    pub const fn uniform(rating: Rating) -> Self {
        Self {
            cleanliness: rating,
            lighting: rating,
            safety: rating,
            privacy: rating,
            accessibility: rating,
            overall: rating,
        }
    }
}

/// Errors returned by [`Review::new`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReviewError {
    /// The comment exceeded [`MAX_COMMENT_CHARS`].
    #[error("review comment has {chars} characters; the limit is 1000")]
    CommentTooLong {
        /// Length of the rejected comment.
        chars: usize,
    },
}

/// A review of one restroom by one author.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Review identifier.
    pub id: ReviewId,
    /// Restroom under review.
    pub restroom_id: RestroomId,
    /// Reviewing author.
    pub author_id: AuthorId,
    /// The six scores.
    pub scores: ReviewScores,
    comment: Option<String>,
    /// Photo references.
    #[serde(default)]
    pub photos: Vec<String>,
    /// Submission time.
    pub created_at: SystemTime,
}

impl Review {
    /// Construct a review timestamped now.
    ///
    /// # Errors
    /// Returns [`ReviewError::CommentTooLong`] when the comment exceeds
    /// [`MAX_COMMENT_CHARS`].
    pub fn new(
        id: ReviewId,
        restroom_id: RestroomId,
        author_id: AuthorId,
        scores: ReviewScores,
        comment: Option<String>,
    ) -> Result<Self, ReviewError> {
        if let Some(text) = &comment {
            let chars = text.chars().count();
            if chars > MAX_COMMENT_CHARS {
                return Err(ReviewError::CommentTooLong { chars });
            }
        }
        Ok(Self {
            id,
            restroom_id,
            author_id,
            scores,
            comment,
            photos: Vec::new(),
            created_at: SystemTime::now(),
        })
    }

    /// Attach photo references.
    #[must_use]
    pub fn with_photos(mut self, photos: Vec<String>) -> Self {
        self.photos = photos;
        self
    }

    /// Override the creation timestamp, e.g. when loading persisted rows.
    #[must_use]
    pub fn with_created_at(mut self, created_at: SystemTime) -> Self {
        self.created_at = created_at;
        self
    }

    /// Free-text comment, if any.
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(5)]
    fn accepts_scores_in_range(#[case] value: u8) {
        assert_eq!(Rating::new(value).map(Rating::get), Ok(value));
    }

    #[rstest]
    #[case(0)]
    #[case(6)]
    #[case(u8::MAX)]
    fn rejects_scores_out_of_range(#[case] value: u8) {
        assert_eq!(Rating::new(value), Err(RatingError::OutOfRange { value }));
    }

    #[rstest]
    fn scores_from_raw_reports_first_invalid_dimension() {
        let err = ReviewScores::from_raw([4, 5, 9, 0, 5, 4]).expect_err("safety is invalid");
        assert_eq!(err, RatingError::OutOfRange { value: 9 });
    }

    #[rstest]
    fn rating_deserialisation_is_validated() {
        assert!(serde_json::from_str::<Rating>("6").is_err());
        assert_eq!(
            serde_json::from_str::<Rating>("2").expect("valid rating").get(),
            2
        );
    }

    #[rstest]
    fn rejects_overlong_comment() {
        let scores = ReviewScores::uniform(Rating::new(3).expect("valid rating"));
        let comment = "a".repeat(MAX_COMMENT_CHARS + 1);
        let err = Review::new(
            ReviewId(1),
            RestroomId(1),
            AuthorId(1),
            scores,
            Some(comment),
        )
        .expect_err("comment too long");
        assert_eq!(
            err,
            ReviewError::CommentTooLong {
                chars: MAX_COMMENT_CHARS + 1
            }
        );
    }

    #[rstest]
    fn keeps_comment_at_limit() {
        let scores = ReviewScores::uniform(Rating::new(3).expect("valid rating"));
        let comment = "é".repeat(MAX_COMMENT_CHARS);
        let review = Review::new(
            ReviewId(1),
            RestroomId(1),
            AuthorId(1),
            scores,
            Some(comment.clone()),
        )
        .expect("comment at the limit is accepted");
        assert_eq!(review.comment(), Some(comment.as_str()));
    }
}
