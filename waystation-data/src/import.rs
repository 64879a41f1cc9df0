//! Seed import into the SQLite entity store.
//!
//! A seed document is JSON of the form
//! `{ "restrooms": [...], "reviews": [...] }`. Restrooms use the serialised
//! [`Restroom`] layout minus the rating aggregates, which are ignored if
//! present. Reviews carry their six scores as raw integers and are
//! validated on the way in. Once every row is written, aggregates are
//! recomputed for each restroom that received reviews.

use std::collections::BTreeSet;

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use waystation_core::{
    AuthorId, GeoPoint, RatingAggregator, RatingError, RecomputeOutcome, Restroom,
    RestroomAttributes, RestroomDetails, RestroomId, RestroomStatus, Review, ReviewError,
    ReviewId, ReviewScores, SqliteEntityStore, SqliteStoreError, StoreError,
};

use crate::fs::read_utf8_to_string;

/// Errors raised while reading or applying a seed document.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The seed file could not be read.
    #[error("failed to read seed file {path}: {source}")]
    Read {
        /// Seed file location.
        path: Utf8PathBuf,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },
    /// The seed document is not valid JSON or has the wrong shape.
    #[error("failed to parse seed document: {0}")]
    Parse(#[from] serde_json::Error),
    /// A review score is outside `1..=5`.
    #[error("review {review} has an invalid rating: {source}")]
    InvalidRating {
        /// Offending review.
        review: ReviewId,
        /// Validation failure.
        #[source]
        source: RatingError,
    },
    /// A review failed validation for another reason.
    #[error("review {review} is invalid: {source}")]
    InvalidReview {
        /// Offending review.
        review: ReviewId,
        /// Validation failure.
        #[source]
        source: ReviewError,
    },
    /// A review targets a restroom that is neither in the seed nor stored.
    #[error("review {review} refers to unknown restroom {restroom_id}")]
    UnknownRestroom {
        /// Offending review.
        review: ReviewId,
        /// Missing restroom.
        restroom_id: RestroomId,
    },
    /// The author already reviewed the restroom.
    #[error("author {author_id} already reviewed restroom {restroom_id}")]
    DuplicateReview {
        /// Restroom under review.
        restroom_id: RestroomId,
        /// Author holding the existing review.
        author_id: AuthorId,
    },
    /// Writing to the database failed.
    #[error(transparent)]
    Store(SqliteStoreError),
    /// Recomputing aggregates failed.
    #[error("failed to recompute aggregates: {0}")]
    Aggregation(#[from] StoreError),
}

impl From<SqliteStoreError> for ImportError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::DuplicateReview {
                restroom_id,
                author_id,
            } => Self::DuplicateReview {
                restroom_id,
                author_id,
            },
            other => Self::Store(other),
        }
    }
}

/// A restroom as written in a seed document.
///
/// There is no ratings field. Aggregates start at zero and are derived from
/// the imported reviews.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SeedRestroom {
    /// Restroom identifier.
    pub id: RestroomId,
    /// Entrance position.
    pub location: GeoPoint,
    /// Name, address and provenance.
    #[serde(default)]
    pub details: RestroomDetails,
    /// Amenity flags.
    #[serde(default)]
    pub attributes: RestroomAttributes,
    /// Lifecycle flags.
    #[serde(default)]
    pub status: RestroomStatus,
}

impl From<SeedRestroom> for Restroom {
    fn from(seed: SeedRestroom) -> Self {
        Self::new(seed.id, seed.location)
            .with_details(seed.details)
            .with_attributes(seed.attributes)
            .with_status(seed.status)
    }
}

/// A review as written in a seed document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SeedReview {
    /// Review identifier.
    pub id: ReviewId,
    /// Restroom under review.
    pub restroom_id: RestroomId,
    /// Reviewing author.
    pub author_id: AuthorId,
    /// Cleanliness score, 1 to 5.
    pub cleanliness: u8,
    /// Lighting score, 1 to 5.
    pub lighting: u8,
    /// Safety score, 1 to 5.
    pub safety: u8,
    /// Privacy score, 1 to 5.
    pub privacy: u8,
    /// Accessibility score, 1 to 5.
    pub accessibility: u8,
    /// Overall score, 1 to 5.
    pub overall: u8,
    /// Optional free-text comment.
    #[serde(default)]
    pub comment: Option<String>,
    /// Photo references.
    #[serde(default)]
    pub photos: Vec<String>,
}

impl TryFrom<SeedReview> for Review {
    type Error = ImportError;

    fn try_from(seed: SeedReview) -> Result<Self, Self::Error> {
        let scores = ReviewScores::from_raw([
            seed.cleanliness,
            seed.lighting,
            seed.safety,
            seed.privacy,
            seed.accessibility,
            seed.overall,
        ])
        .map_err(|source| ImportError::InvalidRating {
            review: seed.id,
            source,
        })?;
        let review = Self::new(
            seed.id,
            seed.restroom_id,
            seed.author_id,
            scores,
            seed.comment,
        )
        .map_err(|source| ImportError::InvalidReview {
            review: seed.id,
            source,
        })?;
        Ok(review.with_photos(seed.photos))
    }
}

/// Parsed seed document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedDocument {
    /// Restrooms to insert.
    #[serde(default)]
    pub restrooms: Vec<SeedRestroom>,
    /// Reviews to insert after every restroom.
    #[serde(default)]
    pub reviews: Vec<SeedReview>,
}

impl SeedDocument {
    /// Parse a seed document from JSON text.
    ///
    /// # Errors
    /// Returns [`ImportError::Parse`] for malformed JSON, out-of-range
    /// coordinates, or missing fields.
    pub fn from_json(json: &str) -> Result<Self, ImportError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a seed file.
    ///
    /// # Errors
    /// Returns [`ImportError::Read`] when the file cannot be read, otherwise
    /// as [`SeedDocument::from_json`].
    pub fn read(path: &Utf8Path) -> Result<Self, ImportError> {
        let json = read_utf8_to_string(path).map_err(|source| ImportError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}

/// Counts reported after an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    /// Restrooms written.
    pub restrooms: usize,
    /// Reviews written.
    pub reviews: usize,
    /// Restrooms whose aggregates were rewritten.
    pub recomputed: usize,
}

/// Write a seed document into `store` and refresh affected aggregates.
///
/// Restrooms are written before reviews, so a review may reference any
/// restroom in the same document or already stored. Rows written before a
/// failure stay written.
///
/// # Errors
/// Returns the first validation, uniqueness or database failure.
pub fn import_seed(
    store: &SqliteEntityStore,
    seed: SeedDocument,
) -> Result<ImportSummary, ImportError> {
    let mut summary = ImportSummary::default();
    for seed_restroom in seed.restrooms {
        store.insert_restroom(&Restroom::from(seed_restroom))?;
        summary.restrooms += 1;
    }

    let mut reviewed = BTreeSet::new();
    for seed_review in seed.reviews {
        let review = Review::try_from(seed_review)?;
        if !store.contains(review.restroom_id)? {
            return Err(ImportError::UnknownRestroom {
                review: review.id,
                restroom_id: review.restroom_id,
            });
        }
        store.insert_review(&review)?;
        reviewed.insert(review.restroom_id);
        summary.reviews += 1;
    }

    let aggregator = RatingAggregator::new(store);
    for id in reviewed {
        match aggregator.recompute_aggregates(id)? {
            RecomputeOutcome::Updated(_) => summary.recomputed += 1,
            outcome => debug!("restroom {id} not recomputed: {outcome:?}"),
        }
    }

    info!(
        "imported {} restrooms and {} reviews; recomputed {} aggregates",
        summary.restrooms, summary.reviews, summary.recomputed
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use waystation_core::{EntityFilter, EntityStore, RatingAggregates};

    const SEED: &str = r#"{
        "restrooms": [
            {"id": 1, "location": {"latitude": 40.7128, "longitude": -74.006}},
            {"id": 2, "location": {"latitude": 40.72, "longitude": -74.0},
             "attributes": {"wheelchair": "full", "requires_fee": true}}
        ],
        "reviews": [
            {"id": 10, "restroom_id": 1, "author_id": 7,
             "cleanliness": 4, "lighting": 5, "safety": 3, "privacy": 4,
             "accessibility": 5, "overall": 4, "comment": "Clean enough"},
            {"id": 11, "restroom_id": 1, "author_id": 8,
             "cleanliness": 2, "lighting": 2, "safety": 2, "privacy": 2,
             "accessibility": 2, "overall": 2}
        ]
    }"#;

    #[fixture]
    fn store() -> SqliteEntityStore {
        SqliteEntityStore::open_in_memory().expect("open store")
    }

    fn review_json(id: u64, author: u64, overall: u8) -> String {
        format!(
            r#"{{"id": {id}, "restroom_id": 1, "author_id": {author},
                "cleanliness": 3, "lighting": 3, "safety": 3, "privacy": 3,
                "accessibility": 3, "overall": {overall}}}"#
        )
    }

    fn seed_with_reviews(reviews: &[String]) -> SeedDocument {
        let json = format!(
            r#"{{"restrooms": [{{"id": 1, "location": {{"latitude": 0.0, "longitude": 0.0}}}}],
                "reviews": [{}]}}"#,
            reviews.join(",")
        );
        SeedDocument::from_json(&json).expect("valid seed")
    }

    #[rstest]
    fn imports_rows_and_recomputes_aggregates(store: SqliteEntityStore) {
        let seed = SeedDocument::from_json(SEED).expect("valid seed");

        let summary = import_seed(&store, seed).expect("import");

        assert_eq!(
            summary,
            ImportSummary {
                restrooms: 2,
                reviews: 2,
                recomputed: 1,
            }
        );
        let restroom = store
            .get_by_id(RestroomId(1))
            .expect("read")
            .expect("restroom stored");
        assert_eq!(restroom.ratings().avg_cleanliness(), 3.0);
        assert_eq!(restroom.ratings().review_count(), 2);
        let unreviewed = store
            .get_by_id(RestroomId(2))
            .expect("read")
            .expect("restroom stored");
        assert_eq!(unreviewed.ratings().review_count(), 0);
        assert!(unreviewed.attributes.requires_fee);
    }

    #[rstest]
    fn seeded_ratings_are_ignored(store: SqliteEntityStore) {
        let json = r#"{"restrooms": [{
            "id": 1,
            "location": {"latitude": 40.7128, "longitude": -74.006},
            "ratings": {"cleanliness": 5.0, "lighting": 5.0, "safety": 5.0,
                        "privacy": 5.0, "accessibility": 5.0, "overall": 5.0,
                        "review_count": 0}
        }]}"#;
        let seed = SeedDocument::from_json(json).expect("valid seed");

        import_seed(&store, seed).expect("import");

        let restroom = store
            .get_by_id(RestroomId(1))
            .expect("read")
            .expect("restroom stored");
        assert_eq!(restroom.ratings(), &RatingAggregates::default());
        let rated = EntityFilter {
            min_rating: Some(4.5),
            ..EntityFilter::default()
        };
        assert!(store.find_active_entities(&rated).expect("query").is_empty());
    }

    #[rstest]
    fn out_of_range_score_is_rejected(store: SqliteEntityStore) {
        let seed = seed_with_reviews(&[review_json(1, 7, 6)]);

        let err = import_seed(&store, seed).expect_err("invalid rating");

        assert!(matches!(
            err,
            ImportError::InvalidRating {
                review: ReviewId(1),
                source: RatingError::OutOfRange { value: 6 },
            }
        ));
    }

    #[rstest]
    fn second_review_by_same_author_is_rejected(store: SqliteEntityStore) {
        let seed = seed_with_reviews(&[review_json(1, 7, 4), review_json(2, 7, 2)]);

        let err = import_seed(&store, seed).expect_err("duplicate review");

        assert!(matches!(
            err,
            ImportError::DuplicateReview {
                restroom_id: RestroomId(1),
                author_id: AuthorId(7),
            }
        ));
    }

    #[rstest]
    fn review_of_unknown_restroom_is_rejected(store: SqliteEntityStore) {
        let json = r#"{"reviews": [{"id": 1, "restroom_id": 99, "author_id": 7,
            "cleanliness": 3, "lighting": 3, "safety": 3, "privacy": 3,
            "accessibility": 3, "overall": 3}]}"#;
        let seed = SeedDocument::from_json(json).expect("valid seed");

        let err = import_seed(&store, seed).expect_err("unknown restroom");

        assert!(matches!(
            err,
            ImportError::UnknownRestroom {
                restroom_id: RestroomId(99),
                ..
            }
        ));
    }

    #[rstest]
    #[case::not_json("{ restrooms")]
    #[case::latitude_out_of_range(
        r#"{"restrooms": [{"id": 1, "location": {"latitude": 91.0, "longitude": 0.0}}]}"#
    )]
    #[case::missing_score(
        r#"{"reviews": [{"id": 1, "restroom_id": 1, "author_id": 1, "cleanliness": 3}]}"#
    )]
    fn malformed_documents_fail_to_parse(#[case] json: &str) {
        assert!(matches!(
            SeedDocument::from_json(json),
            Err(ImportError::Parse(_))
        ));
    }

    #[rstest]
    fn empty_document_imports_nothing(store: SqliteEntityStore) {
        let summary = import_seed(&store, SeedDocument::from_json("{}").expect("valid seed"))
            .expect("import");
        assert_eq!(summary, ImportSummary::default());
    }
}
