//! SQLite-backed store implementation for restrooms and reviews.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use rusqlite::{
    Connection, ErrorCode, OptionalExtension, Row, params, params_from_iter, types::Value,
};
use thiserror::Error;

use crate::{
    AuthorId, GeoPoint, QueryValidationError, RatingAggregates, RatingError, Restroom,
    RestroomAttributes, RestroomDetails, RestroomId, RestroomStatus, Review, ReviewError,
    ReviewId, ReviewScores,
};

use super::{EntityFilter, EntityStore, StoreError};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS restrooms (
    id INTEGER PRIMARY KEY,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL,
    details TEXT NOT NULL,
    attributes TEXT NOT NULL,
    wheelchair TEXT NOT NULL,
    gender_neutral INTEGER,
    baby_changing INTEGER,
    requires_fee INTEGER NOT NULL,
    is_active INTEGER NOT NULL,
    is_verified INTEGER NOT NULL,
    temporarily_closed INTEGER NOT NULL,
    permanently_closed INTEGER NOT NULL,
    avg_cleanliness REAL NOT NULL DEFAULT 0,
    avg_lighting REAL NOT NULL DEFAULT 0,
    avg_safety REAL NOT NULL DEFAULT 0,
    avg_privacy REAL NOT NULL DEFAULT 0,
    avg_accessibility REAL NOT NULL DEFAULT 0,
    avg_overall REAL NOT NULL DEFAULT 0,
    review_count INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS reviews (
    id INTEGER PRIMARY KEY,
    restroom_id INTEGER NOT NULL REFERENCES restrooms(id),
    author_id INTEGER NOT NULL,
    cleanliness INTEGER NOT NULL,
    lighting INTEGER NOT NULL,
    safety INTEGER NOT NULL,
    privacy INTEGER NOT NULL,
    accessibility INTEGER NOT NULL,
    overall INTEGER NOT NULL,
    comment TEXT,
    photos TEXT NOT NULL,
    created_at INTEGER NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS reviews_restroom_author
    ON reviews (restroom_id, author_id);
";

const RESTROOM_COLUMNS: &str = "id, latitude, longitude, details, attributes, \
    is_active, is_verified, temporarily_closed, permanently_closed, \
    avg_cleanliness, avg_lighting, avg_safety, avg_privacy, avg_accessibility, avg_overall, \
    review_count";

/// Error raised when reading or writing the SQLite database.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Opening the SQLite database failed.
    #[error("failed to open SQLite database at {path}: {source}")]
    OpenDatabase {
        /// Location of the SQLite database on disk.
        path: PathBuf,
        /// Source error returned by `rusqlite`.
        #[source]
        source: rusqlite::Error,
    },
    /// A stored JSON column could not be parsed.
    #[error("failed to parse {column} for restroom {id}: {source}")]
    InvalidPayload {
        /// Identifier of the affected restroom.
        id: u64,
        /// Column holding the payload.
        column: &'static str,
        /// JSON decoding failure.
        #[source]
        source: serde_json::Error,
    },
    /// A stored restroom location was out of range.
    #[error("restroom {id} has an invalid location: {source}")]
    InvalidLocation {
        /// Identifier of the affected restroom.
        id: u64,
        /// Validation failure.
        #[source]
        source: QueryValidationError,
    },
    /// A stored review score was out of range.
    #[error("review {id} has an invalid rating: {source}")]
    InvalidRating {
        /// Identifier of the affected review.
        id: u64,
        /// Validation failure.
        #[source]
        source: RatingError,
    },
    /// A stored review comment was rejected.
    #[error("review {id} has an invalid comment: {source}")]
    InvalidComment {
        /// Identifier of the affected review.
        id: u64,
        /// Validation failure.
        #[source]
        source: ReviewError,
    },
    /// The author already reviewed this restroom.
    #[error("author {author_id} already reviewed restroom {restroom_id}")]
    DuplicateReview {
        /// Restroom under review.
        restroom_id: RestroomId,
        /// Author holding the existing review.
        author_id: AuthorId,
    },
    /// A previous holder of the connection lock panicked.
    #[error("SQLite connection lock was poisoned")]
    Poisoned,
    /// Generic SQLite error when reading or writing rows.
    #[error(transparent)]
    Database(#[from] rusqlite::Error),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        Self::backend(error)
    }
}

/// Read-write restroom store backed by a single SQLite connection.
///
/// The connection is guarded by a [`Mutex`], so the store is `Send + Sync`
/// and statements run one at a time.
///
/// # Examples
/// ```
/// use waystation_core::{EntityFilter, EntityStore, GeoPoint, Restroom, RestroomId};
/// use waystation_core::store::SqliteEntityStore;
///
/// let store = SqliteEntityStore::open_in_memory()?;
/// let location = GeoPoint::new(40.7128, -74.0060).expect("valid point");
/// store.insert_restroom(&Restroom::new(RestroomId(1), location))?;
/// let found = store.find_active_entities(&EntityFilter::default()).expect("query");
/// assert_eq!(found.len(), 1);
/// # Ok::<(), waystation_core::store::SqliteStoreError>(())
/// ```
pub struct SqliteEntityStore {
    connection: Mutex<Connection>,
}

impl fmt::Debug for SqliteEntityStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteEntityStore").finish_non_exhaustive()
    }
}

impl SqliteEntityStore {
    /// Open or create a database file and ensure the schema exists.
    pub fn open<P>(path: P) -> Result<Self, SqliteStoreError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let connection =
            Connection::open(path).map_err(|source| SqliteStoreError::OpenDatabase {
                path: path.to_path_buf(),
                source,
            })?;
        Self::with_connection(connection)
    }

    /// Create a private in-memory database.
    pub fn open_in_memory() -> Result<Self, SqliteStoreError> {
        let connection = Connection::open_in_memory()?;
        Self::with_connection(connection)
    }

    fn with_connection(connection: Connection) -> Result<Self, SqliteStoreError> {
        connection.execute_batch(SCHEMA)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SqliteStoreError> {
        self.connection
            .lock()
            .map_err(|_| SqliteStoreError::Poisoned)
    }

    /// Persist a new restroom with zeroed rating aggregates.
    ///
    /// Any aggregates carried by `restroom` are ignored. Ratings only change
    /// through [`EntityStore::update_aggregates`].
    pub fn insert_restroom(&self, restroom: &Restroom) -> Result<(), SqliteStoreError> {
        let details = to_json(restroom.id, "details", &restroom.details)?;
        let attributes = to_json(restroom.id, "attributes", &restroom.attributes)?;
        let connection = self.lock()?;
        connection.execute(
            "INSERT INTO restrooms (
                id, latitude, longitude, details, attributes,
                wheelchair, gender_neutral, baby_changing, requires_fee,
                is_active, is_verified, temporarily_closed, permanently_closed
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                restroom.id.0,
                restroom.location.latitude(),
                restroom.location.longitude(),
                details,
                attributes,
                restroom.attributes.wheelchair.as_str(),
                restroom.attributes.gender_neutral,
                restroom.attributes.baby_changing,
                restroom.attributes.requires_fee,
                restroom.status.active,
                restroom.status.verified,
                restroom.status.temporarily_closed,
                restroom.status.permanently_closed,
            ],
        )?;
        Ok(())
    }

    /// Persist a review, enforcing one review per author and restroom.
    pub fn insert_review(&self, review: &Review) -> Result<(), SqliteStoreError> {
        let photos = serde_json::to_string(&review.photos).map_err(|source| {
            SqliteStoreError::InvalidPayload {
                id: review.restroom_id.0,
                column: "photos",
                source,
            }
        })?;
        let created_at = review
            .created_at
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let scores = &review.scores;
        let connection = self.lock()?;
        let inserted = connection.execute(
            "INSERT INTO reviews (
                id, restroom_id, author_id,
                cleanliness, lighting, safety, privacy, accessibility, overall,
                comment, photos, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                review.id.0,
                review.restroom_id.0,
                review.author_id.0,
                scores.cleanliness.get(),
                scores.lighting.get(),
                scores.safety.get(),
                scores.privacy.get(),
                scores.accessibility.get(),
                scores.overall.get(),
                review.comment(),
                photos,
                created_at,
            ],
        );
        match inserted {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(failure, Some(message)))
                if failure.code == ErrorCode::ConstraintViolation
                    && message.contains("reviews.restroom_id, reviews.author_id") =>
            {
                Err(SqliteStoreError::DuplicateReview {
                    restroom_id: review.restroom_id,
                    author_id: review.author_id,
                })
            }
            Err(source) => Err(source.into()),
        }
    }

    /// Delete a review. Returns whether a row was removed.
    pub fn delete_review(&self, id: ReviewId) -> Result<bool, SqliteStoreError> {
        let connection = self.lock()?;
        let removed = connection.execute("DELETE FROM reviews WHERE id = ?1", params![id.0])?;
        Ok(removed > 0)
    }

    fn query_restrooms(&self, filter: &EntityFilter) -> Result<Vec<Restroom>, SqliteStoreError> {
        let (sql, values) = filter_query(filter);
        let connection = self.lock()?;
        let mut statement = connection.prepare(&sql)?;
        let mut rows = statement.query(params_from_iter(values))?;
        let mut restrooms = Vec::new();
        while let Some(row) = rows.next()? {
            restrooms.push(restroom_from_row(row)?);
        }
        Ok(restrooms)
    }

    fn query_restroom(&self, id: RestroomId) -> Result<Option<Restroom>, SqliteStoreError> {
        let connection = self.lock()?;
        let sql = format!("SELECT {RESTROOM_COLUMNS} FROM restrooms WHERE id = ?1");
        let mut statement = connection.prepare(&sql)?;
        let mut rows = statement.query(params![id.0])?;
        rows.next()?.map(restroom_from_row).transpose()
    }

    fn write_aggregates(
        &self,
        id: RestroomId,
        aggregates: RatingAggregates,
    ) -> Result<bool, SqliteStoreError> {
        let [cleanliness, lighting, safety, privacy, accessibility, overall] =
            aggregates.averages();
        let connection = self.lock()?;
        let updated = connection.execute(
            "UPDATE restrooms SET
                avg_cleanliness = ?2, avg_lighting = ?3, avg_safety = ?4,
                avg_privacy = ?5, avg_accessibility = ?6, avg_overall = ?7,
                review_count = ?8
            WHERE id = ?1",
            params![
                id.0,
                cleanliness,
                lighting,
                safety,
                privacy,
                accessibility,
                overall,
                aggregates.review_count(),
            ],
        )?;
        Ok(updated > 0)
    }

    fn query_reviews(&self, id: RestroomId) -> Result<Vec<Review>, SqliteStoreError> {
        let connection = self.lock()?;
        let mut statement = connection.prepare(
            "SELECT id, restroom_id, author_id,
                    cleanliness, lighting, safety, privacy, accessibility, overall,
                    comment, photos, created_at
             FROM reviews WHERE restroom_id = ?1 ORDER BY id",
        )?;
        let mut rows = statement.query(params![id.0])?;
        let mut reviews = Vec::new();
        while let Some(row) = rows.next()? {
            reviews.push(review_from_row(row)?);
        }
        Ok(reviews)
    }

    /// Whether a restroom with `id` exists, regardless of status.
    pub fn contains(&self, id: RestroomId) -> Result<bool, SqliteStoreError> {
        let connection = self.lock()?;
        let found = connection
            .query_row(
                "SELECT 1 FROM restrooms WHERE id = ?1",
                params![id.0],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

impl EntityStore for SqliteEntityStore {
    fn find_active_entities(&self, filter: &EntityFilter) -> Result<Vec<Restroom>, StoreError> {
        Ok(self.query_restrooms(filter)?)
    }

    fn get_by_id(&self, id: RestroomId) -> Result<Option<Restroom>, StoreError> {
        Ok(self.query_restroom(id)?)
    }

    fn update_aggregates(
        &self,
        id: RestroomId,
        aggregates: RatingAggregates,
    ) -> Result<(), StoreError> {
        if self.write_aggregates(id, aggregates)? {
            Ok(())
        } else {
            Err(StoreError::NotFound { id })
        }
    }

    fn fetch_reviews(&self, id: RestroomId) -> Result<Vec<Review>, StoreError> {
        Ok(self.query_reviews(id)?)
    }
}

/// Translate a filter into a `SELECT` with bound parameters.
fn filter_query(filter: &EntityFilter) -> (String, Vec<Value>) {
    let mut clauses = vec![
        String::from("is_active = 1"),
        String::from("permanently_closed = 0"),
    ];
    let mut values = Vec::new();

    if let Some(min_rating) = filter.min_rating {
        clauses.push(String::from("avg_overall >= ?"));
        values.push(Value::Real(min_rating));
    }
    match filter.wheelchair {
        Some(true) => clauses.push(String::from("wheelchair IN ('full', 'partial')")),
        Some(false) => clauses.push(String::from("wheelchair = 'none'")),
        None => {}
    }
    if let Some(wanted) = filter.gender_neutral {
        clauses.push(String::from("gender_neutral = ?"));
        values.push(Value::Integer(i64::from(wanted)));
    }
    if let Some(wanted) = filter.baby_changing {
        clauses.push(String::from("baby_changing = ?"));
        values.push(Value::Integer(i64::from(wanted)));
    }
    if filter.free_only {
        clauses.push(String::from("requires_fee = 0"));
    }
    if let Some(bbox) = filter.bbox {
        clauses.push(String::from(
            "latitude BETWEEN ? AND ? AND longitude BETWEEN ? AND ?",
        ));
        values.extend([
            Value::Real(bbox.min().y),
            Value::Real(bbox.max().y),
            Value::Real(bbox.min().x),
            Value::Real(bbox.max().x),
        ]);
    }

    let mut sql = format!(
        "SELECT {RESTROOM_COLUMNS} FROM restrooms WHERE {} ORDER BY id",
        clauses.join(" AND ")
    );
    if let Some(limit) = filter.limit {
        sql.push_str(" LIMIT ?");
        values.push(Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
    }
    (sql, values)
}

fn to_json<T: serde::Serialize>(
    id: RestroomId,
    column: &'static str,
    value: &T,
) -> Result<String, SqliteStoreError> {
    serde_json::to_string(value).map_err(|source| SqliteStoreError::InvalidPayload {
        id: id.0,
        column,
        source,
    })
}

fn from_json<T: serde::de::DeserializeOwned>(
    id: u64,
    column: &'static str,
    text: &str,
) -> Result<T, SqliteStoreError> {
    serde_json::from_str(text).map_err(|source| SqliteStoreError::InvalidPayload {
        id,
        column,
        source,
    })
}

fn restroom_from_row(row: &Row<'_>) -> Result<Restroom, SqliteStoreError> {
    let id: u64 = row.get(0)?;
    let location = GeoPoint::new(row.get(1)?, row.get(2)?)
        .map_err(|source| SqliteStoreError::InvalidLocation { id, source })?;
    let details: RestroomDetails = from_json(id, "details", &row.get::<_, String>(3)?)?;
    let attributes: RestroomAttributes = from_json(id, "attributes", &row.get::<_, String>(4)?)?;
    let status = RestroomStatus {
        active: row.get(5)?,
        verified: row.get(6)?,
        temporarily_closed: row.get(7)?,
        permanently_closed: row.get(8)?,
    };
    let ratings = RatingAggregates::restore(
        [
            row.get(9)?,
            row.get(10)?,
            row.get(11)?,
            row.get(12)?,
            row.get(13)?,
            row.get(14)?,
        ],
        row.get(15)?,
    );
    Ok(Restroom::from_parts(
        RestroomId(id),
        location,
        details,
        attributes,
        status,
        ratings,
    ))
}

fn review_from_row(row: &Row<'_>) -> Result<Review, SqliteStoreError> {
    let id: u64 = row.get(0)?;
    let scores = ReviewScores::from_raw([
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
    ])
    .map_err(|source| SqliteStoreError::InvalidRating { id, source })?;
    let comment: Option<String> = row.get(9)?;
    let photos: Vec<String> = from_json(id, "photos", &row.get::<_, String>(10)?)?;
    let created_at: u64 = row.get(11)?;
    let review = Review::new(
        ReviewId(id),
        RestroomId(row.get(1)?),
        AuthorId(row.get(2)?),
        scores,
        comment,
    )
    .map_err(|source| SqliteStoreError::InvalidComment { id, source })?;
    Ok(review
        .with_photos(photos)
        .with_created_at(SystemTime::UNIX_EPOCH + Duration::from_secs(created_at)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{restroom_at, review_with};
    use crate::{AccessibilityLevel, RestroomAttributes};
    use geo::{Coord, Rect};
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    #[fixture]
    fn store() -> SqliteEntityStore {
        SqliteEntityStore::open_in_memory().expect("open in-memory store")
    }

    fn ids(restrooms: &[Restroom]) -> Vec<u64> {
        restrooms.iter().map(|restroom| restroom.id.0).collect()
    }

    #[rstest]
    fn round_trips_restroom_rows(store: SqliteEntityStore) {
        let mut restroom = restroom_at(7, 40.7128, -74.0060).with_attributes(RestroomAttributes {
            wheelchair: AccessibilityLevel::Partial,
            gender_neutral: Some(true),
            has_soap: Some(false),
            ..RestroomAttributes::default()
        });
        restroom.details.name = Some(String::from("Bryant Park"));
        store.insert_restroom(&restroom).expect("insert restroom");

        let loaded = store
            .get_by_id(RestroomId(7))
            .expect("query restroom")
            .expect("restroom exists");
        assert_eq!(loaded, restroom);
    }

    #[rstest]
    fn insert_ignores_carried_aggregates(store: SqliteEntityStore) {
        let mut restroom = restroom_at(1, 0.0, 0.0);
        restroom.set_ratings(RatingAggregates::restore([5.0; 6], 4));
        store.insert_restroom(&restroom).expect("insert restroom");

        let loaded = store
            .get_by_id(RestroomId(1))
            .expect("query restroom")
            .expect("restroom exists");
        assert_eq!(loaded.ratings(), &RatingAggregates::default());
        let filter = EntityFilter {
            min_rating: Some(4.5),
            ..EntityFilter::default()
        };
        assert!(store.find_active_entities(&filter).expect("query").is_empty());
    }

    #[rstest]
    fn missing_restroom_is_none(store: SqliteEntityStore) {
        assert!(store.get_by_id(RestroomId(1)).expect("query").is_none());
        assert!(!store.contains(RestroomId(1)).expect("query"));
    }

    #[rstest]
    fn filter_query_matches_reference_predicate(store: SqliteEntityStore) {
        let accessible = restroom_at(1, 0.0, 0.0).with_attributes(RestroomAttributes {
            wheelchair: AccessibilityLevel::Full,
            baby_changing: Some(true),
            ..RestroomAttributes::default()
        });
        let paid = restroom_at(2, 0.5, 0.5).with_attributes(RestroomAttributes {
            wheelchair: AccessibilityLevel::None,
            requires_fee: true,
            ..RestroomAttributes::default()
        });
        let closed = restroom_at(3, 0.0, 0.0).with_status(RestroomStatus {
            permanently_closed: true,
            ..RestroomStatus::default()
        });
        let far = restroom_at(4, 5.0, 5.0);
        let all = [accessible, paid, closed, far];
        for restroom in &all {
            store.insert_restroom(restroom).expect("insert restroom");
        }

        let filters = [
            EntityFilter::default(),
            EntityFilter {
                wheelchair: Some(true),
                ..EntityFilter::default()
            },
            EntityFilter {
                wheelchair: Some(false),
                ..EntityFilter::default()
            },
            EntityFilter {
                free_only: true,
                baby_changing: Some(true),
                ..EntityFilter::default()
            },
            EntityFilter {
                bbox: Some(Rect::new(Coord { x: -1.0, y: -1.0 }, Coord { x: 1.0, y: 1.0 })),
                ..EntityFilter::default()
            },
            EntityFilter {
                limit: Some(1),
                ..EntityFilter::default()
            },
        ];
        for filter in filters {
            let found = store.find_active_entities(&filter).expect("query");
            let expected: Vec<u64> = all
                .iter()
                .filter(|restroom| filter.matches(restroom))
                .map(|restroom| restroom.id.0)
                .take(filter.limit.unwrap_or(usize::MAX))
                .collect();
            assert_eq!(ids(&found), expected, "filter {filter:?}");
        }
    }

    #[rstest]
    fn min_rating_uses_stored_aggregates(store: SqliteEntityStore) {
        store
            .insert_restroom(&restroom_at(1, 0.0, 0.0))
            .expect("insert restroom");
        store
            .insert_restroom(&restroom_at(2, 0.0, 0.0))
            .expect("insert restroom");
        store
            .update_aggregates(RestroomId(2), RatingAggregates::restore([4.0; 6], 3))
            .expect("update aggregates");

        let filter = EntityFilter {
            min_rating: Some(4.0),
            ..EntityFilter::default()
        };
        let found = store.find_active_entities(&filter).expect("query");
        assert_eq!(ids(&found), vec![2]);
        assert_eq!(found[0].ratings().review_count(), 3);
    }

    #[rstest]
    fn updating_unknown_restroom_is_not_found(store: SqliteEntityStore) {
        let err = store
            .update_aggregates(RestroomId(5), RatingAggregates::default())
            .expect_err("unknown restroom");
        assert!(matches!(err, StoreError::NotFound { id: RestroomId(5) }));
    }

    #[rstest]
    fn reviews_round_trip_and_delete(store: SqliteEntityStore) {
        store
            .insert_restroom(&restroom_at(1, 0.0, 0.0))
            .expect("insert restroom");
        let review = review_with(10, 1, 100, [4, 5, 3, 4, 5, 4])
            .with_photos(vec![String::from("photo.jpg")])
            .with_created_at(UNIX_EPOCH + Duration::from_secs(1_700_000_000));
        store.insert_review(&review).expect("insert review");

        assert_eq!(store.fetch_reviews(RestroomId(1)).expect("fetch"), vec![review]);
        assert!(store.delete_review(ReviewId(10)).expect("delete"));
        assert!(!store.delete_review(ReviewId(10)).expect("delete again"));
        assert!(store.fetch_reviews(RestroomId(1)).expect("fetch").is_empty());
    }

    #[rstest]
    fn rejects_second_review_by_same_author(store: SqliteEntityStore) {
        store
            .insert_restroom(&restroom_at(1, 0.0, 0.0))
            .expect("insert restroom");
        store
            .insert_review(&review_with(1, 1, 100, [3; 6]))
            .expect("first review");
        let err = store
            .insert_review(&review_with(2, 1, 100, [4; 6]))
            .expect_err("duplicate review");
        assert!(matches!(
            err,
            SqliteStoreError::DuplicateReview {
                restroom_id: RestroomId(1),
                author_id: AuthorId(100)
            }
        ));
    }

    #[rstest]
    fn reports_invalid_stored_payload(store: SqliteEntityStore) {
        store
            .insert_restroom(&restroom_at(1, 0.0, 0.0))
            .expect("insert restroom");
        store
            .lock()
            .expect("lock")
            .execute("UPDATE restrooms SET details = 'not-json'", [])
            .expect("corrupt row");
        let err = store.query_restroom(RestroomId(1)).expect_err("corrupt payload");
        assert!(matches!(
            err,
            SqliteStoreError::InvalidPayload {
                id: 1,
                column: "details",
                ..
            }
        ));
    }

    #[rstest]
    fn persists_across_reopen() {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join("restrooms.db");
        {
            let store = SqliteEntityStore::open(&path).expect("create database");
            store
                .insert_restroom(&restroom_at(1, 10.0, 20.0))
                .expect("insert restroom");
        }
        let store = SqliteEntityStore::open(&path).expect("reopen database");
        assert!(store.contains(RestroomId(1)).expect("query"));
    }

    #[rstest]
    fn open_reports_path_on_failure() {
        let dir = TempDir::new().expect("create temp dir");
        let path = dir.path().join("missing").join("restrooms.db");
        let err = SqliteEntityStore::open(&path).expect_err("parent directory is missing");
        assert!(matches!(err, SqliteStoreError::OpenDatabase { path: p, .. } if p == path));
    }
}
