//! Test doubles for stores, caches and geocoders.
//!
//! Compiled for unit tests and behind the `test-support` feature for
//! integration tests and downstream crates.

use std::collections::BTreeMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use crate::{
    Address, AuthorId, CacheError, CacheStore, EntityFilter, EntityStore, GeoPoint, GeocodeError,
    RatingAggregates, Restroom, RestroomId, ReverseGeocoder, Review, ReviewId, ReviewScores,
    StoreError,
};

/// In-memory [`EntityStore`] guarded by read-write locks.
///
/// The store performs a linear scan and is intended only for small datasets.
/// Mutators take `&self` so tests can change data underneath a running
/// engine.
#[derive(Debug, Default)]
pub struct MemoryStore {
    restrooms: RwLock<BTreeMap<RestroomId, Restroom>>,
    reviews: RwLock<BTreeMap<ReviewId, Review>>,
}

impl MemoryStore {
    /// Create a store from a collection of restrooms.
    pub fn with_restrooms<I>(restrooms: I) -> Self
    where
        I: IntoIterator<Item = Restroom>,
    {
        let store = Self::default();
        for restroom in restrooms {
            store.insert_restroom(restroom);
        }
        store
    }

    /// Insert or replace a restroom.
    pub fn insert_restroom(&self, restroom: Restroom) {
        self.restrooms
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(restroom.id, restroom);
    }

    /// Remove a restroom, returning whether it existed.
    pub fn remove_restroom(&self, id: RestroomId) -> bool {
        self.restrooms
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }

    /// Insert or replace a review.
    pub fn add_review(&self, review: Review) {
        self.reviews
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(review.id, review);
    }

    /// Remove a review, returning whether it existed.
    pub fn remove_review(&self, id: ReviewId) -> bool {
        self.reviews
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }

    /// Stored aggregates of a restroom, or zeroed aggregates when absent.
    pub fn ratings_of(&self, id: RestroomId) -> RatingAggregates {
        self.restrooms
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .map(|restroom| *restroom.ratings())
            .unwrap_or_default()
    }
}

impl EntityStore for MemoryStore {
    fn find_active_entities(&self, filter: &EntityFilter) -> Result<Vec<Restroom>, StoreError> {
        let restrooms = self.restrooms.read().unwrap_or_else(PoisonError::into_inner);
        Ok(restrooms
            .values()
            .filter(|restroom| filter.matches(restroom))
            .take(filter.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    fn get_by_id(&self, id: RestroomId) -> Result<Option<Restroom>, StoreError> {
        Ok(self
            .restrooms
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned())
    }

    fn update_aggregates(
        &self,
        id: RestroomId,
        aggregates: RatingAggregates,
    ) -> Result<(), StoreError> {
        let mut restrooms = self.restrooms.write().unwrap_or_else(PoisonError::into_inner);
        let restroom = restrooms.get_mut(&id).ok_or(StoreError::NotFound { id })?;
        restroom.set_ratings(aggregates);
        Ok(())
    }

    fn fetch_reviews(&self, id: RestroomId) -> Result<Vec<Review>, StoreError> {
        Ok(self
            .reviews
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|review| review.restroom_id == id)
            .cloned()
            .collect())
    }
}

/// [`EntityStore`] whose every call fails with a backend error.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingStore;

fn offline() -> StoreError {
    StoreError::backend(io::Error::other("store offline"))
}

impl EntityStore for FailingStore {
    fn find_active_entities(&self, _filter: &EntityFilter) -> Result<Vec<Restroom>, StoreError> {
        Err(offline())
    }

    fn get_by_id(&self, _id: RestroomId) -> Result<Option<Restroom>, StoreError> {
        Err(offline())
    }

    fn update_aggregates(
        &self,
        _id: RestroomId,
        _aggregates: RatingAggregates,
    ) -> Result<(), StoreError> {
        Err(offline())
    }

    fn fetch_reviews(&self, _id: RestroomId) -> Result<Vec<Review>, StoreError> {
        Err(offline())
    }
}

/// [`CacheStore`] that is always unreachable.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableCache;

impl CacheStore for UnavailableCache {
    fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Err(CacheError::Unavailable {
            reason: String::from("connection refused"),
        })
    }

    fn set_with_ttl(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::Unavailable {
            reason: String::from("connection refused"),
        })
    }
}

/// Deterministic [`ReverseGeocoder`] that counts its lookups.
#[derive(Debug)]
pub struct StubGeocoder {
    response: Result<Address, GeocodeError>,
    calls: AtomicUsize,
}

impl StubGeocoder {
    /// Answer every lookup with `address`.
    #[must_use]
    pub const fn with_address(address: Address) -> Self {
        Self {
            response: Ok(address),
            calls: AtomicUsize::new(0),
        }
    }

    /// Fail every lookup with `error`.
    #[must_use]
    pub const fn with_error(error: GeocodeError) -> Self {
        Self {
            response: Err(error),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of lookups served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ReverseGeocoder for StubGeocoder {
    fn reverse_geocode(&self, _point: GeoPoint) -> Result<Address, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone()
    }
}

/// Active restroom with default attributes at the given coordinates.
///
/// # Panics
/// Panics when the coordinates are out of range.
#[must_use]
pub fn restroom_at(id: u64, latitude: f64, longitude: f64) -> Restroom {
    let location = GeoPoint::new(latitude, longitude).expect("valid test coordinate");
    Restroom::new(RestroomId(id), location)
}

/// Review without a comment, scored in storage order.
///
/// # Panics
/// Panics when a score is outside `1..=5`.
#[must_use]
pub fn review_with(id: u64, restroom_id: u64, author_id: u64, scores: [u8; 6]) -> Review {
    let scores = ReviewScores::from_raw(scores).expect("valid test scores");
    Review::new(
        ReviewId(id),
        RestroomId(restroom_id),
        AuthorId(author_id),
        scores,
        None,
    )
    .expect("review without comment is valid")
}
