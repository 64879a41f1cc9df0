//! Facade crate for the Waystation restroom directory.
//!
//! This crate re-exports the core domain types, engines and collaborator
//! traits. The SQLite entity store is available behind the `store-sqlite`
//! feature, which is enabled by default.

#![forbid(unsafe_code)]

pub use waystation_core::{
    AccessibilityLevel, Address, AggregationError, AggregationQueue, AuthorId, CacheError,
    CacheStore, CachedGeocoder, EntityFilter, EntityStore, GeoPoint, GeocodeError,
    MemoryCacheStore, QueryValidationError, RadiusQuery, RadiusSearch, Rating,
    RatingAggregates, RatingAggregator, RatingError, RecomputeOutcome, Restroom,
    RestroomAttributes, RestroomDetails, RestroomId, RestroomSource, RestroomStatus, ResultCache,
    ReverseGeocoder, Review, ReviewError, ReviewId, ReviewScores, RouteHit, RouteQuery,
    RouteSearch, SearchError, SearchHit, StoreError, distance_meters,
    spawn_aggregation_worker,
};

#[cfg(feature = "store-sqlite")]
pub use waystation_core::{SqliteCacheStore, SqliteEntityStore, SqliteStoreError};

#[cfg(feature = "test-support")]
pub use waystation_core::test_support;
