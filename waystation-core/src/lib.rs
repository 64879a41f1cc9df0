//! Core domain types and engines for the Waystation restroom directory.
//!
//! The crate answers two questions: which restrooms lie within a radius of a
//! point, and which can be reached with a short detour between two points.
//! It also keeps each restroom's cached rating aggregates in step with its
//! reviews. Persistence, caching and geocoding are reached through the
//! [`EntityStore`], [`CacheStore`] and [`ReverseGeocoder`] traits.
//!
//! Constructors validate their input and return `Result`, so the engines
//! only ever see in-range coordinates, radii and page sizes.

pub mod aggregator;
pub mod cache;
pub mod distance;
mod geocode;
mod point;
mod query;
mod ratings;
mod restroom;
mod review;
pub mod search;
pub mod store;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use aggregator::{
    AggregationError, AggregationQueue, RatingAggregator, RecomputeOutcome,
    spawn_aggregation_worker,
};
pub use cache::{
    CacheError, CacheStore, MemoryCacheStore, PageCodecError, ResultCache, SEARCH_TTL,
    SearchCacheKey,
};
pub use distance::{EARTH_RADIUS_METERS, distance_meters};
pub use geocode::{
    Address, CachedGeocoder, GEOCODE_TTL, GeocodeError, ReverseGeocoder, geocode_cache_key,
};
pub use point::GeoPoint;
pub use query::{
    DEFAULT_DETOUR_MINUTES, DEFAULT_RADIUS_LIMIT, DEFAULT_RADIUS_METERS, DEFAULT_ROUTE_LIMIT,
    DETOUR_MINUTES_RANGE, MIN_RATING_RANGE, QueryValidationError, RADIUS_LIMIT_RANGE,
    RADIUS_RANGE_METERS, ROUTE_LIMIT_RANGE, RadiusQuery, RouteHit, RouteQuery, SearchHit,
};
pub use ratings::{Averages, RatingAggregates};
pub use restroom::{
    AccessibilityLevel, Restroom, RestroomAttributes, RestroomDetails, RestroomId, RestroomSource,
    RestroomStatus,
};
pub use review::{
    AuthorId, MAX_COMMENT_CHARS, Rating, RatingError, Review, ReviewError, ReviewId, ReviewScores,
};
pub use search::{
    AVERAGE_SPEED_KMH, CORRIDOR_PADDING_DEGREES, RadiusSearch, RouteSearch, SearchError,
    corridor_bbox, estimate_detour_minutes, rank_by_distance,
};
pub use store::{EntityFilter, EntityStore, StoreError};
#[cfg(feature = "store-sqlite")]
pub use cache::SqliteCacheStore;
#[cfg(feature = "store-sqlite")]
pub use store::{SqliteEntityStore, SqliteStoreError};
