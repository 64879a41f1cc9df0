//! Advisory, time-boxed caching of search results.
//!
//! [`CacheStore`] is the raw byte-level collaborator. [`ResultCache`] wraps a
//! store and absorbs every failure: a broken or unreachable backend only
//! turns hits into misses and is reported through `log::warn!`.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use thiserror::Error;

use crate::{RadiusQuery, SearchHit};

mod codec;
mod memory;
#[cfg(feature = "store-sqlite")]
mod sqlite;

pub use codec::PageCodecError;
pub use memory::MemoryCacheStore;
#[cfg(feature = "store-sqlite")]
pub use sqlite::SqliteCacheStore;

/// Default lifetime of a cached first page.
pub const SEARCH_TTL: Duration = Duration::from_secs(300);

/// Failure reported by a [`CacheStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// The backend could not serve the request.
    #[error("cache backend unavailable: {reason}")]
    Unavailable {
        /// Backend-specific description.
        reason: String,
    },
}

/// Byte-oriented key/value store with per-entry expiry.
pub trait CacheStore: Send + Sync {
    /// Fetch a live entry.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// Store `value` under `key` for `ttl`, replacing any existing entry.
    fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;
}

impl<C> CacheStore for Arc<C>
where
    C: CacheStore + ?Sized,
{
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        (**self).get(key)
    }

    fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        (**self).set_with_ttl(key, value, ttl)
    }
}

/// Cache key for the first page of a radius search.
///
/// Coordinates are quantised to four decimal places (about 11 m), so nearby
/// query points share an entry. Every filter and the page size are part of
/// the key; a page cached for one filter set is never served to another.
///
/// # Examples
/// ```
/// use waystation_core::{GeoPoint, RadiusQuery, SearchCacheKey};
///
/// let query = RadiusQuery::new(GeoPoint::new(40.71284, -74.00601)?, 1_000.0, 50, 0)?;
/// assert_eq!(
///     SearchCacheKey::for_query(&query).as_str(),
///     "search:40.7128,-74.0060:1000:any:wc=any:gn=any:bc=any:free=false:limit=50",
/// );
/// # Ok::<(), waystation_core::QueryValidationError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchCacheKey(String);

impl SearchCacheKey {
    /// Build the key for `query`, ignoring its offset.
    #[must_use]
    pub fn for_query(query: &RadiusQuery) -> Self {
        let point = query.point();
        let min_rating = query
            .min_rating()
            .map_or_else(|| String::from("any"), |rating| rating.to_string());
        Self(format!(
            "search:{lat:.4},{lon:.4}:{radius}:{min_rating}:wc={wc}:gn={gn}:bc={bc}:free={free}:limit={limit}",
            lat = point.latitude(),
            lon = point.longitude(),
            radius = query.radius_m(),
            wc = flag(query.wheelchair()),
            gn = flag(query.gender_neutral()),
            bc = flag(query.baby_changing()),
            free = query.is_free_only(),
            limit = query.limit(),
        ))
    }

    /// The key text passed to the [`CacheStore`].
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SearchCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

const fn flag(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "true",
        Some(false) => "false",
        None => "any",
    }
}

/// First-page cache for radius searches.
#[derive(Debug, Clone)]
pub struct ResultCache<C> {
    store: C,
    ttl: Duration,
}

impl<C> ResultCache<C>
where
    C: CacheStore,
{
    /// Wrap `store` using the default [`SEARCH_TTL`].
    pub const fn new(store: C) -> Self {
        Self {
            store,
            ttl: SEARCH_TTL,
        }
    }

    /// Override the entry lifetime.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Lifetime given to newly stored pages.
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The wrapped store.
    pub const fn store(&self) -> &C {
        &self.store
    }

    /// Look up a cached page. Backend failures and undecodable payloads are
    /// logged and reported as a miss.
    pub fn get(&self, key: &SearchCacheKey) -> Option<Vec<SearchHit>> {
        let bytes = match self.store.get(key.as_str()) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                debug!("result cache miss for {key}");
                return None;
            }
            Err(error) => {
                warn!("result cache read failed for {key}: {error}");
                return None;
            }
        };
        match codec::decode_page(&bytes) {
            Ok(page) => {
                debug!("result cache hit for {key} ({} hits)", page.len());
                Some(page)
            }
            Err(error) => {
                warn!("discarding undecodable cached page for {key}: {error}");
                None
            }
        }
    }

    /// Store a page. Failures are logged and otherwise ignored.
    pub fn put(&self, key: &SearchCacheKey, page: &[SearchHit]) {
        let bytes = match codec::encode_page(page) {
            Ok(bytes) => bytes,
            Err(error) => {
                warn!("failed to encode result page for {key}: {error}");
                return;
            }
        };
        if let Err(error) = self.store.set_with_ttl(key.as_str(), bytes, self.ttl) {
            warn!("result cache write failed for {key}: {error}");
        }
    }
}
