//! Reverse geocoding behind a cache.
//!
//! [`ReverseGeocoder`] resolves a point to a postal address. Network
//! implementations live in `waystation-data`; [`CachedGeocoder`] fronts any
//! of them with a [`CacheStore`] so repeated lookups of the same spot stay
//! local for a day.

use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{CacheStore, GeoPoint};

/// Lifetime of a cached geocoding result.
pub const GEOCODE_TTL: Duration = Duration::from_secs(86_400);

/// Postal address resolved for a point.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Full display address.
    pub address: String,
    /// City, town or village, when known.
    pub city: Option<String>,
    /// Country name, when known.
    pub country: Option<String>,
}

/// Errors from [`ReverseGeocoder::reverse_geocode`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeocodeError {
    /// The request did not complete within the configured timeout.
    #[error("geocoding request to {url} timed out after {timeout_secs} s")]
    Timeout {
        /// Request URL.
        url: String,
        /// Configured timeout in whole seconds.
        timeout_secs: u64,
    },
    /// The service answered with a non-success status.
    #[error("geocoding request to {url} failed with HTTP {status}: {message}")]
    HttpError {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Error description.
        message: String,
    },
    /// The request failed before a response arrived.
    #[error("geocoding request to {url} failed: {message}")]
    NetworkError {
        /// Request URL.
        url: String,
        /// Error description.
        message: String,
    },
    /// The response body could not be interpreted.
    #[error("failed to parse geocoding response: {message}")]
    ParseError {
        /// Parser error description.
        message: String,
    },
}

/// Resolve coordinates to an address.
pub trait ReverseGeocoder: Send + Sync {
    /// Look up the address nearest to `point`.
    fn reverse_geocode(&self, point: GeoPoint) -> Result<Address, GeocodeError>;
}

impl<G> ReverseGeocoder for Box<G>
where
    G: ReverseGeocoder + ?Sized,
{
    fn reverse_geocode(&self, point: GeoPoint) -> Result<Address, GeocodeError> {
        (**self).reverse_geocode(point)
    }
}

/// Cache key for a geocoding lookup, quantised to six decimal places.
#[must_use]
pub fn geocode_cache_key(point: GeoPoint) -> String {
    format!(
        "geocode:{:.6},{:.6}",
        point.latitude(),
        point.longitude()
    )
}

/// A [`ReverseGeocoder`] that consults a cache before delegating.
///
/// Successful lookups are stored as JSON for [`GEOCODE_TTL`]. Failures are
/// never cached, and cache errors fall through to a live lookup.
///
/// # Examples
/// ```
/// use waystation_core::{Address, CachedGeocoder, GeoPoint, MemoryCacheStore, ReverseGeocoder};
/// use waystation_core::test_support::StubGeocoder;
///
/// let stub = StubGeocoder::with_address(Address {
///     address: String::from("1 Main St"),
///     city: Some(String::from("Springfield")),
///     country: None,
/// });
/// let geocoder = CachedGeocoder::new(stub, MemoryCacheStore::default());
/// let point = GeoPoint::new(40.0, -74.0)?;
/// let first = geocoder.reverse_geocode(point).expect("lookup");
/// let second = geocoder.reverse_geocode(point).expect("lookup");
/// assert_eq!(first, second);
/// assert_eq!(geocoder.inner().calls(), 1);
/// # Ok::<(), waystation_core::QueryValidationError>(())
/// ```
#[derive(Debug)]
pub struct CachedGeocoder<G, C> {
    inner: G,
    cache: C,
    ttl: Duration,
}

impl<G, C> CachedGeocoder<G, C>
where
    G: ReverseGeocoder,
    C: CacheStore,
{
    /// Front `inner` with `cache` using [`GEOCODE_TTL`].
    pub const fn new(inner: G, cache: C) -> Self {
        Self {
            inner,
            cache,
            ttl: GEOCODE_TTL,
        }
    }

    /// Override the entry lifetime.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// The wrapped geocoder.
    pub const fn inner(&self) -> &G {
        &self.inner
    }

    fn cached(&self, key: &str) -> Option<Address> {
        match self.cache.get(key) {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(address) => Some(address),
                Err(error) => {
                    warn!("discarding unreadable geocode cache entry {key}: {error}");
                    None
                }
            },
            Ok(None) => None,
            Err(error) => {
                warn!("geocode cache read failed for {key}: {error}");
                None
            }
        }
    }

    fn remember(&self, key: &str, address: &Address) {
        let bytes = match serde_json::to_vec(address) {
            Ok(bytes) => bytes,
            Err(error) => {
                warn!("failed to encode geocode result for {key}: {error}");
                return;
            }
        };
        if let Err(error) = self.cache.set_with_ttl(key, bytes, self.ttl) {
            warn!("geocode cache write failed for {key}: {error}");
        }
    }
}

impl<G, C> ReverseGeocoder for CachedGeocoder<G, C>
where
    G: ReverseGeocoder,
    C: CacheStore,
{
    fn reverse_geocode(&self, point: GeoPoint) -> Result<Address, GeocodeError> {
        let key = geocode_cache_key(point);
        if let Some(address) = self.cached(&key) {
            debug!("geocode cache hit for {key}");
            return Ok(address);
        }
        let address = self.inner.reverse_geocode(point)?;
        self.remember(&key, &address);
        Ok(address)
    }
}
