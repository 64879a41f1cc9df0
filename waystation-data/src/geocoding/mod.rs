//! HTTP reverse geocoding against a Nominatim service.
//!
//! [`HttpReverseGeocoder`] implements [`waystation_core::ReverseGeocoder`].
//! Wrap it in [`waystation_core::CachedGeocoder`] to keep repeated lookups
//! of the same point off the network.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use waystation_core::{CachedGeocoder, GeoPoint, MemoryCacheStore, ReverseGeocoder};
//! use waystation_data::geocoding::{HttpReverseGeocoder, HttpReverseGeocoderConfig};
//!
//! let config = HttpReverseGeocoderConfig::new("http://localhost:8080")
//!     .with_timeout(Duration::from_secs(10))
//!     .with_user_agent("my-app/1.0");
//! let geocoder = CachedGeocoder::new(
//!     HttpReverseGeocoder::with_config(config)?,
//!     MemoryCacheStore::default(),
//! );
//!
//! let address = geocoder.reverse_geocode(GeoPoint::new(51.5, -0.12)?)?;
//! println!("{}", address.address);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod nominatim;
mod provider;

pub use provider::{
    DEFAULT_BASE_URL, DEFAULT_USER_AGENT, GeocoderBuildError, HttpReverseGeocoder,
    HttpReverseGeocoderConfig,
};
