//! Network and file collaborators for the Waystation engines.
//!
//! Responsibilities:
//! - Resolve addresses over HTTP through [`geocoding::HttpReverseGeocoder`].
//! - Load JSON seed documents into the SQLite store via [`import`].
//! - Provide capability-based file helpers in [`fs`].
//!
//! Boundaries:
//! - Domain rules live in `waystation-core`; this crate only adapts IO to
//!   its traits.

pub mod fs;
pub mod geocoding;
pub mod import;

pub use geocoding::{GeocoderBuildError, HttpReverseGeocoder, HttpReverseGeocoderConfig};
pub use import::{ImportError, ImportSummary, SeedDocument, SeedRestroom, SeedReview, import_seed};
