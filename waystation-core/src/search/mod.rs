//! Proximity and route-corridor search engines.
//!
//! Both engines fetch a candidate snapshot from an [`EntityStore`], measure
//! each candidate with [`distance_meters`], then filter, order and truncate.
//! They hold no state between calls apart from the shared result cache.
//!
//! [`EntityStore`]: crate::EntityStore
//! [`distance_meters`]: crate::distance::distance_meters

use thiserror::Error;

use crate::StoreError;

mod radius;
mod route;

pub use radius::{RadiusSearch, rank_by_distance};
pub use route::{
    AVERAGE_SPEED_KMH, CORRIDOR_PADDING_DEGREES, RouteSearch, corridor_bbox,
    estimate_detour_minutes,
};

/// Errors returned by the search engines.
///
/// An empty match set is not an error; only store failures surface here.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Fetching candidates failed.
    #[error("failed to load search candidates: {0}")]
    Store(#[from] StoreError),
}
