//! Route-corridor search: restrooms reachable with a bounded detour.
//!
//! The corridor is an axis-aligned box around both endpoints, padded by
//! [`CORRIDOR_PADDING_DEGREES`]. Detours are estimated from the straight-line
//! distance to the origin at a constant [`AVERAGE_SPEED_KMH`]; no road
//! geometry is consulted.

use geo::{Coord, Rect};
use log::debug;

use crate::distance::distance_meters;
use crate::{EntityFilter, EntityStore, GeoPoint, Restroom, RouteHit, RouteQuery};

use super::SearchError;

/// Padding added on every side of the endpoint box, in degrees.
pub const CORRIDOR_PADDING_DEGREES: f64 = 0.1;

/// Assumed travel speed when converting distance to detour time.
pub const AVERAGE_SPEED_KMH: f64 = 50.0;

/// Bounding box spanning both endpoints plus the corridor padding.
///
/// # Examples
/// ```
/// use waystation_core::{GeoPoint, corridor_bbox};
///
/// let bbox = corridor_bbox(GeoPoint::new(40.0, -74.0)?, GeoPoint::new(41.0, -73.0)?);
/// assert!((bbox.min().y - 39.9).abs() < 1e-9);
/// assert!((bbox.max().x - -72.9).abs() < 1e-9);
/// # Ok::<(), waystation_core::QueryValidationError>(())
/// ```
#[must_use]
pub fn corridor_bbox(origin: GeoPoint, destination: GeoPoint) -> Rect<f64> {
    let (a, b) = (origin.coord(), destination.coord());
    Rect::new(
        Coord {
            x: a.x.min(b.x) - CORRIDOR_PADDING_DEGREES,
            y: a.y.min(b.y) - CORRIDOR_PADDING_DEGREES,
        },
        Coord {
            x: a.x.max(b.x) + CORRIDOR_PADDING_DEGREES,
            y: a.y.max(b.y) + CORRIDOR_PADDING_DEGREES,
        },
    )
}

/// Estimated detour in minutes for a straight-line distance in metres.
///
/// ```
/// use waystation_core::estimate_detour_minutes;
///
/// assert_eq!(estimate_detour_minutes(25_000.0), 30.0);
/// ```
#[must_use]
pub fn estimate_detour_minutes(distance_m: f64) -> f64 {
    distance_m / 1000.0 / AVERAGE_SPEED_KMH * 60.0
}

/// Keep `restroom` when its estimated detour is at most `budget_minutes`.
fn detour_hit(restroom: Restroom, distance_m: f64, budget_minutes: f64) -> Option<RouteHit> {
    let minutes = estimate_detour_minutes(distance_m);
    (minutes <= budget_minutes).then(|| RouteHit {
        restroom,
        // Float-to-int casts saturate and truncate toward zero.
        detour_secs: (minutes * 60.0) as u32,
    })
}

/// Route-corridor search engine. Results are never cached.
#[derive(Debug)]
pub struct RouteSearch<S> {
    store: S,
}

impl<S> RouteSearch<S>
where
    S: EntityStore,
{
    /// Build an engine over `store`.
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// The entity store candidates are read from.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Return restrooms inside the corridor whose estimated detour is at most
    /// `query.max_detour_minutes()`, shortest detour first.
    ///
    /// At most `query.limit()` candidates are fetched from the store before
    /// the detour budget is applied, so fewer results than exist may be
    /// returned when many candidates fall outside the budget.
    ///
    /// # Errors
    /// Returns [`SearchError::Store`] when candidates cannot be loaded.
    pub fn search(&self, query: &RouteQuery) -> Result<Vec<RouteHit>, SearchError> {
        let filter = EntityFilter {
            min_rating: query.min_rating(),
            wheelchair: query.wheelchair_required().then_some(true),
            bbox: Some(corridor_bbox(query.origin(), query.destination())),
            limit: Some(query.limit()),
            ..EntityFilter::default()
        };
        let candidates = self.store.find_active_entities(&filter)?;
        let candidate_count = candidates.len();
        let budget = f64::from(query.max_detour_minutes());

        let mut hits: Vec<RouteHit> = candidates
            .into_iter()
            .filter_map(|restroom| {
                let distance_m = distance_meters(query.origin(), restroom.location);
                detour_hit(restroom, distance_m, budget)
            })
            .collect();
        hits.sort_by_key(|hit| (hit.detour_secs, hit.restroom.id));
        hits.truncate(query.limit());
        debug!(
            "route search kept {} of {candidate_count} corridor candidates",
            hits.len()
        );
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MemoryStore, restroom_at};
    use crate::{AccessibilityLevel, RestroomAttributes};
    use rstest::{fixture, rstest};

    const ORIGIN: (f64, f64) = (40.0, -74.0);
    // 0.1 degrees of latitude is about 11.1 km, or 13.3 minutes at 50 km/h.
    const TENTH_DEGREE_MINUTES: f64 = 13.343_391;

    fn route(max_detour_minutes: u32, limit: usize) -> RouteQuery {
        let origin = GeoPoint::new(ORIGIN.0, ORIGIN.1).expect("valid point");
        let destination = GeoPoint::new(40.2, -74.0).expect("valid point");
        RouteQuery::new(origin, destination, max_detour_minutes, limit).expect("valid query")
    }

    fn ids(hits: &[RouteHit]) -> Vec<u64> {
        hits.iter().map(|hit| hit.restroom.id.0).collect()
    }

    #[fixture]
    fn store() -> MemoryStore {
        MemoryStore::with_restrooms([
            restroom_at(1, 40.0, -74.0),
            restroom_at(2, 40.05, -74.0),
            restroom_at(3, 40.1, -74.0),
            restroom_at(4, 40.25, -74.0),
            // Outside the corridor.
            restroom_at(5, 40.5, -74.0),
        ])
    }

    #[rstest]
    fn estimates_detour_at_fifty_kmh() {
        assert_eq!(estimate_detour_minutes(0.0), 0.0);
        assert_eq!(estimate_detour_minutes(25_000.0), 30.0);
        assert!((estimate_detour_minutes(11_119.5) - TENTH_DEGREE_MINUTES).abs() < 1e-3);
    }

    #[rstest]
    #[case(25_000.0, true)]
    #[case(25_000.1, false)]
    fn budget_boundary_is_inclusive(#[case] distance_m: f64, #[case] kept: bool) {
        let hit = detour_hit(restroom_at(1, 0.0, 0.0), distance_m, 30.0);
        assert_eq!(hit.is_some(), kept);
        if let Some(hit) = hit {
            assert_eq!(hit.detour_secs, 1_800);
        }
    }

    #[rstest]
    fn corridor_is_padded_on_every_side() {
        let bbox = corridor_bbox(
            GeoPoint::new(40.2, -73.9).expect("valid point"),
            GeoPoint::new(40.0, -74.0).expect("valid point"),
        );
        assert!((bbox.min().x - -74.1).abs() < 1e-9);
        assert!((bbox.min().y - 39.9).abs() < 1e-9);
        assert!((bbox.max().x - -73.8).abs() < 1e-9);
        assert!((bbox.max().y - 40.3).abs() < 1e-9);
    }

    #[rstest]
    fn keeps_candidates_within_budget_in_detour_order(store: MemoryStore) {
        let engine = RouteSearch::new(store);
        let hits = engine.search(&route(10, 20)).expect("search");
        assert_eq!(ids(&hits), vec![1, 2]);
        assert_eq!(hits[0].detour_secs, 0);
        assert!(hits[1].detour_secs > 0);
    }

    #[rstest]
    fn wider_budget_admits_farther_candidates(store: MemoryStore) {
        let engine = RouteSearch::new(store);
        let hits = engine.search(&route(30, 20)).expect("search");
        assert_eq!(ids(&hits), vec![1, 2, 3]);
        assert!(hits.windows(2).all(|pair| pair[0].detour_secs <= pair[1].detour_secs));
    }

    #[rstest]
    fn detour_seconds_round_toward_zero(store: MemoryStore) {
        let engine = RouteSearch::new(store);
        let hits = engine.search(&route(30, 20)).expect("search");
        let origin = GeoPoint::new(ORIGIN.0, ORIGIN.1).expect("valid point");
        let third = &hits[2];
        let exact = estimate_detour_minutes(distance_meters(origin, third.restroom.location)) * 60.0;
        assert_eq!(third.detour_secs, 800);
        assert!(exact > 800.5);
    }

    #[rstest]
    fn store_limit_applies_before_detour_filter() {
        let store = MemoryStore::with_restrooms([
            restroom_at(1, 40.29, -74.0),
            restroom_at(2, 40.0, -74.0),
        ]);
        let engine = RouteSearch::new(store);
        let hits = engine.search(&route(10, 1)).expect("search");
        assert!(hits.is_empty());
    }

    #[rstest]
    fn wheelchair_requirement_filters_candidates(store: MemoryStore) {
        store.insert_restroom(restroom_at(6, 40.01, -74.0).with_attributes(
            RestroomAttributes {
                wheelchair: AccessibilityLevel::Partial,
                ..RestroomAttributes::default()
            },
        ));
        let engine = RouteSearch::new(store);
        let hits = engine
            .search(&route(10, 20).requiring_wheelchair_access())
            .expect("search");
        assert_eq!(ids(&hits), vec![6]);
    }

    #[rstest]
    fn truncates_to_limit(store: MemoryStore) {
        let engine = RouteSearch::new(store);
        let hits = engine.search(&route(30, 2)).expect("search");
        assert_eq!(ids(&hits), vec![1, 2]);
    }
}
