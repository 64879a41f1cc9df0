//! Radius search: restrooms within a distance of a point, nearest first.

use log::debug;

use crate::distance::distance_meters;
use crate::{
    CacheStore, EntityFilter, EntityStore, GeoPoint, RadiusQuery, Restroom, ResultCache,
    SearchCacheKey, SearchHit,
};

use super::SearchError;

/// Measure `candidates` from `point`, drop those beyond `radius_m` and order
/// the rest by distance, breaking ties by ascending id.
///
/// The comparison is inclusive: a candidate exactly `radius_m` away is kept.
/// Filtering and ordering use exact distances; the reported
/// [`SearchHit::distance_m`] is then rounded to the centimetre.
#[must_use]
pub fn rank_by_distance<I>(candidates: I, point: GeoPoint, radius_m: f64) -> Vec<SearchHit>
where
    I: IntoIterator<Item = Restroom>,
{
    let mut hits: Vec<SearchHit> = candidates
        .into_iter()
        .filter_map(|restroom| {
            let distance_m = distance_meters(point, restroom.location);
            (distance_m <= radius_m).then_some(SearchHit {
                restroom,
                distance_m,
            })
        })
        .collect();
    hits.sort_by(|a, b| {
        a.distance_m
            .total_cmp(&b.distance_m)
            .then_with(|| a.restroom.id.cmp(&b.restroom.id))
    });
    for hit in &mut hits {
        hit.distance_m = round_to_centimetres(hit.distance_m);
    }
    hits
}

fn round_to_centimetres(distance_m: f64) -> f64 {
    (distance_m * 100.0).round() / 100.0
}

/// Radius search engine fronted by a first-page [`ResultCache`].
///
/// # Examples
/// ```
/// use waystation_core::{
///     GeoPoint, MemoryCacheStore, RadiusQuery, RadiusSearch, Restroom, RestroomId, ResultCache,
/// };
/// use waystation_core::test_support::MemoryStore;
///
/// let nyc = GeoPoint::new(40.7128, -74.0060)?;
/// let store = MemoryStore::with_restrooms([Restroom::new(RestroomId(1), nyc)]);
/// let engine = RadiusSearch::new(store, ResultCache::new(MemoryCacheStore::default()));
///
/// let hits = engine.search(&RadiusQuery::new(nyc, 1_000.0, 10, 0)?).expect("search");
/// assert_eq!(hits.len(), 1);
/// assert_eq!(hits[0].distance_m, 0.0);
/// # Ok::<(), waystation_core::QueryValidationError>(())
/// ```
#[derive(Debug)]
pub struct RadiusSearch<S, C> {
    store: S,
    cache: ResultCache<C>,
}

impl<S, C> RadiusSearch<S, C>
where
    S: EntityStore,
    C: CacheStore,
{
    /// Build an engine over `store` and `cache`.
    pub const fn new(store: S, cache: ResultCache<C>) -> Self {
        Self { store, cache }
    }

    /// The entity store candidates are read from.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The first-page cache.
    pub const fn cache(&self) -> &ResultCache<C> {
        &self.cache
    }

    /// Return restrooms within `query.radius_m()` of `query.point()` that
    /// satisfy every supplied filter, nearest first, sliced to
    /// `[offset, offset + limit)`.
    ///
    /// The first page is served from and written to the cache; later pages
    /// always read the store. A page past the last match is empty.
    ///
    /// # Errors
    /// Returns [`SearchError::Store`] when candidates cannot be loaded.
    pub fn search(&self, query: &RadiusQuery) -> Result<Vec<SearchHit>, SearchError> {
        let key = query
            .is_first_page()
            .then(|| SearchCacheKey::for_query(query));
        if let Some(page) = key.as_ref().and_then(|key| self.cache.get(key)) {
            return Ok(page);
        }

        let filter = EntityFilter::from(query);
        let candidates = self.store.find_active_entities(&filter)?;
        let candidate_count = candidates.len();
        let page: Vec<SearchHit> = rank_by_distance(candidates, query.point(), query.radius_m())
            .into_iter()
            .skip(query.offset())
            .take(query.limit())
            .collect();
        debug!(
            "radius search kept {} of {candidate_count} candidates at offset {}",
            page.len(),
            query.offset()
        );

        if let Some(key) = key {
            self.cache.put(&key, &page);
        }
        Ok(page)
    }
}
