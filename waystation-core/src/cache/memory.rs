//! In-process cache store with per-entry expiry.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use super::{CacheError, CacheStore};

/// Lifetime used when `now + ttl` overflows `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

#[derive(Debug)]
struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// A [`CacheStore`] held in process memory.
///
/// Expired entries are evicted when read, and every write sweeps out all
/// expired entries, so keys that are never read again do not accumulate.
/// [`MemoryCacheStore::purge_expired`] runs the same sweep on demand.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use waystation_core::{CacheStore, MemoryCacheStore};
///
/// let cache = MemoryCacheStore::default();
/// cache.set_with_ttl("greeting", b"hello".to_vec(), Duration::from_secs(60))?;
/// assert_eq!(cache.get("greeting")?, Some(b"hello".to_vec()));
/// # Ok::<(), waystation_core::CacheError>(())
/// ```
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCacheStore {
    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Entry>>, CacheError> {
        self.entries.lock().map_err(|_| CacheError::Unavailable {
            reason: String::from("memory cache lock was poisoned"),
        })
    }

    /// Drop every expired entry and return how many were removed.
    pub fn purge_expired(&self) -> Result<usize, CacheError> {
        let now = Instant::now();
        let mut entries = self.lock()?;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        Ok(before - entries.len())
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> Result<usize, CacheError> {
        Ok(self.lock()?.len())
    }

    /// Whether the map holds no entries at all.
    pub fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.lock()?.is_empty())
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let now = Instant::now();
        let mut entries = self.lock()?;
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let now = Instant::now();
        let expires_at = expiry(now, ttl);
        let mut entries = self.lock()?;
        entries.retain(|_, entry| entry.is_live(now));
        entries.insert(key.to_owned(), Entry { value, expires_at });
        Ok(())
    }
}

fn expiry(now: Instant, ttl: Duration) -> Instant {
    now.checked_add(ttl)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn cache() -> MemoryCacheStore {
        MemoryCacheStore::default()
    }

    #[rstest]
    fn missing_key_is_a_miss(cache: MemoryCacheStore) {
        assert_eq!(cache.get("absent").expect("cache available"), None);
    }

    #[rstest]
    fn overwrites_existing_entry(cache: MemoryCacheStore) {
        let ttl = Duration::from_secs(60);
        cache.set_with_ttl("k", vec![1], ttl).expect("set");
        cache.set_with_ttl("k", vec![2], ttl).expect("set");
        assert_eq!(cache.get("k").expect("get"), Some(vec![2]));
        assert_eq!(cache.len().expect("len"), 1);
    }

    #[rstest]
    fn expired_entry_is_evicted_on_read(cache: MemoryCacheStore) {
        cache
            .set_with_ttl("k", vec![1], Duration::ZERO)
            .expect("set");
        assert_eq!(cache.get("k").expect("get"), None);
        assert!(cache.is_empty().expect("is_empty"));
    }

    #[rstest]
    fn purge_removes_only_expired_entries(cache: MemoryCacheStore) {
        cache
            .set_with_ttl("fresh", vec![2], Duration::from_secs(60))
            .expect("set");
        cache
            .set_with_ttl("stale", vec![1], Duration::ZERO)
            .expect("set");
        assert_eq!(cache.purge_expired().expect("purge"), 1);
        assert_eq!(cache.get("fresh").expect("get"), Some(vec![2]));
    }

    #[rstest]
    fn writes_sweep_expired_entries(cache: MemoryCacheStore) {
        for index in 0..100 {
            cache
                .set_with_ttl(&format!("stale-{index}"), vec![0], Duration::ZERO)
                .expect("set");
        }
        cache
            .set_with_ttl("fresh", vec![1], Duration::from_secs(60))
            .expect("set");
        assert_eq!(cache.len().expect("len"), 1);
    }

    #[rstest]
    fn overflowing_ttl_keeps_the_entry(cache: MemoryCacheStore) {
        cache.set_with_ttl("k", vec![1], Duration::MAX).expect("set");
        assert_eq!(cache.get("k").expect("get"), Some(vec![1]));
    }
}
