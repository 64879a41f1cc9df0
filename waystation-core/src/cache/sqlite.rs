//! Cache store persisted in a SQLite table.
//!
//! Entries live in a `cache_entries` table next to the restroom tables, so
//! short-lived processes such as the CLI share cached pages and addresses.
//! Expiry uses wall-clock milliseconds since the Unix epoch.

use std::fmt;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rusqlite::{Connection, OptionalExtension, params};

use super::{CacheError, CacheStore};
use crate::store::SqliteStoreError;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS cache_entries (
    key TEXT PRIMARY KEY,
    value BLOB NOT NULL,
    expires_at_ms INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS cache_entries_expiry ON cache_entries (expires_at_ms);
";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// A [`CacheStore`] backed by a SQLite database.
///
/// Every write first deletes expired rows, so abandoned keys do not
/// accumulate.
///
/// # Examples
/// ```
/// use std::time::Duration;
/// use waystation_core::CacheStore;
/// use waystation_core::cache::SqliteCacheStore;
///
/// let cache = SqliteCacheStore::open_in_memory()?;
/// cache.set_with_ttl("greeting", b"hello".to_vec(), Duration::from_secs(60))?;
/// assert_eq!(cache.get("greeting")?, Some(b"hello".to_vec()));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct SqliteCacheStore {
    connection: Mutex<Connection>,
}

impl fmt::Debug for SqliteCacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteCacheStore").finish_non_exhaustive()
    }
}

impl SqliteCacheStore {
    /// Open or create a database file and ensure the cache table exists.
    pub fn open<P>(path: P) -> Result<Self, SqliteStoreError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let connection =
            Connection::open(path).map_err(|source| SqliteStoreError::OpenDatabase {
                path: path.to_path_buf(),
                source,
            })?;
        Self::with_connection(connection)
    }

    /// Create a private in-memory cache.
    pub fn open_in_memory() -> Result<Self, SqliteStoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(connection: Connection) -> Result<Self, SqliteStoreError> {
        connection.busy_timeout(BUSY_TIMEOUT)?;
        connection.execute_batch(SCHEMA)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, CacheError> {
        self.connection.lock().map_err(|_| CacheError::Unavailable {
            reason: String::from("SQLite cache lock was poisoned"),
        })
    }

    /// Drop every expired entry and return how many were removed.
    pub fn purge_expired(&self) -> Result<usize, CacheError> {
        let connection = self.lock()?;
        purge(&connection, now_ms())
    }

    /// Number of stored entries, including expired ones not yet purged.
    pub fn len(&self) -> Result<usize, CacheError> {
        let connection = self.lock()?;
        let count: i64 = connection
            .query_row("SELECT COUNT(*) FROM cache_entries", [], |row| row.get(0))
            .map_err(unavailable)?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// Whether the table holds no entries at all.
    pub fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.len()? == 0)
    }
}

impl CacheStore for SqliteCacheStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let now = now_ms();
        let connection = self.lock()?;
        let live = connection
            .query_row(
                "SELECT value FROM cache_entries WHERE key = ?1 AND expires_at_ms > ?2",
                params![key, now],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()
            .map_err(unavailable)?;
        if live.is_none() {
            connection
                .execute(
                    "DELETE FROM cache_entries WHERE key = ?1 AND expires_at_ms <= ?2",
                    params![key, now],
                )
                .map_err(unavailable)?;
        }
        Ok(live)
    }

    fn set_with_ttl(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let now = now_ms();
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        let connection = self.lock()?;
        purge(&connection, now)?;
        connection
            .execute(
                "INSERT OR REPLACE INTO cache_entries (key, value, expires_at_ms)
                 VALUES (?1, ?2, ?3)",
                params![key, value, now.saturating_add(ttl_ms)],
            )
            .map_err(unavailable)?;
        Ok(())
    }
}

fn purge(connection: &Connection, now: i64) -> Result<usize, CacheError> {
    connection
        .execute(
            "DELETE FROM cache_entries WHERE expires_at_ms <= ?1",
            params![now],
        )
        .map_err(unavailable)
}

fn now_ms() -> i64 {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX)
}

fn unavailable(error: rusqlite::Error) -> CacheError {
    CacheError::Unavailable {
        reason: error.to_string(),
    }
}
