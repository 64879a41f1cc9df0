//! Opening the SQLite store and cache named by a command's configuration.

use std::sync::Arc;

use camino::Utf8Path;
use log::{debug, warn};
use waystation_core::{CacheStore, MemoryCacheStore, SqliteCacheStore, SqliteEntityStore};
use waystation_data::fs::{ensure_parent_dir, file_is_file};

use crate::{ARG_DATABASE, CliError};

/// Fail unless `path` names an existing regular file.
pub(crate) fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match file_is_file(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Open a database that must already exist.
///
/// Read-side commands refuse to conjure an empty database from a typo.
pub(crate) fn open_existing(path: &Utf8Path) -> Result<SqliteEntityStore, CliError> {
    require_existing(path, ARG_DATABASE)?;
    open(path)
}

/// Open a database, creating the file and its parent directories if needed.
pub(crate) fn open_or_create(path: &Utf8Path) -> Result<SqliteEntityStore, CliError> {
    ensure_parent_dir(path).map_err(|source| CliError::PrepareDatabaseDir {
        path: path.to_path_buf(),
        source,
    })?;
    open(path)
}

fn open(path: &Utf8Path) -> Result<SqliteEntityStore, CliError> {
    debug!("opening database {path}");
    SqliteEntityStore::open(path.as_std_path()).map_err(|source| CliError::OpenDatabase {
        path: path.to_path_buf(),
        source: Box::new(source),
    })
}

/// Open the cache table in the database at `path`.
///
/// Caching is advisory: when the table cannot be opened the command carries
/// on with a cache that lasts only for this process.
pub(crate) fn open_cache(path: &Utf8Path) -> Arc<dyn CacheStore> {
    match SqliteCacheStore::open(path.as_std_path()) {
        Ok(cache) => Arc::new(cache),
        Err(error) => {
            warn!("cache unavailable in {path}, falling back to memory: {error}");
            Arc::new(MemoryCacheStore::default())
        }
    }
}
