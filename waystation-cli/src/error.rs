//! Error types emitted by the Waystation CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>`. Large sources are boxed.

use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;
use waystation_core::{QueryValidationError, RestroomId, SearchError, SqliteStoreError, StoreError};
use waystation_data::{GeocoderBuildError, ImportError};

/// Errors emitted by the Waystation CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The directory that should hold the database could not be created.
    #[error("failed to prepare database directory for {path:?}: {source}")]
    PrepareDatabaseDir {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Opening the SQLite database failed.
    #[error("failed to open database {path:?}: {source}")]
    OpenDatabase {
        path: Utf8PathBuf,
        #[source]
        source: Box<SqliteStoreError>,
    },
    /// Query parameters were out of range.
    #[error("invalid query: {0}")]
    InvalidQuery(#[from] QueryValidationError),
    /// Importing the seed document failed.
    #[error("import failed: {0}")]
    Import(#[source] Box<ImportError>),
    /// A search engine failed to read the store.
    #[error("search failed: {0}")]
    Search(#[from] SearchError),
    /// Recomputing aggregates failed.
    #[error("failed to recompute aggregates for restroom {id}: {source}")]
    Recompute {
        id: RestroomId,
        #[source]
        source: StoreError,
    },
    /// Constructing the HTTP reverse geocoder failed.
    #[error("failed to build geocoder for {base_url:?}: {source}")]
    BuildGeocoder {
        base_url: String,
        #[source]
        source: GeocoderBuildError,
    },
    /// The reverse geocoder failed.
    #[error("geocoding failed: {0}")]
    Geocode(#[from] waystation_core::GeocodeError),
    /// Serialising command output failed.
    #[error("failed to serialise output: {0}")]
    SerialiseOutput(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}

impl From<ImportError> for CliError {
    fn from(error: ImportError) -> Self {
        Self::Import(Box::new(error))
    }
}
