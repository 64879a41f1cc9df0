//! Command-line interface for the Waystation restroom directory.
//!
//! Each subcommand resolves its settings through `ortho_config`, layering
//! defaults, configuration files, `WAYSTATION_CMDS_*` environment variables
//! and flags, then prints its result as pretty JSON.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod database;
mod error;
mod geocode;
mod import;
mod output;
mod recompute;
mod route;
mod search;

pub use error::CliError;

use geocode::{GeocodeArgs, run_geocode};
use import::{ImportArgs, run_import};
use recompute::{RecomputeArgs, run_recompute};
use route::{RouteArgs, run_route};
use search::{SearchArgs, run_search};

pub(crate) const ARG_DATABASE: &str = "database";
pub(crate) const ARG_IMPORT_SEED: &str = "seed";
pub(crate) const ARG_LAT: &str = "lat";
pub(crate) const ARG_LON: &str = "lon";
pub(crate) const ARG_RADIUS: &str = "radius";
pub(crate) const ARG_MIN_RATING: &str = "min-rating";
pub(crate) const ARG_LIMIT: &str = "limit";
pub(crate) const ARG_OFFSET: &str = "offset";
pub(crate) const ARG_CACHE_TTL_SECS: &str = "cache-ttl-secs";
pub(crate) const ARG_ORIGIN_LAT: &str = "origin-lat";
pub(crate) const ARG_ORIGIN_LON: &str = "origin-lon";
pub(crate) const ARG_DEST_LAT: &str = "dest-lat";
pub(crate) const ARG_DEST_LON: &str = "dest-lon";
pub(crate) const ARG_MAX_DETOUR_MINUTES: &str = "max-detour-minutes";
pub(crate) const ARG_RESTROOM_ID: &str = "restroom-id";
pub(crate) const ARG_NOMINATIM_BASE_URL: &str = "nominatim-base-url";
pub(crate) const ARG_TIMEOUT_SECS: &str = "timeout-secs";

pub(crate) const ENV_IMPORT_SEED: &str = "WAYSTATION_CMDS_IMPORT_SEED";
pub(crate) const ENV_SEARCH_LAT: &str = "WAYSTATION_CMDS_SEARCH_LAT";
pub(crate) const ENV_SEARCH_LON: &str = "WAYSTATION_CMDS_SEARCH_LON";
pub(crate) const ENV_ROUTE_ORIGIN_LAT: &str = "WAYSTATION_CMDS_ROUTE_ORIGIN_LAT";
pub(crate) const ENV_ROUTE_ORIGIN_LON: &str = "WAYSTATION_CMDS_ROUTE_ORIGIN_LON";
pub(crate) const ENV_ROUTE_DEST_LAT: &str = "WAYSTATION_CMDS_ROUTE_DEST_LAT";
pub(crate) const ENV_ROUTE_DEST_LON: &str = "WAYSTATION_CMDS_ROUTE_DEST_LON";
pub(crate) const ENV_RECOMPUTE_RESTROOM_ID: &str = "WAYSTATION_CMDS_RECOMPUTE_RESTROOM_ID";
pub(crate) const ENV_GEOCODE_LAT: &str = "WAYSTATION_CMDS_GEOCODE_LAT";
pub(crate) const ENV_GEOCODE_LON: &str = "WAYSTATION_CMDS_GEOCODE_LON";

/// Database file used when neither a flag nor configuration names one.
pub(crate) const DEFAULT_DATABASE: &str = "waystation.db";

/// Run the Waystation CLI with the current process arguments and environment.
///
/// # Errors
/// Returns a [`CliError`] describing the first argument, configuration,
/// validation, storage or output failure.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Import(args) => run_import(args),
        Command::Search(args) => run_search(args),
        Command::Route(args) => run_route(args),
        Command::Recompute(args) => run_recompute(args),
        Command::Geocode(args) => run_geocode(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "waystation",
    about = "Find, rank and rate public restrooms",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load restrooms and reviews from a JSON seed file.
    Import(ImportArgs),
    /// Find restrooms within a radius of a point.
    Search(SearchArgs),
    /// Find restrooms reachable with a short detour between two points.
    Route(RouteArgs),
    /// Rebuild a restroom's rating aggregates from its reviews.
    Recompute(RecomputeArgs),
    /// Resolve a point to a postal address.
    Geocode(GeocodeArgs),
}

#[cfg(test)]
mod tests;
