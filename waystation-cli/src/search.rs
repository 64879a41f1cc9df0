//! `search` command: restrooms within a radius of a point.

use camino::Utf8PathBuf;
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::time::Duration;
use waystation_core::{
    DEFAULT_RADIUS_LIMIT, DEFAULT_RADIUS_METERS, GeoPoint, RadiusQuery, RadiusSearch,
    ResultCache, SEARCH_TTL, SearchHit,
};

use crate::database::{open_cache, open_existing};
use crate::output::write_json;
use crate::{
    ARG_CACHE_TTL_SECS, ARG_DATABASE, ARG_LAT, ARG_LIMIT, ARG_LON, ARG_MIN_RATING, ARG_OFFSET,
    ARG_RADIUS, CliError, DEFAULT_DATABASE, ENV_SEARCH_LAT, ENV_SEARCH_LON,
};

/// CLI arguments for the `search` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "search",
    allow_negative_numbers = true,
    long_about = "List active restrooms within a radius of a point, nearest \
                 first, optionally filtered by rating and amenities.",
    about = "Search around a point"
)]
#[ortho_config(prefix = "WAYSTATION")]
pub(crate) struct SearchArgs {
    /// Latitude of the search centre in degrees.
    #[arg(long = ARG_LAT, value_name = "degrees")]
    #[serde(default)]
    pub(crate) lat: Option<f64>,
    /// Longitude of the search centre in degrees.
    #[arg(long = ARG_LON, value_name = "degrees")]
    #[serde(default)]
    pub(crate) lon: Option<f64>,
    /// Search radius in metres (100 to 50000).
    #[arg(long = ARG_RADIUS, value_name = "metres")]
    #[serde(default)]
    pub(crate) radius: Option<f64>,
    /// Minimum overall rating (1 to 5).
    #[arg(long = ARG_MIN_RATING, value_name = "score")]
    #[serde(default)]
    pub(crate) min_rating: Option<f64>,
    /// Only restrooms with full or partial wheelchair access.
    #[arg(long)]
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) wheelchair: bool,
    /// Only gender-neutral restrooms.
    #[arg(long)]
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) gender_neutral: bool,
    /// Only restrooms with baby-changing facilities.
    #[arg(long)]
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) baby_changing: bool,
    /// Exclude restrooms that charge a fee.
    #[arg(long)]
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) free_only: bool,
    /// Page size (1 to 200).
    #[arg(long = ARG_LIMIT, value_name = "count")]
    #[serde(default)]
    pub(crate) limit: Option<usize>,
    /// Number of results to skip.
    #[arg(long = ARG_OFFSET, value_name = "count")]
    #[serde(default)]
    pub(crate) offset: Option<usize>,
    /// SQLite database to read from.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
    /// Lifetime of cached first pages, in seconds.
    #[arg(long = ARG_CACHE_TTL_SECS, value_name = "secs")]
    #[serde(default)]
    pub(crate) cache_ttl_secs: Option<u64>,
}

impl SearchArgs {
    pub(crate) fn into_config(self) -> Result<SearchConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        SearchConfig::try_from(merged)
    }
}

/// Resolved `search` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SearchConfig {
    pub(crate) query: RadiusQuery,
    pub(crate) database: Utf8PathBuf,
    pub(crate) cache_ttl: Duration,
}

impl TryFrom<SearchArgs> for SearchConfig {
    type Error = CliError;

    fn try_from(args: SearchArgs) -> Result<Self, Self::Error> {
        let lat = args.lat.ok_or(CliError::MissingArgument {
            field: ARG_LAT,
            env: ENV_SEARCH_LAT,
        })?;
        let lon = args.lon.ok_or(CliError::MissingArgument {
            field: ARG_LON,
            env: ENV_SEARCH_LON,
        })?;
        let mut query = RadiusQuery::new(
            GeoPoint::new(lat, lon)?,
            args.radius.unwrap_or(DEFAULT_RADIUS_METERS),
            args.limit.unwrap_or(DEFAULT_RADIUS_LIMIT),
            args.offset.unwrap_or_default(),
        )?;
        if let Some(min_rating) = args.min_rating {
            query = query.with_min_rating(min_rating)?;
        }
        if args.wheelchair {
            query = query.with_wheelchair(true);
        }
        if args.gender_neutral {
            query = query.with_gender_neutral(true);
        }
        if args.baby_changing {
            query = query.with_baby_changing(true);
        }
        if args.free_only {
            query = query.free_only();
        }
        Ok(Self {
            query,
            database: args
                .database
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATABASE)),
            cache_ttl: args.cache_ttl_secs.map_or(SEARCH_TTL, Duration::from_secs),
        })
    }
}

pub(crate) fn run_search(args: SearchArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_search_with(args, &mut stdout)
}

pub(crate) fn run_search_with(args: SearchArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let hits = execute_search(args)?;
    write_json(writer, &hits)
}

fn execute_search(args: SearchArgs) -> Result<Vec<SearchHit>, CliError> {
    let config = args.into_config()?;
    let store = open_existing(&config.database)?;
    let cache = ResultCache::new(open_cache(&config.database)).with_ttl(config.cache_ttl);
    let hits = RadiusSearch::new(store, cache).search(&config.query)?;
    info!("search returned {} restrooms", hits.len());
    Ok(hits)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<SearchConfig, CliError> {
    let merged = SearchArgs::merge_from_layers(layers).map_err(CliError::from)?;
    SearchConfig::try_from(merged)
}
