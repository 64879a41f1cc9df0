//! `route` command: restrooms within a detour budget of a trip.

use camino::Utf8PathBuf;
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use std::io::Write;
use waystation_core::{
    DEFAULT_DETOUR_MINUTES, DEFAULT_ROUTE_LIMIT, GeoPoint, RouteHit, RouteQuery, RouteSearch,
};

use crate::database::open_existing;
use crate::output::write_json;
use crate::{
    ARG_DATABASE, ARG_DEST_LAT, ARG_DEST_LON, ARG_LIMIT, ARG_MAX_DETOUR_MINUTES, ARG_MIN_RATING,
    ARG_ORIGIN_LAT, ARG_ORIGIN_LON, CliError, DEFAULT_DATABASE, ENV_ROUTE_DEST_LAT,
    ENV_ROUTE_DEST_LON, ENV_ROUTE_ORIGIN_LAT, ENV_ROUTE_ORIGIN_LON,
};

/// CLI arguments for the `route` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "route",
    allow_negative_numbers = true,
    long_about = "List active restrooms inside the corridor between an origin \
                 and a destination whose estimated detour fits the budget, \
                 shortest detour first.",
    about = "Search along a trip"
)]
#[ortho_config(prefix = "WAYSTATION")]
pub(crate) struct RouteArgs {
    /// Latitude of the trip origin.
    #[arg(long = ARG_ORIGIN_LAT, value_name = "degrees")]
    #[serde(default)]
    pub(crate) origin_lat: Option<f64>,
    /// Longitude of the trip origin.
    #[arg(long = ARG_ORIGIN_LON, value_name = "degrees")]
    #[serde(default)]
    pub(crate) origin_lon: Option<f64>,
    /// Latitude of the trip destination.
    #[arg(long = ARG_DEST_LAT, value_name = "degrees")]
    #[serde(default)]
    pub(crate) dest_lat: Option<f64>,
    /// Longitude of the trip destination.
    #[arg(long = ARG_DEST_LON, value_name = "degrees")]
    #[serde(default)]
    pub(crate) dest_lon: Option<f64>,
    /// Largest acceptable detour in minutes (1 to 30).
    #[arg(long = ARG_MAX_DETOUR_MINUTES, value_name = "minutes")]
    #[serde(default)]
    pub(crate) max_detour_minutes: Option<u32>,
    /// Minimum overall rating (1 to 5).
    #[arg(long = ARG_MIN_RATING, value_name = "score")]
    #[serde(default)]
    pub(crate) min_rating: Option<f64>,
    /// Only restrooms with full or partial wheelchair access.
    #[arg(long)]
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) wheelchair: bool,
    /// Result cap (1 to 50).
    #[arg(long = ARG_LIMIT, value_name = "count")]
    #[serde(default)]
    pub(crate) limit: Option<usize>,
    /// SQLite database to read from.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

impl RouteArgs {
    pub(crate) fn into_config(self) -> Result<RouteConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        RouteConfig::try_from(merged)
    }
}

/// Resolved `route` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RouteConfig {
    pub(crate) query: RouteQuery,
    pub(crate) database: Utf8PathBuf,
}

fn required(value: Option<f64>, field: &'static str, env: &'static str) -> Result<f64, CliError> {
    value.ok_or(CliError::MissingArgument { field, env })
}

impl TryFrom<RouteArgs> for RouteConfig {
    type Error = CliError;

    fn try_from(args: RouteArgs) -> Result<Self, Self::Error> {
        let origin = GeoPoint::new(
            required(args.origin_lat, ARG_ORIGIN_LAT, ENV_ROUTE_ORIGIN_LAT)?,
            required(args.origin_lon, ARG_ORIGIN_LON, ENV_ROUTE_ORIGIN_LON)?,
        )?;
        let destination = GeoPoint::new(
            required(args.dest_lat, ARG_DEST_LAT, ENV_ROUTE_DEST_LAT)?,
            required(args.dest_lon, ARG_DEST_LON, ENV_ROUTE_DEST_LON)?,
        )?;
        let mut query = RouteQuery::new(
            origin,
            destination,
            args.max_detour_minutes.unwrap_or(DEFAULT_DETOUR_MINUTES),
            args.limit.unwrap_or(DEFAULT_ROUTE_LIMIT),
        )?;
        if let Some(min_rating) = args.min_rating {
            query = query.with_min_rating(min_rating)?;
        }
        if args.wheelchair {
            query = query.requiring_wheelchair_access();
        }
        Ok(Self {
            query,
            database: args
                .database
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATABASE)),
        })
    }
}

pub(crate) fn run_route(args: RouteArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_route_with(args, &mut stdout)
}

pub(crate) fn run_route_with(args: RouteArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let hits = execute_route(args)?;
    write_json(writer, &hits)
}

fn execute_route(args: RouteArgs) -> Result<Vec<RouteHit>, CliError> {
    let config = args.into_config()?;
    let store = open_existing(&config.database)?;
    let hits = RouteSearch::new(store).search(&config.query)?;
    info!("route search returned {} restrooms", hits.len());
    Ok(hits)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<RouteConfig, CliError> {
    let merged = RouteArgs::merge_from_layers(layers).map_err(CliError::from)?;
    RouteConfig::try_from(merged)
}
