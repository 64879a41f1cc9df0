//! `geocode` command: resolve a point through Nominatim.

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::time::Duration;
use waystation_core::{Address, CachedGeocoder, GeoPoint, ReverseGeocoder};
use waystation_data::geocoding::DEFAULT_BASE_URL;
use waystation_data::{HttpReverseGeocoder, HttpReverseGeocoderConfig};

use crate::database::open_cache;
use crate::output::write_json;
use crate::{
    ARG_DATABASE, ARG_LAT, ARG_LON, ARG_NOMINATIM_BASE_URL, ARG_TIMEOUT_SECS, CliError,
    DEFAULT_DATABASE, ENV_GEOCODE_LAT, ENV_GEOCODE_LON,
};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// CLI arguments for the `geocode` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "geocode",
    allow_negative_numbers = true,
    long_about = "Look up the postal address nearest to a point using a \
                 Nominatim reverse-geocoding service. Results are cached in \
                 the database for a day.",
    about = "Reverse-geocode a point"
)]
#[ortho_config(prefix = "WAYSTATION")]
pub(crate) struct GeocodeArgs {
    /// Latitude in degrees.
    #[arg(long = ARG_LAT, value_name = "degrees")]
    #[serde(default)]
    pub(crate) lat: Option<f64>,
    /// Longitude in degrees.
    #[arg(long = ARG_LON, value_name = "degrees")]
    #[serde(default)]
    pub(crate) lon: Option<f64>,
    /// Base URL of the Nominatim service (e.g. "http://localhost:8080").
    #[arg(long = ARG_NOMINATIM_BASE_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) nominatim_base_url: Option<String>,
    /// Request timeout in seconds.
    #[arg(long = ARG_TIMEOUT_SECS, value_name = "secs")]
    #[serde(default)]
    pub(crate) timeout_secs: Option<u64>,
    /// SQLite database holding the lookup cache.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

impl GeocodeArgs {
    pub(crate) fn into_config(self) -> Result<GeocodeConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        GeocodeConfig::try_from(merged)
    }
}

/// Resolved `geocode` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GeocodeConfig {
    pub(crate) point: GeoPoint,
    pub(crate) nominatim_base_url: String,
    pub(crate) timeout: Duration,
    pub(crate) database: Utf8PathBuf,
}

impl TryFrom<GeocodeArgs> for GeocodeConfig {
    type Error = CliError;

    fn try_from(args: GeocodeArgs) -> Result<Self, Self::Error> {
        let lat = args.lat.ok_or(CliError::MissingArgument {
            field: ARG_LAT,
            env: ENV_GEOCODE_LAT,
        })?;
        let lon = args.lon.ok_or(CliError::MissingArgument {
            field: ARG_LON,
            env: ENV_GEOCODE_LON,
        })?;
        Ok(Self {
            point: GeoPoint::new(lat, lon)?,
            nominatim_base_url: args
                .nominatim_base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
            timeout: Duration::from_secs(args.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            database: args
                .database
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATABASE)),
        })
    }
}

/// Builds a geocoder for the current invocation.
pub(crate) trait GeocoderBuilder {
    fn build(&self, config: &GeocodeConfig) -> Result<Box<dyn ReverseGeocoder>, CliError>;
}

pub(crate) struct DefaultGeocoderBuilder;

impl GeocoderBuilder for DefaultGeocoderBuilder {
    fn build(&self, config: &GeocodeConfig) -> Result<Box<dyn ReverseGeocoder>, CliError> {
        let http_config = HttpReverseGeocoderConfig::new(config.nominatim_base_url.clone())
            .with_timeout(config.timeout);
        let geocoder = HttpReverseGeocoder::with_config(http_config).map_err(|source| {
            CliError::BuildGeocoder {
                base_url: config.nominatim_base_url.clone(),
                source,
            }
        })?;
        Ok(Box::new(geocoder))
    }
}

pub(crate) fn run_geocode(args: GeocodeArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_geocode_with(args, &DefaultGeocoderBuilder, &mut stdout)
}

pub(crate) fn run_geocode_with(
    args: GeocodeArgs,
    builder: &dyn GeocoderBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let address = execute_geocode(args, builder)?;
    write_json(writer, &address)
}

fn execute_geocode(args: GeocodeArgs, builder: &dyn GeocoderBuilder) -> Result<Address, CliError> {
    let config = args.into_config()?;
    let geocoder = CachedGeocoder::new(builder.build(&config)?, open_cache(&config.database));
    Ok(geocoder.reverse_geocode(config.point)?)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<GeocodeConfig, CliError> {
    let merged = GeocodeArgs::merge_from_layers(layers).map_err(CliError::from)?;
    GeocodeConfig::try_from(merged)
}
