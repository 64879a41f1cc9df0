//! `import` command: load a JSON seed file into the SQLite store.

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use std::io::Write;
use waystation_data::{ImportSummary, SeedDocument, import_seed};

use crate::database::{open_or_create, require_existing};
use crate::output::write_json;
use crate::{ARG_DATABASE, ARG_IMPORT_SEED, CliError, DEFAULT_DATABASE, ENV_IMPORT_SEED};

/// CLI arguments for the `import` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "import",
    long_about = "Load restrooms and reviews from a JSON seed file into the \
                 SQLite database, creating it if needed, then rebuild the \
                 rating aggregates of every reviewed restroom.",
    about = "Import a seed file"
)]
#[ortho_config(prefix = "WAYSTATION")]
pub(crate) struct ImportArgs {
    /// Path to the JSON seed file.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) seed: Option<Utf8PathBuf>,
    /// SQLite database to write into.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

impl ImportArgs {
    pub(crate) fn into_config(self) -> Result<ImportConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ImportConfig::try_from(merged)
    }
}

/// Resolved `import` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImportConfig {
    pub(crate) seed: Utf8PathBuf,
    pub(crate) database: Utf8PathBuf,
}

impl TryFrom<ImportArgs> for ImportConfig {
    type Error = CliError;

    fn try_from(args: ImportArgs) -> Result<Self, Self::Error> {
        let seed = args.seed.ok_or(CliError::MissingArgument {
            field: ARG_IMPORT_SEED,
            env: ENV_IMPORT_SEED,
        })?;
        let database = args
            .database
            .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATABASE));
        Ok(Self { seed, database })
    }
}

pub(crate) fn run_import(args: ImportArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_import_with(args, &mut stdout)
}

pub(crate) fn run_import_with(args: ImportArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let summary = execute_import(args)?;
    write_json(writer, &summary)
}

fn execute_import(args: ImportArgs) -> Result<ImportSummary, CliError> {
    let config = args.into_config()?;
    require_existing(&config.seed, ARG_IMPORT_SEED)?;
    let seed = SeedDocument::read(&config.seed)?;
    let store = open_or_create(&config.database)?;
    Ok(import_seed(&store, seed)?)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<ImportConfig, CliError> {
    let merged = ImportArgs::merge_from_layers(layers).map_err(CliError::from)?;
    ImportConfig::try_from(merged)
}
