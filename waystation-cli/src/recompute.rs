//! `recompute` command: rebuild one restroom's rating aggregates.

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use std::io::Write;
use waystation_core::{RatingAggregates, RatingAggregator, RecomputeOutcome, RestroomId};

use crate::database::open_existing;
use crate::output::write_json;
use crate::{ARG_DATABASE, ARG_RESTROOM_ID, CliError, DEFAULT_DATABASE, ENV_RECOMPUTE_RESTROOM_ID};

/// CLI arguments for the `recompute` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "recompute",
    long_about = "Recalculate the per-dimension averages and review count \
                 of a restroom from its current reviews and store them.",
    about = "Rebuild rating aggregates"
)]
#[ortho_config(prefix = "WAYSTATION")]
pub(crate) struct RecomputeArgs {
    /// Identifier of the restroom to refresh.
    #[arg(value_name = "id")]
    #[serde(default)]
    pub(crate) restroom_id: Option<u64>,
    /// SQLite database to update.
    #[arg(long = ARG_DATABASE, value_name = "path")]
    #[serde(default)]
    pub(crate) database: Option<Utf8PathBuf>,
}

impl RecomputeArgs {
    pub(crate) fn into_config(self) -> Result<RecomputeConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        RecomputeConfig::try_from(merged)
    }
}

/// Resolved `recompute` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecomputeConfig {
    pub(crate) restroom_id: RestroomId,
    pub(crate) database: Utf8PathBuf,
}

impl TryFrom<RecomputeArgs> for RecomputeConfig {
    type Error = CliError;

    fn try_from(args: RecomputeArgs) -> Result<Self, Self::Error> {
        let id = args.restroom_id.ok_or(CliError::MissingArgument {
            field: ARG_RESTROOM_ID,
            env: ENV_RECOMPUTE_RESTROOM_ID,
        })?;
        Ok(Self {
            restroom_id: RestroomId(id),
            database: args
                .database
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_DATABASE)),
        })
    }
}

/// What the command prints.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub(crate) struct RecomputeReport {
    pub(crate) restroom_id: RestroomId,
    pub(crate) outcome: OutcomeKind,
    /// Present only when new aggregates were written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) aggregates: Option<RatingAggregates>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum OutcomeKind {
    Updated,
    NoReviews,
    MissingRestroom,
}

impl RecomputeReport {
    const fn new(restroom_id: RestroomId, outcome: RecomputeOutcome) -> Self {
        let (outcome, aggregates) = match outcome {
            RecomputeOutcome::Updated(aggregates) => (OutcomeKind::Updated, Some(aggregates)),
            RecomputeOutcome::NoReviews => (OutcomeKind::NoReviews, None),
            RecomputeOutcome::MissingRestroom => (OutcomeKind::MissingRestroom, None),
        };
        Self {
            restroom_id,
            outcome,
            aggregates,
        }
    }
}

pub(crate) fn run_recompute(args: RecomputeArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_recompute_with(args, &mut stdout)
}

pub(crate) fn run_recompute_with(
    args: RecomputeArgs,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let report = execute_recompute(args)?;
    write_json(writer, &report)
}

fn execute_recompute(args: RecomputeArgs) -> Result<RecomputeReport, CliError> {
    let config = args.into_config()?;
    let store = open_existing(&config.database)?;
    let id = config.restroom_id;
    let outcome = RatingAggregator::new(store)
        .recompute_aggregates(id)
        .map_err(|source| CliError::Recompute { id, source })?;
    Ok(RecomputeReport::new(id, outcome))
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<RecomputeConfig, CliError> {
    let merged = RecomputeArgs::merge_from_layers(layers).map_err(CliError::from)?;
    RecomputeConfig::try_from(merged)
}
