//! Run settings resolved from command-line flags and configuration.

use std::path::PathBuf;

use gf_core::{GapTarget, TimeRange};

use crate::cli::Cli;
use crate::config::Config;
use crate::error::PreflightError;

/// Everything a run needs to know before touching the database.
#[derive(Debug, Clone)]
pub struct Settings {
    pub database: PathBuf,
    pub window_client: String,
    pub afk_client: String,
    pub window_hint: Option<i64>,
    pub afk_hint: Option<i64>,
    pub range: TimeRange,
    pub gap: GapTarget,
    pub force: bool,
    pub validate_only: bool,
    pub json: bool,
    pub writer_processes: Vec<String>,
}

impl Settings {
    /// Merges flags over configuration and checks the argument-level invariants.
    pub fn resolve(cli: &Cli, config: &Config) -> anyhow::Result<Self> {
        let range = TimeRange::new(cli.start, cli.end)?;
        let gap = GapTarget::from_millis(cli.gap.unwrap_or(config.gap_ms))?;

        if let (Some(window), Some(afk)) = (cli.window_bucket, cli.afk_bucket) {
            if window == afk {
                return Err(PreflightError::SameBucket(window).into());
            }
        }

        Ok(Self {
            database: cli.database.clone(),
            window_client: config.window_client.clone(),
            afk_client: config.afk_client.clone(),
            window_hint: cli.window_bucket,
            afk_hint: cli.afk_bucket,
            range,
            gap,
            force: cli.force,
            validate_only: cli.validate,
            json: cli.json,
            writer_processes: config.writer_processes.clone(),
        })
    }

    /// Settings for `database` with every option at its default.
    #[cfg(test)]
    pub(crate) fn for_database(database: impl Into<PathBuf>) -> Self {
        let config = Config::default();
        Self {
            database: database.into(),
            window_client: config.window_client,
            afk_client: config.afk_client,
            window_hint: None,
            afk_hint: None,
            range: TimeRange::unbounded(),
            gap: GapTarget::default(),
            force: false,
            validate_only: false,
            json: false,
            writer_processes: config.writer_processes,
        }
    }
}
