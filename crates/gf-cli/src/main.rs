use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use gf_cli::commands::{fill, validate};
use gf_cli::{Cli, Config, PreflightError, Settings, report, safety};
use gf_core::BucketError;
use tracing_subscriber::EnvFilter;

fn run(cli: &Cli) -> Result<()> {
    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let settings = Settings::resolve(cli, &config)?;

    if !settings.database.is_file() {
        return Err(PreflightError::MissingDatabase(settings.database.clone()).into());
    }
    if !settings.validate_only && !settings.force {
        safety::check_writers(&settings.writer_processes)?;
    }

    let mut db = gf_db::Database::open(&settings.database)
        .with_context(|| format!("failed to open {}", settings.database.display()))?;

    let mut out = io::stdout().lock();
    if settings.validate_only {
        validate::run(&mut out, &db, &settings)?;
    } else {
        fill::run(&mut out, &mut db, &settings, |plan| {
            safety::confirm(&mut io::stdin().lock(), &mut io::stderr(), plan)
        })?;
    }
    Ok(())
}

fn main() -> ExitCode {
    // Argument errors exit 1 like every other failure; help and version exit 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    // Logs go to stderr so stdout carries only the report
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            if let Some(bucket_err) = err.downcast_ref::<BucketError>() {
                let candidates = bucket_err.candidates();
                if !candidates.is_empty() {
                    eprint!("{}", report::format_candidates(candidates));
                }
            }
            ExitCode::FAILURE
        }
    }
}
