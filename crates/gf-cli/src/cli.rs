//! Command-line argument definitions.

use std::path::PathBuf;

use clap::Parser;

/// Close the gaps between window events in an ActivityWatch database.
///
/// Inside every afk interval, window event boundaries are moved so that
/// consecutive events sit exactly `--gap` milliseconds apart. Stop the
/// ActivityWatch server and back up the database before running.
#[derive(Debug, Parser)]
#[command(name = "gapfill", version, about, long_about)]
pub struct Cli {
    /// Path to the ActivityWatch SQLite database.
    pub database: PathBuf,

    /// Window bucket id, required when several window buckets exist.
    #[arg(short, long, value_name = "ID")]
    pub window_bucket: Option<i64>,

    /// Afk bucket id, required when several afk buckets exist.
    #[arg(short, long, value_name = "ID")]
    pub afk_bucket: Option<i64>,

    /// Only process events from this time on (19-digit nanoseconds since the epoch).
    #[arg(short, long, value_name = "NANOS", value_parser = parse_period_arg)]
    pub start: Option<i64>,

    /// Only process events up to this time (19-digit nanoseconds since the epoch).
    #[arg(short, long, value_name = "NANOS", value_parser = parse_period_arg)]
    pub end: Option<i64>,

    /// Target gap between consecutive window events, in milliseconds.
    #[arg(
        short,
        long,
        value_name = "MS",
        value_parser = clap::value_parser!(u64).range(0..=5000)
    )]
    pub gap: Option<u64>,

    /// Skip the running-server check and the confirmation prompt.
    #[arg(short, long)]
    pub force: bool,

    /// Only report overlaps and gaps; never write.
    #[arg(long)]
    pub validate: bool,

    /// Print the report as JSON.
    #[arg(long)]
    pub json: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

fn parse_period_arg(value: &str) -> Result<i64, String> {
    gf_core::parse_period(value).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("gapfill").chain(args.iter().copied()))
    }

    #[test]
    fn database_is_the_only_required_argument() {
        let cli = parse(&["aw.db"]).unwrap();
        assert_eq!(cli.database, PathBuf::from("aw.db"));
        assert_eq!(cli.window_bucket, None);
        assert_eq!(cli.gap, None);
        assert!(!cli.force);
        assert!(!cli.validate);
    }

    #[test]
    fn parses_all_flags() {
        let cli = parse(&[
            "-w",
            "3",
            "-a",
            "4",
            "-s",
            "1700000000000000000",
            "-e",
            "1700000100000000000",
            "-g",
            "500",
            "-f",
            "--validate",
            "-v",
            "aw.db",
        ])
        .unwrap();

        assert_eq!(cli.window_bucket, Some(3));
        assert_eq!(cli.afk_bucket, Some(4));
        assert_eq!(cli.start, Some(1_700_000_000_000_000_000));
        assert_eq!(cli.end, Some(1_700_000_100_000_000_000));
        assert_eq!(cli.gap, Some(500));
        assert!(cli.force);
        assert!(cli.validate);
        assert!(cli.verbose);
    }

    #[test]
    fn rejects_gap_above_limit() {
        assert!(parse(&["-g", "5001", "aw.db"]).is_err());
        assert!(parse(&["-g", "5000", "aw.db"]).is_ok());
    }

    #[test]
    fn rejects_short_period() {
        let err = parse(&["-s", "1700000000", "aw.db"]).unwrap_err();
        assert!(err.to_string().contains("1700000000"));
    }

    #[test]
    fn missing_database_is_an_error() {
        assert!(parse(&[]).is_err());
    }
}
