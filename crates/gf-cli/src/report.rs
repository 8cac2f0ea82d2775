//! Human-readable and JSON rendering of run results.

use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, SecondsFormat};
use gf_core::{Bucket, FillStats, ValidationReport};
use serde::Serialize;

use crate::commands::streams::Streams;
use crate::settings::Settings;

/// Formats nanoseconds as `Hh MMm SS.mmms`, dropping leading zero units.
pub fn format_duration(ns: i64) -> String {
    let sign = if ns < 0 { "-" } else { "" };
    let total_ms = ns.unsigned_abs() / 1_000_000;
    let hours = total_ms / 3_600_000;
    let minutes = total_ms / 60_000 % 60;
    let seconds = total_ms / 1_000 % 60;
    let millis = total_ms % 1_000;

    if hours >= 1 {
        format!("{sign}{hours}h {minutes:02}m {seconds:02}.{millis:03}s")
    } else if minutes >= 1 {
        format!("{sign}{minutes}m {seconds:02}.{millis:03}s")
    } else {
        format!("{sign}{seconds}.{millis:03}s")
    }
}

/// Formats a nanosecond timestamp as RFC 3339 UTC with milliseconds.
pub fn format_timestamp(ns: i64) -> String {
    DateTime::from_timestamp_nanos(ns).to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn format_bound(bound: Option<i64>, open: &str) -> String {
    bound.map_or_else(|| open.to_string(), |ns| format!("{ns} ({})", format_timestamp(ns)))
}

fn format_bucket(bucket: &Bucket) -> String {
    format!("{bucket} [{}]", bucket.client)
}

/// Lists the buckets an operator can pass with `-w` or `-a`.
pub fn format_candidates(candidates: &[Bucket]) -> String {
    let lines: String = candidates
        .iter()
        .map(|bucket| format!("  {}\n", format_bucket(bucket)))
        .collect();
    format!("Available buckets:\n{lines}")
}

/// Describes what a fill run is about to do.
pub fn format_plan(settings: &Settings, streams: &Streams) -> String {
    format!(
        "Database:      {}\n\
         Window bucket: {} ({} events)\n\
         Afk bucket:    {} ({} events)\n\
         Start:         {}\n\
         End:           {}\n\
         Gap:           {}\n",
        settings.database.display(),
        format_bucket(&streams.window_bucket),
        streams.window.len(),
        format_bucket(&streams.afk_bucket),
        streams.afk.len(),
        format_bound(settings.range.start, "(first event)"),
        format_bound(settings.range.end, "(last event)"),
        settings.gap,
    )
}

/// Writes the fill statistics.
pub fn write_fill_stats<W: Write>(writer: &mut W, stats: &FillStats) -> Result<()> {
    writeln!(
        writer,
        "Adjusted {} of {} window events across {} afk intervals ({} writes)",
        stats.events_adjusted, stats.window_events, stats.afk_events, stats.writes
    )?;
    writeln!(writer, "Covered before: {}", format_duration(stats.covered_before_ns))?;
    writeln!(writer, "Covered after:  {}", format_duration(stats.covered_after_ns))?;

    let delta = stats.covered_delta_ns();
    let sign = if delta > 0 { "+" } else { "" };
    writeln!(writer, "Difference:     {sign}{}", format_duration(delta))?;
    Ok(())
}

/// Writes one line per anomaly followed by the `Finished` marker.
pub fn write_validation<W: Write>(writer: &mut W, report: &ValidationReport) -> Result<()> {
    for anomaly in report.iter() {
        writeln!(writer, "{anomaly}")?;
    }
    writeln!(
        writer,
        "Finished: {} anomalies ({} overlaps, {} gaps)",
        report.len(),
        report.overlaps.len(),
        report.gaps.len()
    )?;
    Ok(())
}

/// Machine-readable result of a run.
#[derive(Debug, Serialize)]
pub struct JsonReport<'a> {
    pub window_bucket: i64,
    pub afk_bucket: i64,
    pub gap_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<&'a FillStats>,
    pub validation: &'a ValidationReport,
}

impl JsonReport<'_> {
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        serde_json::to_writer_pretty(&mut *writer, self)?;
        writeln!(writer)?;
        Ok(())
    }
}
