//! Validate-only mode: report overlaps and gaps without writing.

use std::io::Write;

use anyhow::Result;
use gf_core::{ValidationReport, validate};
use gf_db::Database;

use crate::commands::streams::Streams;
use crate::report::{self, JsonReport};
use crate::settings::Settings;

pub fn run<W: Write>(writer: &mut W, db: &Database, settings: &Settings) -> Result<ValidationReport> {
    let streams = Streams::load(db, settings)?;
    let report = validate(&streams.afk, &streams.window, settings.gap.as_nanos());

    if settings.json {
        JsonReport {
            window_bucket: streams.window_bucket.id,
            afk_bucket: streams.afk_bucket.id,
            gap_ms: settings.gap.as_millis(),
            fill: None,
            validation: &report,
        }
        .write(writer)?;
    } else {
        report::write_validation(writer, &report)?;
    }

    Ok(report)
}
