//! Fill mode: rewrite window boundaries, then validate the result.

use std::io::Write;

use anyhow::{Context, Result};
use gf_core::{FillOptions, FillStats, ValidationReport, fill_gaps, validate};
use gf_db::Database;

use crate::commands::streams::Streams;
use crate::report::{self, JsonReport};
use crate::settings::Settings;

/// How a fill run ended.
#[derive(Debug)]
pub enum Outcome {
    /// The operator did not confirm; nothing was written.
    Declined,
    Filled {
        stats: FillStats,
        validation: ValidationReport,
    },
}

/// Runs the fill engine against `db`.
///
/// `confirm` receives the plan summary and decides whether to go ahead. It is
/// not called when `settings.force` is set.
pub fn run<W, F>(writer: &mut W, db: &mut Database, settings: &Settings, confirm: F) -> Result<Outcome>
where
    W: Write,
    F: FnOnce(&str) -> Result<bool>,
{
    let mut streams = Streams::load(db, settings)?;

    if !settings.force && !confirm(&report::format_plan(settings, &streams))? {
        writeln!(writer, "Aborted, no changes made.")?;
        return Ok(Outcome::Declined);
    }

    let options = FillOptions::new(settings.gap, &settings.range);
    let stats = match fill_gaps(&streams.afk, &mut streams.window, options, db) {
        Ok(stats) => stats,
        Err(err) => {
            writeln!(writer, "Fill aborted; writes below were kept.")?;
            report::write_fill_stats(writer, &err.stats)?;
            return Err(err).context("fill failed");
        }
    };
    tracing::info!(
        adjusted = stats.events_adjusted,
        writes = stats.writes,
        "fill finished"
    );

    let written = streams
        .reload(db, &settings.range)
        .context("failed to reload events after fill")?;
    let validation = validate(&written.afk, &written.window, settings.gap.as_nanos());

    if settings.json {
        JsonReport {
            window_bucket: streams.window_bucket.id,
            afk_bucket: streams.afk_bucket.id,
            gap_ms: settings.gap.as_millis(),
            fill: Some(&stats),
            validation: &validation,
        }
        .write(writer)?;
    } else {
        report::write_fill_stats(writer, &stats)?;
        report::write_validation(writer, &validation)?;
    }

    Ok(Outcome::Filled { stats, validation })
}

#[cfg(test)]
mod tests {
    use gf_core::{AFK_CLIENT, GapTarget, TimeRange, WINDOW_CLIENT};

    use super::*;

    struct Fixture {
        db: Database,
        window: i64,
        afk: i64,
    }

    fn fixture() -> Fixture {
        let db = Database::open_in_memory().unwrap();
        let window = db.insert_bucket("aw-watcher-window_host", WINDOW_CLIENT).unwrap();
        let afk = db.insert_bucket("aw-watcher-afk_host", AFK_CLIENT).unwrap();
        Fixture { db, window, afk }
    }

    fn forced() -> Settings {
        let mut settings = Settings::for_database("aw.db");
        settings.force = true;
        settings
    }

    fn bounds(db: &Database, bucket: i64) -> Vec<(i64, i64)> {
        db.load_events(bucket, &TimeRange::unbounded())
            .unwrap()
            .iter()
            .map(|e| (e.start, e.end))
            .collect()
    }

    #[test]
    fn bounded_run_snaps_to_afk_start() {
        let mut fx = fixture();
        fx.db.insert_event(fx.window, 0, 1_000).unwrap();
        fx.db.insert_event(fx.window, 1_200, 6_000).unwrap();
        fx.db.insert_event(fx.afk, 1_000, 5_000).unwrap();

        let mut settings = forced();
        settings.range = TimeRange::new(Some(0), None).unwrap();
        let mut out = Vec::new();
        let outcome = run(&mut out, &mut fx.db, &settings, |_| unreachable!()).unwrap();

        assert_eq!(bounds(&fx.db, fx.window), [(0, 1_000), (1_000, 6_000)]);
        let Outcome::Filled { stats, validation } = outcome else {
            panic!("expected a fill");
        };
        assert_eq!(stats.events_adjusted, 1);
        assert_eq!(stats.covered_delta_ns(), 200);
        assert!(validation.is_empty());
    }

    #[test]
    fn half_second_gap_is_left_between_events() {
        let mut fx = fixture();
        let gap = 500_000_000;
        fx.db.insert_event(fx.afk, 0, 10 * gap).unwrap();
        fx.db.insert_event(fx.window, gap, 2 * gap).unwrap();
        fx.db.insert_event(fx.window, 3 * gap + 200_000_000, 4 * gap).unwrap();

        let mut settings = forced();
        settings.gap = GapTarget::from_millis(500).unwrap();
        let mut out = Vec::new();
        run(&mut out, &mut fx.db, &settings, |_| unreachable!()).unwrap();

        let events = bounds(&fx.db, fx.window);
        assert_eq!(events[1].0 - events[0].1, gap);
        let output = String::from_utf8(out).unwrap();
        assert!(output.contains("Finished: 0 anomalies"), "{output}");
    }

    #[test]
    fn declining_writes_nothing() {
        let mut fx = fixture();
        fx.db.insert_event(fx.window, 0, 1_000).unwrap();
        fx.db.insert_event(fx.window, 1_200, 6_000).unwrap();
        fx.db.insert_event(fx.afk, 1_000, 5_000).unwrap();

        let mut settings = forced();
        settings.force = false;
        let mut seen = String::new();
        let mut out = Vec::new();
        let outcome = run(&mut out, &mut fx.db, &settings, |plan| {
            seen = plan.to_string();
            Ok(false)
        })
        .unwrap();

        assert!(matches!(outcome, Outcome::Declined));
        assert!(seen.contains("Window bucket: 1 (aw-watcher-window_host)"), "{seen}");
        assert!(seen.contains("(2 events)"), "{seen}");
        assert_eq!(bounds(&fx.db, fx.window), [(0, 1_000), (1_200, 6_000)]);
        assert_eq!(String::from_utf8(out).unwrap(), "Aborted, no changes made.\n");
    }

    #[test]
    fn second_run_adjusts_nothing() {
        let mut fx = fixture();
        fx.db.insert_event(fx.afk, 0, 10_000).unwrap();
        fx.db.insert_event(fx.window, 100, 2_000).unwrap();
        fx.db.insert_event(fx.window, 2_500, 4_000).unwrap();
        fx.db.insert_event(fx.window, 4_100, 9_000).unwrap();

        let settings = forced();
        run(&mut Vec::new(), &mut fx.db, &settings, |_| unreachable!()).unwrap();
        let first = bounds(&fx.db, fx.window);
        let outcome = run(&mut Vec::new(), &mut fx.db, &settings, |_| unreachable!()).unwrap();

        assert_eq!(bounds(&fx.db, fx.window), first);
        assert!(matches!(outcome, Outcome::Filled { stats, .. } if stats.writes == 0));
    }

    #[test]
    fn json_output_carries_stats_and_validation() {
        let mut fx = fixture();
        fx.db.insert_event(fx.afk, 0, 10_000).unwrap();
        fx.db.insert_event(fx.window, 100, 2_000).unwrap();
        fx.db.insert_event(fx.window, 2_500, 4_000).unwrap();

        let mut settings = forced();
        settings.json = true;
        let mut out = Vec::new();
        run(&mut out, &mut fx.db, &settings, |_| unreachable!()).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["window_bucket"], fx.window);
        assert_eq!(value["fill"]["window_events"], 2);
        assert!(value["fill"]["writes"].as_u64().unwrap() > 0);
        assert_eq!(value["validation"]["gaps"], serde_json::json!([]));
    }
}
