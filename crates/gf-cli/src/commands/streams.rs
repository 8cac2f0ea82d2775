//! Bucket resolution and event loading shared by both modes.

use anyhow::{Context, Result};
use gf_core::{Bucket, Event, TimeRange, resolve_bucket};
use gf_db::Database;

use crate::error::PreflightError;
use crate::settings::Settings;

/// The two event streams a run works on.
#[derive(Debug, Clone)]
pub struct Streams {
    pub window_bucket: Bucket,
    pub afk_bucket: Bucket,
    pub window: Vec<Event>,
    pub afk: Vec<Event>,
}

impl Streams {
    /// Resolves both buckets and loads their events within the run's range.
    ///
    /// Fails if the buckets coincide or either stream is empty.
    pub fn load(db: &Database, settings: &Settings) -> Result<Self> {
        let window_bucket = find_bucket(db, &settings.window_client, settings.window_hint)?;
        let afk_bucket = find_bucket(db, &settings.afk_client, settings.afk_hint)?;
        if window_bucket.id == afk_bucket.id {
            return Err(PreflightError::SameBucket(window_bucket.id).into());
        }
        tracing::info!(window = %window_bucket, afk = %afk_bucket, "resolved buckets");

        let streams = Self {
            window: load_nonempty(db, window_bucket.id, &settings.range)?,
            afk: load_nonempty(db, afk_bucket.id, &settings.range)?,
            window_bucket,
            afk_bucket,
        };
        tracing::info!(
            window = streams.window.len(),
            afk = streams.afk.len(),
            range = %settings.range,
            "loaded events"
        );
        Ok(streams)
    }

    /// Reads the same buckets again, e.g. to check what a fill wrote.
    pub fn reload(&self, db: &Database, range: &TimeRange) -> Result<Self> {
        Ok(Self {
            window_bucket: self.window_bucket.clone(),
            afk_bucket: self.afk_bucket.clone(),
            window: db.load_events(self.window_bucket.id, range)?,
            afk: db.load_events(self.afk_bucket.id, range)?,
        })
    }
}

fn find_bucket(db: &Database, client: &str, hint: Option<i64>) -> Result<Bucket> {
    let candidates = db
        .buckets_for_client(client)
        .with_context(|| format!("failed to list {client} buckets"))?;
    let id = resolve_bucket(client, &candidates, hint)?;
    candidates
        .into_iter()
        .find(|bucket| bucket.id == id)
        .with_context(|| format!("bucket {id} missing from {client} candidates"))
}

fn load_nonempty(db: &Database, bucket_id: i64, range: &TimeRange) -> Result<Vec<Event>> {
    let events = db
        .load_events(bucket_id, range)
        .with_context(|| format!("failed to load events of bucket {bucket_id}"))?;
    if events.is_empty() {
        return Err(PreflightError::EmptyResultSet {
            bucket_id,
            range: *range,
        }
        .into());
    }
    Ok(events)
}
