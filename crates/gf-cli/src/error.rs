//! Conditions that stop a run before any event is written.

use std::path::PathBuf;

use gf_core::TimeRange;
use thiserror::Error;

/// Refusals raised while preparing a run.
#[derive(Debug, Error)]
pub enum PreflightError {
    #[error("database file not found: {}", .0.display())]
    MissingDatabase(PathBuf),

    #[error("window and afk bucket must differ, both are {0}")]
    SameBucket(i64),

    #[error("{process} is running (pid {pids}); stop it or pass --force")]
    ConflictingWriter { process: String, pids: String },

    #[error("no events in bucket {bucket_id} for {range}")]
    EmptyResultSet { bucket_id: i64, range: TimeRange },
}
