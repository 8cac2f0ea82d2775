//! Bucket resolution.
//!
//! A watcher can leave several buckets behind (one per hostname, or stale ones
//! after a rename). Resolution picks exactly one, or explains why it can't.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Client name written by the window watcher.
pub const WINDOW_CLIENT: &str = "aw-watcher-window";

/// Client name written by the afk watcher.
pub const AFK_CLIENT: &str = "aw-watcher-afk";

/// A named partition of events from one watcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub id: i64,
    pub name: String,
    pub client: String,
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.name)
    }
}

/// Reasons a bucket could not be resolved.
///
/// None of these are retried; the operator has to re-run with an explicit id.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BucketError {
    #[error("no bucket found for {client}")]
    NoBucketFound { client: String },

    #[error("{} buckets found for {client}; pass an explicit bucket id", candidates.len())]
    AmbiguousBucket {
        client: String,
        candidates: Vec<Bucket>,
    },

    #[error("bucket {hint} does not belong to {client}")]
    UnknownBucketHint {
        client: String,
        hint: i64,
        candidates: Vec<Bucket>,
    },
}

impl BucketError {
    /// Buckets the operator can choose from, if any.
    pub fn candidates(&self) -> &[Bucket] {
        match self {
            Self::NoBucketFound { .. } => &[],
            Self::AmbiguousBucket { candidates, .. }
            | Self::UnknownBucketHint { candidates, .. } => candidates,
        }
    }
}

/// Picks the bucket for `client` out of `candidates`.
///
/// A hint that names one of the candidates always wins. Without a usable hint
/// a single candidate is returned and several candidates are ambiguous.
pub fn resolve_bucket(
    client: &str,
    candidates: &[Bucket],
    hint: Option<i64>,
) -> Result<i64, BucketError> {
    if let Some(hint) = hint {
        if candidates.iter().any(|b| b.id == hint) {
            return Ok(hint);
        }
    }

    match (candidates, hint) {
        ([], _) => Err(BucketError::NoBucketFound {
            client: client.to_string(),
        }),
        ([only], None) => Ok(only.id),
        ([_], Some(hint)) => Err(BucketError::UnknownBucketHint {
            client: client.to_string(),
            hint,
            candidates: candidates.to_vec(),
        }),
        _ => Err(BucketError::AmbiguousBucket {
            client: client.to_string(),
            candidates: candidates.to_vec(),
        }),
    }
}
