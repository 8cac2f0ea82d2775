//! Core domain logic for gapfill.
//!
//! This crate contains the pure parts of the tool:
//! - Interval model: window and afk events as `[start, end]` nanosecond ranges
//! - Bucket resolution: picking one bucket per watcher
//! - Gap filling: aligning window event boundaries to afk intervals
//! - Validation: reporting overlaps and residual gaps

pub mod bucket;
pub mod event;
mod fill;
mod stats;
pub mod types;
pub mod validate;

pub use bucket::{AFK_CLIENT, Bucket, BucketError, WINDOW_CLIENT, resolve_bucket};
pub use event::{Event, covered_ns};
pub use fill::{BoundaryWriter, FillError, FillOptions, fill_gaps};
pub use stats::FillStats;
pub use types::{GapTarget, TimeRange, ValidationError, parse_period};
pub use validate::{Anomaly, ValidationReport, validate};
