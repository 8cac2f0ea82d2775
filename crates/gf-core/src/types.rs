//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of digits in a nanosecond epoch timestamp between 2001 and 2286.
pub const PERIOD_DIGITS: usize = 19;

/// Largest accepted gap target, in milliseconds.
pub const MAX_GAP_MS: u64 = 5_000;

const NANOS_PER_MILLI: i64 = 1_000_000;

/// Validation errors for core types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// An event ends before it starts.
    #[error("event {id} ends before it starts ({start} > {end})")]
    InvertedEvent { id: i64, start: i64, end: i64 },

    /// The time range is empty or inverted.
    #[error("start period {start} must be before end period {end}")]
    InvalidRange { start: i64, end: i64 },

    /// A period bound is not a 19-digit nanosecond timestamp.
    #[error("invalid period {value:?}: expected exactly {PERIOD_DIGITS} digits of nanoseconds")]
    InvalidPeriod { value: String },

    /// The gap target is outside the accepted range.
    #[error("gap must be between 0 and {MAX_GAP_MS} ms, got {value}")]
    GapOutOfRange { value: u64 },
}

/// Optional bounds narrowing which events are loaded.
///
/// A missing bound means the query is open on that side. Events that only
/// partially overlap the range are still loaded, so both bounds are inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: Option<i64>,
    pub end: Option<i64>,
}

impl TimeRange {
    /// Creates a range, rejecting `start >= end` when both bounds are present.
    pub fn new(start: Option<i64>, end: Option<i64>) -> Result<Self, ValidationError> {
        if let (Some(start), Some(end)) = (start, end) {
            if start >= end {
                return Err(ValidationError::InvalidRange { start, end });
            }
        }
        Ok(Self { start, end })
    }

    /// A range with no bounds on either side.
    pub const fn unbounded() -> Self {
        Self {
            start: None,
            end: None,
        }
    }

    pub const fn has_start(&self) -> bool {
        self.start.is_some()
    }

    pub const fn has_end(&self) -> bool {
        self.end.is_some()
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.start, self.end) {
            (None, None) => write!(f, "all time"),
            (Some(start), None) => write!(f, "from {start}"),
            (None, Some(end)) => write!(f, "until {end}"),
            (Some(start), Some(end)) => write!(f, "{start}..={end}"),
        }
    }
}

/// Parses a period bound given as exactly 19 digits of epoch nanoseconds.
pub fn parse_period(value: &str) -> Result<i64, ValidationError> {
    let invalid = || ValidationError::InvalidPeriod {
        value: value.to_string(),
    };
    if value.len() != PERIOD_DIGITS || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    value.parse().map_err(|_| invalid())
}

/// The desired separation between consecutive window events, in nanoseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u64", into = "u64")]
pub struct GapTarget(i64);

impl GapTarget {
    /// Creates a gap target from milliseconds, rejecting values above [`MAX_GAP_MS`].
    pub fn from_millis(ms: u64) -> Result<Self, ValidationError> {
        if ms > MAX_GAP_MS {
            return Err(ValidationError::GapOutOfRange { value: ms });
        }
        let ms = i64::try_from(ms).map_err(|_| ValidationError::GapOutOfRange { value: ms })?;
        Ok(Self(ms * NANOS_PER_MILLI))
    }

    pub const fn as_nanos(self) -> i64 {
        self.0
    }

    pub const fn as_millis(self) -> u64 {
        (self.0 / NANOS_PER_MILLI).unsigned_abs()
    }
}

impl TryFrom<u64> for GapTarget {
    type Error = ValidationError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::from_millis(value)
    }
}

impl From<GapTarget> for u64 {
    fn from(gap: GapTarget) -> Self {
        gap.as_millis()
    }
}

impl fmt::Display for GapTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.as_millis())
    }
}
