//! Read-only checks over window and afk streams.
//!
//! Two passes: adjacent window events must not overlap, and window events
//! that share an afk interval must sit exactly `gap` apart. Anomalies are
//! diagnostics, not errors.

use std::fmt;

use serde::Serialize;

use crate::event::Event;

/// One problem found by [`validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anomaly {
    /// `first` ends `overlap_ns` after `second` starts.
    Overlap {
        first: i64,
        second: i64,
        overlap_ns: i64,
    },
    /// The distance between `first.end` and `second.start` is not the target.
    Gap {
        first: i64,
        second: i64,
        observed_ns: i64,
        expected_ns: i64,
    },
}

impl fmt::Display for Anomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overlap {
                first,
                second,
                overlap_ns,
            } => write!(
                f,
                "overlap: event {first} ends {overlap_ns}ns after event {second} starts"
            ),
            Self::Gap {
                first,
                second,
                observed_ns,
                expected_ns,
            } => write!(
                f,
                "gap: event {first} -> event {second} is {observed_ns}ns, expected {expected_ns}ns"
            ),
        }
    }
}

/// Result of both validation passes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub overlaps: Vec<Anomaly>,
    pub gaps: Vec<Anomaly>,
}

impl ValidationReport {
    pub fn len(&self) -> usize {
        self.overlaps.len() + self.gaps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlaps.is_empty() && self.gaps.is_empty()
    }

    /// All anomalies, overlaps first.
    pub fn iter(&self) -> impl Iterator<Item = &Anomaly> {
        self.overlaps.iter().chain(self.gaps.iter())
    }
}

/// Runs the overlap and gap passes. Both inputs must be sorted by start.
pub fn validate(afk_events: &[Event], window_events: &[Event], gap_ns: i64) -> ValidationReport {
    let report = ValidationReport {
        overlaps: overlap_pass(window_events),
        gaps: gap_pass(afk_events, window_events, gap_ns),
    };
    tracing::debug!(
        overlaps = report.overlaps.len(),
        gaps = report.gaps.len(),
        "validation finished"
    );
    report
}

fn overlap_pass(window_events: &[Event]) -> Vec<Anomaly> {
    window_events
        .windows(2)
        .filter(|pair| pair[0].end > pair[1].start)
        .map(|pair| Anomaly::Overlap {
            first: pair[0].id,
            second: pair[1].id,
            overlap_ns: pair[0].end.saturating_sub(pair[1].start),
        })
        .collect()
}

/// Walks both streams the same way the fill engine does.
///
/// A pair is checked once, from the afk interval its first event ends in.
/// Overlapping pairs are left to the overlap pass.
fn gap_pass(afk_events: &[Event], window_events: &[Event], gap_ns: i64) -> Vec<Anomaly> {
    let mut anomalies = Vec::new();
    let mut cursor = 0;

    for (afk_index, afk) in afk_events.iter().enumerate() {
        while let Some(current) = window_events.get(cursor) {
            if current.end <= afk.start {
                cursor += 1;
                continue;
            }
            if current.start >= afk.end {
                break;
            }

            if current.end <= afk.end {
                if let Some(next) = window_events.get(cursor + 1) {
                    let observed = next.start.saturating_sub(current.end);
                    let tolerated = next.start > afk.end
                        && in_contiguous_afk(afk_events, afk_index, next.start);
                    if observed >= 0 && !current.adjacent_with_gap(next, gap_ns) && !tolerated {
                        anomalies.push(Anomaly::Gap {
                            first: current.id,
                            second: next.id,
                            observed_ns: observed,
                            expected_ns: gap_ns,
                        });
                    }
                }
            }

            if current.end >= afk.end {
                break;
            }
            cursor += 1;
        }
    }

    anomalies
}

/// Whether `t` lies in one of the afk intervals chained without gaps after
/// `afk_events[index]`.
fn in_contiguous_afk(afk_events: &[Event], index: usize, t: i64) -> bool {
    let mut previous = &afk_events[index];
    for afk in &afk_events[index + 1..] {
        if afk.start != previous.end {
            return false;
        }
        if afk.contains(t) || t == afk.end {
            return true;
        }
        previous = afk;
    }
    false
}
