//! Timestamped intervals and the predicates shared by the engine and validator.
//!
//! All arithmetic is on `i64` nanoseconds since the Unix epoch and saturates
//! at the `i64` limits, since timestamps come straight from the store.

use serde::{Deserialize, Serialize};

use crate::types::ValidationError;

/// An interval record from a window or afk bucket.
///
/// Only `start` and `end` are ever rewritten; the `id` identifies the row in
/// the store for the lifetime of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub start: i64,
    pub end: i64,
}

impl Event {
    /// Creates an event, rejecting intervals that end before they start.
    pub fn new(id: i64, start: i64, end: i64) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvertedEvent { id, start, end });
        }
        Ok(Self { id, start, end })
    }

    /// Length of the interval in nanoseconds.
    pub const fn duration(&self) -> i64 {
        self.end.saturating_sub(self.start)
    }

    /// Whether the two intervals share any time.
    ///
    /// Intervals that merely touch (`a.end == b.start`) do not overlap.
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Whether `next` starts exactly `gap` nanoseconds after `self` ends.
    pub const fn adjacent_with_gap(&self, next: &Self, gap: i64) -> bool {
        next.start.saturating_sub(self.end) == gap
    }

    /// Whether `t` falls in the half-open interval `[start, end)`.
    pub const fn contains(&self, t: i64) -> bool {
        self.start <= t && t < self.end
    }

    /// Length of the shared sub-interval, or 0 when the intervals are disjoint.
    pub fn clamp_overlap(&self, other: &Self) -> i64 {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        end.saturating_sub(start).max(0)
    }
}

/// Returns the total duration covered by `events`, summed per event.
pub fn covered_ns(events: &[Event]) -> i64 {
    events
        .iter()
        .map(Event::duration)
        .fold(0, i64::saturating_add)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(id: i64, start: i64, end: i64) -> Event {
        Event::new(id, start, end).unwrap()
    }

    #[test]
    fn new_rejects_inverted_interval() {
        assert_eq!(
            Event::new(7, 10, 5).unwrap_err(),
            ValidationError::InvertedEvent {
                id: 7,
                start: 10,
                end: 5
            }
        );
        assert!(Event::new(7, 5, 5).is_ok());
    }

    #[test]
    fn touching_intervals_do_not_overlap() {
        let a = ev(1, 0, 100);
        let b = ev(2, 100, 200);
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
        assert!(a.adjacent_with_gap(&b, 0));
    }

    #[test]
    fn overlap_is_symmetric() {
        let a = ev(1, 0, 100);
        let b = ev(2, 50, 200);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert_eq!(a.clamp_overlap(&b), 50);
        assert_eq!(b.clamp_overlap(&a), 50);
    }

    #[test]
    fn clamp_overlap_is_zero_for_disjoint_intervals() {
        let a = ev(1, 0, 100);
        let b = ev(2, 300, 400);
        assert_eq!(a.clamp_overlap(&b), 0);
    }

    #[test]
    fn contains_is_half_open() {
        let afk = ev(1, 1_000, 5_000);
        assert!(afk.contains(1_000));
        assert!(afk.contains(4_999));
        assert!(!afk.contains(5_000));
        assert!(!afk.contains(999));
    }

    #[test]
    fn adjacency_checks_exact_gap() {
        let a = ev(1, 0, 1_000);
        let b = ev(2, 1_500, 2_000);
        assert!(a.adjacent_with_gap(&b, 500));
        assert!(!a.adjacent_with_gap(&b, 499));
    }

    #[test]
    fn covered_sums_durations() {
        let events = [ev(1, 0, 10), ev(2, 20, 25), ev(3, 30, 30)];
        assert_eq!(covered_ns(&events), 15);
        assert_eq!(covered_ns(&[]), 0);
    }

    #[test]
    fn extreme_timestamps_saturate() {
        let everything = ev(1, i64::MIN, i64::MAX);
        assert_eq!(everything.duration(), i64::MAX);
        assert_eq!(covered_ns(&[everything, ev(2, 0, 10)]), i64::MAX);
        assert_eq!(everything.clamp_overlap(&everything), i64::MAX);

        let early = ev(3, i64::MIN, i64::MIN);
        let late = ev(4, i64::MAX, i64::MAX);
        assert!(!early.adjacent_with_gap(&late, 0));
        assert!(early.adjacent_with_gap(&late, i64::MAX));
    }
}
