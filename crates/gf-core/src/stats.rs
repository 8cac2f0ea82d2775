//! Aggregate figures reported after a fill run.

use serde::Serialize;

use crate::event::{Event, covered_ns};

/// Counters threaded through one fill run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FillStats {
    /// Window events loaded for the run.
    pub window_events: usize,
    /// Afk events loaded for the run.
    pub afk_events: usize,
    /// Distinct window events whose boundaries changed.
    pub events_adjusted: usize,
    /// Boundary writes sent to the store. An event that spans two afk
    /// intervals can be written twice.
    pub writes: usize,
    /// Summed window durations before the run.
    pub covered_before_ns: i64,
    /// Summed window durations after the last completed write.
    pub covered_after_ns: i64,
}

impl FillStats {
    /// Starts accumulating for the given inputs.
    pub fn begin(afk_events: &[Event], window_events: &[Event]) -> Self {
        let covered = covered_ns(window_events);
        Self {
            window_events: window_events.len(),
            afk_events: afk_events.len(),
            events_adjusted: 0,
            writes: 0,
            covered_before_ns: covered,
            covered_after_ns: covered,
        }
    }

    /// Records a completed write, adjusting the covered total by the change.
    pub(crate) fn record_write(&mut self, before: &Event, after: &Event, first_for_event: bool) {
        self.writes += 1;
        if first_for_event {
            self.events_adjusted += 1;
        }
        self.covered_after_ns = self
            .covered_after_ns
            .saturating_add(after.duration().saturating_sub(before.duration()));
    }

    /// Net change in covered time, positive when gaps were closed.
    pub const fn covered_delta_ns(&self) -> i64 {
        self.covered_after_ns.saturating_sub(self.covered_before_ns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_sums_window_durations() {
        let window = [
            Event::new(1, 0, 100).unwrap(),
            Event::new(2, 150, 200).unwrap(),
        ];
        let stats = FillStats::begin(&[], &window);
        assert_eq!(stats.window_events, 2);
        assert_eq!(stats.afk_events, 0);
        assert_eq!(stats.covered_before_ns, 150);
        assert_eq!(stats.covered_delta_ns(), 0);
    }

    #[test]
    fn record_write_tracks_distinct_events() {
        let before = Event::new(1, 100, 200).unwrap();
        let widened = Event::new(1, 50, 200).unwrap();
        let narrowed = Event::new(1, 50, 180).unwrap();
        let mut stats = FillStats::begin(&[], &[before]);

        stats.record_write(&before, &widened, true);
        stats.record_write(&widened, &narrowed, false);

        assert_eq!(stats.writes, 2);
        assert_eq!(stats.events_adjusted, 1);
        assert_eq!(stats.covered_after_ns, 130);
        assert_eq!(stats.covered_delta_ns(), 30);
    }
}
