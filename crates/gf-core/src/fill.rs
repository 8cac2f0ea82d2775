//! Gap-filling engine.
//!
//! Closes the gaps a window watcher leaves between consecutive window events
//! while the user is active, so that neighbours end up exactly `gap` apart.
//!
//! # Algorithm Summary
//!
//! Both streams are sorted by start. For each afk interval, in order:
//!
//! 1. Skip window events that end at or before the afk start, remembering the
//!    last skipped end as the previous window end.
//! 2. Stop at the first window event that starts at or after the afk end; it
//!    is looked at again for the next afk interval.
//! 3. For every window event in between:
//!    - the first one starting inside the afk interval has its start pulled
//!      to `afk.start + gap`, or to `previous_end + gap` if the previous
//!      window event reaches into the afk interval. A start that would land
//!      at or past the afk end is left alone;
//!    - its end is pulled to `min(next.start, afk.end) - gap`, unless it
//!      already runs past the afk end. The very last window event is pulled
//!      to `afk.end - gap` instead, but only for queries without an upper
//!      bound;
//!    - a new start that does not fit before the old end is tried again once
//!      the end has moved.
//! 4. Move on to the next afk interval once a window event reaches the afk
//!    end, without advancing past it.
//!
//! An end pulled back below the afk start lands in an earlier afk interval,
//! and a later run judges it against that interval. The end is therefore
//! walked back until it satisfies the bound of the interval it lands in.
//!
//! The window cursor never moves backwards, so the walk is a single merge-join
//! over both sequences. Every new boundary is derived from an afk edge or a
//! neighbouring window event and already satisfies the rule a later run would
//! apply to it, which makes a second run a no-op.

use thiserror::Error;

use crate::event::Event;
use crate::stats::FillStats;
use crate::types::{GapTarget, TimeRange};

/// Destination for adjusted window event boundaries.
///
/// Implemented by the store gateway; tests record writes in memory.
pub trait BoundaryWriter {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Persists `event.start` and `event.end` for the row `event.id`.
    fn write_bounds(&mut self, event: &Event) -> Result<(), Self::Error>;
}

/// Parameters fixed for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillOptions {
    /// Target separation in nanoseconds.
    pub gap_ns: i64,
    /// The query had a lower bound, so the first window event may be moved.
    pub has_start_bound: bool,
    /// The query had an upper bound, so the last window event is left alone.
    pub has_end_bound: bool,
}

impl FillOptions {
    pub const fn new(gap: GapTarget, range: &TimeRange) -> Self {
        Self {
            gap_ns: gap.as_nanos(),
            has_start_bound: range.has_start(),
            has_end_bound: range.has_end(),
        }
    }
}

/// A write failed part way through a run.
///
/// Writes that completed before the failure are not rolled back; `stats`
/// describes exactly those.
#[derive(Debug, Error)]
#[error("failed to write new bounds for event {event_id}")]
pub struct FillError<E: std::error::Error + 'static> {
    pub event_id: i64,
    pub stats: FillStats,
    #[source]
    pub source: E,
}

/// Aligns window event boundaries to afk intervals and neighbours.
///
/// `window_events` is updated in place as writes succeed, so on return it
/// mirrors what the store holds.
pub fn fill_gaps<W: BoundaryWriter>(
    afk_events: &[Event],
    window_events: &mut [Event],
    options: FillOptions,
    writer: &mut W,
) -> Result<FillStats, FillError<W::Error>> {
    let mut stats = FillStats::begin(afk_events, window_events);
    let mut adjusted = vec![false; window_events.len()];
    let mut cursor = 0;
    let mut previous_end: Option<i64> = None;

    for (index, afk) in afk_events.iter().enumerate() {
        let mut leading_edge_seen = false;

        while let Some(&current) = window_events.get(cursor) {
            if current.end <= afk.start {
                previous_end = Some(current.end);
                cursor += 1;
                continue;
            }
            if current.start >= afk.end {
                break;
            }

            let mut lead = None;
            if !leading_edge_seen && current.start >= afk.start {
                leading_edge_seen = true;
                if cursor > 0 || options.has_start_bound {
                    lead = leading_edge(&current, afk, previous_end, options.gap_ns);
                }
            }

            let next = window_events.get(cursor + 1).copied();
            let mut updated = current;
            if let Some(start) = lead.filter(|&start| start < updated.end) {
                updated.start = start;
            }
            if let Some(end) = trailing_edge(&updated, afk_events, index, next.as_ref(), options) {
                updated.end = end;
            }
            // A short event only fits its new start once its end has moved.
            if let Some(start) = lead.filter(|&start| start != updated.start && start < updated.end) {
                updated.start = start;
                if let Some(end) = trailing_edge(&updated, afk_events, index, next.as_ref(), options)
                {
                    updated.end = end;
                }
            }

            if updated != current {
                tracing::debug!(
                    event_id = current.id,
                    start = current.start,
                    end = current.end,
                    new_start = updated.start,
                    new_end = updated.end,
                    "adjusting window event"
                );
                if let Err(source) = writer.write_bounds(&updated) {
                    return Err(FillError {
                        event_id: current.id,
                        stats,
                        source,
                    });
                }
                stats.record_write(&current, &updated, !adjusted[cursor]);
                adjusted[cursor] = true;
                window_events[cursor] = updated;
            }

            if updated.end >= afk.end {
                break;
            }
            previous_end = Some(updated.end);
            cursor += 1;
        }
    }

    Ok(stats)
}

/// Candidate start for the first window event beginning inside `afk`.
///
/// The caller still has to check it against the event's end.
fn leading_edge(current: &Event, afk: &Event, previous_end: Option<i64>, gap: i64) -> Option<i64> {
    let from_afk = afk.start.saturating_add(gap);
    if current.start == from_afk {
        return None;
    }
    let candidate = match previous_end {
        Some(end) if current.start == end.saturating_add(gap) => return None,
        Some(end) if end > afk.start => end.saturating_add(gap),
        _ => from_afk,
    };
    (candidate < afk.end).then_some(candidate)
}

/// New end for a window event inside `afk_events[index]`, if it moves.
fn trailing_edge(
    current: &Event,
    afk_events: &[Event],
    index: usize,
    next: Option<&Event>,
    options: FillOptions,
) -> Option<i64> {
    let afk = &afk_events[index];
    let gap = options.gap_ns;
    let (candidate, next_start) = match next {
        None if options.has_end_bound || current.end >= afk.end => return None,
        None => (afk.end.saturating_sub(gap), None),
        Some(_) if current.end > afk.end => return None,
        Some(next) => (next.start.min(afk.end).saturating_sub(gap), Some(next.start)),
    };
    let candidate = settle_end(afk_events, index, next_start, gap, candidate);
    (candidate > current.start && candidate != current.end).then_some(candidate)
}

/// Walks an end that fell below `afk_events[index].start` back through the
/// earlier afk intervals it lands in, applying each one's trailing bound.
///
/// Stops in a hole between afk intervals, where no later run touches it.
fn settle_end(
    afk_events: &[Event],
    mut index: usize,
    next_start: Option<i64>,
    gap: i64,
    mut candidate: i64,
) -> i64 {
    while candidate <= afk_events[index].start {
        let Some(earlier) = afk_events[..index]
            .iter()
            .rposition(|afk| afk.start < candidate)
        else {
            break;
        };
        let afk = &afk_events[earlier];
        let settled = match next_start {
            None if candidate >= afk.end => break,
            None => afk.end.saturating_sub(gap),
            Some(_) if candidate > afk.end => break,
            Some(next_start) => next_start.min(afk.end).saturating_sub(gap),
        };
        if settled == candidate {
            break;
        }
        candidate = settled;
        index = earlier;
    }
    candidate
}
