//! Busy/free interval computation.
//!
//! Normalizes events into half-open `[start, end)` instants, merges
//! overlapping busy periods, then computes the complement within a window.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::{normalize_events, Event};
use crate::options::EngineOptions;

/// A half-open `[start, end)` time range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// A merged period during which the owner is occupied.
pub type BusyInterval = Interval;
/// A period during which the owner is unoccupied.
pub type FreeInterval = Interval;

impl Interval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Intersection with `[window_start, window_end)`, if non-empty.
    pub fn clip(&self, window_start: DateTime<Utc>, window_end: DateTime<Utc>) -> Option<Interval> {
        let start = self.start.max(window_start);
        let end = self.end.min(window_end);
        (start < end).then_some(Interval { start, end })
    }
}

/// Merge overlapping or adjacent intervals. Input order does not matter;
/// the output is sorted and pairwise disjoint.
pub fn merge_intervals(mut intervals: Vec<Interval>) -> Vec<Interval> {
    intervals.sort();

    let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());
    for interval in intervals {
        if let Some(last) = merged.last_mut() {
            if interval.start <= last.end {
                // Overlapping or adjacent: extend the running interval.
                last.end = last.end.max(interval.end);
                continue;
            }
        }
        merged.push(interval);
    }

    merged
}

/// Merged busy intervals of `events`, clipped to `[window_start, window_end)`.
///
/// Events without a resolvable timed span (all-day, missing start) and events
/// that do not block time (cancelled, declined) contribute nothing.
pub fn busy_intervals(
    events: &[Event],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    options: &EngineOptions,
) -> Vec<BusyInterval> {
    if window_start >= window_end {
        return Vec::new();
    }

    let clipped: Vec<Interval> = normalize_events(events, options)
        .iter()
        .filter_map(|t| Interval::new(t.start, t.end).clip(window_start, window_end))
        .collect();

    merge_intervals(clipped)
}

/// Complement of `busy` within `[window_start, window_end)`.
///
/// `busy` must be sorted and disjoint (as produced by [`busy_intervals`]).
/// Busy intervals reaching outside the window are clipped first.
pub fn free_intervals(
    busy: &[BusyInterval],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Vec<FreeInterval> {
    let mut free = Vec::new();
    let mut cursor = window_start;

    for interval in busy.iter().filter_map(|b| b.clip(window_start, window_end)) {
        if cursor < interval.start {
            free.push(Interval::new(cursor, interval.start));
        }
        cursor = cursor.max(interval.end);
    }

    // Trailing free interval after the last busy period.
    if cursor < window_end {
        free.push(Interval::new(cursor, window_end));
    }

    free
}

/// Free intervals of at least `min_duration_minutes` within the window.
pub fn find_free_intervals(
    events: &[Event],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    min_duration_minutes: i64,
    options: &EngineOptions,
) -> Vec<FreeInterval> {
    let busy = busy_intervals(events, window_start, window_end, options);
    free_intervals(&busy, window_start, window_end)
        .into_iter()
        .filter(|slot| slot.duration_minutes() >= min_duration_minutes)
        .collect()
}
