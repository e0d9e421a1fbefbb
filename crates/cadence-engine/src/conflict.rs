//! Detect overlapping events in a calendar view.
//!
//! Performs pairwise comparison to find time overlaps. Adjacent events (where
//! one ends exactly when another starts) are NOT conflicts, and two solo
//! placeholders never conflict with each other.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::{normalize_events, Event, EventSummary, TimedEvent};
use crate::options::EngineOptions;

/// How much of the two events the overlap covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverlapKind {
    /// The overlap is 100% of both durations (identical ranges).
    Complete,
    Partial,
}

/// A detected conflict between two events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    /// The earlier-starting event; `is_meeting` tells whether it is genuine.
    pub first: EventSummary,
    pub second: EventSummary,
    pub overlap_start: DateTime<Utc>,
    pub overlap_end: DateTime<Utc>,
    pub overlap_minutes: i64,
    pub kind: OverlapKind,
}

impl Conflict {
    /// True when both sides are genuine meetings.
    pub fn is_double_booking(&self) -> bool {
        self.first.is_meeting && self.second.is_meeting
    }
}

/// Find all pairwise conflicts among the timed events of one view.
///
/// Two events overlap when `a.start < b.end && b.start < a.end`. The overlap
/// window is `[max(starts), min(ends))`. All-day, cancelled and declined
/// events are excluded. Results are ordered by the first event's position,
/// then the second's.
pub fn detect_conflicts(events: &[Event], options: &EngineOptions) -> Vec<Conflict> {
    let timed = normalize_events(events, options);
    let meeting: Vec<bool> = timed.iter().map(|t| t.event.is_meeting(options)).collect();

    let mut conflicts = Vec::new();
    for i in 0..timed.len() {
        for j in (i + 1)..timed.len() {
            if !meeting[i] && !meeting[j] {
                continue;
            }
            if let Some(conflict) = overlap(&timed[i], &timed[j], options) {
                conflicts.push(conflict);
            }
        }
    }

    conflicts
}

/// Conflicts between a proposed `[start, end)` range and the events of a view.
///
/// Every time-blocking event counts, placeholders included, since the
/// proposal would displace them.
pub fn conflicts_with(
    events: &[Event],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    options: &EngineOptions,
) -> Vec<EventSummary> {
    normalize_events(events, options)
        .iter()
        .filter(|t| t.start < end && start < t.end)
        .map(|t| t.summary(options))
        .collect()
}

fn overlap(a: &TimedEvent<'_>, b: &TimedEvent<'_>, options: &EngineOptions) -> Option<Conflict> {
    // Excludes the adjacent case where a.end == b.start.
    if !(a.start < b.end && b.start < a.end) {
        return None;
    }

    let overlap_start = a.start.max(b.start);
    let overlap_end = a.end.min(b.end);
    let overlap_minutes = (overlap_end - overlap_start).num_minutes();
    let kind = if a.start == b.start && a.end == b.end {
        OverlapKind::Complete
    } else {
        OverlapKind::Partial
    };

    Some(Conflict {
        first: a.summary(options),
        second: b.summary(options),
        overlap_start,
        overlap_end,
        overlap_minutes,
        kind,
    })
}
