//! Buffer classification between consecutive events.
//!
//! Each gap is judged from its two neighbors only. Pairs involving a solo
//! placeholder are always `normal`: a hold such as "Focus Time" directly after
//! a meeting is not a back-to-back problem.

use serde::{Deserialize, Serialize};

use crate::event::{normalize_events, Event, EventSummary};
use crate::options::EngineOptions;

/// Gaps strictly below this many minutes leave insufficient buffer.
pub const MIN_BUFFER_MINUTES: i64 = 10;
/// Inclusive bounds of a gap long enough for focused work.
pub const FOCUS_BLOCK_MINUTES: (i64, i64) = (60, 120);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GapStatus {
    BackToBack,
    InsufficientBuffer,
    FocusBlock,
    Normal,
}

impl GapStatus {
    /// Classify a gap between two genuine meetings.
    pub fn from_minutes(gap_minutes: i64) -> Self {
        let (focus_min, focus_max) = FOCUS_BLOCK_MINUTES;
        match gap_minutes {
            0 => GapStatus::BackToBack,
            g if g > 0 && g < MIN_BUFFER_MINUTES => GapStatus::InsufficientBuffer,
            g if (focus_min..=focus_max).contains(&g) => GapStatus::FocusBlock,
            _ => GapStatus::Normal,
        }
    }

    pub fn recommendation(&self) -> &'static str {
        match self {
            GapStatus::BackToBack => {
                "Back-to-back meetings: end the first 5-10 minutes early or push the second."
            }
            GapStatus::InsufficientBuffer => {
                "Less than 10 minutes between meetings: consider widening the buffer."
            }
            GapStatus::FocusBlock => "Protect this 1-2 hour gap as a focus block.",
            GapStatus::Normal => "No action needed.",
        }
    }
}

/// Classification of the gap following one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GapRecord {
    pub before: EventSummary,
    pub after: EventSummary,
    pub gap_minutes: i64,
    pub status: GapStatus,
    pub recommendation: String,
}

/// Classify the gap after every timed event.
///
/// Events are normalized and sorted first; all-day, cancelled and declined
/// events never participate. Overlapping pairs yield a negative gap and are
/// reported as `normal` here (the conflict detector owns overlaps).
pub fn classify_gaps(events: &[Event], options: &EngineOptions) -> Vec<GapRecord> {
    let timed = normalize_events(events, options);

    timed
        .windows(2)
        .map(|pair| {
            let before = pair[0].summary(options);
            let after = pair[1].summary(options);
            let gap_minutes = (pair[1].start - pair[0].end).num_minutes();

            let status = if before.is_meeting && after.is_meeting {
                GapStatus::from_minutes(gap_minutes)
            } else {
                GapStatus::Normal
            };

            GapRecord {
                before,
                after,
                gap_minutes,
                status,
                recommendation: status.recommendation().to_string(),
            }
        })
        .collect()
}
