//! Calendar health summary over a window.
//!
//! Aggregates gap classification, conflicts and meeting load into a single
//! 0–100 score for dashboards. Persisting scores over time is the caller's
//! concern.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::conflict::detect_conflicts;
use crate::event::{normalize_events, Event};
use crate::gaps::{classify_gaps, GapStatus};
use crate::interval::Interval;
use crate::options::EngineOptions;

const BACK_TO_BACK_PENALTY: f64 = 5.0;
const INSUFFICIENT_BUFFER_PENALTY: f64 = 3.0;
const CONFLICT_PENALTY: f64 = 10.0;
const FOCUS_BLOCK_BONUS: f64 = 2.0;
/// Meeting load (fraction of baseline hours) above which the score drops.
const LOAD_THRESHOLD: f64 = 0.5;
const LOAD_PENALTY: f64 = 40.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSummary {
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub meeting_count: usize,
    pub meeting_minutes: i64,
    pub back_to_back_count: usize,
    pub insufficient_buffer_count: usize,
    pub focus_block_count: usize,
    /// Conflicts where both sides are genuine meetings.
    pub conflict_count: usize,
    /// Meeting hours ÷ baseline hours scaled to the window length.
    pub meeting_load: f64,
    pub score: u8,
}

/// Summarize the health of the events overlapping `[window_start, window_end)`.
///
/// Events are selected by overlap with the window and counted in full.
pub fn summarize_health(
    events: &[Event],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    options: &EngineOptions,
) -> HealthSummary {
    let window = Interval::new(window_start, window_end);
    let in_window: Vec<Event> = normalize_events(events, options)
        .iter()
        .filter(|t| Interval::new(t.start, t.end).overlaps(&window))
        .map(|t| t.event.clone())
        .collect();

    let meetings: Vec<_> = normalize_events(&in_window, options)
        .into_iter()
        .filter(|t| t.event.is_meeting(options))
        .collect();
    let meeting_minutes: i64 = meetings.iter().map(|t| t.duration_minutes()).sum();

    let gaps = classify_gaps(&in_window, options);
    let count = |status: GapStatus| gaps.iter().filter(|g| g.status == status).count();
    let back_to_back_count = count(GapStatus::BackToBack);
    let insufficient_buffer_count = count(GapStatus::InsufficientBuffer);
    let focus_block_count = count(GapStatus::FocusBlock);

    let conflict_count = detect_conflicts(&in_window, options)
        .iter()
        .filter(|c| c.is_double_booking())
        .count();

    let window_weeks = (window_end - window_start).num_minutes().max(0) as f64 / (7.0 * 24.0 * 60.0);
    let baseline_minutes = options.baseline_work_week_hours * 60.0 * window_weeks;
    let meeting_load = if baseline_minutes > 0.0 {
        meeting_minutes as f64 / baseline_minutes
    } else {
        0.0
    };

    let score = 100.0
        - BACK_TO_BACK_PENALTY * back_to_back_count as f64
        - INSUFFICIENT_BUFFER_PENALTY * insufficient_buffer_count as f64
        - CONFLICT_PENALTY * conflict_count as f64
        - LOAD_PENALTY * (meeting_load - LOAD_THRESHOLD).max(0.0)
        + FOCUS_BLOCK_BONUS * focus_block_count as f64;

    HealthSummary {
        window_start,
        window_end,
        meeting_count: meetings.len(),
        meeting_minutes,
        back_to_back_count,
        insufficient_buffer_count,
        focus_block_count,
        conflict_count,
        meeting_load,
        score: score.clamp(0.0, 100.0).round() as u8,
    }
}
