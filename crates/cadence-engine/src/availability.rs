//! Timezone-constrained slot search.
//!
//! Resolves a semantic date range, computes the free intervals of each local
//! day from the merged busy intervals, then walks every free interval in
//! `duration`-sized steps. A candidate is accepted only when both endpoints
//! fall inside the working-hours window of the requester's zone and of every
//! explicitly constrained zone.

use chrono::{DateTime, Duration, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{EngineError, Result};
use crate::event::Event;
use crate::interval::{busy_intervals, free_intervals, Interval};
use crate::options::EngineOptions;
use crate::range::{resolve_range, DateRange, ResolvedRange};
use crate::timezone::{local_label, resolve_or_default};

/// A participant zone with an optional working-hours override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimezoneConstraint {
    pub timezone: String,
    #[serde(default, alias = "hours_start", skip_serializing_if = "Option::is_none")]
    pub hours_start: Option<u32>,
    #[serde(default, alias = "hours_end", skip_serializing_if = "Option::is_none")]
    pub hours_end: Option<u32>,
}

impl TimezoneConstraint {
    pub fn new(timezone: impl Into<String>) -> Self {
        Self {
            timezone: timezone.into(),
            hours_start: None,
            hours_end: None,
        }
    }
}

/// A slot search request, as produced by the intent-parsing layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AvailabilityRequest {
    #[serde(alias = "date_range", skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    /// Explicit dates (`YYYY-MM-DD`); when present they override `date_range`.
    #[serde(alias = "custom_dates")]
    pub custom_dates: Vec<String>,
    /// Slot length in minutes.
    pub duration: i64,
    #[serde(alias = "timezone_constraints")]
    pub timezone_constraints: Vec<TimezoneConstraint>,
    #[serde(alias = "working_hours_only")]
    pub working_hours_only: bool,
    /// The window currently shown to the user, used when no range is given.
    #[serde(alias = "view_window", skip_serializing_if = "Option::is_none")]
    pub view_window: Option<Interval>,
}

impl Default for AvailabilityRequest {
    fn default() -> Self {
        Self {
            date_range: None,
            custom_dates: Vec::new(),
            duration: 30,
            timezone_constraints: Vec::new(),
            working_hours_only: false,
            view_window: None,
        }
    }
}

/// Local time of a slot in one of the zones involved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneLabel {
    pub timezone: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotSuggestion {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_minutes: i64,
    pub labels: Vec<ZoneLabel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotSearch {
    pub range: ResolvedRange,
    pub duration_minutes: i64,
    /// Every distinct zone involved, requester first.
    pub timezones: Vec<String>,
    pub slots: Vec<SlotSuggestion>,
    /// True when the search stopped at `max_slots`.
    pub capped: bool,
}

/// Working-hours window of one zone, in local minutes of day.
#[derive(Debug, Clone, Copy)]
struct ZoneWindow {
    tz: Tz,
    start_minute: i64,
    end_minute: i64,
}

impl ZoneWindow {
    fn new(tz: Tz, start_hour: u32, end_hour: u32) -> Result<Self> {
        if start_hour >= end_hour || end_hour > 24 {
            return Err(EngineError::InvalidRequest(format!(
                "working hours {}..{} for {} are not a valid window",
                start_hour,
                end_hour,
                tz.name()
            )));
        }
        Ok(Self {
            tz,
            start_minute: start_hour as i64 * 60,
            end_minute: end_hour as i64 * 60,
        })
    }

    /// Both endpoints of `[start, end)` fall inside the window on the same
    /// local day (an end at exactly the window close is allowed).
    fn admits(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        let local_start = start.with_timezone(&self.tz);
        let local_end = end.with_timezone(&self.tz);
        let day_offset = (local_end.date_naive() - local_start.date_naive()).num_days();

        let start_minute = minute_of_day(local_start.hour(), local_start.minute());
        let end_minute = day_offset * 1440 + minute_of_day(local_end.hour(), local_end.minute());

        start_minute >= self.start_minute && end_minute <= self.end_minute
    }
}

fn minute_of_day(hour: u32, minute: u32) -> i64 {
    hour as i64 * 60 + minute as i64
}

/// Enumerate candidate slots for `request`.
///
/// `timezone` is the requester's zone; `now` anchors semantic ranges and
/// excludes candidates that start in the past. Returns at most
/// `options.max_slots` suggestions in chronological order.
///
/// # Errors
/// Returns `EngineError::InvalidRequest` for a non-positive duration or an
/// invalid working-hours window, and `EngineError::InvalidDate` for
/// unparseable custom dates.
pub fn find_slots(
    events: &[Event],
    request: &AvailabilityRequest,
    now: DateTime<Utc>,
    timezone: &str,
    options: &EngineOptions,
) -> Result<SlotSearch> {
    if request.duration <= 0 || request.duration > 24 * 60 {
        return Err(EngineError::InvalidRequest(format!(
            "duration must be between 1 and 1440 minutes, got {}",
            request.duration
        )));
    }

    let home = resolve_or_default(timezone, &options.default_timezone);
    let range = resolve_range(
        request.date_range,
        &request.custom_dates,
        request.view_window,
        now,
        home,
    )?;

    let constrained = request.working_hours_only || !request.timezone_constraints.is_empty();
    let (home_start, home_end) = if constrained {
        (options.working_hours_start, options.working_hours_end)
    } else {
        (0, 24)
    };

    let mut windows = vec![ZoneWindow::new(home, home_start, home_end)?];
    for constraint in &request.timezone_constraints {
        let tz = resolve_or_default(&constraint.timezone, &options.default_timezone);
        windows.push(ZoneWindow::new(
            tz,
            constraint.hours_start.unwrap_or(options.working_hours_start),
            constraint.hours_end.unwrap_or(options.working_hours_end),
        )?);
    }

    let mut zones: Vec<Tz> = Vec::new();
    for window in &windows {
        if !zones.contains(&window.tz) {
            zones.push(window.tz);
        }
    }

    let duration = Duration::minutes(request.duration);
    let busy = busy_intervals(events, range.start, range.end, options);

    let mut slots = Vec::new();
    let mut capped = false;

    'days: for (_, day) in range.days(home) {
        for free in free_intervals(&busy, day.start, day.end) {
            let mut cursor = free.start;
            while cursor + duration <= free.end {
                let end = cursor + duration;
                if cursor >= now && windows.iter().all(|w| w.admits(cursor, end)) {
                    if slots.len() >= options.max_slots {
                        capped = true;
                        break 'days;
                    }
                    slots.push(SlotSuggestion {
                        start: cursor,
                        end,
                        duration_minutes: request.duration,
                        labels: zones
                            .iter()
                            .map(|tz| ZoneLabel {
                                timezone: tz.name().to_string(),
                                label: local_label(cursor, *tz),
                            })
                            .collect(),
                    });
                }
                cursor = end;
            }
        }
    }

    debug!(
        slots = slots.len(),
        capped,
        busy = busy.len(),
        "slot search complete"
    );

    Ok(SlotSearch {
        range,
        duration_minutes: request.duration,
        timezones: zones.iter().map(|tz| tz.name().to_string()).collect(),
        slots,
        capped,
    })
}
