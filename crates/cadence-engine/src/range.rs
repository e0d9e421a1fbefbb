//! Semantic date-range resolution.
//!
//! Maps labels such as `this_week` onto concrete `[start, end)` instants in
//! the requester's timezone, and slices a resolved range into local days.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::interval::Interval;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateRange {
    Today,
    Tomorrow,
    ThisWeek,
    NextWeek,
    ThisMonth,
    NextMonth,
    Custom,
}

/// Where a resolved range came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RangeSource {
    Semantic(DateRange),
    CustomDates,
    ViewWindow,
    DefaultWeek,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub source: RangeSource,
}

impl ResolvedRange {
    /// Local calendar days covered by the range, each clipped to the range.
    pub fn days(&self, tz: Tz) -> Vec<(NaiveDate, Interval)> {
        if self.start >= self.end {
            return Vec::new();
        }

        let first = self.start.with_timezone(&tz).date_naive();
        let last = (self.end - Duration::nanoseconds(1))
            .with_timezone(&tz)
            .date_naive();

        first
            .iter_days()
            .take_while(|day| *day <= last)
            .filter_map(|day| {
                let day_start = local_midnight(tz, day);
                let day_end = local_midnight(tz, day + Duration::days(1));
                Interval::new(day_start, day_end)
                    .clip(self.start, self.end)
                    .map(|bounds| (day, bounds))
            })
            .collect()
    }
}

/// Resolve the search window.
///
/// Precedence: explicit custom dates, then the semantic label, then the
/// caller's view window, then the current Monday-anchored week.
pub fn resolve_range(
    range: Option<DateRange>,
    custom_dates: &[String],
    view_window: Option<Interval>,
    now: DateTime<Utc>,
    tz: Tz,
) -> Result<ResolvedRange> {
    if !custom_dates.is_empty() {
        let dates = custom_dates
            .iter()
            .map(|s| parse_date(s, tz))
            .collect::<Result<Vec<NaiveDate>>>()?;
        // Non-empty, so min/max exist.
        let (Some(min), Some(max)) = (dates.iter().min(), dates.iter().max()) else {
            return Err(EngineError::InvalidRequest("no custom dates".to_string()));
        };
        return Ok(ResolvedRange {
            start: local_midnight(tz, *min),
            end: local_midnight(tz, *max + Duration::days(1)),
            source: RangeSource::CustomDates,
        });
    }

    let today = now.with_timezone(&tz).date_naive();

    let Some(label) = range else {
        if let Some(window) = view_window {
            if window.start >= window.end {
                return Err(EngineError::InvalidWindow {
                    start: window.start.to_rfc3339(),
                    end: window.end.to_rfc3339(),
                });
            }
            return Ok(ResolvedRange {
                start: window.start,
                end: window.end,
                source: RangeSource::ViewWindow,
            });
        }
        let monday = week_start(today);
        return Ok(ResolvedRange {
            start: local_midnight(tz, monday),
            end: local_midnight(tz, monday + Duration::days(7)),
            source: RangeSource::DefaultWeek,
        });
    };

    let (first_day, last_day_exclusive) = match label {
        DateRange::Custom => {
            return Err(EngineError::InvalidRequest(
                "custom date range requires at least one date".to_string(),
            ));
        }
        DateRange::Today => (today, today + Duration::days(1)),
        DateRange::Tomorrow => (today + Duration::days(1), today + Duration::days(2)),
        DateRange::ThisWeek => {
            let monday = week_start(today);
            (monday, monday + Duration::days(7))
        }
        DateRange::NextWeek => {
            let monday = week_start(today) + Duration::days(7);
            (monday, monday + Duration::days(7))
        }
        DateRange::ThisMonth => {
            let first = month_start(today);
            (first, next_month_start(first))
        }
        DateRange::NextMonth => {
            let first = next_month_start(month_start(today));
            (first, next_month_start(first))
        }
    };

    Ok(ResolvedRange {
        start: local_midnight(tz, first_day),
        end: local_midnight(tz, last_day_exclusive),
        source: RangeSource::Semantic(label),
    })
}

/// The instant of local midnight starting `date` in `tz`.
///
/// Zones that skip midnight on a DST change start the day at the first valid
/// local time after it.
pub fn local_midnight(tz: Tz, date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    (0..=2)
        .find_map(|h| {
            tz.from_local_datetime(&(naive + Duration::hours(h)))
                .earliest()
        })
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}

fn week_start(day: NaiveDate) -> NaiveDate {
    day - Duration::days(day.weekday().num_days_from_monday() as i64)
}

fn month_start(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

fn next_month_start(first: NaiveDate) -> NaiveDate {
    let (year, month) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(first + Duration::days(31))
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp (taken as its local date).
fn parse_date(raw: &str, tz: Tz) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.with_timezone(&tz).date_naive())
        .map_err(|_| EngineError::InvalidDate(raw.to_string()))
}
