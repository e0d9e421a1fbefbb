//! Recurrence rule inspection and cadence inference.
//!
//! Rule properties (`FREQ`, `INTERVAL`, `COUNT`, `UNTIL`) are read directly
//! from the RRULE body. Occurrence expansion goes through the `rrule` crate.
//! Malformed rules are never fatal: callers fall back to inferring cadence
//! from observed occurrence spacing.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rrule::RRuleSet;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Inferred recurrence frequency label of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Cadence {
    Daily,
    Weekly,
    #[serde(rename = "Bi-Weekly")]
    BiWeekly,
    Monthly,
    Irregular,
}

impl Cadence {
    /// Bucket an average spacing in days.
    pub fn from_gap_days(days: f64) -> Self {
        if days <= 2.0 {
            Cadence::Daily
        } else if days <= 10.0 {
            Cadence::Weekly
        } else if days <= 17.0 {
            Cadence::BiWeekly
        } else if days <= 45.0 {
            Cadence::Monthly
        } else {
            Cadence::Irregular
        }
    }

    /// Expected occurrences in a 30-day month, if the cadence is regular.
    pub fn occurrences_per_month(&self) -> Option<f64> {
        match self {
            Cadence::Daily => Some(30.0),
            Cadence::Weekly => Some(30.0 / 7.0),
            Cadence::BiWeekly => Some(30.0 / 14.0),
            Cadence::Monthly => Some(1.0),
            Cadence::Irregular => None,
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Cadence::Daily => "Daily",
            Cadence::Weekly => "Weekly",
            Cadence::BiWeekly => "Bi-Weekly",
            Cadence::Monthly => "Monthly",
            Cadence::Irregular => "Irregular",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Frequency {
    Secondly,
    Minutely,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// The properties of an RRULE body that cadence and end detection need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    pub interval: u32,
    pub count: Option<u32>,
    pub until: Option<String>,
}

impl FromStr for RecurrenceRule {
    type Err = EngineError;

    /// Parse `FREQ=WEEKLY;INTERVAL=2;...`, with or without an `RRULE:` prefix.
    fn from_str(s: &str) -> Result<Self> {
        let body = s.trim();
        let body = body.strip_prefix("RRULE:").unwrap_or(body);
        if body.is_empty() {
            return Err(EngineError::InvalidRule("empty RRULE string".to_string()));
        }

        let mut frequency = None;
        let mut interval = 1;
        let mut count = None;
        let mut until = None;

        for part in body.split(';').filter(|p| !p.is_empty()) {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| EngineError::InvalidRule(format!("malformed part '{}'", part)))?;
            match key.trim().to_ascii_uppercase().as_str() {
                "FREQ" => frequency = Some(parse_frequency(value)?),
                "INTERVAL" => interval = parse_number(key, value)?,
                "COUNT" => count = Some(parse_number(key, value)?),
                "UNTIL" => until = Some(value.trim().to_string()),
                _ => {}
            }
        }

        let frequency =
            frequency.ok_or_else(|| EngineError::InvalidRule(format!("no FREQ in '{}'", body)))?;
        if interval == 0 {
            return Err(EngineError::InvalidRule("INTERVAL must be positive".to_string()));
        }

        Ok(Self {
            frequency,
            interval,
            count,
            until,
        })
    }
}

impl RecurrenceRule {
    /// Whether the rule terminates on its own (`COUNT` or `UNTIL`).
    pub fn has_end(&self) -> bool {
        self.count.is_some() || self.until.is_some()
    }

    /// Approximate spacing between occurrences, in days.
    pub fn approx_gap_days(&self) -> Option<f64> {
        let unit = match self.frequency {
            Frequency::Daily => 1.0,
            Frequency::Weekly => 7.0,
            Frequency::Monthly => 30.0,
            Frequency::Yearly => 365.0,
            Frequency::Secondly | Frequency::Minutely | Frequency::Hourly => return None,
        };
        Some(unit * self.interval as f64)
    }

    /// Label by frequency. Only `WEEKLY` looks at the interval; frequencies
    /// without a direct label are bucketed by their spacing.
    pub fn cadence(&self) -> Cadence {
        match (self.frequency, self.interval) {
            (Frequency::Daily, _) => Cadence::Daily,
            (Frequency::Weekly, 2) => Cadence::BiWeekly,
            (Frequency::Weekly, _) => Cadence::Weekly,
            (Frequency::Monthly, _) => Cadence::Monthly,
            _ => self
                .approx_gap_days()
                .map(Cadence::from_gap_days)
                .unwrap_or(Cadence::Daily),
        }
    }
}

fn parse_frequency(value: &str) -> Result<Frequency> {
    match value.trim().to_ascii_uppercase().as_str() {
        "SECONDLY" => Ok(Frequency::Secondly),
        "MINUTELY" => Ok(Frequency::Minutely),
        "HOURLY" => Ok(Frequency::Hourly),
        "DAILY" => Ok(Frequency::Daily),
        "WEEKLY" => Ok(Frequency::Weekly),
        "MONTHLY" => Ok(Frequency::Monthly),
        "YEARLY" => Ok(Frequency::Yearly),
        other => Err(EngineError::InvalidRule(format!("unknown FREQ '{}'", other))),
    }
}

fn parse_number(key: &str, value: &str) -> Result<u32> {
    value
        .trim()
        .parse()
        .map_err(|_| EngineError::InvalidRule(format!("{} is not a number: '{}'", key, value)))
}

/// Average spacing in days between sorted occurrence starts.
///
/// Returns `None` with fewer than two occurrences.
pub fn average_gap_days(starts: &[DateTime<Utc>]) -> Option<f64> {
    if starts.len() < 2 {
        return None;
    }
    let total: f64 = starts
        .windows(2)
        .map(|w| (w[1] - w[0]).num_seconds() as f64 / 86_400.0)
        .sum();
    Some(total / (starts.len() - 1) as f64)
}

/// Cadence from the rule when it parses, else from observed spacing.
pub fn infer_cadence(rule: Option<&RecurrenceRule>, sorted_starts: &[DateTime<Utc>]) -> Cadence {
    if let Some(rule) = rule {
        return rule.cadence();
    }
    average_gap_days(sorted_starts)
        .map(Cadence::from_gap_days)
        .unwrap_or(Cadence::Irregular)
}

/// Build the iCalendar text block the rrule crate parses.
fn rule_set(rule: &str, dtstart: DateTime<Utc>) -> Result<RRuleSet> {
    let body = rule.trim();
    let body = body.strip_prefix("RRULE:").unwrap_or(body);
    if body.is_empty() {
        return Err(EngineError::InvalidRule("empty RRULE string".to_string()));
    }

    let text = format!("DTSTART:{}\nRRULE:{}", dtstart.format("%Y%m%dT%H%M%SZ"), body);
    text.parse()
        .map_err(|e| EngineError::InvalidRule(format!("{}", e)))
}

/// Occurrence starts of `rule` anchored at `dtstart`, within `(after, before)`.
///
/// At most `limit` instances are produced.
///
/// # Errors
/// Returns `EngineError::InvalidRule` if the rule is empty or unparseable.
pub fn occurrences_between(
    rule: &str,
    dtstart: DateTime<Utc>,
    after: DateTime<Utc>,
    before: DateTime<Utc>,
    limit: u16,
) -> Result<Vec<DateTime<Utc>>> {
    let set = rule_set(rule, dtstart)?;
    let tz: rrule::Tz = Utc.into();
    let result = set
        .after(after.with_timezone(&tz))
        .before(before.with_timezone(&tz))
        .all(limit);

    Ok(result
        .dates
        .into_iter()
        .map(|dt| dt.with_timezone(&Utc))
        .filter(|dt| *dt > after && *dt < before)
        .collect())
}

/// The first occurrence of `rule` strictly after `after`, if the rule has one.
///
/// # Errors
/// Returns `EngineError::InvalidRule` if the rule is empty or unparseable.
pub fn next_occurrence(
    rule: &str,
    dtstart: DateTime<Utc>,
    after: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>> {
    let set = rule_set(rule, dtstart)?;
    let tz: rrule::Tz = Utc.into();
    let result = set.after(after.with_timezone(&tz)).all(2);

    Ok(result
        .dates
        .into_iter()
        .map(|dt| dt.with_timezone(&Utc))
        .find(|dt| *dt > after))
}
