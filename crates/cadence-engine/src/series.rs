//! Recurring-series grouping and per-series metrics.
//!
//! Events are grouped into logical series by trying an ordered list of key
//! derivation strategies; the first strategy that yields a key wins. Each
//! series then gets a cadence, time-cost metrics, audience split and flags.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::event::{Event, EventStatus, ResponseStatus};
use crate::options::{email_domain, EngineOptions};
use crate::recurrence::{
    average_gap_days, infer_cadence, next_occurrence as next_rule_occurrence, occurrences_between,
    Cadence, RecurrenceRule,
};

/// Heuristic keys bucket durations to this many minutes.
const DURATION_BUCKET_MINUTES: i64 = 15;
/// Length of the trailing/leading measurement windows.
const MEASUREMENT_WINDOW_DAYS: i64 = 30;

/// One way of deriving a series key from an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyStrategy {
    /// iCalendar UID with any `_R<date>[T<time>]` modification suffix removed.
    BaseUid,
    /// The provider's recurring-series reference id.
    SeriesReference,
    /// The event's own id, when it carries a recurrence rule.
    MasterId,
    /// Normalized title + organizer + duration bucket.
    Heuristic,
}

/// Strategies in precedence order.
pub const DEFAULT_KEY_STRATEGIES: [KeyStrategy; 4] = [
    KeyStrategy::BaseUid,
    KeyStrategy::SeriesReference,
    KeyStrategy::MasterId,
    KeyStrategy::Heuristic,
];

impl KeyStrategy {
    /// Derive this strategy's key for `event`, if it applies.
    pub fn derive(&self, event: &Event, default_minutes: i64) -> Option<String> {
        match self {
            KeyStrategy::BaseUid => {
                let uid = event.ical_uid.as_deref()?.trim();
                if uid.is_empty() {
                    return None;
                }
                match strip_modification_suffix(uid) {
                    Some(base) => Some(format!("uid:{}", base)),
                    // A plain UID only links events the provider marks recurring.
                    None if event.is_recurring() => Some(format!("uid:{}", uid)),
                    None => None,
                }
            }
            KeyStrategy::SeriesReference => event
                .recurring_event_id
                .as_deref()
                .filter(|id| !id.is_empty())
                .map(|id| format!("series:{}", id)),
            KeyStrategy::MasterId => (event.recurrence_rule().is_some() && !event.id.is_empty())
                .then(|| format!("master:{}", event.id)),
            KeyStrategy::Heuristic => {
                let title = normalize_title(event.title());
                if title.is_empty() {
                    return None;
                }
                let organizer = event
                    .organizer_email()
                    .map(str::to_ascii_lowercase)
                    .unwrap_or_default();
                let minutes = event
                    .timed_span(default_minutes)
                    .map(|(start, end)| (end - start).num_minutes())
                    .unwrap_or(0);
                let bucket = ((minutes as f64 / DURATION_BUCKET_MINUTES as f64).round() as i64)
                    * DURATION_BUCKET_MINUTES;
                Some(format!("heuristic:{}|{}|{}", title, organizer, bucket))
            }
        }
    }
}

/// First key produced by `strategies`, tried in order.
pub fn series_key(
    event: &Event,
    strategies: &[KeyStrategy],
    default_minutes: i64,
) -> Option<(KeyStrategy, String)> {
    strategies
        .iter()
        .find_map(|s| s.derive(event, default_minutes).map(|key| (*s, key)))
}

/// Remove a provider modification suffix: `abc_R20240101T120000@google.com`
/// becomes `abc@google.com`. Returns `None` when no suffix is present.
pub fn strip_modification_suffix(uid: &str) -> Option<String> {
    let (local, domain) = uid.rsplit_once('@')?;
    if domain.is_empty() {
        return None;
    }
    let idx = local.rfind("_R")?;
    let tail = &local[idx + 2..];
    let digits = |s: &str, n: usize| s.len() == n && s.bytes().all(|b| b.is_ascii_digit());

    if !tail.is_ascii() {
        return None;
    }
    let valid = match tail.len() {
        8 => digits(tail, 8),
        15 => digits(&tail[..8], 8) && tail.as_bytes()[8] == b'T' && digits(&tail[9..], 6),
        _ => false,
    };
    (valid && idx > 0).then(|| format!("{}@{}", &local[..idx], domain))
}

fn normalize_title(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SeriesFlag {
    /// Attendee count × monthly minutes at or above the configured threshold.
    HighPeopleHours,
    /// External attendees on a series with no end in sight.
    ExternalNoEnd,
    /// Not updated within the staleness window.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Audience {
    Internal,
    External,
    Mixed,
}

/// Which measurement produced the monthly minutes figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MinutesSource {
    TrailingWindow,
    LeadingWindow,
    Projected,
}

/// One instance of a series, in start order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesInstance {
    pub id: String,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub status: EventStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesMetrics {
    pub instance_count: usize,
    pub cancelled_count: usize,
    pub average_duration_minutes: f64,
    pub weekly_minutes: f64,
    pub monthly_minutes: f64,
    pub minutes_source: MinutesSource,
    /// Distinct human attendees, owner included.
    pub attendee_count: usize,
    pub internal_attendees: usize,
    pub external_attendees: usize,
    pub people_minutes_monthly: f64,
    /// Accepted ÷ answered responses; 1.0 when nobody answered.
    pub acceptance_rate: f64,
    /// Cancelled ÷ total instances; 0.0 for an empty series.
    pub cancellation_rate: f64,
    pub agenda_missing: bool,
    pub last_updated: Option<DateTime<Utc>>,
    pub days_since_update: Option<i64>,
    /// `Some` when a recurrence rule is known: whether it has COUNT/UNTIL.
    pub has_end: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesGroup {
    pub key: String,
    pub strategy: KeyStrategy,
    pub title: String,
    pub organizer: Option<String>,
    pub instances: Vec<SeriesInstance>,
    pub cadence: Cadence,
    pub metrics: SeriesMetrics,
    pub flags: Vec<SeriesFlag>,
    pub is_placeholder: bool,
    /// `None` for placeholders.
    pub audience: Option<Audience>,
    pub last_occurrence: Option<DateTime<Utc>>,
    pub next_occurrence: Option<DateTime<Utc>>,
}

impl SeriesGroup {
    pub fn has_flag(&self, flag: SeriesFlag) -> bool {
        self.flags.contains(&flag)
    }
}

/// Totals across all resolved series.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesSummary {
    pub series_count: usize,
    pub placeholder_count: usize,
    pub total_monthly_minutes: f64,
    pub total_people_minutes: f64,
    pub high_people_hours_count: usize,
    pub external_no_end_count: usize,
    pub stale_count: usize,
    pub by_cadence: BTreeMap<Cadence, usize>,
}

/// Group `events` into series with the default strategy order.
pub fn resolve_series(events: &[Event], now: DateTime<Utc>, options: &EngineOptions) -> Vec<SeriesGroup> {
    resolve_series_with(events, now, options, &DEFAULT_KEY_STRATEGIES)
}

/// Group `events` into series, trying `strategies` in order for each event.
///
/// A group is kept when it has at least two instances or any instance is
/// linked to a recurrence (rule or series reference). Output is ordered by
/// monthly minutes descending, then key.
pub fn resolve_series_with(
    events: &[Event],
    now: DateTime<Utc>,
    options: &EngineOptions,
    strategies: &[KeyStrategy],
) -> Vec<SeriesGroup> {
    let mut groups: BTreeMap<String, (KeyStrategy, Vec<&Event>)> = BTreeMap::new();
    for event in events {
        if let Some((strategy, key)) = series_key(event, strategies, options.default_event_minutes) {
            groups
                .entry(key)
                .or_insert_with(|| (strategy, Vec::new()))
                .1
                .push(event);
        }
    }

    let mut series: Vec<SeriesGroup> = groups
        .into_iter()
        .filter(|(_, (_, members))| members.len() >= 2 || members.iter().any(|e| e.is_recurring()))
        .map(|(key, (strategy, members))| build_group(key, strategy, members, now, options))
        .collect();

    series.sort_by(|a, b| {
        b.metrics
            .monthly_minutes
            .total_cmp(&a.metrics.monthly_minutes)
            .then_with(|| a.key.cmp(&b.key))
    });

    debug!(events = events.len(), series = series.len(), "resolved recurring series");
    series
}

/// Start of an instance: its timed start, or midnight UTC of an all-day date.
fn instance_start(event: &Event) -> Option<DateTime<Utc>> {
    let start = event.start.as_ref()?;
    start
        .date_time
        .or_else(|| start.date.map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc()))
}

fn build_group(
    key: String,
    strategy: KeyStrategy,
    mut members: Vec<&Event>,
    now: DateTime<Utc>,
    options: &EngineOptions,
) -> SeriesGroup {
    members.sort_by(|a, b| {
        instance_start(a)
            .cmp(&instance_start(b))
            .then_with(|| a.id.cmp(&b.id))
    });

    let default_minutes = options.default_event_minutes;
    let active: Vec<&Event> = members
        .iter()
        .copied()
        .filter(|e| e.status != EventStatus::Cancelled)
        .collect();

    // Rule and anchor come from the first member carrying a parseable rule.
    let master = members.iter().find_map(|e| {
        let raw = e.recurrence_rule()?;
        match raw.parse::<RecurrenceRule>() {
            Ok(rule) => Some((*e, raw, rule)),
            Err(err) => {
                warn!(event = %e.id, error = %err, "unparseable recurrence rule, inferring cadence");
                None
            }
        }
    });

    let starts: Vec<DateTime<Utc>> = active.iter().filter_map(|e| instance_start(e)).collect();
    let cadence = infer_cadence(master.as_ref().map(|(_, _, rule)| rule), &starts);

    // Durations and measurement windows.
    let spans: Vec<(DateTime<Utc>, DateTime<Utc>)> = active
        .iter()
        .filter_map(|e| e.timed_span(default_minutes))
        .collect();
    let average_duration_minutes = if spans.is_empty() {
        0.0
    } else {
        spans.iter().map(|(s, e)| (*e - *s).num_minutes() as f64).sum::<f64>() / spans.len() as f64
    };

    let window = Duration::days(MEASUREMENT_WINDOW_DAYS);
    let minutes_in = |from: DateTime<Utc>, to: DateTime<Utc>| -> f64 {
        spans
            .iter()
            .filter(|(s, _)| *s >= from && *s < to)
            .map(|(s, e)| (*e - *s).num_minutes() as f64)
            .sum()
    };

    let trailing = minutes_in(now - window, now);
    let mut leading = minutes_in(now, now + window);
    if leading == 0.0 {
        if let Some((event, raw, _)) = &master {
            if let Some(anchor) = instance_start(event) {
                match occurrences_between(raw, anchor, now, now + window, 200) {
                    Ok(upcoming) => leading = upcoming.len() as f64 * average_duration_minutes,
                    Err(err) => warn!(event = %event.id, error = %err, "recurrence expansion failed"),
                }
            }
        }
    }

    let (monthly_minutes, minutes_source) = if trailing > 0.0 {
        (trailing, MinutesSource::TrailingWindow)
    } else if leading > 0.0 {
        (leading, MinutesSource::LeadingWindow)
    } else {
        (
            project_monthly_minutes(cadence, average_duration_minutes, &starts),
            MinutesSource::Projected,
        )
    };
    let weekly_minutes = monthly_minutes * 7.0 / MEASUREMENT_WINDOW_DAYS as f64;

    // Audience.
    let owner_domain = options.owner_domain().or_else(|| {
        members
            .iter()
            .flat_map(|e| e.attendees.iter())
            .find(|a| a.is_self)
            .and_then(|a| email_domain(&a.email))
            .or_else(|| members.iter().find_map(|e| e.organizer_email().and_then(email_domain)))
    });

    let mut owner_present = false;
    let mut others: BTreeSet<String> = BTreeSet::new();
    for attendee in members.iter().flat_map(|e| e.participants()) {
        if attendee.is_owner(options) {
            owner_present = true;
        } else if !attendee.email.is_empty() {
            others.insert(attendee.email.to_ascii_lowercase());
        }
    }

    let is_placeholder = others.is_empty();
    let (internal_attendees, external_attendees) = if is_placeholder {
        (0, 0)
    } else {
        let external = others
            .iter()
            .filter(|email| match (&owner_domain, email_domain(email)) {
                (Some(owner), Some(domain)) => *owner != domain,
                _ => false,
            })
            .count();
        (others.len() - external, external)
    };
    let attendee_count = others.len() + usize::from(owner_present || !is_placeholder);
    let audience = match (is_placeholder, internal_attendees, external_attendees) {
        (true, _, _) => None,
        (false, _, 0) => Some(Audience::Internal),
        (false, 0, _) => Some(Audience::External),
        _ => Some(Audience::Mixed),
    };

    // Responses.
    let (accepted, answered) = members
        .iter()
        .flat_map(|e| e.participants())
        .fold((0usize, 0usize), |(acc, ans), a| match a.response_status {
            ResponseStatus::NeedsAction => (acc, ans),
            ResponseStatus::Accepted => (acc + 1, ans + 1),
            ResponseStatus::Declined | ResponseStatus::Tentative => (acc, ans + 1),
        });
    let acceptance_rate = if answered == 0 {
        1.0
    } else {
        accepted as f64 / answered as f64
    };

    let cancelled_count = members.len() - active.len();
    let cancellation_rate = if members.is_empty() {
        0.0
    } else {
        cancelled_count as f64 / members.len() as f64
    };

    let agenda_missing = members.iter().all(|e| !e.has_agenda());
    let last_updated = members.iter().filter_map(|e| e.updated).max();
    let days_since_update = last_updated.map(|u| (now - u).num_days());

    // Occurrences.
    let last_occurrence = starts.iter().copied().filter(|s| *s <= now).max();
    let next_occurrence = starts.iter().copied().filter(|s| *s > now).min().or_else(|| {
        let (event, raw, _) = master.as_ref()?;
        let anchor = instance_start(event)?;
        next_rule_occurrence(raw, anchor, now).unwrap_or_else(|err| {
            warn!(event = %event.id, error = %err, "recurrence expansion failed");
            None
        })
    });

    let has_end = master.as_ref().map(|(_, _, rule)| rule.has_end());
    let people_minutes_monthly = attendee_count as f64 * monthly_minutes;

    let mut flags = Vec::new();
    if !is_placeholder && people_minutes_monthly >= options.people_minutes_threshold {
        flags.push(SeriesFlag::HighPeopleHours);
    }
    let open_ended = match has_end {
        Some(ends) => !ends,
        None => next_occurrence.is_some(),
    };
    if external_attendees > 0 && open_ended {
        flags.push(SeriesFlag::ExternalNoEnd);
    }
    if days_since_update.is_some_and(|d| d >= options.stale_after_days) {
        flags.push(SeriesFlag::Stale);
    }

    let latest = members.last().copied();
    SeriesGroup {
        key,
        strategy,
        title: latest.map(|e| e.title().to_string()).unwrap_or_default(),
        organizer: latest.and_then(|e| e.organizer_email()).map(str::to_string),
        instances: members
            .iter()
            .map(|e| {
                let span = e.timed_span(default_minutes);
                SeriesInstance {
                    id: e.id.clone(),
                    start: instance_start(e),
                    end: span.map(|(_, end)| end),
                    status: e.status,
                }
            })
            .collect(),
        cadence,
        metrics: SeriesMetrics {
            instance_count: members.len(),
            cancelled_count,
            average_duration_minutes,
            weekly_minutes,
            monthly_minutes,
            minutes_source,
            attendee_count,
            internal_attendees,
            external_attendees,
            people_minutes_monthly,
            acceptance_rate,
            cancellation_rate,
            agenda_missing,
            last_updated,
            days_since_update,
            has_end,
        },
        flags,
        is_placeholder,
        audience,
        last_occurrence,
        next_occurrence,
    }
}

/// Averaged projection used when neither measurement window saw an instance.
fn project_monthly_minutes(cadence: Cadence, average_minutes: f64, starts: &[DateTime<Utc>]) -> f64 {
    let per_month = cadence.occurrences_per_month().or_else(|| {
        average_gap_days(starts)
            .filter(|gap| *gap > 0.0)
            .map(|gap| MEASUREMENT_WINDOW_DAYS as f64 / gap)
    });
    per_month.map(|n| n * average_minutes).unwrap_or(0.0)
}

/// Totals across `series`.
pub fn summarize_series(series: &[SeriesGroup]) -> SeriesSummary {
    let mut summary = SeriesSummary {
        series_count: series.len(),
        ..SeriesSummary::default()
    };
    for group in series {
        if group.is_placeholder {
            summary.placeholder_count += 1;
        }
        summary.total_monthly_minutes += group.metrics.monthly_minutes;
        summary.total_people_minutes += group.metrics.people_minutes_monthly;
        for flag in &group.flags {
            match flag {
                SeriesFlag::HighPeopleHours => summary.high_people_hours_count += 1,
                SeriesFlag::ExternalNoEnd => summary.external_no_end_count += 1,
                SeriesFlag::Stale => summary.stale_count += 1,
            }
        }
        *summary.by_cadence.entry(group.cadence).or_insert(0) += 1;
    }
    summary
}

/// Advisory change suggested for a flagged series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SeriesAction {
    Shorten,
    AddEndDate,
    Review,
}

/// A recommendation the caller may hand to an action executor. Nothing here
/// mutates a calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionPreview {
    pub series_key: String,
    pub title: String,
    pub action: SeriesAction,
    pub rationale: String,
    pub monthly_minutes_reclaimed: f64,
}

/// Share of time a shortened series gives back.
const SHORTEN_FRACTION: f64 = 0.25;
/// Below this acceptance rate a stale series is a cancellation candidate.
const LOW_ACCEPTANCE: f64 = 0.5;

/// One preview per flag on every flagged series, in series order.
pub fn recommend_actions(series: &[SeriesGroup]) -> Vec<ActionPreview> {
    let mut previews = Vec::new();
    for group in series {
        for flag in &group.flags {
            let (action, rationale, reclaimed) = match flag {
                SeriesFlag::HighPeopleHours => (
                    SeriesAction::Shorten,
                    format!(
                        "{} people spend {:.0} minutes a month in this series",
                        group.metrics.attendee_count, group.metrics.people_minutes_monthly
                    ),
                    group.metrics.monthly_minutes * SHORTEN_FRACTION,
                ),
                SeriesFlag::ExternalNoEnd => (
                    SeriesAction::AddEndDate,
                    format!(
                        "{} external attendee(s) on a series with no end date",
                        group.metrics.external_attendees
                    ),
                    0.0,
                ),
                SeriesFlag::Stale => {
                    let reclaim = if group.metrics.acceptance_rate < LOW_ACCEPTANCE
                        || group.metrics.agenda_missing
                    {
                        group.metrics.monthly_minutes
                    } else {
                        0.0
                    };
                    (
                        SeriesAction::Review,
                        format!(
                            "not updated in {} days",
                            group.metrics.days_since_update.unwrap_or_default()
                        ),
                        reclaim,
                    )
                }
            };
            previews.push(ActionPreview {
                series_key: group.key.clone(),
                title: group.title.clone(),
                action,
                rationale,
                monthly_minutes_reclaimed: reclaimed,
            });
        }
    }
    previews
}
