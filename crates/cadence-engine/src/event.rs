//! Calendar event data model and normalization.
//!
//! Events arrive in the provider's JSON shape (camelCase keys, `start` /
//! `end` objects carrying either a `dateTime` or an all-day `date`). The
//! engine only ever reads them; normalization produces [`TimedEvent`] views
//! with resolved half-open `[start, end)` instants.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::options::EngineOptions;

/// Start or end of an event: a timestamped instant or an all-day date.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventTime {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventTime {
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self {
            date_time: Some(instant),
            ..Self::default()
        }
    }

    pub fn all_day(date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            ..Self::default()
        }
    }

    /// True when this is a date-only value with no instant.
    pub fn is_all_day(&self) -> bool {
        self.date_time.is_none() && self.date.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    #[default]
    Confirmed,
    Tentative,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseStatus {
    Accepted,
    Declined,
    Tentative,
    #[default]
    NeedsAction,
}

/// Organizer or creator of an event.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Person {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(rename = "self")]
    pub is_self: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Attendee {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub response_status: ResponseStatus,
    #[serde(rename = "self")]
    pub is_self: bool,
    /// Rooms and other bookable resources.
    pub resource: bool,
}

/// Address fragments that identify non-human attendees.
const SERVICE_DOMAINS: &[&str] = &[
    "resource.calendar.google.com",
    "group.calendar.google.com",
    "group.v.calendar.google.com",
    "import.calendar.google.com",
];
const SERVICE_LOCAL_PREFIXES: &[&str] = &["noreply", "no-reply", "calendar-notification"];

impl Attendee {
    pub fn new(email: impl Into<String>, response_status: ResponseStatus) -> Self {
        Self {
            email: email.into(),
            response_status,
            ..Self::default()
        }
    }

    /// Rooms, group calendars and notification mailboxes.
    pub fn is_service(&self) -> bool {
        if self.resource {
            return true;
        }
        let email = self.email.to_ascii_lowercase();
        let (local, domain) = email.rsplit_once('@').unwrap_or((email.as_str(), ""));
        SERVICE_DOMAINS.iter().any(|d| domain.ends_with(d))
            || SERVICE_LOCAL_PREFIXES.iter().any(|p| local.starts_with(p))
    }

    pub fn is_owner(&self, options: &EngineOptions) -> bool {
        self.is_self || options.is_owner(&self.email)
    }
}

/// A calendar event as supplied by the provider client.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Event {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start: Option<EventTime>,
    pub end: Option<EventTime>,
    pub attendees: Vec<Attendee>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizer: Option<Person>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator: Option<Person>,
    pub status: EventStatus,
    /// RRULE / EXDATE lines, present on series masters.
    pub recurrence: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurring_event_id: Option<String>,
    #[serde(rename = "iCalUID", skip_serializing_if = "Option::is_none")]
    pub ical_uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
}

impl Event {
    /// A confirmed, timed event with no attendees.
    pub fn timed(id: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            start: Some(EventTime::at(start)),
            end: Some(EventTime::at(end)),
            ..Self::default()
        }
    }

    pub fn title(&self) -> &str {
        self.summary.as_deref().unwrap_or("")
    }

    pub fn is_all_day(&self) -> bool {
        self.start.as_ref().is_some_and(EventTime::is_all_day)
    }

    /// Resolve `[start, end)` instants. All-day and start-less events have no
    /// timed span. A missing or non-positive end is clamped to
    /// `start + default_minutes`.
    pub fn timed_span(&self, default_minutes: i64) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let start = self.start.as_ref()?.date_time?;
        let end = self
            .end
            .as_ref()
            .and_then(|e| e.date_time)
            .filter(|end| *end > start)
            .unwrap_or(start + Duration::minutes(default_minutes));
        Some((start, end))
    }

    /// Email of the organizer, falling back to the creator.
    pub fn organizer_email(&self) -> Option<&str> {
        self.organizer
            .as_ref()
            .or(self.creator.as_ref())
            .map(|p| p.email.as_str())
            .filter(|e| !e.is_empty())
    }

    /// Attendees that are people rather than rooms or mailboxes.
    pub fn participants(&self) -> impl Iterator<Item = &Attendee> {
        self.attendees.iter().filter(|a| !a.is_service())
    }

    /// A genuine meeting has at least one participant besides the owner.
    /// Solo holds such as "Focus Time" are placeholders.
    pub fn is_meeting(&self, options: &EngineOptions) -> bool {
        self.participants().any(|a| !a.is_owner(options))
    }

    /// The owner's own response on this event, if the owner is listed.
    pub fn owner_response(&self, options: &EngineOptions) -> Option<ResponseStatus> {
        self.attendees
            .iter()
            .find(|a| a.is_owner(options))
            .map(|a| a.response_status)
    }

    /// Cancelled events and events the owner declined do not occupy time.
    pub fn blocks_time(&self, options: &EngineOptions) -> bool {
        self.status != EventStatus::Cancelled
            && self.owner_response(options) != Some(ResponseStatus::Declined)
    }

    /// True for series masters and expanded instances alike.
    pub fn is_recurring(&self) -> bool {
        self.recurring_event_id.is_some() || self.recurrence_rule().is_some()
    }

    /// The RRULE body (without the `RRULE:` prefix), if any line carries one.
    pub fn recurrence_rule(&self) -> Option<&str> {
        self.recurrence.iter().find_map(|line| {
            let line = line.trim();
            if let Some(rule) = line.strip_prefix("RRULE:") {
                Some(rule)
            } else if line.starts_with("FREQ=") {
                Some(line)
            } else {
                None
            }
        })
    }

    pub fn has_agenda(&self) -> bool {
        self.description
            .as_deref()
            .is_some_and(|d| !d.trim().is_empty())
    }
}

/// An event with resolved instants, borrowed from the caller's list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedEvent<'a> {
    pub event: &'a Event,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimedEvent<'_> {
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    pub fn summary(&self, options: &EngineOptions) -> EventSummary {
        EventSummary {
            id: self.event.id.clone(),
            title: self.event.title().to_string(),
            start: self.start,
            end: self.end,
            is_meeting: self.event.is_meeting(options),
        }
    }
}

/// Compact event reference carried by gap and conflict records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSummary {
    pub id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// False for solo placeholders.
    pub is_meeting: bool,
}

/// Resolve every time-blocking, timed event and sort by `(start, end)`.
///
/// All-day, cancelled, declined and start-less events are excluded.
pub fn normalize_events<'a>(events: &'a [Event], options: &EngineOptions) -> Vec<TimedEvent<'a>> {
    let mut timed: Vec<TimedEvent<'a>> = events
        .iter()
        .filter(|e| e.blocks_time(options))
        .filter_map(|event| {
            event
                .timed_span(options.default_event_minutes)
                .map(|(start, end)| TimedEvent { event, start, end })
        })
        .collect();

    let dropped = events.len() - timed.len();
    if dropped > 0 {
        debug!(dropped, total = events.len(), "excluded non-timed or non-blocking events");
    }

    timed.sort_by_key(|t| (t.start, t.end));
    timed
}
