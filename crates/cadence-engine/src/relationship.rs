//! One-on-one relationship cadence tracking.
//!
//! Only meetings with exactly two human participants, one of them the owner,
//! count. Each counterpart gets a snapshot of how often and how recently the
//! two have met, and a health status derived from that.

use std::cmp::Reverse;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::event::{Attendee, Event};
use crate::options::EngineOptions;
use crate::recurrence::average_gap_days;

/// Health of a relationship, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationshipStatus {
    Critical,
    Overdue,
    Healthy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingSample {
    pub id: String,
    pub title: String,
    pub start: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipSnapshot {
    pub email: String,
    pub name: Option<String>,
    pub last_meeting: Option<MeetingSample>,
    pub next_meeting: Option<MeetingSample>,
    pub meeting_count: usize,
    pub average_gap_days: Option<f64>,
    pub days_since_last: Option<i64>,
    pub days_until_next: Option<i64>,
    pub is_recurring: bool,
    pub status: RelationshipStatus,
}

/// Status rules: no past meeting or more than `critical_days` since the last
/// one is critical; more than twice the average gap is overdue.
pub fn classify_relationship(
    average_gap_days: Option<f64>,
    days_since_last: Option<i64>,
    critical_days: i64,
) -> RelationshipStatus {
    let Some(days) = days_since_last else {
        return RelationshipStatus::Critical;
    };
    if days > critical_days {
        return RelationshipStatus::Critical;
    }
    match average_gap_days {
        Some(avg) if days as f64 > 2.0 * avg => RelationshipStatus::Overdue,
        _ => RelationshipStatus::Healthy,
    }
}

/// The counterpart of a one-on-one, or `None` if `event` is not one.
fn counterpart<'a>(event: &'a Event, options: &EngineOptions) -> Option<&'a Attendee> {
    let participants: Vec<&Attendee> = event.participants().collect();
    if participants.len() != 2 {
        return None;
    }
    match (participants[0].is_owner(options), participants[1].is_owner(options)) {
        (true, false) => Some(participants[1]),
        (false, true) => Some(participants[0]),
        _ => None,
    }
}

struct Meeting<'a> {
    event: &'a Event,
    start: DateTime<Utc>,
}

impl Meeting<'_> {
    fn sample(&self) -> MeetingSample {
        MeetingSample {
            id: self.event.id.clone(),
            title: self.event.title().to_string(),
            start: self.start,
        }
    }
}

/// Snapshot every one-on-one counterpart, most urgent first.
///
/// Ordering: status severity, then days since the last meeting descending
/// (never-met counterparts first), then email.
pub fn track_relationships(
    events: &[Event],
    now: DateTime<Utc>,
    options: &EngineOptions,
) -> Vec<RelationshipSnapshot> {
    let mut by_counterpart: BTreeMap<String, (Option<String>, Vec<Meeting<'_>>)> = BTreeMap::new();

    for event in events.iter().filter(|e| e.blocks_time(options)) {
        let Some(other) = counterpart(event, options) else {
            continue;
        };
        let Some((start, _)) = event.timed_span(options.default_event_minutes) else {
            continue;
        };
        let entry = by_counterpart
            .entry(other.email.to_ascii_lowercase())
            .or_insert_with(|| (None, Vec::new()));
        if entry.0.is_none() {
            entry.0 = other.display_name.clone();
        }
        entry.1.push(Meeting { event, start });
    }

    let mut snapshots: Vec<RelationshipSnapshot> = by_counterpart
        .into_iter()
        .map(|(email, (name, mut meetings))| {
            meetings.sort_by_key(|m| m.start);
            let (past, future): (Vec<&Meeting<'_>>, Vec<&Meeting<'_>>) =
                meetings.iter().partition(|m| m.start <= now);

            let mut past_starts: Vec<DateTime<Utc>> = past.iter().map(|m| m.start).collect();
            // Same-instant duplicates would contribute zero-length gaps.
            past_starts.dedup();
            let average_gap_days = average_gap_days(&past_starts);

            let last = past.last();
            let next = future.first();
            let days_since_last = last.map(|m| (now - m.start).num_days());
            let days_until_next = next.map(|m| (m.start - now).num_days());

            RelationshipSnapshot {
                email,
                name,
                last_meeting: last.map(|m| m.sample()),
                next_meeting: next.map(|m| m.sample()),
                meeting_count: meetings.len(),
                average_gap_days,
                days_since_last,
                days_until_next,
                is_recurring: meetings.iter().any(|m| m.event.is_recurring()),
                status: classify_relationship(
                    average_gap_days,
                    days_since_last,
                    options.relationship_critical_days,
                ),
            }
        })
        .collect();

    snapshots.sort_by_key(|s| {
        (
            s.status,
            Reverse(s.days_since_last.unwrap_or(i64::MAX)),
            s.email.clone(),
        )
    });

    debug!(counterparts = snapshots.len(), "tracked one-on-one relationships");
    snapshots
}
