//! Tests for gap classification between consecutive events.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use cadence_engine::event::{Attendee, Event, EventTime, ResponseStatus};
use cadence_engine::gaps::{classify_gaps, GapStatus};
use cadence_engine::EngineOptions;

const OWNER: &str = "owner@acme.com";

fn at(hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 16, hour, min, 0).unwrap()
}

fn options() -> EngineOptions {
    EngineOptions::default().with_owner(OWNER)
}

fn meeting(id: &str, start: (u32, u32), end: (u32, u32)) -> Event {
    let mut event = Event::timed(id, at(start.0, start.1), at(end.0, end.1));
    event.summary = Some(format!("Meeting {}", id));
    event.attendees = vec![
        Attendee::new(OWNER, ResponseStatus::Accepted),
        Attendee::new("peer@acme.com", ResponseStatus::Accepted),
    ];
    event
}

fn placeholder(id: &str, start: (u32, u32), end: (u32, u32)) -> Event {
    let mut event = Event::timed(id, at(start.0, start.1), at(end.0, end.1));
    event.summary = Some("Focus Time".to_string());
    event
}

fn status_between(first: Event, second: Event) -> GapStatus {
    let records = classify_gaps(&[first, second], &options());
    assert_eq!(records.len(), 1);
    records[0].status
}

#[test]
fn zero_minute_gap_is_back_to_back() {
    let status = status_between(meeting("a", (9, 0), (10, 0)), meeting("b", (10, 0), (11, 0)));
    assert_eq!(status, GapStatus::BackToBack);
}

#[test]
fn five_minute_gap_is_insufficient_buffer() {
    let status = status_between(meeting("a", (9, 0), (10, 0)), meeting("b", (10, 5), (11, 0)));
    assert_eq!(status, GapStatus::InsufficientBuffer);
}

#[test]
fn ten_minute_gap_is_normal() {
    let status = status_between(meeting("a", (9, 0), (10, 0)), meeting("b", (10, 10), (11, 0)));
    assert_eq!(status, GapStatus::Normal);
}

#[test]
fn ninety_minute_gap_is_focus_block() {
    let status = status_between(meeting("a", (9, 0), (10, 0)), meeting("b", (11, 30), (12, 0)));
    assert_eq!(status, GapStatus::FocusBlock);
}

#[test]
fn focus_block_bounds_are_inclusive() {
    let sixty = status_between(meeting("a", (9, 0), (10, 0)), meeting("b", (11, 0), (12, 0)));
    let one_twenty = status_between(meeting("a", (9, 0), (10, 0)), meeting("b", (12, 0), (13, 0)));
    assert_eq!(sixty, GapStatus::FocusBlock);
    assert_eq!(one_twenty, GapStatus::FocusBlock);
}

#[test]
fn one_hundred_fifty_minute_gap_is_normal() {
    let status = status_between(meeting("a", (9, 0), (10, 0)), meeting("b", (12, 30), (13, 0)));
    assert_eq!(status, GapStatus::Normal);
}

#[test]
fn placeholder_after_meeting_is_suppressed() {
    let status = status_between(
        meeting("a", (9, 0), (10, 0)),
        placeholder("focus", (10, 0), (11, 0)),
    );
    assert_eq!(status, GapStatus::Normal);
}

#[test]
fn single_invitee_events_are_meetings() {
    let invite = |id: &str, start: (u32, u32), end: (u32, u32), guest: &str| {
        let mut event = Event::timed(id, at(start.0, start.1), at(end.0, end.1));
        event.attendees = vec![Attendee::new(guest, ResponseStatus::NeedsAction)];
        event
    };

    let status = status_between(
        invite("a", (9, 0), (10, 0), "bob@acme.com"),
        invite("b", (10, 0), (11, 0), "carol@acme.com"),
    );
    assert_eq!(status, GapStatus::BackToBack);

    // Only the owner listed: still a placeholder.
    let status = status_between(
        meeting("a", (9, 0), (10, 0)),
        invite("hold", (10, 0), (11, 0), OWNER),
    );
    assert_eq!(status, GapStatus::Normal);
}

#[test]
fn records_carry_pair_minutes_and_recommendation() {
    let records = classify_gaps(
        &[meeting("b", (10, 5), (11, 0)), meeting("a", (9, 0), (10, 0))],
        &options(),
    );

    assert_eq!(records[0].before.id, "a", "events are sorted by start first");
    assert_eq!(records[0].after.id, "b");
    assert_eq!(records[0].gap_minutes, 5);
    assert_eq!(
        records[0].recommendation,
        GapStatus::InsufficientBuffer.recommendation()
    );
}

#[test]
fn all_day_events_are_excluded() {
    let date = NaiveDate::from_ymd_opt(2026, 3, 16).unwrap();
    let mut all_day = meeting("offsite", (0, 0), (0, 0));
    all_day.start = Some(EventTime::all_day(date));
    all_day.end = Some(EventTime::all_day(date.succ_opt().unwrap()));

    let records = classify_gaps(
        &[meeting("a", (9, 0), (10, 0)), all_day, meeting("b", (10, 0), (11, 0))],
        &options(),
    );

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, GapStatus::BackToBack);
}

#[test]
fn each_gap_is_classified_independently() {
    let records = classify_gaps(
        &[
            meeting("a", (9, 0), (10, 0)),
            meeting("b", (10, 0), (11, 0)),
            meeting("c", (11, 5), (12, 0)),
            meeting("d", (13, 30), (14, 0)),
        ],
        &options(),
    );

    let statuses: Vec<GapStatus> = records.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![
            GapStatus::BackToBack,
            GapStatus::InsufficientBuffer,
            GapStatus::FocusBlock,
        ]
    );
}

#[test]
fn statuses_serialize_as_kebab_case() {
    let json = serde_json::to_string(&GapStatus::InsufficientBuffer).unwrap();
    assert_eq!(json, "\"insufficient-buffer\"");
}
