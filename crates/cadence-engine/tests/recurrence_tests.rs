//! Tests for RRULE inspection, cadence inference and rule expansion.

use chrono::{DateTime, Duration, TimeZone, Utc};
use cadence_engine::error::EngineError;
use cadence_engine::recurrence::{
    average_gap_days, infer_cadence, next_occurrence, occurrences_between, Cadence, Frequency,
    RecurrenceRule,
};

fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

// ---------------------------------------------------------------------------
// Rule parsing
// ---------------------------------------------------------------------------

#[test]
fn parses_prefixed_and_bare_rules() {
    let prefixed: RecurrenceRule = "RRULE:FREQ=WEEKLY;INTERVAL=2;BYDAY=MO,WE".parse().unwrap();
    let bare: RecurrenceRule = "FREQ=WEEKLY;INTERVAL=2;BYDAY=MO,WE".parse().unwrap();

    assert_eq!(prefixed, bare);
    assert_eq!(prefixed.frequency, Frequency::Weekly);
    assert_eq!(prefixed.interval, 2);
    assert!(!prefixed.has_end());
}

#[test]
fn count_and_until_mark_an_end() {
    let counted: RecurrenceRule = "FREQ=DAILY;COUNT=5".parse().unwrap();
    let until: RecurrenceRule = "FREQ=MONTHLY;UNTIL=20261231T000000Z".parse().unwrap();

    assert_eq!(counted.count, Some(5));
    assert!(counted.has_end());
    assert_eq!(until.until.as_deref(), Some("20261231T000000Z"));
    assert!(until.has_end());
}

#[test]
fn malformed_rules_are_rejected() {
    for bad in ["", "RRULE:", "INTERVAL=2", "FREQ=SOMETIMES", "FREQ=DAILY;INTERVAL=0", "FREQ=DAILY;COUNT=x", "FREQ"] {
        let err = bad.parse::<RecurrenceRule>().unwrap_err();
        assert!(matches!(err, EngineError::InvalidRule(_)), "rule {:?}", bad);
    }
}

// ---------------------------------------------------------------------------
// Cadence
// ---------------------------------------------------------------------------

#[test]
fn rule_cadence_labels() {
    let cadence = |s: &str| s.parse::<RecurrenceRule>().unwrap().cadence();

    assert_eq!(cadence("FREQ=DAILY"), Cadence::Daily);
    assert_eq!(cadence("FREQ=HOURLY"), Cadence::Daily);
    assert_eq!(cadence("FREQ=WEEKLY"), Cadence::Weekly);
    assert_eq!(cadence("FREQ=WEEKLY;INTERVAL=2"), Cadence::BiWeekly);
    assert_eq!(cadence("FREQ=MONTHLY"), Cadence::Monthly);
    assert_eq!(cadence("FREQ=WEEKLY;INTERVAL=3"), Cadence::Weekly);
    assert_eq!(cadence("FREQ=DAILY;INTERVAL=3"), Cadence::Daily);
    assert_eq!(cadence("FREQ=MONTHLY;INTERVAL=2"), Cadence::Monthly);
    assert_eq!(cadence("FREQ=YEARLY"), Cadence::Irregular);
}

#[test]
fn cadence_falls_back_to_spacing_then_irregular() {
    let starts: Vec<DateTime<Utc>> = (0..4).map(|i| utc(2026, 1, 1, 9) + Duration::days(14 * i)).collect();

    assert_eq!(average_gap_days(&starts), Some(14.0));
    assert_eq!(infer_cadence(None, &starts), Cadence::BiWeekly);
    assert_eq!(infer_cadence(None, &starts[..1]), Cadence::Irregular);

    let daily: RecurrenceRule = "FREQ=DAILY".parse().unwrap();
    assert_eq!(infer_cadence(Some(&daily), &starts), Cadence::Daily);
}

#[test]
fn cadence_serializes_with_display_labels() {
    assert_eq!(serde_json::to_string(&Cadence::BiWeekly).unwrap(), "\"Bi-Weekly\"");
    assert_eq!(Cadence::BiWeekly.to_string(), "Bi-Weekly");
    assert_eq!(Cadence::Weekly.occurrences_per_month(), Some(30.0 / 7.0));
    assert_eq!(Cadence::Irregular.occurrences_per_month(), None);
}

// ---------------------------------------------------------------------------
// Expansion
// ---------------------------------------------------------------------------

#[test]
fn next_occurrence_after_a_given_instant() {
    // Daily at 09:00 from 2026-01-01.
    let next = next_occurrence("RRULE:FREQ=DAILY", utc(2026, 1, 1, 9), utc(2026, 1, 10, 12)).unwrap();
    assert_eq!(next, Some(utc(2026, 1, 11, 9)));
}

#[test]
fn finished_rule_has_no_next_occurrence() {
    let next = next_occurrence("FREQ=DAILY;COUNT=3", utc(2026, 1, 1, 9), utc(2026, 2, 1, 0)).unwrap();
    assert_eq!(next, None);
}

#[test]
fn occurrences_within_window_are_exclusive_of_bounds() {
    let found = occurrences_between(
        "FREQ=DAILY",
        utc(2026, 1, 1, 9),
        utc(2026, 1, 3, 9),
        utc(2026, 1, 6, 9),
        100,
    )
    .unwrap();

    assert_eq!(found, vec![utc(2026, 1, 4, 9), utc(2026, 1, 5, 9)]);
}

#[test]
fn empty_rule_cannot_be_expanded() {
    let err = next_occurrence("RRULE:", utc(2026, 1, 1, 9), utc(2026, 1, 2, 0)).unwrap_err();
    assert!(matches!(err, EngineError::InvalidRule(_)));
}
