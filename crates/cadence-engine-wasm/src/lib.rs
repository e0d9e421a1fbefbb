//! WASM bindings for cadence-engine.
//!
//! Exposes the engine's analyses to JavaScript via `wasm-bindgen`. Events,
//! options, requests and results all cross the boundary as JSON strings.
//! Options are optional everywhere: pass `undefined` for the defaults.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p cadence-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target nodejs --out-dir packages/cadence-engine-js/wasm/ \
//!   target/wasm32-unknown-unknown/release/cadence_engine_wasm.wasm
//! ```

use cadence_engine::{EngineOptions, Event, SchedulingRequest};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Boundary helpers
// ---------------------------------------------------------------------------

/// Errors are carried as plain strings and converted to `JsValue` only at the
/// export boundary, so the conversions stay testable off-wasm.
type BoundaryResult<T> = Result<T, String>;

/// Parse an ISO 8601 datetime string into `DateTime<Utc>`.
///
/// Accepts RFC 3339 (e.g., "2026-02-17T14:00:00+00:00") and naive datetimes
/// (e.g., "2026-02-17T14:00:00"), which are interpreted as UTC.
fn parse_datetime(s: &str) -> BoundaryResult<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .map(|ndt| ndt.and_utc())
        .map_err(|e| format!("Invalid datetime '{}': {}", s, e))
}

fn parse_events(json: &str) -> BoundaryResult<Vec<Event>> {
    serde_json::from_str(json).map_err(|e| format!("Invalid events JSON: {}", e))
}

fn parse_options(json: Option<&str>) -> BoundaryResult<EngineOptions> {
    match json {
        Some(json) if !json.trim().is_empty() => {
            EngineOptions::from_json(json).map_err(|e| e.to_string())
        }
        _ => Ok(EngineOptions::default()),
    }
}

fn to_json<T: Serialize>(value: &T) -> BoundaryResult<String> {
    serde_json::to_string(value).map_err(|e| format!("Serialization error: {}", e))
}

fn to_js(result: BoundaryResult<String>) -> Result<String, JsValue> {
    result.map_err(|e| JsValue::from_str(&e))
}

// ---------------------------------------------------------------------------
// Implementations
// ---------------------------------------------------------------------------

fn busy_intervals_impl(
    events_json: &str,
    window_start: &str,
    window_end: &str,
    options_json: Option<&str>,
) -> BoundaryResult<String> {
    let events = parse_events(events_json)?;
    let options = parse_options(options_json)?;
    let busy = cadence_engine::busy_intervals(
        &events,
        parse_datetime(window_start)?,
        parse_datetime(window_end)?,
        &options,
    );
    to_json(&busy)
}

fn free_intervals_impl(
    events_json: &str,
    window_start: &str,
    window_end: &str,
    min_minutes: i64,
    options_json: Option<&str>,
) -> BoundaryResult<String> {
    let events = parse_events(events_json)?;
    let options = parse_options(options_json)?;
    let free = cadence_engine::interval::find_free_intervals(
        &events,
        parse_datetime(window_start)?,
        parse_datetime(window_end)?,
        min_minutes,
        &options,
    );
    to_json(&free)
}

fn find_slots_impl(
    events_json: &str,
    request_json: &str,
    now: &str,
    timezone: &str,
    options_json: Option<&str>,
) -> BoundaryResult<String> {
    let events = parse_events(events_json)?;
    let options = parse_options(options_json)?;
    let request = serde_json::from_str(request_json)
        .map_err(|e| format!("Invalid availability request JSON: {}", e))?;
    let search = cadence_engine::find_slots(&events, &request, parse_datetime(now)?, timezone, &options)
        .map_err(|e| e.to_string())?;
    to_json(&search)
}

fn evaluate_impl(
    events_json: &str,
    request_json: &str,
    now: &str,
    timezone: &str,
    options_json: Option<&str>,
) -> BoundaryResult<String> {
    let events = parse_events(events_json)?;
    let options = parse_options(options_json)?;
    let request: SchedulingRequest = serde_json::from_str(request_json)
        .map_err(|e| format!("Invalid scheduling request JSON: {}", e))?;
    let outcome = cadence_engine::evaluate(&events, &request, parse_datetime(now)?, timezone, &options)
        .map_err(|e| e.to_string())?;
    to_json(&outcome)
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Merged busy intervals within `[windowStart, windowEnd)`.
///
/// Returns a JSON array of `{start, end}` objects.
#[wasm_bindgen(js_name = "busyIntervals")]
pub fn busy_intervals(
    events_json: &str,
    window_start: &str,
    window_end: &str,
    options_json: Option<String>,
) -> Result<String, JsValue> {
    to_js(busy_intervals_impl(events_json, window_start, window_end, options_json.as_deref()))
}

/// Free intervals of at least `minMinutes` within `[windowStart, windowEnd)`.
#[wasm_bindgen(js_name = "freeIntervals")]
pub fn free_intervals(
    events_json: &str,
    window_start: &str,
    window_end: &str,
    min_minutes: i32,
    options_json: Option<String>,
) -> Result<String, JsValue> {
    to_js(free_intervals_impl(
        events_json,
        window_start,
        window_end,
        i64::from(min_minutes),
        options_json.as_deref(),
    ))
}

/// Gap records between consecutive events.
#[wasm_bindgen(js_name = "classifyGaps")]
pub fn classify_gaps(events_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    to_js((|| {
        let events = parse_events(events_json)?;
        let options = parse_options(options_json.as_deref())?;
        to_json(&cadence_engine::classify_gaps(&events, &options))
    })())
}

/// Every overlapping event pair.
#[wasm_bindgen(js_name = "detectConflicts")]
pub fn detect_conflicts(events_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    to_js((|| {
        let events = parse_events(events_json)?;
        let options = parse_options(options_json.as_deref())?;
        to_json(&cadence_engine::detect_conflicts(&events, &options))
    })())
}

/// Slot search. `requestJson` is an availability request object.
#[wasm_bindgen(js_name = "findSlots")]
pub fn find_slots(
    events_json: &str,
    request_json: &str,
    now: &str,
    timezone: &str,
    options_json: Option<String>,
) -> Result<String, JsValue> {
    to_js(find_slots_impl(events_json, request_json, now, timezone, options_json.as_deref()))
}

/// Recurring series with metrics and flags.
#[wasm_bindgen(js_name = "resolveSeries")]
pub fn resolve_series(events_json: &str, now: &str, options_json: Option<String>) -> Result<String, JsValue> {
    to_js((|| {
        let events = parse_events(events_json)?;
        let options = parse_options(options_json.as_deref())?;
        to_json(&cadence_engine::resolve_series(&events, parse_datetime(now)?, &options))
    })())
}

/// One-on-one relationship snapshots, most urgent first.
#[wasm_bindgen(js_name = "trackRelationships")]
pub fn track_relationships(
    events_json: &str,
    now: &str,
    options_json: Option<String>,
) -> Result<String, JsValue> {
    to_js((|| {
        let events = parse_events(events_json)?;
        let options = parse_options(options_json.as_deref())?;
        to_json(&cadence_engine::track_relationships(&events, parse_datetime(now)?, &options))
    })())
}

/// Health summary for `[windowStart, windowEnd)`.
#[wasm_bindgen(js_name = "summarizeHealth")]
pub fn summarize_health(
    events_json: &str,
    window_start: &str,
    window_end: &str,
    options_json: Option<String>,
) -> Result<String, JsValue> {
    to_js((|| {
        let events = parse_events(events_json)?;
        let options = parse_options(options_json.as_deref())?;
        to_json(&cadence_engine::summarize_health(
            &events,
            parse_datetime(window_start)?,
            parse_datetime(window_end)?,
            &options,
        ))
    })())
}

/// Evaluate a tagged scheduling request (`kind`: find-slots, check-time,
/// preview-actions).
#[wasm_bindgen(js_name = "evaluate")]
pub fn evaluate(
    events_json: &str,
    request_json: &str,
    now: &str,
    timezone: &str,
    options_json: Option<String>,
) -> Result<String, JsValue> {
    to_js(evaluate_impl(events_json, request_json, now, timezone, options_json.as_deref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVENTS: &str = r#"[
        {"id": "a", "start": {"dateTime": "2026-03-16T09:00:00Z"}, "end": {"dateTime": "2026-03-16T10:00:00Z"}},
        {"id": "b", "start": {"dateTime": "2026-03-16T09:30:00Z"}, "end": {"dateTime": "2026-03-16T11:00:00Z"}}
    ]"#;

    #[test]
    fn naive_datetimes_are_utc() {
        assert_eq!(
            parse_datetime("2026-03-16T09:00:00").unwrap(),
            parse_datetime("2026-03-16T09:00:00Z").unwrap()
        );
        assert!(parse_datetime("tuesday").unwrap_err().contains("Invalid datetime"));
    }

    #[test]
    fn busy_intervals_round_trip_through_json() {
        let json = busy_intervals_impl(EVENTS, "2026-03-16T00:00:00Z", "2026-03-17T00:00:00Z", None)
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value.as_array().unwrap().len(), 1);
        assert_eq!(value[0]["end"], "2026-03-16T11:00:00Z");
    }

    #[test]
    fn free_intervals_filter_short_gaps() {
        let json = free_intervals_impl(
            EVENTS,
            "2026-03-16T08:30:00",
            "2026-03-16T12:00:00",
            45,
            Some(""),
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value.as_array().unwrap().len(), 1);
        assert_eq!(value[0]["start"], "2026-03-16T11:00:00Z");
    }

    #[test]
    fn invalid_inputs_surface_messages() {
        assert!(parse_events("{").unwrap_err().contains("Invalid events JSON"));
        assert!(parse_options(Some(r#"{"workingHoursStart": 20, "workingHoursEnd": 8}"#)).is_err());

        let err = evaluate_impl(
            EVENTS,
            r#"{"kind": "check-time", "start": "2026-03-16T11:00:00Z", "end": "2026-03-16T10:00:00Z"}"#,
            "2026-03-15T00:00:00Z",
            "UTC",
            None,
        )
        .unwrap_err();
        assert!(err.contains("2026-03-16T11:00:00"));
    }

    #[test]
    fn slot_search_uses_options_cap() {
        let json = find_slots_impl(
            EVENTS,
            r#"{"customDates": ["2026-03-16"], "workingHoursOnly": true}"#,
            "2026-03-15T00:00:00Z",
            "UTC",
            Some(r#"{"maxSlots": 2}"#),
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["slots"].as_array().unwrap().len(), 2);
        assert_eq!(value["slots"][0]["start"], "2026-03-16T11:00:00Z");
    }
}
