//! # cadence-engine
//!
//! Deterministic calendar intelligence for scheduling assistants.
//!
//! The engine turns a raw list of calendar events into structured scheduling
//! insight. Every operation is a pure function of (events, reference time,
//! options): no I/O, no clocks, no shared state. Callers pass `now`
//! explicitly, so identical inputs always produce identical outputs.
//!
//! ## Modules
//!
//! - [`event`] — Provider-shaped event model and normalization
//! - [`interval`] — Merged busy intervals and their free complement
//! - [`gaps`] — Buffer classification between consecutive events
//! - [`conflict`] — Pairwise overlap detection with placeholder suppression
//! - [`range`] — Semantic date ranges (`today`, `next_week`, ...) → instants
//! - [`availability`] — Timezone-constrained slot search
//! - [`recurrence`] — RRULE inspection, expansion and cadence inference
//! - [`series`] — Recurring-series grouping, metrics, flags and recommendations
//! - [`relationship`] — One-on-one cadence health per counterpart
//! - [`health`] — Calendar health summary and score
//! - [`outcome`] — Tagged scheduling requests and outcomes
//! - [`timezone`] — Timezone label resolution (IANA, abbreviations, airports, cities)
//! - [`options`] — Engine configuration
//! - [`error`] — Error types

pub mod availability;
pub mod conflict;
pub mod error;
pub mod event;
pub mod gaps;
pub mod health;
pub mod interval;
pub mod options;
pub mod outcome;
pub mod range;
pub mod recurrence;
pub mod relationship;
pub mod series;
pub mod timezone;

pub use availability::{
    find_slots, AvailabilityRequest, SlotSearch, SlotSuggestion, TimezoneConstraint, ZoneLabel,
};
pub use conflict::{conflicts_with, detect_conflicts, Conflict, OverlapKind};
pub use error::EngineError;
pub use event::{Attendee, Event, EventStatus, EventSummary, EventTime, Person, ResponseStatus};
pub use gaps::{classify_gaps, GapRecord, GapStatus};
pub use health::{summarize_health, HealthSummary};
pub use interval::{busy_intervals, free_intervals, BusyInterval, FreeInterval, Interval};
pub use options::EngineOptions;
pub use outcome::{evaluate, SchedulingOutcome, SchedulingRequest};
pub use range::{resolve_range, DateRange, RangeSource, ResolvedRange};
pub use recurrence::{Cadence, RecurrenceRule};
pub use relationship::{
    classify_relationship, track_relationships, RelationshipSnapshot, RelationshipStatus,
};
pub use series::{
    recommend_actions, resolve_series, summarize_series, ActionPreview, KeyStrategy,
    SeriesFlag, SeriesGroup, SeriesSummary,
};
pub use timezone::{resolve_or_default, resolve_timezone};
