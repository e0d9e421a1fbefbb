//! Tagged scheduling requests and outcomes for the assistant layer.
//!
//! Each request kind maps to exactly one outcome variant shape, so consumers
//! match on `kind` instead of probing optional fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::availability::{find_slots, AvailabilityRequest, SlotSearch};
use crate::conflict::conflicts_with;
use crate::error::{EngineError, Result};
use crate::event::{Event, EventSummary};
use crate::options::EngineOptions;
use crate::series::{recommend_actions, resolve_series, ActionPreview};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SchedulingRequest {
    /// Search for open slots.
    FindSlots(AvailabilityRequest),
    /// Check whether a proposed time is clear.
    CheckTime {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    /// Preview advisory changes for flagged recurring series.
    PreviewActions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SchedulingOutcome {
    Slots(SlotSearch),
    Available {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    Conflicts {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        conflicts: Vec<EventSummary>,
    },
    ActionPreview {
        actions: Vec<ActionPreview>,
    },
}

/// Evaluate one request against the owner's events.
///
/// # Errors
/// Propagates request validation errors from slot search, and returns
/// `EngineError::InvalidWindow` for a proposed time whose start is not before
/// its end.
pub fn evaluate(
    events: &[Event],
    request: &SchedulingRequest,
    now: DateTime<Utc>,
    timezone: &str,
    options: &EngineOptions,
) -> Result<SchedulingOutcome> {
    match request {
        SchedulingRequest::FindSlots(search) => {
            find_slots(events, search, now, timezone, options).map(SchedulingOutcome::Slots)
        }
        SchedulingRequest::CheckTime { start, end } => {
            if start >= end {
                return Err(EngineError::InvalidWindow {
                    start: start.to_rfc3339(),
                    end: end.to_rfc3339(),
                });
            }
            let conflicts = conflicts_with(events, *start, *end, options);
            if conflicts.is_empty() {
                Ok(SchedulingOutcome::Available {
                    start: *start,
                    end: *end,
                })
            } else {
                Ok(SchedulingOutcome::Conflicts {
                    start: *start,
                    end: *end,
                    conflicts,
                })
            }
        }
        SchedulingRequest::PreviewActions => {
            let series = resolve_series(events, now, options);
            Ok(SchedulingOutcome::ActionPreview {
                actions: recommend_actions(&series),
            })
        }
    }
}
