//! Engine configuration.
//!
//! Every field has a default so callers can supply a partial JSON document
//! (or none at all) and still get a usable configuration.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

/// Tunables shared by every engine operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineOptions {
    /// Email of the calendar owner. When absent, the attendee carrying the
    /// `self` flag identifies the owner.
    pub owner_email: Option<String>,
    /// Contracted hours per week, used to express meeting load as a fraction.
    pub baseline_work_week_hours: f64,
    /// Duration applied to events whose end is missing or not after the start.
    pub default_event_minutes: i64,
    /// Hard cap on accepted slot suggestions per search.
    pub max_slots: usize,
    /// Working-hours window start (local hour of day).
    pub working_hours_start: u32,
    /// Working-hours window end (local hour of day, exclusive bound for slot ends).
    pub working_hours_end: u32,
    /// Attendee-count × monthly-minutes at or above which a series is flagged.
    pub people_minutes_threshold: f64,
    /// Days without an update after which a series is considered stale.
    pub stale_after_days: i64,
    /// Days since the last one-on-one after which a relationship is critical.
    pub relationship_critical_days: i64,
    /// Zone used when a requested timezone cannot be resolved.
    pub default_timezone: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            owner_email: None,
            baseline_work_week_hours: 40.0,
            default_event_minutes: 30,
            max_slots: 20,
            working_hours_start: 9,
            working_hours_end: 17,
            people_minutes_threshold: 2400.0,
            stale_after_days: 180,
            relationship_critical_days: 60,
            default_timezone: "UTC".to_string(),
        }
    }
}

impl EngineOptions {
    /// Parse options from a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)
            .map_err(|e| EngineError::InvalidRequest(format!("invalid options JSON: {}", e)))?;
        options.validate()?;
        Ok(options)
    }

    /// Builder-style owner override.
    pub fn with_owner(mut self, email: impl Into<String>) -> Self {
        self.owner_email = Some(email.into());
        self
    }

    /// Reject option combinations no operation can honor.
    pub fn validate(&self) -> Result<()> {
        if self.working_hours_start >= self.working_hours_end || self.working_hours_end > 24 {
            return Err(EngineError::InvalidRequest(format!(
                "working hours {}..{} are not a valid window",
                self.working_hours_start, self.working_hours_end
            )));
        }
        if self.default_event_minutes <= 0 {
            return Err(EngineError::InvalidRequest(
                "defaultEventMinutes must be positive".to_string(),
            ));
        }
        if self.baseline_work_week_hours <= 0.0 {
            return Err(EngineError::InvalidRequest(
                "baselineWorkWeekHours must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// True when `email` is the configured owner (case-insensitive).
    pub fn is_owner(&self, email: &str) -> bool {
        self.owner_email
            .as_deref()
            .is_some_and(|owner| owner.eq_ignore_ascii_case(email))
    }

    /// Domain part of the owner email, lowercased.
    pub fn owner_domain(&self) -> Option<String> {
        self.owner_email.as_deref().and_then(email_domain)
    }
}

/// Lowercased domain of an email address, if it has one.
pub(crate) fn email_domain(email: &str) -> Option<String> {
    email
        .rsplit_once('@')
        .map(|(_, domain)| domain.trim().to_ascii_lowercase())
        .filter(|domain| !domain.is_empty())
}
