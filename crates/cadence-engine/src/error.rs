//! Error types for cadence-engine operations.
//!
//! Only request validation fails hard. Malformed events, recurrence rules and
//! timezones degrade gracefully inside the engine instead of surfacing here.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid RRULE: {0}")]
    InvalidRule(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid window: start {start} is not before end {end}")]
    InvalidWindow { start: String, end: String },
}

pub type Result<T> = std::result::Result<T, EngineError>;
