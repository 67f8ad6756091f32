//! Error types for agenda-engine operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgendaError {
    /// Illegal state-machine transition, or an operation the acting party may not perform.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A confirmation or reschedule named a time the booking cannot use.
    #[error("Invalid time: {0}")]
    InvalidTime(String),

    /// The requested span is blocked by busy time or falls in unscheduled time.
    #[error("Time unavailable: {0}")]
    TimeUnavailable(String),

    /// The requested span partially overlaps a different booking.
    #[error(
        "There's already a booking in part of this time, try either requesting \
         the exact same time of the booking or a later time"
    )]
    OverlappingTime,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid recurrence rule: {0}")]
    InvalidRule(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl AgendaError {
    /// True for `TimeUnavailable` and its `OverlappingTime` subtype.
    pub fn is_time_unavailable(&self) -> bool {
        matches!(self, AgendaError::TimeUnavailable(_) | AgendaError::OverlappingTime)
    }

    /// True for `InvalidTime` and every unavailability error.
    pub fn is_invalid_time(&self) -> bool {
        matches!(self, AgendaError::InvalidTime(_)) || self.is_time_unavailable()
    }

    /// True for the whole state/time family.
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, AgendaError::InvalidState(_)) || self.is_invalid_time()
    }
}

pub type Result<T> = std::result::Result<T, AgendaError>;
