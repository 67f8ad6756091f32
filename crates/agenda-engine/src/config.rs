//! Engine configuration.
//!
//! [`SchedulerConfig`] is plain data and deserializes from JSON; fields left
//! out take their defaults. [`BookingPolicy`] adds the caller-supplied
//! duplicate predicate, which can't be expressed as data.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::booking::{Actor, Booking, Party};
use crate::error::{AgendaError, Result};
use crate::span::TimeSpan;

/// Longest materialization window `validate` accepts, about a century.
pub const MAX_HORIZON_DAYS: i64 = 36_500;

/// Who may book time that no availability covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnscheduledBooking {
    Never,
    /// The schedule owner and administrators.
    #[default]
    HostOrAdmin,
    Always,
}

impl UnscheduledBooking {
    pub fn permits(self, actor: Actor) -> bool {
        match self {
            UnscheduledBooking::Never => false,
            UnscheduledBooking::HostOrAdmin => {
                matches!(actor, Actor::Admin | Actor::Party(Party::Host))
            }
            UnscheduledBooking::Always => true,
        }
    }
}

/// Placement rules applied when a booking reserves time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BookingRules {
    /// Allow a booking to partially overlap busy time or another booking.
    pub allow_overlapping: bool,
    /// Allow several bookings to share an identical slot. Shared slots stay
    /// `busy = false` so the exact time remains bookable.
    pub allow_multiple: bool,
    pub unscheduled: UnscheduledBooking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// How far ahead occurrences are materialized.
    pub horizon_days: i64,
    /// Cap on the instances one recurrence expansion may produce.
    pub max_occurrences: u16,
    pub booking: BookingRules,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            horizon_days: 100,
            max_occurrences: 1000,
            booking: BookingRules::default(),
        }
    }
}

impl SchedulerConfig {
    /// Parse a JSON document; missing fields take their defaults.
    ///
    /// # Errors
    /// `AgendaError::Config` if the document is malformed or fails [`validate`](Self::validate).
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SchedulerConfig =
            serde_json::from_str(json).map_err(|e| AgendaError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_HORIZON_DAYS).contains(&self.horizon_days) {
            return Err(AgendaError::Config(format!(
                "horizon_days must be between 1 and {MAX_HORIZON_DAYS}, got {}",
                self.horizon_days
            )));
        }
        if self.max_occurrences == 0 {
            return Err(AgendaError::Config(
                "max_occurrences must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// The materialization window starting at `now`.
    ///
    /// # Errors
    /// `AgendaError::Config` if the window would end past the last
    /// representable instant.
    pub fn horizon(&self, now: DateTime<Utc>) -> Result<TimeSpan> {
        let end = Duration::try_days(self.horizon_days)
            .and_then(|days| now.checked_add_signed(days))
            .ok_or_else(|| {
                AgendaError::Config(format!(
                    "a horizon of {} days from {now} is out of range",
                    self.horizon_days
                ))
            })?;
        Ok(TimeSpan::new(now, end))
    }
}

/// Decides whether `candidate` duplicates `existing`, given they ask for the same time.
pub type DuplicateCheck<K> = fn(candidate: &Booking<K>, existing: &Booking<K>) -> bool;

fn never_duplicate<K>(_: &Booking<K>, _: &Booking<K>) -> bool {
    false
}

/// Everything [`crate::booking::save_booking`] needs to decide where a booking may go.
pub struct BookingPolicy<K> {
    pub rules: BookingRules,
    pub is_duplicate: DuplicateCheck<K>,
}

impl<K> BookingPolicy<K> {
    pub fn new(rules: BookingRules) -> Self {
        Self {
            rules,
            is_duplicate: never_duplicate::<K>,
        }
    }

    pub fn with_duplicate_check(mut self, check: DuplicateCheck<K>) -> Self {
        self.is_duplicate = check;
        self
    }
}

impl<K> Clone for BookingPolicy<K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for BookingPolicy<K> {}

impl<K> Default for BookingPolicy<K> {
    fn default() -> Self {
        Self::new(BookingRules::default())
    }
}

impl<K> std::fmt::Debug for BookingPolicy<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingPolicy")
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}
