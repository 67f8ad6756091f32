//! Booking state machine.
//!
//! ```text
//! UNCONFIRMED ──confirm──▶ CONFIRMED ──finish──▶ COMPLETED | MISSED
//!      │                      │
//!      ├──cancel──▶ DECLINED  └──cancel──▶ CANCELED
//!      └──expire──▶ EXPIRED
//! ```
//!
//! `reschedule` is allowed from UNCONFIRMED and CONFIRMED; the latter drops
//! back to UNCONFIRMED. These methods only change the booking value; persist
//! the result with [`crate::booking::save_booking`] so its slots follow.

use chrono::{DateTime, Utc};

use super::{Actor, Booking, BookingState, Party};
use crate::error::{AgendaError, Result};
use crate::model::Subject;
use crate::span::TimeSpan;

/// Most requested times a booking may carry at once.
pub const MAX_REQUESTED_TIMES: usize = 2;

impl<K: Subject> Booking<K> {
    /// Withdraw the booking. Unconfirmed bookings become declined, confirmed
    /// ones canceled.
    ///
    /// # Errors
    /// `InvalidState` from any other state.
    pub fn cancel(&mut self, actor: Actor) -> Result<()> {
        self.state = match self.state {
            BookingState::Unconfirmed => BookingState::Declined,
            BookingState::Confirmed => BookingState::Canceled,
            other => {
                return Err(AgendaError::InvalidState(format!(
                    "only unconfirmed and confirmed bookings can be canceled, booking is {other:?}"
                )))
            }
        };
        tracing::debug!(booking = %self.id, ?actor, state = ?self.state, "booking canceled");
        self.assignee = None;
        Ok(())
    }

    /// Accept one of the requested times.
    ///
    /// # Errors
    /// `InvalidState` if the booking is not unconfirmed or `actor` is not the
    /// assignee; `InvalidTime` if `time` was not requested.
    pub fn confirm(&mut self, actor: Actor, time: DateTime<Utc>) -> Result<()> {
        if self.state != BookingState::Unconfirmed {
            return Err(AgendaError::InvalidState(format!(
                "only unconfirmed bookings can be confirmed, booking is {:?}",
                self.state
            )));
        }
        if let (Some(assignee), Actor::Party(party)) = (self.assignee, actor) {
            if assignee != party {
                return Err(AgendaError::InvalidState(
                    "the other party has to confirm the booking".to_string(),
                ));
            }
        }
        if !self.requested_times.contains(&time) {
            return Err(AgendaError::InvalidTime(
                "must confirm an existing requested time".to_string(),
            ));
        }
        self.requested_times = vec![time];
        self.state = BookingState::Confirmed;
        self.assignee = None;
        Ok(())
    }

    /// Record whether a confirmed booking took place.
    ///
    /// The confirmed time, and every span in `owned` (the slots the booking
    /// currently holds), must have started by `now`.
    ///
    /// # Errors
    /// `InvalidState` unless the booking is confirmed and has started.
    pub fn finish(
        &mut self,
        actor: Actor,
        happened: bool,
        now: DateTime<Utc>,
        owned: &[TimeSpan],
    ) -> Result<()> {
        if self.state != BookingState::Confirmed {
            return Err(AgendaError::InvalidState(
                "booking must be confirmed".to_string(),
            ));
        }
        let started = self.requested_times.iter().all(|t| *t <= now)
            && owned.iter().all(|span| span.start <= now);
        if !started {
            return Err(AgendaError::InvalidState(
                "a booking must have started before it can be finished".to_string(),
            ));
        }
        self.state = if happened {
            BookingState::Completed
        } else {
            BookingState::Missed
        };
        tracing::debug!(booking = %self.id, ?actor, state = ?self.state, "booking finished");
        Ok(())
    }

    /// Move an unconfirmed booking whose requested times have all passed to EXPIRED.
    ///
    /// # Errors
    /// `InvalidState` if the booking is not unconfirmed or a requested time is
    /// still ahead of `now`.
    pub fn expire(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.state != BookingState::Unconfirmed {
            return Err(AgendaError::InvalidState(
                "booking must be unconfirmed".to_string(),
            ));
        }
        if self.requested_times.iter().any(|t| *t > now) {
            return Err(AgendaError::InvalidState(
                "a booking must be in the past before it can be expired".to_string(),
            ));
        }
        self.state = BookingState::Expired;
        self.assignee = None;
        Ok(())
    }

    /// Replace the requested times and hand the response to the other party.
    ///
    /// # Errors
    /// `InvalidTime` for zero or more than two times; `InvalidState` if the
    /// booking is neither unconfirmed nor confirmed.
    pub fn reschedule(&mut self, actor: Actor, times: &[DateTime<Utc>]) -> Result<()> {
        if times.is_empty() {
            return Err(AgendaError::InvalidTime(
                "must supply at least one time when rescheduling, otherwise just cancel"
                    .to_string(),
            ));
        }
        if times.len() > MAX_REQUESTED_TIMES {
            return Err(AgendaError::InvalidTime(format!(
                "only a maximum of {MAX_REQUESTED_TIMES} times is supported"
            )));
        }
        match self.state {
            BookingState::Unconfirmed => {}
            BookingState::Confirmed => self.state = BookingState::Unconfirmed,
            other => {
                return Err(AgendaError::InvalidState(format!(
                    "only unconfirmed or confirmed bookings can be rescheduled, booking is {other:?}"
                )))
            }
        }
        self.requested_times = times.to_vec();
        self.assignee = Some(match actor {
            Actor::Party(party) => party.other(),
            Actor::Admin => Party::Guest,
        });
        Ok(())
    }
}
