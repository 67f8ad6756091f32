//! Bookings: reservations of a subject's time.
//!
//! - [`state`] — the booking state machine (`cancel`, `confirm`, `finish`, ...)
//! - [`reserve`] — turning requested times into reserved slots on save
//! - [`padding`] — re-laying buffer slots when a booking's padding changes

pub mod padding;
pub mod reserve;
pub mod state;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{BookingId, Subject};
use crate::span::{shift, PaddedSpan, TimeSpan};

pub use padding::padding_changed;
pub use reserve::save_booking;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BookingState {
    #[default]
    Unconfirmed,
    /// Scheduled to happen, or happened and not yet finished.
    Confirmed,
    Declined,
    Completed,
    Canceled,
    /// Never confirmed before all requested times passed.
    Expired,
    /// Confirmed, but nobody showed.
    Missed,
}

impl BookingState {
    /// States in which the requested times stay reserved.
    pub const RESERVED: [BookingState; 4] = [
        BookingState::Unconfirmed,
        BookingState::Confirmed,
        BookingState::Completed,
        BookingState::Missed,
    ];

    pub fn is_reserved(self) -> bool {
        Self::RESERVED.contains(&self)
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BookingState::Declined
                | BookingState::Canceled
                | BookingState::Completed
                | BookingState::Missed
                | BookingState::Expired
        )
    }
}

/// The two sides of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Party {
    /// Owner of the schedule being booked.
    Host,
    /// Whoever asked for the booking.
    Guest,
}

impl Party {
    pub fn other(self) -> Party {
        match self {
            Party::Host => Party::Guest,
            Party::Guest => Party::Host,
        }
    }
}

/// Who is performing a state-changing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Actor {
    Party(Party),
    /// Administrative override: may act on behalf of either party.
    Admin,
}

impl Actor {
    pub const HOST: Actor = Actor::Party(Party::Host);
    pub const GUEST: Actor = Actor::Party(Party::Guest);
}

/// A request to reserve part of a subject's schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct Booking<K> {
    pub id: BookingId,
    /// Owner of the schedule being booked.
    pub subject: K,
    /// Whoever requested the booking.
    pub booker: K,
    pub state: BookingState,
    /// One or two candidate start times; a confirmed booking has exactly one.
    pub requested_times: Vec<DateTime<Utc>>,
    pub duration: Duration,
    /// Busy buffer reserved before and after each booked span.
    pub padding: Duration,
    /// Party expected to respond next, if any.
    pub assignee: Option<Party>,
}

impl<K: Subject> Booking<K> {
    pub fn new(subject: K, booker: K, requested: DateTime<Utc>, duration: Duration) -> Self {
        Self {
            id: BookingId::UNSAVED,
            subject,
            booker,
            state: BookingState::Unconfirmed,
            requested_times: vec![requested],
            duration,
            padding: Duration::zero(),
            assignee: None,
        }
    }

    pub fn with_alternative(mut self, requested: DateTime<Utc>) -> Self {
        self.requested_times.push(requested);
        self
    }

    pub fn with_padding(mut self, padding: Duration) -> Self {
        self.padding = padding;
        self
    }

    /// Spans this booking must hold slots for in its current state.
    pub fn reserved_spans(&self) -> Vec<TimeSpan> {
        if !self.state.is_reserved() {
            return Vec::new();
        }
        let mut spans: Vec<TimeSpan> = self
            .requested_times
            .iter()
            .map(|t| TimeSpan::new(*t, shift(*t, self.duration)))
            .collect();
        spans.sort();
        spans.dedup();
        spans
    }

    pub fn padded_spans(&self) -> Vec<PaddedSpan> {
        self.reserved_spans()
            .into_iter()
            .map(|core| PaddedSpan::new(core, self.padding))
            .collect()
    }
}
