//! Scheduling entities.
//!
//! There are three levels of scheduling:
//!
//! 1. [`Availability`] — what a subject declares: recurring free intent.
//!    Availabilities may overlap; overlapping doesn't make a subject any more
//!    available.
//! 2. [`Occurrence`] — one materialized instance of an availability. Purely a
//!    cache, always derived, never edited.
//! 3. [`TimeSlot`] — what is actually scheduled. Slots are free or busy and,
//!    for one subject, never overlap (padding slots excepted). Their bounds are
//!    fully determined by current occurrences and reserving bookings.

use std::fmt::Debug;
use std::hash::Hash;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::span::TimeSpan;

/// The opaque owner of a schedule: a person, a room, a group.
///
/// Any cloneable, hashable key works; the engine only compares subjects for
/// equality.
pub trait Subject: Clone + Eq + Hash + Debug {}

impl<T: Clone + Eq + Hash + Debug> Subject for T {}

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub u64);

        impl $name {
            /// Identifier carried by entities that have not been stored yet.
            pub const UNSAVED: $name = $name(0);

            pub fn is_saved(&self) -> bool {
                self.0 != 0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(AvailabilityId);
entity_id!(OccurrenceId);
entity_id!(SlotId);
entity_id!(BookingId);

/// A (possibly) recurring available time, declared in the subject's local zone.
#[derive(Debug, Clone, PartialEq)]
pub struct Availability<K> {
    pub id: AvailabilityId,
    pub subject: K,
    pub start_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    /// RFC 5545 RRULE body (`FREQ=WEEKLY;BYDAY=MO`). `None` is a one-off.
    pub recurrence: Option<String>,
    pub timezone: Tz,
}

impl<K: Subject> Availability<K> {
    pub fn new(
        subject: K,
        start_date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        timezone: Tz,
    ) -> Self {
        Self {
            id: AvailabilityId::UNSAVED,
            subject,
            start_date,
            start_time,
            end_time,
            recurrence: None,
            timezone,
        }
    }

    pub fn with_recurrence(mut self, rule: impl Into<String>) -> Self {
        self.recurrence = Some(rule.into());
        self
    }

    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }

    /// First local start: `start_date` at `start_time`, in the availability's zone.
    pub fn anchor(&self) -> NaiveDateTime {
        self.start_date.and_time(self.start_time)
    }
}

/// One materialized instance of an availability, in UTC.
///
/// Within an availability an occurrence is identified by its exact bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Occurrence<K> {
    pub id: OccurrenceId,
    pub availability: AvailabilityId,
    pub subject: K,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl<K: Subject> Occurrence<K> {
    pub fn new(availability: &Availability<K>, span: TimeSpan) -> Self {
        Self {
            id: OccurrenceId::UNSAVED,
            availability: availability.id,
            subject: availability.subject.clone(),
            start: span.start,
            end: span.end,
        }
    }

    pub fn span(&self) -> TimeSpan {
        TimeSpan::new(self.start, self.end)
    }
}

/// A segment of time that can be scheduled.
///
/// A slot with `padding_for` set is buffer time around a booked slot and is
/// always busy.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSlot<K> {
    pub id: SlotId,
    pub subject: K,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub busy: bool,
    pub padding_for: Option<SlotId>,
}

impl<K: Subject> TimeSlot<K> {
    pub fn free(subject: K, span: TimeSpan) -> Self {
        Self {
            id: SlotId::UNSAVED,
            subject,
            start: span.start,
            end: span.end,
            busy: false,
            padding_for: None,
        }
    }

    pub fn busy(subject: K, span: TimeSpan) -> Self {
        Self {
            busy: true,
            ..Self::free(subject, span)
        }
    }

    pub fn padding(subject: K, span: TimeSpan, padded: SlotId) -> Self {
        Self {
            padding_for: Some(padded),
            ..Self::busy(subject, span)
        }
    }

    pub fn span(&self) -> TimeSpan {
        TimeSpan::new(self.start, self.end)
    }

    pub fn set_span(&mut self, span: TimeSpan) {
        self.start = span.start;
        self.end = span.end;
    }

    pub fn is_padding(&self) -> bool {
        self.padding_for.is_some()
    }
}

/// Association: an occurrence contributed free time to a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotOccurrence {
    pub slot: SlotId,
    pub occurrence: OccurrenceId,
}

/// Association: a booking reserves a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BookingTime {
    pub booking: BookingId,
    pub slot: SlotId,
}
