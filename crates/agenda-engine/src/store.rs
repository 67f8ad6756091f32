//! Persistence seam for the scheduling entities.
//!
//! The engines never hold entities across calls; they read, modify and write
//! through a [`Store`] inside [`Store::atomically`], which must make the whole
//! closure all-or-nothing. Range queries return rows ordered by start.
//!
//! Cascades behave like foreign keys with `ON DELETE CASCADE`:
//!
//! - removing a slot removes its [`SlotOccurrence`] and [`BookingTime`] rows and
//!   every padding slot whose `padding_for` points at it;
//! - removing an occurrence removes its [`SlotOccurrence`] rows.

use crate::booking::Booking;
use crate::error::Result;
use crate::model::{
    Availability, AvailabilityId, BookingId, BookingTime, Occurrence, OccurrenceId, SlotId,
    SlotOccurrence, Subject, TimeSlot,
};
use crate::span::TimeSpan;

pub trait Store<K: Subject> {
    /// Run `f` as one transaction: if it returns `Err`, none of its writes persist.
    fn atomically<T, E, F>(&mut self, f: F) -> std::result::Result<T, E>
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> std::result::Result<T, E>;

    // ── Availabilities ─────────────────────────────────────

    /// Store a new availability and return it with its assigned id.
    fn insert_availability(&mut self, availability: Availability<K>) -> Result<Availability<K>>;
    fn availability(&self, id: AvailabilityId) -> Result<Option<Availability<K>>>;
    fn update_availability(&mut self, availability: &Availability<K>) -> Result<()>;
    fn remove_availability(&mut self, id: AvailabilityId) -> Result<Option<Availability<K>>>;
    fn availabilities(&self) -> Result<Vec<Availability<K>>>;

    // ── Occurrences ────────────────────────────────────────

    fn insert_occurrence(&mut self, occurrence: Occurrence<K>) -> Result<Occurrence<K>>;
    fn occurrence(&self, id: OccurrenceId) -> Result<Option<Occurrence<K>>>;
    fn remove_occurrence(&mut self, id: OccurrenceId) -> Result<Option<Occurrence<K>>>;
    fn occurrences_of(&self, availability: AvailabilityId) -> Result<Vec<Occurrence<K>>>;
    /// Occurrences of `subject` that overlap `span` or touch its bounds.
    fn occurrences_touching(&self, subject: &K, span: TimeSpan) -> Result<Vec<Occurrence<K>>>;
    /// Occurrences of `subject` that strictly overlap `span`.
    fn occurrences_overlapping(&self, subject: &K, span: TimeSpan)
        -> Result<Vec<Occurrence<K>>>;

    // ── Time slots ─────────────────────────────────────────

    fn insert_slot(&mut self, slot: TimeSlot<K>) -> Result<TimeSlot<K>>;
    fn slot(&self, id: SlotId) -> Result<Option<TimeSlot<K>>>;
    fn update_slot(&mut self, slot: &TimeSlot<K>) -> Result<()>;
    fn remove_slot(&mut self, id: SlotId) -> Result<Option<TimeSlot<K>>>;
    fn slots_of(&self, subject: &K) -> Result<Vec<TimeSlot<K>>>;
    /// Slots of `subject` that overlap `span` or touch its bounds.
    fn slots_touching(&self, subject: &K, span: TimeSpan) -> Result<Vec<TimeSlot<K>>>;
    /// Slots of `subject` that strictly overlap `span`.
    fn slots_overlapping(&self, subject: &K, span: TimeSpan) -> Result<Vec<TimeSlot<K>>>;
    /// Padding slots whose `padding_for` is `slot`.
    fn padding_of(&self, slot: SlotId) -> Result<Vec<TimeSlot<K>>>;

    // ── Slot ↔ occurrence ──────────────────────────────────

    fn link_occurrence(&mut self, link: SlotOccurrence) -> Result<()>;
    fn unlink_occurrence(&mut self, link: SlotOccurrence) -> Result<()>;
    fn occurrences_of_slot(&self, slot: SlotId) -> Result<Vec<OccurrenceId>>;
    fn slots_of_occurrence(&self, occurrence: OccurrenceId) -> Result<Vec<SlotId>>;

    // ── Bookings ───────────────────────────────────────────

    fn insert_booking(&mut self, booking: Booking<K>) -> Result<Booking<K>>;
    fn booking(&self, id: BookingId) -> Result<Option<Booking<K>>>;
    fn update_booking(&mut self, booking: &Booking<K>) -> Result<()>;
    fn link_booking(&mut self, link: BookingTime) -> Result<()>;
    fn unlink_booking(&mut self, link: BookingTime) -> Result<()>;
    fn bookings_of_slot(&self, slot: SlotId) -> Result<Vec<BookingId>>;
    fn slots_of_booking(&self, booking: BookingId) -> Result<Vec<TimeSlot<K>>>;

    /// True when at least one booking reserves `slot`.
    fn is_booked(&self, slot: SlotId) -> Result<bool> {
        Ok(!self.bookings_of_slot(slot)?.is_empty())
    }
}
