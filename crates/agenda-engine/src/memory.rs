//! In-memory [`Store`] with snapshot rollback.

use std::collections::{BTreeMap, BTreeSet};

use crate::booking::Booking;
use crate::error::{AgendaError, Result};
use crate::model::{
    Availability, AvailabilityId, BookingId, BookingTime, Occurrence, OccurrenceId, SlotId,
    SlotOccurrence, Subject, TimeSlot,
};
use crate::span::TimeSpan;
use crate::store::Store;

#[derive(Debug, Clone)]
struct Tables<K> {
    next_id: u64,
    availabilities: BTreeMap<AvailabilityId, Availability<K>>,
    occurrences: BTreeMap<OccurrenceId, Occurrence<K>>,
    slots: BTreeMap<SlotId, TimeSlot<K>>,
    bookings: BTreeMap<BookingId, Booking<K>>,
    slot_occurrences: BTreeSet<SlotOccurrence>,
    booking_times: BTreeSet<BookingTime>,
}

impl<K> Default for Tables<K> {
    fn default() -> Self {
        Self {
            next_id: 1,
            availabilities: BTreeMap::new(),
            occurrences: BTreeMap::new(),
            slots: BTreeMap::new(),
            bookings: BTreeMap::new(),
            slot_occurrences: BTreeSet::new(),
            booking_times: BTreeSet::new(),
        }
    }
}

impl<K> Tables<K> {
    fn allocate(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// A [`Store`] that keeps every table in memory.
///
/// Transactions snapshot the tables and restore them when the closure fails.
/// Ids are allocated from one counter shared by all tables, so they are
/// unique across entity kinds and increase in creation order.
#[derive(Debug, Clone)]
pub struct MemoryStore<K> {
    tables: Tables<K>,
}

impl<K> Default for MemoryStore<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> MemoryStore<K> {
    pub fn new() -> Self {
        Self {
            tables: Tables::default(),
        }
    }

    pub fn slot_count(&self) -> usize {
        self.tables.slots.len()
    }

    pub fn occurrence_count(&self) -> usize {
        self.tables.occurrences.len()
    }
}

fn by_start<K: Subject>(mut slots: Vec<TimeSlot<K>>) -> Vec<TimeSlot<K>> {
    slots.sort_by_key(|s| (s.start, s.end, s.id));
    slots
}

fn missing(kind: &str, id: impl std::fmt::Display) -> AgendaError {
    AgendaError::Store(format!("{kind} {id} does not exist"))
}

impl<K: Subject> MemoryStore<K> {
    fn remove_slot_row(&mut self, id: SlotId) -> Option<TimeSlot<K>> {
        let removed = self.tables.slots.remove(&id)?;
        self.tables.slot_occurrences.retain(|link| link.slot != id);
        self.tables.booking_times.retain(|link| link.slot != id);
        let padding: Vec<SlotId> = self
            .tables
            .slots
            .values()
            .filter(|s| s.padding_for == Some(id))
            .map(|s| s.id)
            .collect();
        for pad in padding {
            self.remove_slot_row(pad);
        }
        Some(removed)
    }

    fn occurrences_where(
        &self,
        subject: &K,
        keep: impl Fn(&Occurrence<K>) -> bool,
    ) -> Vec<Occurrence<K>> {
        let mut found: Vec<Occurrence<K>> = self
            .tables
            .occurrences
            .values()
            .filter(|o| &o.subject == subject && keep(o))
            .cloned()
            .collect();
        found.sort_by_key(|o| (o.start, o.end, o.id));
        found
    }

    fn slots_where(&self, subject: &K, keep: impl Fn(&TimeSlot<K>) -> bool) -> Vec<TimeSlot<K>> {
        by_start(
            self.tables
                .slots
                .values()
                .filter(|s| &s.subject == subject && keep(s))
                .cloned()
                .collect(),
        )
    }
}

impl<K: Subject> Store<K> for MemoryStore<K> {
    fn atomically<T, E, F>(&mut self, f: F) -> std::result::Result<T, E>
    where
        F: FnOnce(&mut Self) -> std::result::Result<T, E>,
    {
        let snapshot = self.tables.clone();
        let result = f(self);
        if result.is_err() {
            tracing::debug!("transaction failed, restoring snapshot");
            self.tables = snapshot;
        }
        result
    }

    // ── Availabilities ─────────────────────────────────────

    fn insert_availability(&mut self, mut availability: Availability<K>) -> Result<Availability<K>> {
        availability.id = AvailabilityId(self.tables.allocate());
        self.tables
            .availabilities
            .insert(availability.id, availability.clone());
        Ok(availability)
    }

    fn availability(&self, id: AvailabilityId) -> Result<Option<Availability<K>>> {
        Ok(self.tables.availabilities.get(&id).cloned())
    }

    fn update_availability(&mut self, availability: &Availability<K>) -> Result<()> {
        let row = self
            .tables
            .availabilities
            .get_mut(&availability.id)
            .ok_or_else(|| missing("availability", availability.id))?;
        *row = availability.clone();
        Ok(())
    }

    fn remove_availability(&mut self, id: AvailabilityId) -> Result<Option<Availability<K>>> {
        Ok(self.tables.availabilities.remove(&id))
    }

    fn availabilities(&self) -> Result<Vec<Availability<K>>> {
        Ok(self.tables.availabilities.values().cloned().collect())
    }

    // ── Occurrences ────────────────────────────────────────

    fn insert_occurrence(&mut self, mut occurrence: Occurrence<K>) -> Result<Occurrence<K>> {
        occurrence.id = OccurrenceId(self.tables.allocate());
        self.tables
            .occurrences
            .insert(occurrence.id, occurrence.clone());
        Ok(occurrence)
    }

    fn occurrence(&self, id: OccurrenceId) -> Result<Option<Occurrence<K>>> {
        Ok(self.tables.occurrences.get(&id).cloned())
    }

    fn remove_occurrence(&mut self, id: OccurrenceId) -> Result<Option<Occurrence<K>>> {
        let removed = self.tables.occurrences.remove(&id);
        if removed.is_some() {
            self.tables
                .slot_occurrences
                .retain(|link| link.occurrence != id);
        }
        Ok(removed)
    }

    fn occurrences_of(&self, availability: AvailabilityId) -> Result<Vec<Occurrence<K>>> {
        let mut found: Vec<Occurrence<K>> = self
            .tables
            .occurrences
            .values()
            .filter(|o| o.availability == availability)
            .cloned()
            .collect();
        found.sort_by_key(|o| (o.start, o.end, o.id));
        Ok(found)
    }

    fn occurrences_touching(&self, subject: &K, span: TimeSpan) -> Result<Vec<Occurrence<K>>> {
        Ok(self.occurrences_where(subject, |o| o.span().connects(&span)))
    }

    fn occurrences_overlapping(
        &self,
        subject: &K,
        span: TimeSpan,
    ) -> Result<Vec<Occurrence<K>>> {
        Ok(self.occurrences_where(subject, |o| o.span().overlaps(&span)))
    }

    // ── Time slots ─────────────────────────────────────────

    fn insert_slot(&mut self, mut slot: TimeSlot<K>) -> Result<TimeSlot<K>> {
        slot.id = SlotId(self.tables.allocate());
        self.tables.slots.insert(slot.id, slot.clone());
        Ok(slot)
    }

    fn slot(&self, id: SlotId) -> Result<Option<TimeSlot<K>>> {
        Ok(self.tables.slots.get(&id).cloned())
    }

    fn update_slot(&mut self, slot: &TimeSlot<K>) -> Result<()> {
        let row = self
            .tables
            .slots
            .get_mut(&slot.id)
            .ok_or_else(|| missing("time slot", slot.id))?;
        *row = slot.clone();
        Ok(())
    }

    fn remove_slot(&mut self, id: SlotId) -> Result<Option<TimeSlot<K>>> {
        Ok(self.remove_slot_row(id))
    }

    fn slots_of(&self, subject: &K) -> Result<Vec<TimeSlot<K>>> {
        Ok(self.slots_where(subject, |_| true))
    }

    fn slots_touching(&self, subject: &K, span: TimeSpan) -> Result<Vec<TimeSlot<K>>> {
        Ok(self.slots_where(subject, |s| s.span().connects(&span)))
    }

    fn slots_overlapping(&self, subject: &K, span: TimeSpan) -> Result<Vec<TimeSlot<K>>> {
        Ok(self.slots_where(subject, |s| s.span().overlaps(&span)))
    }

    fn padding_of(&self, slot: SlotId) -> Result<Vec<TimeSlot<K>>> {
        Ok(by_start(
            self.tables
                .slots
                .values()
                .filter(|s| s.padding_for == Some(slot))
                .cloned()
                .collect(),
        ))
    }

    // ── Slot ↔ occurrence ──────────────────────────────────

    fn link_occurrence(&mut self, link: SlotOccurrence) -> Result<()> {
        if !self.tables.slots.contains_key(&link.slot) {
            return Err(missing("time slot", link.slot));
        }
        if !self.tables.occurrences.contains_key(&link.occurrence) {
            return Err(missing("occurrence", link.occurrence));
        }
        self.tables.slot_occurrences.insert(link);
        Ok(())
    }

    fn unlink_occurrence(&mut self, link: SlotOccurrence) -> Result<()> {
        self.tables.slot_occurrences.remove(&link);
        Ok(())
    }

    fn occurrences_of_slot(&self, slot: SlotId) -> Result<Vec<OccurrenceId>> {
        Ok(self
            .tables
            .slot_occurrences
            .iter()
            .filter(|link| link.slot == slot)
            .map(|link| link.occurrence)
            .collect())
    }

    fn slots_of_occurrence(&self, occurrence: OccurrenceId) -> Result<Vec<SlotId>> {
        Ok(self
            .tables
            .slot_occurrences
            .iter()
            .filter(|link| link.occurrence == occurrence)
            .map(|link| link.slot)
            .collect())
    }

    // ── Bookings ───────────────────────────────────────────

    fn insert_booking(&mut self, mut booking: Booking<K>) -> Result<Booking<K>> {
        booking.id = BookingId(self.tables.allocate());
        self.tables.bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    fn booking(&self, id: BookingId) -> Result<Option<Booking<K>>> {
        Ok(self.tables.bookings.get(&id).cloned())
    }

    fn update_booking(&mut self, booking: &Booking<K>) -> Result<()> {
        let row = self
            .tables
            .bookings
            .get_mut(&booking.id)
            .ok_or_else(|| missing("booking", booking.id))?;
        *row = booking.clone();
        Ok(())
    }

    fn link_booking(&mut self, link: BookingTime) -> Result<()> {
        if !self.tables.slots.contains_key(&link.slot) {
            return Err(missing("time slot", link.slot));
        }
        if !self.tables.bookings.contains_key(&link.booking) {
            return Err(missing("booking", link.booking));
        }
        self.tables.booking_times.insert(link);
        Ok(())
    }

    fn unlink_booking(&mut self, link: BookingTime) -> Result<()> {
        self.tables.booking_times.remove(&link);
        Ok(())
    }

    fn bookings_of_slot(&self, slot: SlotId) -> Result<Vec<BookingId>> {
        Ok(self
            .tables
            .booking_times
            .iter()
            .filter(|link| link.slot == slot)
            .map(|link| link.booking)
            .collect())
    }

    fn slots_of_booking(&self, booking: BookingId) -> Result<Vec<TimeSlot<K>>> {
        Ok(by_start(
            self.tables
                .booking_times
                .iter()
                .filter(|link| link.booking == booking)
                .filter_map(|link| self.tables.slots.get(&link.slot).cloned())
                .collect(),
        ))
    }
}
