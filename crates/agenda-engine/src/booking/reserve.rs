//! Reserving slots for a booking.
//!
//! Saving a booking diffs the spans it wants (one per requested time while in
//! a reserved state) against the core slots it already holds, keyed by exact
//! bounds. Held slots nobody wants any more are released and their time handed
//! back to regeneration; wanted spans without a slot are placed:
//!
//! ```text
//!   free  08:00 ─────────────────────────────── 14:00
//!   book        10:30 pad 11:00 core 12:00 pad 12:30
//!   =>    08:00 free 10:30 │ busy │ busy │ busy │ 12:30 free 14:00
//! ```
//!
//! The free slots under the padded span are carved, leaving remainders that
//! keep the occurrence links of the slot they came from.

use std::collections::{BTreeSet, HashMap};

use chrono::Duration;

use super::padding::relay_padding;
use super::state::MAX_REQUESTED_TIMES;
use super::{Actor, Booking};
use crate::config::BookingPolicy;
use crate::error::{AgendaError, Result};
use crate::model::{BookingId, BookingTime, SlotId, SlotOccurrence, Subject, TimeSlot};
use crate::regen::regen_region;
use crate::span::{merge_spans, PaddedSpan, TimeSpan};
use crate::store::Store;

/// Persist `booking` and bring its slots in line with its requested times.
///
/// A new booking gets its id assigned. A changed padding re-lays the padding
/// slots of the cores it keeps. Everything happens in one transaction, so on
/// error neither the booking row nor any slot has changed.
///
/// # Errors
/// - `Validation` for a malformed booking or a duplicate of an existing one
/// - `TimeUnavailable` when a padded span hits busy time (other bookings'
///   padding included), an exact-time booking without `allow_multiple`, or
///   unscheduled time `actor` may not book
/// - `OverlappingTime` when a span partially overlaps another booking
pub fn save_booking<K, S>(
    store: &mut S,
    booking: &mut Booking<K>,
    actor: Actor,
    policy: &BookingPolicy<K>,
) -> Result<()>
where
    K: Subject,
    S: Store<K>,
{
    validate(booking)?;

    let saved = store.atomically(|tx| -> Result<Booking<K>> {
        let mut stored_padding = None;
        let row = if booking.id.is_saved() {
            stored_padding = tx.booking(booking.id)?.map(|stored| stored.padding);
            tx.update_booking(booking)?;
            booking.clone()
        } else {
            tx.insert_booking(booking.clone())?
        };

        let (add, release) = slot_diff(tx, &row)?;
        release_slots(tx, &row, release)?;
        for padded in add {
            place(tx, &row, padded, actor, policy)?;
        }
        if stored_padding.is_some_and(|padding| padding != row.padding) {
            relay_padding(tx, &row, policy.rules)?;
        }
        Ok(row)
    })?;

    booking.id = saved.id;
    Ok(())
}

fn validate<K: Subject>(booking: &Booking<K>) -> Result<()> {
    if booking.requested_times.is_empty() || booking.requested_times.len() > MAX_REQUESTED_TIMES {
        return Err(AgendaError::Validation(format!(
            "a booking needs between 1 and {MAX_REQUESTED_TIMES} requested times, got {}",
            booking.requested_times.len()
        )));
    }
    if booking.duration <= Duration::zero() {
        return Err(AgendaError::Validation(
            "booking duration must be positive".to_string(),
        ));
    }
    if booking.padding < Duration::zero() {
        return Err(AgendaError::Validation(
            "booking padding can't be negative".to_string(),
        ));
    }
    for &t in &booking.requested_times {
        let in_range = t.checked_sub_signed(booking.padding).is_some()
            && t.checked_add_signed(booking.duration)
                .and_then(|end| end.checked_add_signed(booking.padding))
                .is_some();
        if !in_range {
            return Err(AgendaError::Validation(format!(
                "booking at {t} with its duration and padding is out of range"
            )));
        }
    }
    let padded = booking.padded_spans();
    for (i, a) in padded.iter().enumerate() {
        if padded[i + 1..].iter().any(|b| a.outer().overlaps(&b.outer())) {
            return Err(AgendaError::Validation(
                "requested times of one booking can't overlap".to_string(),
            ));
        }
    }
    Ok(())
}

/// Spans still to be placed, and held core slots no longer wanted.
fn slot_diff<K, S>(store: &S, booking: &Booking<K>) -> Result<(Vec<PaddedSpan>, Vec<TimeSlot<K>>)>
where
    K: Subject,
    S: Store<K>,
{
    let mut held: HashMap<TimeSpan, TimeSlot<K>> = HashMap::new();
    if booking.id.is_saved() {
        for slot in store.slots_of_booking(booking.id)? {
            if !slot.is_padding() {
                held.insert(slot.span(), slot);
            }
        }
    }

    let mut add = Vec::new();
    for padded in booking.padded_spans() {
        if held.remove(&padded.core).is_none() {
            add.push(padded);
        }
    }
    let mut release: Vec<TimeSlot<K>> = held.into_values().collect();
    release.sort_by_key(|s| (s.start, s.id));
    Ok((add, release))
}

fn release_slots<K, S>(store: &mut S, booking: &Booking<K>, slots: Vec<TimeSlot<K>>) -> Result<()>
where
    K: Subject,
    S: Store<K>,
{
    let mut freed = Vec::new();
    for slot in slots {
        store.unlink_booking(BookingTime {
            booking: booking.id,
            slot: slot.id,
        })?;
        if store.is_booked(slot.id)? {
            continue;
        }
        let mut extent = slot.span();
        for pad in store.padding_of(slot.id)? {
            extent = extent.expanded(&pad.span());
        }
        store.remove_slot(slot.id)?;
        tracing::debug!(booking = %booking.id, slot = %slot.id, span = %extent, "released slot");
        freed.push(extent);
    }
    for region in merge_spans(freed) {
        regen_region(store, &booking.subject, region)?;
    }
    Ok(())
}

fn place<K, S>(
    store: &mut S,
    booking: &Booking<K>,
    padded: PaddedSpan,
    actor: Actor,
    policy: &BookingPolicy<K>,
) -> Result<()>
where
    K: Subject,
    S: Store<K>,
{
    let rules = policy.rules;
    let outer = padded.outer();
    let own: BTreeSet<SlotId> = store
        .slots_of_booking(booking.id)?
        .into_iter()
        .map(|s| s.id)
        .collect();
    let nearby: Vec<TimeSlot<K>> = store
        .slots_overlapping(&booking.subject, outer)?
        .into_iter()
        .filter(|s| !own.contains(&s.id) && !s.padding_for.is_some_and(|p| own.contains(&p)))
        .collect();

    // Same bounds as an existing booking: share its slot, or refuse.
    for slot in &nearby {
        if slot.is_padding() || slot.span() != padded.core {
            continue;
        }
        let holders = store.bookings_of_slot(slot.id)?;
        if holders.is_empty() {
            continue;
        }
        if !rules.allow_multiple {
            return Err(AgendaError::TimeUnavailable(
                "Requested time is already booked".to_string(),
            ));
        }
        check_duplicates(store, booking, &holders, policy)?;
        store.link_booking(BookingTime {
            booking: booking.id,
            slot: slot.id,
        })?;
        tracing::debug!(booking = %booking.id, slot = %slot.id, span = %padded.core, "sharing booked slot");
        return Ok(());
    }

    let mut free = Vec::new();
    let mut cover = Vec::new();
    for slot in nearby {
        if store.is_booked(slot.id)? {
            if !rules.allow_overlapping {
                return Err(AgendaError::OverlappingTime);
            }
            cover.push(slot.span());
        } else if slot.busy {
            if !rules.allow_overlapping {
                return Err(AgendaError::TimeUnavailable(
                    "Requested time is busy".to_string(),
                ));
            }
            cover.push(slot.span());
        } else {
            cover.push(slot.span());
            free.push(slot);
        }
    }

    let scheduled = merge_spans(cover).iter().any(|m| m.contains(&outer));
    if !scheduled {
        if !rules.unscheduled.permits(actor) {
            return Err(AgendaError::TimeUnavailable(
                "Requested time is unavailable".to_string(),
            ));
        }
        tracing::debug!(booking = %booking.id, span = %outer, ?actor, "booking unscheduled time");
    }

    for slot in &free {
        carve(store, slot, outer)?;
    }

    let mut core = TimeSlot::free(booking.subject.clone(), padded.core);
    core.busy = !rules.allow_multiple;
    let core = store.insert_slot(core)?;
    store.link_booking(BookingTime {
        booking: booking.id,
        slot: core.id,
    })?;
    if padded.padding > Duration::zero() {
        for pad in [padded.leading(), padded.trailing()] {
            store.insert_slot(TimeSlot::padding(booking.subject.clone(), pad, core.id))?;
        }
    }
    tracing::debug!(booking = %booking.id, slot = %core.id, span = %padded.core, busy = core.busy, "reserved slot");
    Ok(())
}

fn check_duplicates<K, S>(
    store: &S,
    booking: &Booking<K>,
    holders: &[BookingId],
    policy: &BookingPolicy<K>,
) -> Result<()>
where
    K: Subject,
    S: Store<K>,
{
    for &holder in holders {
        if holder == booking.id {
            continue;
        }
        if let Some(existing) = store.booking(holder)? {
            if (policy.is_duplicate)(booking, &existing) {
                return Err(AgendaError::Validation("Duplicate booking".to_string()));
            }
        }
    }
    Ok(())
}

/// Cut `span` out of a free slot.
///
/// Whatever lies outside `span` survives as new free slots, linked to those of
/// the slot's occurrences that still reach them.
pub(super) fn carve<K, S>(store: &mut S, slot: &TimeSlot<K>, span: TimeSpan) -> Result<()>
where
    K: Subject,
    S: Store<K>,
{
    let fed_by = store.occurrences_of_slot(slot.id)?;
    let (leading, trailing) = slot.span().subtract(&span);
    store.remove_slot(slot.id)?;

    for piece in [leading, trailing].into_iter().flatten() {
        let remainder = store.insert_slot(TimeSlot::free(slot.subject.clone(), piece))?;
        for &occurrence in &fed_by {
            let reaches = store
                .occurrence(occurrence)?
                .is_some_and(|o| o.span().connects(&piece));
            if reaches {
                store.link_occurrence(SlotOccurrence {
                    slot: remainder.id,
                    occurrence,
                })?;
            }
        }
        tracing::trace!(from = %slot.id, slot = %remainder.id, span = %piece, "kept remainder");
    }
    Ok(())
}
