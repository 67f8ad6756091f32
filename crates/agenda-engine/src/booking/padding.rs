//! Re-laying padding slots after a booking's padding changed.
//!
//! [`save_booking`](super::save_booking) runs this inside its own transaction
//! whenever the saved padding differs from the stored row, so the row and its
//! padding slots always change together. [`padding_changed`] re-lays the
//! slots of a row that was updated some other way.

use chrono::Duration;

use super::reserve::carve;
use super::Booking;
use crate::config::{BookingPolicy, BookingRules};
use crate::error::{AgendaError, Result};
use crate::model::{BookingId, Subject, TimeSlot};
use crate::regen::regen_region;
use crate::span::{merge_spans, PaddedSpan, TimeSpan};
use crate::store::Store;

/// Resize, create or drop the padding slots around every core slot the
/// stored booking holds so they match its padding.
///
/// Growing padding takes time from neighbouring free slots; shrinking it hands
/// the released time back to regeneration. A stale id is a no-op.
///
/// # Errors
/// `TimeUnavailable` if grown padding would cover busy time or a slot held by
/// another booking (unless `allow_overlapping`), `Validation` if the core
/// slot is shared with other bookings. Nothing changes in either case.
pub fn padding_changed<K, S>(
    store: &mut S,
    booking: BookingId,
    policy: &BookingPolicy<K>,
) -> Result<()>
where
    K: Subject,
    S: Store<K>,
{
    store.atomically(|tx| -> Result<()> {
        let Some(booking) = tx.booking(booking)? else {
            tracing::debug!(%booking, "booking vanished before padding update, skipping");
            return Ok(());
        };
        relay_padding(tx, &booking, policy.rules)
    })
}

/// Bring the padding slots of `booking`'s cores in line with `booking.padding`.
///
/// Runs inside the caller's transaction.
pub(super) fn relay_padding<K, S>(
    store: &mut S,
    booking: &Booking<K>,
    rules: BookingRules,
) -> Result<()>
where
    K: Subject,
    S: Store<K>,
{
    let padding = booking.padding.max(Duration::zero());

    let mut freed = Vec::new();
    for core in store.slots_of_booking(booking.id)? {
        if core.is_padding() {
            continue;
        }
        let layout = PaddedSpan::new(core.span(), padding);
        let (mut before, mut after) = (None, None);
        for pad in store.padding_of(core.id)? {
            if pad.start < core.start {
                before = Some(pad);
            } else {
                after = Some(pad);
            }
        }
        let moves = !fits(&before, layout.leading()) || !fits(&after, layout.trailing());
        if moves && store.bookings_of_slot(core.id)?.len() > 1 {
            return Err(AgendaError::Validation(
                "padding of a time shared with other bookings can't change".to_string(),
            ));
        }
        freed.extend(relay(store, booking, &core, before, layout.leading(), rules)?);
        freed.extend(relay(store, booking, &core, after, layout.trailing(), rules)?);
    }

    for region in merge_spans(freed) {
        regen_region(store, &booking.subject, region)?;
    }
    Ok(())
}

/// The padding slot already matches `target`, a missing one matching no padding.
fn fits<K: Subject>(existing: &Option<TimeSlot<K>>, target: TimeSpan) -> bool {
    match existing {
        Some(pad) => pad.span() == target,
        None => !target.is_real(),
    }
}

/// Move one padding slot to `target`, returning the time it gave up.
fn relay<K, S>(
    store: &mut S,
    booking: &Booking<K>,
    core: &TimeSlot<K>,
    existing: Option<TimeSlot<K>>,
    target: TimeSpan,
    rules: BookingRules,
) -> Result<Vec<TimeSpan>>
where
    K: Subject,
    S: Store<K>,
{
    let Some(mut pad) = existing else {
        if target.is_real() {
            claim(store, core, target, rules)?;
            let pad = store.insert_slot(TimeSlot::padding(booking.subject.clone(), target, core.id))?;
            tracing::debug!(booking = %booking.id, slot = %pad.id, span = %target, "added padding");
        }
        return Ok(Vec::new());
    };

    let old = pad.span();
    if !target.is_real() {
        store.remove_slot(pad.id)?;
        tracing::debug!(booking = %booking.id, slot = %pad.id, "dropped padding");
        return Ok(vec![old]);
    }
    if old == target {
        return Ok(Vec::new());
    }

    claim(store, core, target, rules)?;
    pad.set_span(target);
    store.update_slot(&pad)?;
    tracing::debug!(booking = %booking.id, slot = %pad.id, from = %old, to = %target, "resized padding");

    let (leading, trailing) = old.subtract(&target);
    Ok([leading, trailing].into_iter().flatten().collect())
}

/// Clear free slots out of `span` so padding can occupy it.
fn claim<K, S>(store: &mut S, core: &TimeSlot<K>, span: TimeSpan, rules: BookingRules) -> Result<()>
where
    K: Subject,
    S: Store<K>,
{
    for slot in store.slots_overlapping(&core.subject, span)? {
        if slot.id == core.id || slot.padding_for == Some(core.id) {
            continue;
        }
        if slot.busy || store.is_booked(slot.id)? {
            if rules.allow_overlapping {
                continue;
            }
            return Err(AgendaError::TimeUnavailable(format!(
                "padding {span} would overlap reserved time"
            )));
        }
        carve(store, &slot, span)?;
    }
    Ok(())
}
