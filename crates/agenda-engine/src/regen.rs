//! Slot regeneration: keeps a subject's free slots in step with its occurrences.
//!
//! Adding an occurrence sweeps its span left to right. Busy or booked slots
//! are obstacles; the free stretch before each obstacle, and the stretch after
//! the last one, is *flushed*: joined onto whatever free slots it touches, or
//! materialized as a new free slot. Removing an occurrence drops the free slots
//! it fed and lets every sibling occurrence that shared them rebuild its own
//! coverage, which is how one merged region splits back into pieces.
//!
//! Regeneration can cascade (dropping a slot regenerates its siblings, whose
//! sweeps may find orphaned slots of their own), so work is driven from a
//! queue rather than by recursion.

use std::collections::{BTreeSet, VecDeque};

use crate::error::Result;
use crate::model::{Occurrence, OccurrenceId, SlotId, SlotOccurrence, Subject, TimeSlot};
use crate::span::TimeSpan;
use crate::store::Store;

/// Fit one occurrence into its subject's slots.
///
/// A stale id (the occurrence was deleted meanwhile) is a no-op.
pub fn regen_for_occurrence<K, S>(store: &mut S, occurrence: OccurrenceId) -> Result<()>
where
    K: Subject,
    S: Store<K>,
{
    let mut queue = VecDeque::from([occurrence]);
    drain(store, &mut queue)
}

/// Regenerate every occurrence of `subject` that touches `region`.
///
/// Used after busy time is released so the freed region is covered again.
pub fn regen_region<K, S>(store: &mut S, subject: &K, region: TimeSpan) -> Result<()>
where
    K: Subject,
    S: Store<K>,
{
    let mut queue: VecDeque<OccurrenceId> = store
        .occurrences_touching(subject, region)?
        .into_iter()
        .map(|o| o.id)
        .collect();
    drain(store, &mut queue)
}

/// Detach an occurrence from the slots it feeds, ahead of deleting it.
///
/// Each of those slots is dropped and the other occurrences that fed them are
/// regenerated, so coverage shrinks to what the remaining occurrences justify.
pub fn detach_occurrence<K, S>(store: &mut S, occurrence: OccurrenceId) -> Result<()>
where
    K: Subject,
    S: Store<K>,
{
    let slots = store.slots_of_occurrence(occurrence)?;
    let mut queue = VecDeque::new();
    disconnect_slots(store, occurrence, &slots, &mut queue)?;
    drain(store, &mut queue)
}

fn drain<K, S>(store: &mut S, queue: &mut VecDeque<OccurrenceId>) -> Result<()>
where
    K: Subject,
    S: Store<K>,
{
    while let Some(id) = queue.pop_front() {
        regen_one(store, id, queue)?;
    }
    Ok(())
}

fn disconnect_slots<K, S>(
    store: &mut S,
    occurrence: OccurrenceId,
    slots: &[SlotId],
    queue: &mut VecDeque<OccurrenceId>,
) -> Result<()>
where
    K: Subject,
    S: Store<K>,
{
    let mut siblings = BTreeSet::new();
    for &slot_id in slots {
        let Some(slot) = store.slot(slot_id)? else {
            continue;
        };
        siblings.extend(
            store
                .occurrences_of_slot(slot_id)?
                .into_iter()
                .filter(|o| *o != occurrence),
        );
        if slot.busy || store.is_booked(slot_id)? {
            // Reserved time outlives the free intent that produced it.
            store.unlink_occurrence(SlotOccurrence {
                slot: slot_id,
                occurrence,
            })?;
        } else {
            tracing::trace!(slot = %slot_id, span = %slot.span(), "dropping free slot");
            store.remove_slot(slot_id)?;
        }
    }
    for sibling in siblings {
        if !queue.contains(&sibling) {
            queue.push_back(sibling);
        }
    }
    Ok(())
}

fn regen_one<K, S>(store: &mut S, id: OccurrenceId, queue: &mut VecDeque<OccurrenceId>) -> Result<()>
where
    K: Subject,
    S: Store<K>,
{
    let Some(occurrence) = store.occurrence(id)? else {
        tracing::debug!(occurrence = %id, "occurrence vanished before regeneration, skipping");
        return Ok(());
    };
    let span = occurrence.span();

    // Slots this occurrence fed that no longer touch it are orphans.
    let mut orphans = Vec::new();
    for slot_id in store.slots_of_occurrence(id)? {
        if let Some(slot) = store.slot(slot_id)? {
            if !slot.span().connects(&span) {
                orphans.push(slot_id);
            }
        }
    }
    if !orphans.is_empty() {
        disconnect_slots(store, id, &orphans, queue)?;
    }

    let extant = store.slots_touching(&occurrence.subject, span)?;
    let mut cursor = span.start;
    let mut merge: Vec<TimeSlot<K>> = Vec::new();
    for slot in extant {
        if slot.busy || store.is_booked(slot.id)? {
            flush(store, &occurrence, TimeSpan::new(cursor, slot.start), &merge)?;
            merge.clear();
            cursor = cursor.max(slot.end);
        } else {
            merge.push(slot);
        }
    }
    flush(store, &occurrence, TimeSpan::new(cursor, span.end), &merge)
}

/// Cover `free` with a free slot fed by `occurrence`.
///
/// If free slots in `candidates` touch `free`, the first absorbs the others
/// (taking over their occurrence links) and grows to the bounding span;
/// otherwise a new slot is created for exactly `free`.
fn flush<K, S>(
    store: &mut S,
    occurrence: &Occurrence<K>,
    free: TimeSpan,
    candidates: &[TimeSlot<K>],
) -> Result<()>
where
    K: Subject,
    S: Store<K>,
{
    if !free.is_real() {
        return Ok(());
    }
    let mut connected = candidates.iter().filter(|s| s.span().connects(&free));

    let Some(first) = connected.next() else {
        let slot = store.insert_slot(TimeSlot::free(occurrence.subject.clone(), free))?;
        store.link_occurrence(SlotOccurrence {
            slot: slot.id,
            occurrence: occurrence.id,
        })?;
        tracing::debug!(slot = %slot.id, span = %free, occurrence = %occurrence.id, "created free slot");
        return Ok(());
    };

    let mut keeper = first.clone();
    let mut bounds = free.expanded(&keeper.span());
    for other in connected {
        bounds = bounds.expanded(&other.span());
        for fed_by in store.occurrences_of_slot(other.id)? {
            store.link_occurrence(SlotOccurrence {
                slot: keeper.id,
                occurrence: fed_by,
            })?;
        }
        store.remove_slot(other.id)?;
        tracing::trace!(slot = %other.id, into = %keeper.id, "merged free slot");
    }
    if keeper.span() != bounds {
        keeper.set_span(bounds);
        store.update_slot(&keeper)?;
        tracing::debug!(slot = %keeper.id, span = %bounds, "expanded free slot");
    }
    store.link_occurrence(SlotOccurrence {
        slot: keeper.id,
        occurrence: occurrence.id,
    })
}
