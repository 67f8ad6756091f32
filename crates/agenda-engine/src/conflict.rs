//! Detect slots that overlap when they shouldn't.
//!
//! A subject's slots never overlap, except a padding slot and the slot it
//! pads. [`audit_overlaps`] reports every pair breaking that rule, e.g. after
//! bookings placed with `allow_overlapping`.
//! Adjacent slots (one ends exactly when the other starts) are not conflicts.

use crate::model::{SlotId, Subject, TimeSlot};
use crate::span::TimeSpan;

/// Two slots of the same subject whose spans overlap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotConflict {
    pub slot_a: SlotId,
    pub slot_b: SlotId,
    pub overlap: TimeSpan,
    pub overlap_minutes: i64,
}

/// Find all pairwise overlaps among `slots`.
///
/// Slots of different subjects never conflict. Pairs are reported once, in
/// input order.
pub fn audit_overlaps<K: Subject>(slots: &[TimeSlot<K>]) -> Vec<SlotConflict> {
    let mut conflicts = Vec::new();

    for (i, a) in slots.iter().enumerate() {
        for b in &slots[i + 1..] {
            if a.subject != b.subject || pads(a, b) || pads(b, a) {
                continue;
            }
            if let Some(overlap) = a.span().clipped(&b.span()) {
                conflicts.push(SlotConflict {
                    slot_a: a.id,
                    slot_b: b.id,
                    overlap,
                    overlap_minutes: overlap.duration_minutes(),
                });
            }
        }
    }

    conflicts
}

fn pads<K>(padding: &TimeSlot<K>, core: &TimeSlot<K>) -> bool {
    padding.padding_for == Some(core.id)
}
