//! Housekeeping: clearing materialized occurrences and slots that have passed.

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::model::Subject;
use crate::reconcile::delete_occurrence;
use crate::store::Store;

/// Delete every occurrence of every availability, with the free slots they fed.
///
/// Availabilities stay; reconcile them again to rebuild. Booked and busy slots
/// are kept. Returns how many occurrences were removed.
pub fn clear_occurrences<K, S>(store: &mut S) -> Result<usize>
where
    K: Subject,
    S: Store<K>,
{
    store.atomically(|tx| -> Result<usize> {
        let mut removed = 0;
        for availability in tx.availabilities()? {
            for occurrence in tx.occurrences_of(availability.id)? {
                delete_occurrence(tx, occurrence.id)?;
                removed += 1;
            }
        }
        tracing::info!(removed, "cleared occurrences");
        Ok(removed)
    })
}

/// Delete free, unbooked slots of `subject` that ended at or before `now`.
///
/// Returns how many slots were removed.
pub fn clear_old_slots<K, S>(store: &mut S, subject: &K, now: DateTime<Utc>) -> Result<usize>
where
    K: Subject,
    S: Store<K>,
{
    store.atomically(|tx| -> Result<usize> {
        let mut removed = 0;
        for slot in tx.slots_of(subject)? {
            if slot.end > now || slot.busy || tx.is_booked(slot.id)? {
                continue;
            }
            tx.remove_slot(slot.id)?;
            removed += 1;
        }
        tracing::debug!(?subject, removed, before = %now, "cleared old slots");
        Ok(removed)
    })
}
