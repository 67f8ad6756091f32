//! Compute free time for a subject.
//!
//! Free time is the union of the subject's occurrences inside the window, minus
//! every busy slot. Slots shared under the multi-booking policy stay
//! `busy = false` and therefore still show as free.

use crate::error::Result;
use crate::model::Subject;
use crate::span::{merge_spans, TimeSpan};
use crate::store::Store;

/// Free spans of `subject` within `window`, ordered and disjoint.
///
/// Returns an empty list when no occurrence falls inside the window.
pub fn free_times<K, S>(store: &S, subject: &K, window: TimeSpan) -> Result<Vec<TimeSpan>>
where
    K: Subject,
    S: Store<K>,
{
    let offered = merge_spans(
        store
            .occurrences_overlapping(subject, window)?
            .iter()
            .filter_map(|o| o.span().clipped(&window)),
    );
    if offered.is_empty() {
        return Ok(offered);
    }

    let busy: Vec<TimeSpan> = store
        .slots_overlapping(subject, window)?
        .iter()
        .filter(|s| s.busy)
        .map(|s| s.span())
        .collect();
    Ok(subtract_busy(offered, &busy))
}

/// The first free span of at least `min_minutes` within `window`.
pub fn first_free<K, S>(
    store: &S,
    subject: &K,
    window: TimeSpan,
    min_minutes: i64,
) -> Result<Option<TimeSpan>>
where
    K: Subject,
    S: Store<K>,
{
    Ok(free_times(store, subject, window)?
        .into_iter()
        .find(|span| span.duration_minutes() >= min_minutes))
}

/// Remove `busy` from the ordered, disjoint `free` spans.
///
/// Busy spans are applied in start order. A busy span strictly inside a free
/// span splits it, one covering an edge truncates it, and one covering it
/// entirely drops it.
pub fn subtract_busy(mut free: Vec<TimeSpan>, busy: &[TimeSpan]) -> Vec<TimeSpan> {
    let mut busy = busy.to_vec();
    busy.sort_by_key(|s| (s.start, s.end));

    for blocked in &busy {
        let mut next = Vec::with_capacity(free.len() + 1);
        for span in free {
            let (leading, trailing) = span.subtract(blocked);
            next.extend(leading);
            next.extend(trailing);
        }
        free = next;
    }
    free
}
