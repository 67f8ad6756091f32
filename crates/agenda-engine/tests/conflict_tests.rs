//! Tests for the slot overlap audit.

use agenda_engine::{audit_overlaps, SlotId, TimeSlot, TimeSpan};
use chrono::{TimeZone, Utc};

fn span(sh: u32, sm: u32, eh: u32, em: u32) -> TimeSpan {
    TimeSpan::new(
        Utc.with_ymd_and_hms(2026, 3, 16, sh, sm, 0).unwrap(),
        Utc.with_ymd_and_hms(2026, 3, 16, eh, em, 0).unwrap(),
    )
}

fn slot(id: u64, span: TimeSpan) -> TimeSlot<&'static str> {
    let mut slot = TimeSlot::busy("host", span);
    slot.id = SlotId(id);
    slot
}

#[test]
fn partial_overlap_is_reported_with_its_length() {
    let slots = vec![slot(1, span(9, 0, 10, 0)), slot(2, span(9, 30, 11, 0))];

    let conflicts = audit_overlaps(&slots);

    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].slot_a, SlotId(1));
    assert_eq!(conflicts[0].slot_b, SlotId(2));
    assert_eq!(conflicts[0].overlap, span(9, 30, 10, 0));
    assert_eq!(conflicts[0].overlap_minutes, 30);
}

#[test]
fn adjacent_slots_do_not_conflict() {
    let slots = vec![slot(1, span(9, 0, 10, 0)), slot(2, span(10, 0, 11, 0))];
    assert!(audit_overlaps(&slots).is_empty());
}

#[test]
fn nested_slot_conflicts_for_its_whole_length() {
    let slots = vec![slot(1, span(8, 0, 14, 0)), slot(2, span(11, 0, 12, 15))];

    let conflicts = audit_overlaps(&slots);

    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].overlap_minutes, 75);
}

#[test]
fn every_overlapping_pair_is_reported_once() {
    let slots = vec![
        slot(1, span(9, 0, 12, 0)),
        slot(2, span(10, 0, 11, 0)),
        slot(3, span(10, 30, 13, 0)),
    ];

    let pairs: Vec<(SlotId, SlotId)> = audit_overlaps(&slots)
        .into_iter()
        .map(|c| (c.slot_a, c.slot_b))
        .collect();

    assert_eq!(
        pairs,
        vec![
            (SlotId(1), SlotId(2)),
            (SlotId(1), SlotId(3)),
            (SlotId(2), SlotId(3)),
        ]
    );
}

#[test]
fn padding_may_overlap_its_own_slot() {
    let core = slot(1, span(11, 0, 12, 0));
    let mut pad = TimeSlot::padding("host", span(10, 30, 11, 15), core.id);
    pad.id = SlotId(2);

    assert!(audit_overlaps(&[core, pad]).is_empty());
}

#[test]
fn padding_of_different_slots_conflicts() {
    let mut pad = TimeSlot::padding("host", span(10, 30, 11, 0), SlotId(1));
    pad.id = SlotId(2);
    let mut neighbour_pad = TimeSlot::padding("host", span(10, 45, 11, 15), SlotId(9));
    neighbour_pad.id = SlotId(3);

    let conflicts = audit_overlaps(&[pad, neighbour_pad]);

    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].overlap, span(10, 45, 11, 0));
    assert_eq!(conflicts[0].overlap_minutes, 15);
}

#[test]
fn other_subjects_never_conflict() {
    let mine = slot(1, span(9, 0, 10, 0));
    let mut theirs = TimeSlot::busy("guest", span(9, 0, 10, 0));
    theirs.id = SlotId(2);

    assert!(audit_overlaps(&[mine, theirs]).is_empty());
}
