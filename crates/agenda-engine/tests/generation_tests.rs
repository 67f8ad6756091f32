//! Slot generation: occurrences merge into free slots, split apart again when
//! removed, and free time avoids busy slots.

use agenda_engine::{
    audit_overlaps, delete_availability, free_times, reconcile_availability, Availability,
    MemoryStore, Store, TimeSlot, TimeSpan,
};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::America::Vancouver;
use chrono_tz::Tz;

const HOST: &str = "host";

fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
}

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

/// Insert a one-off availability and materialize it over a generous window.
fn offer(
    store: &mut MemoryStore<&'static str>,
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
    zone: Tz,
) -> Availability<&'static str> {
    let availability = store
        .insert_availability(Availability::new(HOST, date, start, end, zone))
        .unwrap();
    let day = zone
        .from_local_datetime(&date.and_hms_opt(0, 0, 0).unwrap())
        .unwrap()
        .with_timezone(&Utc);
    let window = TimeSpan::new(day - chrono::Duration::days(1), day + chrono::Duration::days(1));
    reconcile_availability(store, availability.id, window).unwrap();
    availability
}

fn slot_spans(store: &MemoryStore<&'static str>) -> Vec<(TimeSpan, bool)> {
    store
        .slots_of(&HOST)
        .unwrap()
        .into_iter()
        .map(|s| (s.span(), s.busy))
        .collect()
}

// ── Merging and splitting ──────────────────────────────────

#[test_log::test]
fn single_availability_yields_one_free_slot() {
    let mut store = MemoryStore::new();
    offer(
        &mut store,
        NaiveDate::from_ymd_opt(2001, 3, 4).unwrap(),
        hm(12, 0),
        hm(14, 0),
        Vancouver,
    );
    let span = TimeSpan::new(utc(2001, 3, 4, 20, 0), utc(2001, 3, 4, 22, 0));

    assert_eq!(store.occurrence_count(), 1);
    assert_eq!(slot_spans(&store), vec![(span, false)]);
    assert_eq!(free_times(&store, &HOST, span).unwrap(), vec![span]);
}

#[test_log::test]
fn contiguous_availabilities_merge_and_split_again() {
    let mut store = MemoryStore::new();
    let day = NaiveDate::from_ymd_opt(2002, 1, 9).unwrap();
    offer(&mut store, day, hm(8, 0), hm(10, 0), Vancouver);
    let middle = offer(&mut store, day, hm(9, 30), hm(12, 0), Vancouver);
    offer(&mut store, day, hm(12, 0), hm(14, 0), Vancouver);

    let whole = TimeSpan::new(utc(2002, 1, 9, 16, 0), utc(2002, 1, 9, 22, 0));
    assert_eq!(slot_spans(&store), vec![(whole, false)]);
    assert_eq!(free_times(&store, &HOST, whole).unwrap(), vec![whole]);

    delete_availability(&mut store, middle.id).unwrap();

    let morning = TimeSpan::new(utc(2002, 1, 9, 16, 0), utc(2002, 1, 9, 18, 0));
    let afternoon = TimeSpan::new(utc(2002, 1, 9, 20, 0), utc(2002, 1, 9, 22, 0));
    assert_eq!(
        slot_spans(&store),
        vec![(morning, false), (afternoon, false)]
    );
    assert_eq!(
        free_times(&store, &HOST, whole).unwrap(),
        vec![morning, afternoon]
    );
}

#[test]
fn merged_slot_remembers_every_contributor() {
    let mut store = MemoryStore::new();
    let day = NaiveDate::from_ymd_opt(2002, 1, 9).unwrap();
    offer(&mut store, day, hm(8, 0), hm(10, 0), Vancouver);
    offer(&mut store, day, hm(10, 0), hm(12, 0), Vancouver);

    let slots = store.slots_of(&HOST).unwrap();
    assert_eq!(slots.len(), 1);
    assert_eq!(store.occurrences_of_slot(slots[0].id).unwrap().len(), 2);
    assert!(audit_overlaps(&slots).is_empty());
}

#[test]
fn generation_flows_around_busy_slots() {
    let mut store = MemoryStore::new();
    let busy = TimeSpan::new(utc(2002, 1, 9, 12, 0), utc(2002, 1, 9, 13, 0));
    store.insert_slot(TimeSlot::busy(HOST, busy)).unwrap();

    offer(
        &mut store,
        NaiveDate::from_ymd_opt(2002, 1, 9).unwrap(),
        hm(10, 0),
        hm(18, 0),
        chrono_tz::UTC,
    );

    assert_eq!(
        slot_spans(&store),
        vec![
            (TimeSpan::new(utc(2002, 1, 9, 10, 0), busy.start), false),
            (busy, true),
            (TimeSpan::new(busy.end, utc(2002, 1, 9, 18, 0)), false),
        ]
    );
}

// ── Free time around busy slots ────────────────────────────

fn busy_fixture(busy: &[TimeSpan]) -> (MemoryStore<&'static str>, TimeSpan) {
    let mut store = MemoryStore::new();
    let span = TimeSpan::new(utc(2002, 1, 9, 10, 0), utc(2002, 1, 9, 18, 0));
    offer(
        &mut store,
        NaiveDate::from_ymd_opt(2002, 1, 9).unwrap(),
        hm(10, 0),
        hm(18, 0),
        chrono_tz::UTC,
    );
    assert_eq!(free_times(&store, &HOST, span).unwrap(), vec![span]);
    for b in busy {
        store.insert_slot(TimeSlot::busy(HOST, *b)).unwrap();
    }
    (store, span)
}

#[test]
fn busy_infix_splits_free_time() {
    let busy = TimeSpan::new(utc(2002, 1, 9, 12, 0), utc(2002, 1, 9, 13, 0));
    let (store, span) = busy_fixture(&[busy]);

    assert_eq!(
        free_times(&store, &HOST, span).unwrap(),
        vec![
            TimeSpan::new(span.start, busy.start),
            TimeSpan::new(busy.end, span.end)
        ]
    );
}

#[test]
fn busy_prefix_truncates_free_time() {
    let busy = TimeSpan::new(utc(2002, 1, 9, 8, 0), utc(2002, 1, 9, 12, 0));
    let (store, span) = busy_fixture(&[busy]);

    assert_eq!(
        free_times(&store, &HOST, span).unwrap(),
        vec![TimeSpan::new(busy.end, span.end)]
    );
}

#[test]
fn busy_suffix_truncates_free_time() {
    let busy = TimeSpan::new(utc(2002, 1, 9, 12, 0), utc(2002, 1, 9, 20, 0));
    let (store, span) = busy_fixture(&[busy]);

    assert_eq!(
        free_times(&store, &HOST, span).unwrap(),
        vec![TimeSpan::new(span.start, busy.start)]
    );
}

#[test]
fn double_infix_leaves_three_pieces() {
    let first = TimeSpan::new(utc(2002, 1, 9, 12, 0), utc(2002, 1, 9, 13, 0));
    let second = TimeSpan::new(utc(2002, 1, 9, 13, 15), utc(2002, 1, 9, 13, 30));
    let (store, span) = busy_fixture(&[first, second]);

    assert_eq!(
        free_times(&store, &HOST, span).unwrap(),
        vec![
            TimeSpan::new(span.start, first.start),
            TimeSpan::new(first.end, second.start),
            TimeSpan::new(second.end, span.end),
        ]
    );
}

#[test]
fn busy_time_elsewhere_changes_nothing() {
    let busy = TimeSpan::new(utc(2003, 1, 9, 12, 0), utc(2003, 1, 9, 20, 0));
    let (store, span) = busy_fixture(&[busy]);

    assert_eq!(free_times(&store, &HOST, span).unwrap(), vec![span]);
}

#[test]
fn no_occurrences_means_no_free_time() {
    let store: MemoryStore<&'static str> = MemoryStore::new();
    let window = TimeSpan::new(utc(2002, 1, 9, 0, 0), utc(2002, 1, 10, 0, 0));
    assert!(free_times(&store, &HOST, window).unwrap().is_empty());
}
