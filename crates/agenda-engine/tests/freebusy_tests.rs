//! Free-time queries over reconciled schedules.

use agenda_engine::{
    first_free, free_times, reconcile_availability, Availability, MemoryStore, Store, TimeSlot,
    TimeSpan,
};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

const HOST: &str = "host";

fn at(d: u32, h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, d, h, m, 0).unwrap()
}

fn span(d: u32, sh: u32, sm: u32, eh: u32, em: u32) -> TimeSpan {
    TimeSpan::new(at(d, sh, sm), at(d, eh, em))
}

/// Weekdays 09:00–17:00 UTC from Monday 2026-03-02, materialized for the week.
fn office_hours() -> MemoryStore<&'static str> {
    let mut store = MemoryStore::new();
    let availability = store
        .insert_availability(
            Availability::new(
                HOST,
                NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
                NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
                chrono_tz::UTC,
            )
            .with_recurrence("FREQ=WEEKLY;BYDAY=MO,TU,WE,TH,FR"),
        )
        .unwrap();
    reconcile_availability(
        &mut store,
        availability.id,
        TimeSpan::new(at(2, 0, 0), at(9, 0, 0)),
    )
    .unwrap();
    store
}

// ── free_times ─────────────────────────────────────────────

#[test]
fn free_time_is_clipped_to_the_window() {
    let store = office_hours();

    let free = free_times(&store, &HOST, span(3, 12, 0, 20, 0)).unwrap();

    assert_eq!(free, vec![span(3, 12, 0, 17, 0)]);
}

#[test]
fn window_across_days_lists_each_day() {
    let store = office_hours();

    let free = free_times(&store, &HOST, TimeSpan::new(at(5, 0, 0), at(8, 0, 0))).unwrap();

    // Thursday and Friday; the weekend offers nothing.
    assert_eq!(free, vec![span(5, 9, 0, 17, 0), span(6, 9, 0, 17, 0)]);
}

#[test]
fn busy_slots_are_carved_out() {
    let mut store = office_hours();
    store
        .insert_slot(TimeSlot::busy(HOST, span(3, 10, 0, 11, 30)))
        .unwrap();
    store
        .insert_slot(TimeSlot::busy(HOST, span(3, 16, 0, 18, 0)))
        .unwrap();

    let free = free_times(&store, &HOST, span(3, 0, 0, 23, 0)).unwrap();

    assert_eq!(free, vec![span(3, 9, 0, 10, 0), span(3, 11, 30, 16, 0)]);
}

#[test]
fn other_subjects_do_not_interfere() {
    let mut store = office_hours();
    store
        .insert_slot(TimeSlot::busy("someone-else", span(3, 10, 0, 11, 0)))
        .unwrap();

    let free = free_times(&store, &HOST, span(3, 0, 0, 23, 0)).unwrap();

    assert_eq!(free, vec![span(3, 9, 0, 17, 0)]);
    assert!(free_times(&store, &"someone-else", span(3, 0, 0, 23, 0))
        .unwrap()
        .is_empty());
}

// ── first_free ─────────────────────────────────────────────

#[test]
fn first_free_skips_short_gaps() {
    let mut store = office_hours();
    store
        .insert_slot(TimeSlot::busy(HOST, span(3, 9, 30, 16, 30)))
        .unwrap();

    let window = TimeSpan::new(at(3, 0, 0), at(3, 0, 0) + Duration::days(2));
    let found = first_free(&store, &HOST, window, 45).unwrap();

    assert_eq!(found, Some(span(4, 9, 0, 17, 0)));
}

#[test]
fn first_free_finds_nothing_when_every_gap_is_short() {
    let store = office_hours();

    let found = first_free(&store, &HOST, span(3, 9, 0, 10, 0), 90).unwrap();

    assert_eq!(found, None);
}
