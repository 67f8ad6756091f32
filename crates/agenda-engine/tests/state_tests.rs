//! Booking state machine transitions.

use agenda_engine::{Actor, AgendaError, Booking, BookingState, Party, TimeSpan};
use chrono::{DateTime, Duration, TimeZone, Utc};

fn at(d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, d, h, 0, 0).unwrap()
}

fn booking() -> Booking<u32> {
    Booking::new(1, 2, at(10, 9), Duration::hours(1)).with_alternative(at(11, 9))
}

fn confirmed() -> Booking<u32> {
    let mut b = booking();
    b.confirm(Actor::HOST, at(10, 9)).unwrap();
    b
}

// ── confirm ────────────────────────────────────────────────

#[test]
fn confirm_collapses_to_the_chosen_time() {
    let b = confirmed();
    assert_eq!(b.state, BookingState::Confirmed);
    assert_eq!(b.requested_times, vec![at(10, 9)]);
    assert_eq!(b.assignee, None);
}

#[test]
fn confirm_rejects_an_unrequested_time() {
    let mut b = booking();
    let err = b.confirm(Actor::HOST, at(12, 9)).unwrap_err();
    assert!(matches!(err, AgendaError::InvalidTime(_)));
    assert!(err.is_invalid_state(), "InvalidTime is part of the state family");
    assert_eq!(b.state, BookingState::Unconfirmed);
}

#[test]
fn confirm_twice_is_invalid() {
    let mut b = confirmed();
    let err = b.confirm(Actor::HOST, at(10, 9)).unwrap_err();
    assert!(matches!(err, AgendaError::InvalidState(_)));
}

#[test]
fn only_the_assignee_may_confirm_a_reschedule() {
    let mut b = booking();
    b.reschedule(Actor::GUEST, &[at(12, 9)]).unwrap();
    assert_eq!(b.assignee, Some(Party::Host));

    let err = b.confirm(Actor::GUEST, at(12, 9)).unwrap_err();
    assert!(matches!(err, AgendaError::InvalidState(_)));

    b.confirm(Actor::HOST, at(12, 9)).unwrap();
    assert_eq!(b.state, BookingState::Confirmed);
}

#[test]
fn admin_may_confirm_for_either_party() {
    let mut b = booking();
    b.reschedule(Actor::HOST, &[at(12, 9)]).unwrap();
    assert_eq!(b.assignee, Some(Party::Guest));

    b.confirm(Actor::Admin, at(12, 9)).unwrap();
    assert_eq!(b.state, BookingState::Confirmed);
}

// ── cancel ─────────────────────────────────────────────────

#[test]
fn cancel_unconfirmed_declines() {
    let mut b = booking();
    b.cancel(Actor::HOST).unwrap();
    assert_eq!(b.state, BookingState::Declined);
    assert!(b.reserved_spans().is_empty());
}

#[test]
fn cancel_confirmed_cancels() {
    let mut b = confirmed();
    b.cancel(Actor::GUEST).unwrap();
    assert_eq!(b.state, BookingState::Canceled);
}

#[test]
fn cancel_from_a_terminal_state_is_invalid() {
    let mut b = booking();
    b.cancel(Actor::HOST).unwrap();
    assert!(matches!(
        b.cancel(Actor::HOST),
        Err(AgendaError::InvalidState(_))
    ));
}

// ── finish ─────────────────────────────────────────────────

#[test]
fn finish_records_whether_it_happened() {
    let held = [TimeSpan::new(at(10, 9), at(10, 10))];

    let mut happened = confirmed();
    happened.finish(Actor::HOST, true, at(10, 11), &held).unwrap();
    assert_eq!(happened.state, BookingState::Completed);

    let mut missed = confirmed();
    missed.finish(Actor::HOST, false, at(10, 11), &held).unwrap();
    assert_eq!(missed.state, BookingState::Missed);
    assert!(missed.state.is_reserved());
}

#[test]
fn finish_before_the_start_is_invalid() {
    let mut b = confirmed();
    let held = [TimeSpan::new(at(10, 9), at(10, 10))];
    let err = b.finish(Actor::HOST, true, at(10, 8), &held).unwrap_err();
    assert!(matches!(err, AgendaError::InvalidState(_)));
    assert_eq!(b.state, BookingState::Confirmed);
}

#[test]
fn finish_checks_the_confirmed_time_itself() {
    let mut b = confirmed();
    let err = b.finish(Actor::HOST, true, at(10, 8), &[]).unwrap_err();
    assert!(matches!(err, AgendaError::InvalidState(_)));
    assert_eq!(b.state, BookingState::Confirmed);
}

#[test]
fn finish_requires_confirmation() {
    let mut b = booking();
    assert!(b.finish(Actor::HOST, true, at(20, 0), &[]).is_err());
}

// ── expire ─────────────────────────────────────────────────

#[test]
fn expire_once_every_requested_time_has_passed() {
    let mut b = booking();
    assert!(b.expire(at(10, 12)).is_err(), "second requested time still ahead");

    b.expire(at(11, 12)).unwrap();
    assert_eq!(b.state, BookingState::Expired);
    assert!(b.state.is_terminal());
    assert!(b.reserved_spans().is_empty());
}

// ── reschedule ─────────────────────────────────────────────

#[test]
fn reschedule_drops_a_confirmed_booking_back() {
    let mut b = confirmed();
    b.reschedule(Actor::GUEST, &[at(13, 9), at(14, 9)]).unwrap();
    assert_eq!(b.state, BookingState::Unconfirmed);
    assert_eq!(b.requested_times, vec![at(13, 9), at(14, 9)]);
}

#[test]
fn reschedule_needs_one_or_two_times() {
    let mut b = booking();
    assert!(matches!(
        b.reschedule(Actor::GUEST, &[]),
        Err(AgendaError::InvalidTime(_))
    ));
    assert!(matches!(
        b.reschedule(Actor::GUEST, &[at(13, 9), at(14, 9), at(15, 9)]),
        Err(AgendaError::InvalidTime(_))
    ));
    assert_eq!(b.requested_times.len(), 2, "failed reschedule leaves times alone");
}

#[test]
fn reschedule_after_cancel_is_invalid() {
    let mut b = confirmed();
    b.cancel(Actor::HOST).unwrap();
    assert!(matches!(
        b.reschedule(Actor::GUEST, &[at(13, 9)]),
        Err(AgendaError::InvalidState(_))
    ));
}

// ── reserved spans ─────────────────────────────────────────

#[test]
fn reserved_spans_follow_the_state() {
    let b = booking();
    assert_eq!(
        b.reserved_spans(),
        vec![
            TimeSpan::new(at(10, 9), at(10, 10)),
            TimeSpan::new(at(11, 9), at(11, 10)),
        ]
    );
    assert_eq!(BookingState::RESERVED.len(), 4);
}
