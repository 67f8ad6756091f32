//! # agenda-engine
//!
//! Keeps a subject's schedule consistent across three layers: declared
//! recurring availability, the occurrences materialized from it, and the time
//! slots that bookings reserve. Recurrence rules are evaluated with the `rrule`
//! crate on local wall-clock time and resolved to UTC through `chrono-tz`.
//!
//! ## Modules
//!
//! - [`span`] — time-span algebra (`overlaps`, `connects`, `merge_spans`)
//! - [`model`] — availabilities, occurrences, slots and their ids
//! - [`dst`] — local-time resolution across DST transitions
//! - [`expander`] — availability + window → occurrence spans
//! - [`store`] — the persistence seam; [`memory`] is an in-memory implementation
//! - [`reconcile`] — occurrence reconciliation for an availability
//! - [`regen`] — fitting occurrences into free slots
//! - [`booking`] — booking state machine and slot reservation
//! - [`freebusy`] — free time over a window
//! - [`conflict`] — audit slots for overlaps
//! - [`maintenance`] — clearing occurrences and past slots
//! - [`config`] — engine configuration and booking policy
//! - [`error`] — error types
//!
//! ## Example
//!
//! ```
//! use agenda_engine::{
//!     free_times, reconcile_availability, Availability, MemoryStore, Store, TimeSpan,
//! };
//! use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
//!
//! let mut store = MemoryStore::new();
//! let availability = Availability::new(
//!     "host",
//!     NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
//!     NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
//!     NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
//!     chrono_tz::UTC,
//! );
//! let availability = store.insert_availability(availability).unwrap();
//! let window = TimeSpan::new(
//!     Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap(),
//!     Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap(),
//! );
//! reconcile_availability(&mut store, availability.id, window).unwrap();
//!
//! let free = free_times(&store, &"host", window).unwrap();
//! assert_eq!(free.len(), 1);
//! assert_eq!(free[0].duration_minutes(), 180);
//! ```

pub mod booking;
pub mod config;
pub mod conflict;
pub mod dst;
pub mod error;
pub mod expander;
pub mod freebusy;
pub mod maintenance;
pub mod memory;
pub mod model;
pub mod reconcile;
pub mod regen;
pub mod span;
pub mod store;

pub use booking::{padding_changed, save_booking, Actor, Booking, BookingState, Party};
pub use config::{BookingPolicy, BookingRules, SchedulerConfig, UnscheduledBooking};
pub use conflict::{audit_overlaps, SlotConflict};
pub use dst::{ChronoTzResolver, ZoneResolver};
pub use error::{AgendaError, Result};
pub use expander::{expand_availability, RRuleEvaluator, RecurrenceEvaluator};
pub use freebusy::{first_free, free_times};
pub use maintenance::{clear_occurrences, clear_old_slots};
pub use memory::MemoryStore;
pub use model::{
    Availability, AvailabilityId, BookingId, Occurrence, OccurrenceId, SlotId, Subject, TimeSlot,
};
pub use reconcile::{
    delete_availability, delete_occurrence, reconcile_availability, Reconciler, Reconciliation,
};
pub use regen::regen_for_occurrence;
pub use span::{merge_spans, PaddedSpan, TimeSpan};
pub use store::Store;
