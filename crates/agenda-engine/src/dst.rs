//! Timezone localization and the DST resolution policy.
//!
//! A local wall-clock time can map to one instant, two instants (the repeated
//! hour when clocks fall back) or none (the skipped hour when clocks spring
//! forward). Occurrence identity depends on exact bounds, so these cases must
//! resolve the same way every time: both fall back to the zone's standard
//! (non-DST) offset.

use chrono::{DateTime, LocalResult, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::{OffsetComponents, Tz};

/// Turns naive local times into absolute instants.
pub trait ZoneResolver {
    /// Localize `local` in `zone`, reporting ambiguous and non-existent times distinctly.
    fn localize(&self, zone: Tz, local: NaiveDateTime) -> LocalResult<DateTime<Utc>>;

    /// Interpret `local` using the zone's standard (non-DST) offset.
    fn standard_time(&self, zone: Tz, local: NaiveDateTime) -> DateTime<Utc>;

    /// Localize with the standard-time fallback applied to ambiguous and skipped times.
    fn resolve(&self, zone: Tz, local: NaiveDateTime) -> DateTime<Utc> {
        match self.localize(zone, local) {
            LocalResult::Single(instant) => instant,
            LocalResult::Ambiguous(..) | LocalResult::None => self.standard_time(zone, local),
        }
    }
}

/// [`ZoneResolver`] backed by the IANA database compiled into `chrono-tz`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChronoTzResolver;

impl ZoneResolver for ChronoTzResolver {
    fn localize(&self, zone: Tz, local: NaiveDateTime) -> LocalResult<DateTime<Utc>> {
        zone.from_local_datetime(&local).map(|dt| dt.with_timezone(&Utc))
    }

    fn standard_time(&self, zone: Tz, local: NaiveDateTime) -> DateTime<Utc> {
        // When clocks fall back, one of the two readings already carries the
        // standard offset.
        if let LocalResult::Ambiguous(first, second) = zone.from_local_datetime(&local) {
            for candidate in [first, second] {
                if candidate.offset().dst_offset().is_zero() {
                    return candidate.with_timezone(&Utc);
                }
            }
            return first.with_timezone(&Utc);
        }
        // The standard offset is stable across a DST change, so sampling the
        // zone near the requested time is enough to find it.
        let sampled = zone.offset_from_utc_datetime(&local);
        let standard = sampled.base_utc_offset();
        let fixed = sampled.fix().local_minus_utc();
        tracing::trace!(
            %local,
            zone = %zone.name(),
            sampled_offset_secs = fixed,
            "resolving local time with standard offset"
        );
        Utc.from_utc_datetime(&(local - standard))
    }
}
