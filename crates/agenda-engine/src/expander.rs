//! Recurrence expansion -- turns an [`Availability`] into concrete UTC occurrence spans.
//!
//! Rules are evaluated on naive local time in the availability's zone, then each
//! local start is localized back to an absolute instant. Ambiguous and skipped
//! local times resolve with the zone's standard offset (see [`crate::dst`]), so
//! expanding the same availability twice always yields identical bounds.

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use rrule::RRuleSet;

use crate::dst::ZoneResolver;
use crate::error::{AgendaError, Result};
use crate::model::{Availability, Subject};
use crate::span::TimeSpan;

/// Evaluates a recurrence rule on naive local time.
pub trait RecurrenceEvaluator {
    /// All instants of `rule` anchored at `anchor` that fall between `start`
    /// and `end`, in chronological order.
    ///
    /// With `inclusive`, instants equal to `start` or `end` are included.
    ///
    /// # Errors
    /// Returns `AgendaError::InvalidRule` if `rule` cannot be evaluated.
    fn between(
        &self,
        rule: &str,
        anchor: NaiveDateTime,
        start: NaiveDateTime,
        end: NaiveDateTime,
        inclusive: bool,
    ) -> Result<Vec<NaiveDateTime>>;
}

/// [`RecurrenceEvaluator`] backed by the `rrule` crate.
#[derive(Debug, Clone, Copy)]
pub struct RRuleEvaluator {
    /// Maximum number of instances a single evaluation may produce.
    pub max_instances: u16,
}

impl Default for RRuleEvaluator {
    fn default() -> Self {
        Self {
            max_instances: 1000,
        }
    }
}

impl RRuleEvaluator {
    pub fn new(max_instances: u16) -> Self {
        Self { max_instances }
    }
}

impl RecurrenceEvaluator for RRuleEvaluator {
    fn between(
        &self,
        rule: &str,
        anchor: NaiveDateTime,
        start: NaiveDateTime,
        end: NaiveDateTime,
        inclusive: bool,
    ) -> Result<Vec<NaiveDateTime>> {
        let body = rule.trim();
        let body = body.strip_prefix("RRULE:").unwrap_or(body);
        if body.is_empty() {
            return Err(AgendaError::InvalidRule("empty RRULE string".to_string()));
        }

        // Naive local time has no DST, so it is evaluated as UTC wall-clock
        // time and read back with `naive_utc`.
        let rrule_text = format!(
            "DTSTART:{}Z\nRRULE:{}",
            anchor.format("%Y%m%dT%H%M%S"),
            body
        );
        let rrule_set: RRuleSet = rrule_text
            .parse()
            .map_err(|e| AgendaError::InvalidRule(format!("{}", e)))?;

        // Widen the query by a second on each side and apply the inclusivity
        // rule ourselves so the crate's boundary semantics don't matter.
        let slack = Duration::seconds(1);
        let after = rrule::Tz::UTC.from_utc_datetime(&(start - slack));
        let before = rrule::Tz::UTC.from_utc_datetime(&(end + slack));
        let result = rrule_set.after(after).before(before).all(self.max_instances);
        if result.limited {
            tracing::warn!(
                rule = body,
                limit = self.max_instances,
                "recurrence expansion hit the instance limit"
            );
        }

        Ok(result
            .dates
            .into_iter()
            .map(|dt| dt.naive_utc())
            .filter(|t| in_range(*t, start, end, inclusive))
            .collect())
    }
}

fn in_range(t: NaiveDateTime, start: NaiveDateTime, end: NaiveDateTime, inclusive: bool) -> bool {
    if inclusive {
        t >= start && t <= end
    } else {
        t > start && t < end
    }
}

/// Expand an availability into the UTC occurrence spans that start within `window`.
///
/// The window is converted to the availability's local zone and the rule is
/// asked for every local start in range (inclusive). A one-off availability
/// (no rule) yields its anchor if the anchor falls in range. Each span lasts
/// [`Availability::duration`].
///
/// # Errors
/// Returns `AgendaError::Validation` if the availability does not end after it
/// starts, and `AgendaError::InvalidRule` if its rule cannot be evaluated.
pub fn expand_availability<K, E, Z>(
    availability: &Availability<K>,
    window: TimeSpan,
    evaluator: &E,
    resolver: &Z,
) -> Result<impl Iterator<Item = TimeSpan>>
where
    K: Subject,
    E: RecurrenceEvaluator + ?Sized,
    Z: ZoneResolver + ?Sized,
{
    let duration = availability.duration();
    if duration <= Duration::zero() {
        return Err(AgendaError::Validation(format!(
            "availability {} ends at {} which is not after its start {}",
            availability.id, availability.end_time, availability.start_time
        )));
    }

    let zone = availability.timezone;
    let naive_start = window.start.with_timezone(&zone).naive_local();
    let naive_end = window.end.with_timezone(&zone).naive_local();
    let anchor = availability.anchor();

    let local_starts = match availability.recurrence.as_deref().map(str::trim) {
        Some(rule) if !rule.is_empty() => {
            evaluator.between(rule, anchor, naive_start, naive_end, true)?
        }
        _ if in_range(anchor, naive_start, naive_end, true) => vec![anchor],
        _ => Vec::new(),
    };

    let spans: Vec<TimeSpan> = local_starts
        .into_iter()
        .map(|local| {
            let start: DateTime<Utc> = resolver.resolve(zone, local);
            TimeSpan::new(start, start + duration)
        })
        .collect();
    Ok(spans.into_iter())
}
