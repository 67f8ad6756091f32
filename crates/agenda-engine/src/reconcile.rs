//! Occurrence reconciliation: keeps an availability's materialized occurrences
//! equal to what its rule produces over a window.
//!
//! Occurrences are keyed by their exact UTC bounds, so re-running an unchanged
//! availability matches every existing row and writes nothing.

use std::collections::HashMap;
use std::ops::AddAssign;

use chrono::{DateTime, Utc};

use crate::config::SchedulerConfig;
use crate::dst::{ChronoTzResolver, ZoneResolver};
use crate::error::Result;
use crate::expander::{expand_availability, RRuleEvaluator, RecurrenceEvaluator};
use crate::model::{AvailabilityId, Occurrence, OccurrenceId, Subject};
use crate::regen::{detach_occurrence, regen_for_occurrence};
use crate::span::TimeSpan;
use crate::store::Store;

/// What one reconciliation changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub created: usize,
    pub kept: usize,
    pub deleted: usize,
}

impl Reconciliation {
    pub fn is_noop(&self) -> bool {
        self.created == 0 && self.deleted == 0
    }
}

impl AddAssign for Reconciliation {
    fn add_assign(&mut self, other: Self) {
        self.created += other.created;
        self.kept += other.kept;
        self.deleted += other.deleted;
    }
}

/// Reconciles availabilities using a rule evaluator and a zone resolver.
#[derive(Debug, Clone, Default)]
pub struct Reconciler<E = RRuleEvaluator, Z = ChronoTzResolver> {
    pub evaluator: E,
    pub resolver: Z,
}

impl Reconciler {
    /// A reconciler using the `rrule` evaluator capped at the configured instance count.
    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self {
            evaluator: RRuleEvaluator::new(config.max_occurrences),
            resolver: ChronoTzResolver,
        }
    }
}

impl<E, Z> Reconciler<E, Z>
where
    E: RecurrenceEvaluator,
    Z: ZoneResolver,
{
    pub fn new(evaluator: E, resolver: Z) -> Self {
        Self {
            evaluator,
            resolver,
        }
    }

    /// Make the availability's occurrences match its expansion over `window`.
    ///
    /// New spans become occurrences and are fitted into the slots; existing
    /// occurrences the window no longer produces are detached and deleted.
    /// The whole pass is one transaction. A stale id is a no-op.
    ///
    /// # Errors
    /// Propagates expansion errors (`Validation`, `InvalidRule`) and store
    /// failures; nothing is written in that case.
    pub fn reconcile<K, S>(
        &self,
        store: &mut S,
        availability: AvailabilityId,
        window: TimeSpan,
    ) -> Result<Reconciliation>
    where
        K: Subject,
        S: Store<K>,
    {
        store.atomically(|tx| -> Result<Reconciliation> {
            let Some(availability) = tx.availability(availability)? else {
                tracing::debug!(%availability, "availability vanished before reconciliation, skipping");
                return Ok(Reconciliation::default());
            };

            // The same bounds can occur more than once, so keep a list per key.
            let mut existing: HashMap<TimeSpan, Vec<Occurrence<K>>> = HashMap::new();
            for occurrence in tx.occurrences_of(availability.id)? {
                existing
                    .entry(occurrence.span())
                    .or_default()
                    .push(occurrence);
            }

            let mut outcome = Reconciliation::default();
            let spans =
                expand_availability(&availability, window, &self.evaluator, &self.resolver)?;
            for span in spans {
                if existing.get_mut(&span).and_then(Vec::pop).is_some() {
                    outcome.kept += 1;
                    continue;
                }
                let occurrence = tx.insert_occurrence(Occurrence::new(&availability, span))?;
                regen_for_occurrence(tx, occurrence.id)?;
                outcome.created += 1;
            }

            for stale in existing.into_values().flatten() {
                delete_occurrence(tx, stale.id)?;
                outcome.deleted += 1;
            }

            tracing::debug!(
                availability = %availability.id,
                window = %window,
                created = outcome.created,
                kept = outcome.kept,
                deleted = outcome.deleted,
                "reconciled availability"
            );
            Ok(outcome)
        })
    }

    /// Reconcile over the configured horizon starting at `now`.
    pub fn reconcile_from<K, S>(
        &self,
        store: &mut S,
        availability: AvailabilityId,
        now: DateTime<Utc>,
        config: &SchedulerConfig,
    ) -> Result<Reconciliation>
    where
        K: Subject,
        S: Store<K>,
    {
        self.reconcile(store, availability, config.horizon(now)?)
    }

    /// Reconcile every stored availability over `window`.
    pub fn rebuild_all<K, S>(&self, store: &mut S, window: TimeSpan) -> Result<Reconciliation>
    where
        K: Subject,
        S: Store<K>,
    {
        let mut total = Reconciliation::default();
        for availability in store.availabilities()? {
            total += self.reconcile(store, availability.id, window)?;
        }
        Ok(total)
    }
}

/// Reconcile with the default `rrule` evaluator and `chrono-tz` resolver.
pub fn reconcile_availability<K, S>(
    store: &mut S,
    availability: AvailabilityId,
    window: TimeSpan,
) -> Result<Reconciliation>
where
    K: Subject,
    S: Store<K>,
{
    <Reconciler>::default().reconcile(store, availability, window)
}

/// Detach an occurrence from its slots, then delete it.
pub fn delete_occurrence<K, S>(store: &mut S, occurrence: OccurrenceId) -> Result<()>
where
    K: Subject,
    S: Store<K>,
{
    detach_occurrence(store, occurrence)?;
    store.remove_occurrence(occurrence)?;
    tracing::trace!(%occurrence, "deleted occurrence");
    Ok(())
}

/// Delete an availability together with its occurrences, atomically.
///
/// Returns how many occurrences were removed. A stale id is a no-op.
pub fn delete_availability<K, S>(store: &mut S, availability: AvailabilityId) -> Result<usize>
where
    K: Subject,
    S: Store<K>,
{
    store.atomically(|tx| -> Result<usize> {
        if tx.availability(availability)?.is_none() {
            return Ok(0);
        }
        let occurrences = tx.occurrences_of(availability)?;
        for occurrence in &occurrences {
            delete_occurrence(tx, occurrence.id)?;
        }
        tx.remove_availability(availability)?;
        tracing::debug!(%availability, removed = occurrences.len(), "deleted availability");
        Ok(occurrences.len())
    })
}
