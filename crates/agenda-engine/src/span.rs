//! Time-span algebra.
//!
//! A [`TimeSpan`] is a pair of absolute UTC instants. All scheduling layers
//! (occurrences, slots, booking requests) are compared through these
//! operations, so their boundary semantics matter:
//!
//! - [`TimeSpan::overlaps`] is strict: spans that merely touch do not overlap.
//! - [`TimeSpan::connects`] is inclusive: touching spans connect, which is what
//!   makes two free slots eligible for merging.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// An interval between two UTC instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeSpan {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeSpan {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> Duration {
        self.end - self.start
    }

    /// A span is real when it has positive length.
    pub fn is_real(&self) -> bool {
        self.start < self.end
    }

    /// `other` lies within `self`, bounds inclusive.
    pub fn contains(&self, other: &TimeSpan) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    pub fn overlaps(&self, other: &TimeSpan) -> bool {
        other.start < self.end && other.end > self.start
    }

    pub fn connects(&self, other: &TimeSpan) -> bool {
        other.start <= self.end && other.end >= self.start
    }

    /// Smallest span covering both `self` and `other`.
    pub fn expanded(&self, other: &TimeSpan) -> TimeSpan {
        TimeSpan {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Intersection of the two spans, if it has positive length.
    pub fn clipped(&self, window: &TimeSpan) -> Option<TimeSpan> {
        let clipped = TimeSpan {
            start: self.start.max(window.start),
            end: self.end.min(window.end),
        };
        clipped.is_real().then_some(clipped)
    }

    /// Pieces of `self` left over once `other` is removed, leading piece first.
    pub fn subtract(&self, other: &TimeSpan) -> (Option<TimeSpan>, Option<TimeSpan>) {
        if !self.overlaps(other) {
            return (Some(*self), None);
        }
        let leading = TimeSpan::new(self.start, other.start);
        let trailing = TimeSpan::new(other.end, self.end);
        (
            leading.is_real().then_some(leading),
            trailing.is_real().then_some(trailing),
        )
    }

    pub fn duration_minutes(&self) -> i64 {
        self.length().num_minutes()
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start.date_naive() == self.end.date_naive() {
            write!(
                f,
                "{} {}-{}",
                self.start.format("%Y-%m-%d"),
                self.start.format("%H:%M"),
                self.end.format("%H:%M")
            )
        } else {
            write!(
                f,
                "{}-{}",
                self.start.format("%Y-%m-%d %H:%M"),
                self.end.format("%Y-%m-%d %H:%M")
            )
        }
    }
}

/// A booked span together with the buffer time required on either side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaddedSpan {
    pub core: TimeSpan,
    pub padding: Duration,
}

impl PaddedSpan {
    pub fn new(core: TimeSpan, padding: Duration) -> Self {
        Self { core, padding }
    }

    /// The whole footprint: leading pad, core and trailing pad.
    pub fn outer(&self) -> TimeSpan {
        TimeSpan::new(
            shift(self.core.start, -self.padding),
            shift(self.core.end, self.padding),
        )
    }

    pub fn leading(&self) -> TimeSpan {
        TimeSpan::new(shift(self.core.start, -self.padding), self.core.start)
    }

    pub fn trailing(&self) -> TimeSpan {
        TimeSpan::new(self.core.end, shift(self.core.end, self.padding))
    }
}

/// `t + by`, clamped to the representable range instead of overflowing.
pub(crate) fn shift(t: DateTime<Utc>, by: Duration) -> DateTime<Utc> {
    t.checked_add_signed(by).unwrap_or(if by < Duration::zero() {
        DateTime::<Utc>::MIN_UTC
    } else {
        DateTime::<Utc>::MAX_UTC
    })
}

/// Merge overlapping or touching spans.
///
/// Returns the minimal start-ordered list of disjoint spans whose union equals
/// the union of the input. Touching spans (`a.end == b.start`) are joined.
pub fn merge_spans<I>(spans: I) -> Vec<TimeSpan>
where
    I: IntoIterator<Item = TimeSpan>,
{
    let mut sorted: Vec<TimeSpan> = spans.into_iter().collect();
    sorted.sort_by_key(|s| (s.start, s.end));

    let mut merged: Vec<TimeSpan> = Vec::with_capacity(sorted.len());
    for span in sorted {
        if let Some(last) = merged.last_mut() {
            if span.start <= last.end {
                last.end = last.end.max(span.end);
                continue;
            }
        }
        merged.push(span);
    }
    merged
}
