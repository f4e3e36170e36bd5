//! Closed integer time intervals.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A closed interval `[start, end]` of millisecond timestamps.
///
/// Both bounds are inclusive and `start <= end` always holds: the constructor
/// orders its arguments. Time is discrete, so `[0, 9]` and `[10, 19]` are
/// adjacent and together cover `[0, 19]` without a gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeInterval {
    start: i64,
    end: i64,
}

impl TimeInterval {
    /// Build an interval from two bounds in any order.
    #[must_use]
    pub const fn new(a: i64, b: i64) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    /// Interval covering exactly one instant.
    #[must_use]
    pub const fn point(t: i64) -> Self {
        Self { start: t, end: t }
    }

    /// Build an interval from two UTC datetimes (millisecond precision).
    #[must_use]
    pub fn from_datetimes(a: DateTime<Utc>, b: DateTime<Utc>) -> Self {
        Self::new(a.timestamp_millis(), b.timestamp_millis())
    }

    /// Inclusive start.
    #[must_use]
    pub const fn start(&self) -> i64 {
        self.start
    }

    /// Inclusive end.
    #[must_use]
    pub const fn end(&self) -> i64 {
        self.end
    }

    /// Number of discrete instants covered (saturating).
    #[must_use]
    pub const fn len(&self) -> u64 {
        self.end.abs_diff(self.start).saturating_add(1)
    }

    /// Always false; an interval covers at least one instant.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Midpoint, rounded towards `start`.
    #[must_use]
    pub const fn midpoint(&self) -> i64 {
        let half = (self.end as i128 - self.start as i128) / 2;
        self.start + half as i64
    }

    /// True if `t` lies within the interval.
    #[must_use]
    pub const fn contains(&self, t: i64) -> bool {
        self.start <= t && t <= self.end
    }

    /// True if `other` lies entirely within this interval.
    #[must_use]
    pub const fn contains_interval(&self, other: &Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// True if both intervals share at least one instant (touching edges count).
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// True if the intervals are separated by exactly one unit.
    #[must_use]
    pub const fn is_adjacent(&self, other: &Self) -> bool {
        (self.end < i64::MAX && self.end + 1 == other.start)
            || (other.end < i64::MAX && other.end + 1 == self.start)
    }

    /// True if the intervals overlap or are adjacent, i.e. their union is one interval.
    #[must_use]
    pub const fn mergeable(&self, other: &Self) -> bool {
        self.overlaps(other) || self.is_adjacent(other)
    }

    /// Common part of both intervals, if any.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start <= end).then_some(Self { start, end })
    }

    /// Smallest interval covering both.
    #[must_use]
    pub fn hull(&self, other: &Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Start as a UTC datetime, if representable.
    #[must_use]
    pub fn start_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.start)
    }

    /// End as a UTC datetime, if representable.
    #[must_use]
    pub fn end_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.end)
    }
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}
