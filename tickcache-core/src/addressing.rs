//! Bucketed store addressing.
//!
//! The backing store partitions every series into buckets: tick series by a
//! fixed time width, bar series by a fixed number of bars (so the time span of
//! a bar bucket is `points_per_bucket * period`). These are pure functions of
//! the layout; nothing here touches storage.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::{CacheConfig, Period, SeriesKind, TimeInterval};

/// Bucket geometry shared by the store and both providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketLayout {
    points_per_bucket: u32,
    tick_bucket_ms: i64,
}

impl Default for BucketLayout {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

impl BucketLayout {
    /// Build a layout; zero or negative sizes are clamped to one.
    #[must_use]
    pub const fn new(points_per_bucket: u32, tick_bucket_ms: i64) -> Self {
        Self {
            points_per_bucket: if points_per_bucket == 0 {
                1
            } else {
                points_per_bucket
            },
            tick_bucket_ms: if tick_bucket_ms <= 0 {
                1
            } else {
                tick_bucket_ms
            },
        }
    }

    /// Layout described by a cache configuration.
    #[must_use]
    pub const fn from_config(cfg: &CacheConfig) -> Self {
        Self::new(cfg.points_per_bucket, cfg.tick_bucket_ms)
    }

    /// Bars per bucket.
    #[must_use]
    pub const fn points_per_bucket(&self) -> u32 {
        self.points_per_bucket
    }

    /// Time width of a tick bucket.
    #[must_use]
    pub const fn tick_bucket_ms(&self) -> i64 {
        self.tick_bucket_ms
    }

    /// Time span of one bucket of the given kind, in milliseconds.
    #[must_use]
    pub const fn bucket_span_ms(&self, kind: SeriesKind) -> i64 {
        match kind {
            SeriesKind::Ticks => self.tick_bucket_ms,
            SeriesKind::Bars(period) => {
                // `Bars(Tick)` is not a valid kind; treat it as 1ms bars.
                let ms = match period.millis() {
                    Some(ms) => ms,
                    None => 1,
                };
                (self.points_per_bucket as i64).saturating_mul(ms)
            }
        }
    }

    /// Index of the bucket containing `time` (floor division).
    #[must_use]
    pub const fn bucket_index_for_time(&self, kind: SeriesKind, time: i64) -> i64 {
        time.div_euclid(self.bucket_span_ms(kind))
    }

    /// Time range covered by bucket `index`.
    #[must_use]
    pub const fn bucket_time_range(&self, kind: SeriesKind, index: i64) -> TimeInterval {
        let span = self.bucket_span_ms(kind);
        let start = index.saturating_mul(span);
        TimeInterval::new(start, start.saturating_add(span - 1))
    }

    /// Inclusive range of bucket indexes intersecting `iv`.
    #[must_use]
    pub fn buckets_covering(&self, kind: SeriesKind, iv: TimeInterval) -> RangeInclusive<i64> {
        self.bucket_index_for_time(kind, iv.start())..=self.bucket_index_for_time(kind, iv.end())
    }

    /// Widen `iv` to the boundaries of the buckets it touches.
    #[must_use]
    pub const fn align(&self, kind: SeriesKind, iv: TimeInterval) -> TimeInterval {
        let first = self.bucket_time_range(kind, self.bucket_index_for_time(kind, iv.start()));
        let last = self.bucket_time_range(kind, self.bucket_index_for_time(kind, iv.end()));
        TimeInterval::new(first.start(), last.end())
    }
}

/// Start of the bar of `period` containing `time`; `time` itself for ticks.
#[must_use]
pub const fn period_start(period: Period, time: i64) -> i64 {
    match period.millis() {
        Some(ms) => time.div_euclid(ms) * ms,
        None => time,
    }
}

/// Per-bucket entry of a [`RankIndex`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankEntry {
    /// Number of ticks stored in the bucket.
    pub size: u64,
    /// Number of ticks stored in all earlier buckets.
    pub before: u64,
}

/// Secondary index answering "how many ticks precede time T" without scanning.
///
/// Only populated buckets have an entry. Size changes are applied in batches
/// so cumulative counts are rewritten once per store operation instead of
/// once per point.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankIndex {
    entries: BTreeMap<i64, RankEntry>,
}

impl RankIndex {
    /// Create an empty index.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Apply a batch of `(bucket, new_size)` updates.
    ///
    /// Cumulative counts of every bucket at or after the lowest touched bucket
    /// are rewritten once. A size of zero drops the entry.
    pub fn record_buckets(&mut self, sizes: &[(i64, u64)]) {
        let Some(lowest) = sizes.iter().map(|(b, _)| *b).min() else {
            return;
        };
        for &(bucket, size) in sizes {
            if size == 0 {
                self.entries.remove(&bucket);
            } else {
                self.entries.entry(bucket).or_default().size = size;
            }
        }
        let mut running = self
            .entries
            .range(..lowest)
            .next_back()
            .map_or(0, |(_, e)| e.before + e.size);
        for entry in self.entries.range_mut(lowest..).map(|(_, e)| e) {
            entry.before = running;
            running += entry.size;
        }
    }

    /// Entry for a bucket, if populated.
    #[must_use]
    pub fn entry(&self, bucket: i64) -> Option<RankEntry> {
        self.entries.get(&bucket).copied()
    }

    /// Total number of indexed ticks.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.entries
            .last_key_value()
            .map_or(0, |(_, e)| e.before + e.size)
    }

    /// Number of ticks strictly before `time`.
    ///
    /// Walks back from the bucket containing `time` to the nearest populated
    /// entry. When that entry is the bucket of `time` itself,
    /// `in_bucket_below(bucket)` must return how many of its ticks precede
    /// `time`; it is not called otherwise.
    pub fn count_before(
        &self,
        layout: &BucketLayout,
        time: i64,
        in_bucket_below: impl FnOnce(i64) -> u64,
    ) -> u64 {
        let bucket = layout.bucket_index_for_time(SeriesKind::Ticks, time);
        match self.entries.range(..=bucket).next_back() {
            None => 0,
            Some((&b, e)) if b == bucket => e.before + in_bucket_below(bucket),
            Some((_, e)) => e.before + e.size,
        }
    }
}
