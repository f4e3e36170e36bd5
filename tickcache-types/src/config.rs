//! Configuration shared by the providers and the bucketed store addressing.

use serde::{Deserialize, Serialize};

use crate::TickcacheError;

/// Tunables for bucket addressing and both caching layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Bars per storage bucket.
    ///
    /// 1440 keeps the bucket span of every bar period an integral multiple
    /// of the bucket span of its next finer period.
    pub points_per_bucket: u32,
    /// Time width of a tick bucket in milliseconds.
    pub tick_bucket_ms: i64,
    /// Maximum number of points the incremental cache keeps per series.
    pub cache_point_budget: usize,
    /// Divisor applied to the retained half-width on each eviction round (>= 2).
    pub eviction_shrink_factor: u32,
    /// Default for cancelling pending fetches unrelated to a new load.
    pub preempt_unrelated: bool,
    /// Number of buckets the synchronous provider keeps resident.
    pub bucket_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            points_per_bucket: 1440,
            tick_bucket_ms: 3_600_000,
            cache_point_budget: 100_000,
            eviction_shrink_factor: 2,
            preempt_unrelated: false,
            bucket_capacity: 16,
        }
    }
}

impl CacheConfig {
    /// Check the configuration for values that would break addressing or eviction.
    ///
    /// # Errors
    /// Returns `InvalidArg` naming the first offending field.
    pub fn validate(&self) -> Result<(), TickcacheError> {
        if self.points_per_bucket == 0 {
            return Err(TickcacheError::InvalidArg(
                "points_per_bucket must be positive".into(),
            ));
        }
        if self.tick_bucket_ms <= 0 {
            return Err(TickcacheError::InvalidArg(
                "tick_bucket_ms must be positive".into(),
            ));
        }
        if self.cache_point_budget == 0 {
            return Err(TickcacheError::InvalidArg(
                "cache_point_budget must be positive".into(),
            ));
        }
        if self.eviction_shrink_factor < 2 {
            return Err(TickcacheError::InvalidArg(
                "eviction_shrink_factor must be at least 2".into(),
            ));
        }
        if self.bucket_capacity == 0 {
            return Err(TickcacheError::InvalidArg(
                "bucket_capacity must be positive".into(),
            ));
        }
        Ok(())
    }
}
