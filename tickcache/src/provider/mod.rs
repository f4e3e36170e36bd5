//! Fully resolving query surface.
//!
//! Every call either returns complete data or awaits the backing store;
//! nothing is delivered partially. Whole store buckets are cached in a
//! bounded map so that neighbouring requests (scrolling, previous/next point
//! lookups) rarely reach the store twice.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::try_join_all;
use tickcache_core::{
    BackingStore, BucketLayout, DataPoint, SeriesKey, TickcacheError, TimeInterval, clip_points,
};

use crate::core::tag_err;

mod buckets;
mod neighbors;
mod paired;
mod synthetic;

use buckets::BucketCache;

/// Query surface returning fully resolved data.
pub struct Provider {
    store: Arc<dyn BackingStore>,
    layout: BucketLayout,
    buckets: Mutex<BucketCache>,
}

impl Provider {
    /// Create a provider keeping at most `bucket_capacity` buckets resident.
    #[must_use]
    pub fn new(store: Arc<dyn BackingStore>, layout: BucketLayout, bucket_capacity: usize) -> Self {
        Self {
            store,
            layout,
            buckets: Mutex::new(BucketCache::new(bucket_capacity)),
        }
    }

    /// Bucket geometry used to address the store.
    #[must_use]
    pub const fn layout(&self) -> BucketLayout {
        self.layout
    }

    /// All points of `key` in `[from, to]`, sorted by timestamp.
    ///
    /// The request is clamped to the times the store knows about, so
    /// unbounded ranges are cheap.
    ///
    /// # Errors
    /// Returns `InvalidArg` when `from > to`, or the store's error tagged with
    /// its name.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "tickcache::provider::get_range",
            skip(self),
            fields(key = %key, from = from, to = to),
        )
    )]
    pub async fn get_range(
        &self,
        key: &SeriesKey,
        from: i64,
        to: i64,
    ) -> Result<Vec<DataPoint>, TickcacheError> {
        if from > to {
            return Err(TickcacheError::InvalidArg(format!(
                "range start {from} is after end {to}"
            )));
        }
        let Some(known) = self.known_span(key).await? else {
            return Ok(Vec::new());
        };
        let Some(iv) = TimeInterval::new(from, to).intersection(&known) else {
            return Ok(Vec::new());
        };
        let ids: Vec<i64> = self.layout.buckets_covering(key.kind(), iv).collect();
        let anchor = self.layout.bucket_index_for_time(key.kind(), iv.midpoint());
        let parts = self.load_buckets(key, &ids, anchor).await?;
        Ok(parts
            .iter()
            .flat_map(|pts| clip_points(pts, iv))
            .collect())
    }

    /// Drop every cached bucket.
    pub fn clear(&self) {
        self.lock_buckets().clear();
    }

    /// Number of buckets currently resident.
    #[must_use]
    pub fn cached_bucket_count(&self) -> usize {
        self.lock_buckets().len()
    }

    /// `[earliest, latest]` stored for `key`, `None` when the series is empty.
    pub(crate) async fn known_span(
        &self,
        key: &SeriesKey,
    ) -> Result<Option<TimeInterval>, TickcacheError> {
        let name = self.store.name();
        let first = self
            .store
            .earliest_known_time(key)
            .await
            .map_err(|e| tag_err(name, e))?;
        let last = self
            .store
            .latest_known_time(key)
            .await
            .map_err(|e| tag_err(name, e))?;
        Ok(first.zip(last).map(|(a, b)| TimeInterval::new(a, b)))
    }

    /// Contents of the given buckets, in order, fetching the missing ones
    /// concurrently. The cache lock is never held across a store call.
    ///
    /// `anchor` becomes the series' eviction anchor, and fetched buckets are
    /// inserted and evicted in one lock section so the cache never holds
    /// more than its capacity.
    pub(crate) async fn load_buckets(
        &self,
        key: &SeriesKey,
        ids: &[i64],
        anchor: i64,
    ) -> Result<Vec<Arc<[DataPoint]>>, TickcacheError> {
        let mut parts: Vec<Option<Arc<[DataPoint]>>> = {
            let mut cache = self.lock_buckets();
            cache.set_anchor(key, anchor);
            ids.iter().map(|b| cache.get(key, *b)).collect()
        };
        let missing: Vec<i64> = ids
            .iter()
            .zip(&parts)
            .filter(|(_, p)| p.is_none())
            .map(|(b, _)| *b)
            .collect();

        if !missing.is_empty() {
            #[cfg(feature = "tracing")]
            tracing::debug!(key = %key, buckets = missing.len(), "fetching missing buckets");
            let name = self.store.name();
            let kind = key.kind();
            let fetched = try_join_all(missing.iter().map(|&b| {
                let range = self.layout.bucket_time_range(kind, b);
                async move {
                    self.store
                        .fetch(key, range)
                        .await
                        .map(|pts| (b, Arc::<[DataPoint]>::from(pts)))
                        .map_err(|e| tag_err(name, e))
                }
            }))
            .await?;

            let mut cache = self.lock_buckets();
            cache.set_anchor(key, anchor);
            for (b, pts) in fetched {
                cache.insert(key, b, Arc::clone(&pts));
                if let Some(pos) = ids.iter().position(|id| *id == b) {
                    parts[pos] = Some(pts);
                }
            }
            cache.evict();
        }
        Ok(parts.into_iter().flatten().collect())
    }

    /// Contents of a single bucket.
    pub(crate) async fn load_bucket(
        &self,
        key: &SeriesKey,
        bucket: i64,
    ) -> Result<Arc<[DataPoint]>, TickcacheError> {
        let mut parts = self.load_buckets(key, &[bucket], bucket).await?;
        Ok(parts.pop().unwrap_or_else(|| Arc::from(Vec::new())))
    }

    fn lock_buckets(&self) -> MutexGuard<'_, BucketCache> {
        self.buckets.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
