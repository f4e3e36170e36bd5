//! Incremental query surface.
//!
//! `load` answers from the cache at once and fetches only what is neither
//! cached nor already in flight. Fetch results fan out to every consumer
//! waiting on them and, when persisted, are merged into a per-series cache
//! bounded by a point budget.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use tickcache_core::{
    BackingStore, BucketLayout, CacheConfig, DataPoint, FeedHandle, IntervalSet, SeriesKey,
    SeriesKind, TimeInterval,
};

use crate::consumer::{Consumer, Delivery};

mod live;
mod pending;
mod series;
mod task;

use pending::{PendingFetch, Subscriber};
use series::{EvictionPolicy, SeriesState};
use task::FetchJob;

pub(crate) fn lock_series(m: &Mutex<SeriesState>) -> MutexGuard<'_, SeriesState> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Inner {
    store: Arc<dyn BackingStore>,
    layout: BucketLayout,
    policy: EvictionPolicy,
    preempt_default: bool,
    series: RwLock<HashMap<SeriesKey, Arc<Mutex<SeriesState>>>>,
    live: Mutex<HashMap<SeriesKey, FeedHandle>>,
    destroyed: AtomicBool,
    next_id: AtomicU64,
}

impl Inner {
    fn entry(&self, key: &SeriesKey) -> Arc<Mutex<SeriesState>> {
        {
            let map = self.series.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(s) = map.get(key) {
                return Arc::clone(s);
            }
        }
        let mut map = self.series.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(map.entry(key.clone()).or_default())
    }

    fn existing(&self, key: &SeriesKey) -> Option<Arc<Mutex<SeriesState>>> {
        let map = self.series.read().unwrap_or_else(PoisonError::into_inner);
        map.get(key).cloned()
    }

    fn all_series(&self) -> Vec<Arc<Mutex<SeriesState>>> {
        let map = self.series.read().unwrap_or_else(PoisonError::into_inner);
        map.values().cloned().collect()
    }

    fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::Acquire)
    }
}

/// Asynchronous, incremental query surface with a bounded per-series cache.
///
/// Cloning is cheap; clones share the same caches and background work.
#[derive(Clone)]
pub struct CachingProvider {
    inner: Arc<Inner>,
}

impl CachingProvider {
    /// Create a provider over `store` configured by `cfg`.
    #[must_use]
    pub fn new(store: Arc<dyn BackingStore>, cfg: &CacheConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                layout: BucketLayout::from_config(cfg),
                policy: EvictionPolicy {
                    budget: cfg.cache_point_budget,
                    shrink: cfg.eviction_shrink_factor,
                },
                preempt_default: cfg.preempt_unrelated,
                series: RwLock::new(HashMap::new()),
                live: Mutex::new(HashMap::new()),
                destroyed: AtomicBool::new(false),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Request the points of `key` in `[from, to]`.
    ///
    /// Cached ranges are delivered to `consumer` before this returns. The
    /// consumer joins every in-flight fetch overlapping the range, and one
    /// background fetch is dispatched per remaining gap. With `persist`,
    /// fetched points are merged into the cache. With `preempt_unrelated`,
    /// in-flight fetches of `key` that do not overlap the range are
    /// cancelled. Bar ranges are widened to store bucket boundaries first.
    ///
    /// Never blocks on the store. Must be called from within a Tokio
    /// runtime; outside one, or after [`CachingProvider::destroy`], or with
    /// `from > to`, the call is logged and ignored.
    ///
    /// `consumer` is called with the series lock held for the cached part, so
    /// it must not call back into this provider.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "tickcache::caching::load",
            skip(self, consumer),
            fields(key = %key, from = from, to = to),
        )
    )]
    pub fn load(
        &self,
        key: &SeriesKey,
        from: i64,
        to: i64,
        persist: bool,
        preempt_unrelated: bool,
        consumer: Arc<dyn Consumer>,
    ) {
        let inner = &self.inner;
        if inner.is_destroyed() {
            #[cfg(feature = "tracing")]
            tracing::warn!("load after destroy ignored");
            return;
        }
        if from > to {
            #[cfg(feature = "tracing")]
            tracing::warn!("load with start after end ignored");
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            #[cfg(feature = "tracing")]
            tracing::warn!("load outside a tokio runtime ignored");
            return;
        };

        let mut iv = TimeInterval::new(from, to);
        if let kind @ SeriesKind::Bars(_) = key.kind() {
            iv = inner.layout.align(kind, iv);
        }

        let series = inner.entry(key);
        let mut jobs = Vec::new();
        {
            let mut st = lock_series(&series);

            for covered in st.cache.ranges().query(iv) {
                consumer.on_delivery(&Delivery {
                    key: key.clone(),
                    points: st.cache.points_in(covered),
                    covers: covered,
                });
            }

            let sub = Subscriber {
                consumer,
                interval: iv,
                persist,
            };

            if preempt_unrelated {
                st.pending.retain(|p| {
                    if p.interval.overlaps(&iv) {
                        return true;
                    }
                    #[cfg(feature = "tracing")]
                    tracing::debug!(interval = %p.interval, "preempting unrelated fetch");
                    p.cancel();
                    false
                });
            }

            let mut to_fetch = IntervalSet::from(iv);
            for covered in st.cache.ranges().query(iv) {
                to_fetch.remove(covered);
            }
            for p in st.pending.iter_mut().filter(|p| p.interval.overlaps(&iv)) {
                p.subscribers.push(sub.clone());
                to_fetch.remove(p.interval);
            }

            for gap in to_fetch.all() {
                let id = inner.next_id.fetch_add(1, Ordering::Relaxed);
                let (pending, cancel) = PendingFetch::new(id, gap, iv.midpoint(), sub.clone());
                jobs.push(FetchJob {
                    store: Arc::clone(&inner.store),
                    series: Arc::clone(&series),
                    key: key.clone(),
                    id,
                    interval: gap,
                    state: pending.state.clone(),
                    cancel,
                    policy: inner.policy,
                });
                st.pending.push(pending);
            }
        }

        #[cfg(feature = "tracing")]
        if !jobs.is_empty() {
            tracing::debug!(fetches = jobs.len(), "dispatching fetches");
        }
        for job in jobs {
            runtime.spawn(job.run());
        }
    }

    /// [`CachingProvider::load`] with `persist` on and the configured
    /// preemption default.
    pub fn load_default(
        &self,
        key: &SeriesKey,
        from: i64,
        to: i64,
        consumer: Arc<dyn Consumer>,
    ) {
        self.load(key, from, to, true, self.inner.preempt_default, consumer);
    }

    /// Cancel every in-flight fetch of every series.
    ///
    /// Returns `false` if some fetch had already started delivering; that
    /// fetch still completes.
    pub fn cancel_all(&self) -> bool {
        let mut all = true;
        for series in self.inner.all_series() {
            let mut st = lock_series(&series);
            for p in st.pending.drain(..) {
                all &= p.cancel();
            }
            all &= st.delivering.is_empty();
        }
        all
    }

    /// Cancel all work, stop live sessions and drop every cache.
    ///
    /// Later calls are ignored with a logged warning.
    pub fn destroy(&self) {
        if self.inner.destroyed.swap(true, Ordering::AcqRel) {
            #[cfg(feature = "tracing")]
            tracing::warn!("provider already destroyed");
            return;
        }
        self.cancel_all();
        // dropping a handle stops its session
        self.inner
            .live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.inner
            .series
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Whether [`CachingProvider::destroy`] has been called.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.inner.is_destroyed()
    }

    /// Ranges of `key` the cache is complete for.
    #[must_use]
    pub fn cached_ranges(&self, key: &SeriesKey) -> Vec<TimeInterval> {
        self.inner
            .existing(key)
            .map(|s| lock_series(&s).cache.ranges().all())
            .unwrap_or_default()
    }

    /// Number of cached points of `key`.
    #[must_use]
    pub fn cached_len(&self, key: &SeriesKey) -> usize {
        self.inner
            .existing(key)
            .map_or(0, |s| lock_series(&s).cache.len())
    }

    /// Intervals of the in-flight fetches of `key`, ascending.
    #[must_use]
    pub fn pending_ranges(&self, key: &SeriesKey) -> Vec<TimeInterval> {
        let mut out: Vec<TimeInterval> = self
            .inner
            .existing(key)
            .map(|s| lock_series(&s).pending.iter().map(|p| p.interval).collect())
            .unwrap_or_default();
        out.sort();
        out
    }

    /// Current eviction anchor of `key`.
    #[must_use]
    pub fn recently_requested_time(&self, key: &SeriesKey) -> Option<i64> {
        self.inner
            .existing(key)
            .and_then(|s| lock_series(&s).cache.recently_requested_time())
    }

    /// Cached points of `key` inside `interval`, without touching the store.
    #[must_use]
    pub fn snapshot(&self, key: &SeriesKey, interval: TimeInterval) -> Vec<DataPoint> {
        self.inner
            .existing(key)
            .map(|s| lock_series(&s).cache.points_in(interval))
            .unwrap_or_default()
    }
}
