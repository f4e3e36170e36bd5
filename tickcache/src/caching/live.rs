use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::oneshot;

use tickcache_core::{DataPoint, FeedHandle, SeriesKey, TickcacheError, sort_dedup};

use super::series::{EvictionPolicy, SeriesState};
use super::{CachingProvider, lock_series};
use crate::core::tag_err;

fn absorb(series: &Mutex<SeriesState>, mut points: Vec<DataPoint>, policy: EvictionPolicy) {
    sort_dedup(&mut points);
    let mut st = lock_series(series);
    st.cache.absorb_live(points);
    st.cache.evict(policy);
}

/// Drops points older than the newest one already passed.
#[derive(Debug, Default)]
struct MonotonicGate {
    last: Option<i64>,
}

impl MonotonicGate {
    fn allow(&mut self, ts: i64) -> bool {
        match self.last {
            Some(prev) if ts < prev => false,
            _ => {
                self.last = Some(ts);
                true
            }
        }
    }
}

impl CachingProvider {
    /// Merge freshly produced points into the cache of `key`.
    ///
    /// The cache becomes complete from the first live point it ever absorbed
    /// up to the newest one. Ignored after [`CachingProvider::destroy`].
    pub fn absorb_live(&self, key: &SeriesKey, points: Vec<DataPoint>) {
        if self.inner.is_destroyed() || points.is_empty() {
            return;
        }
        let series = self.inner.entry(key);
        absorb(&series, points, self.inner.policy);
    }

    /// Subscribe to the store's live feed for `key` and absorb every point.
    ///
    /// Points older than the newest absorbed one are dropped. Following a
    /// series again replaces the previous session.
    ///
    /// # Errors
    /// Returns `Destroyed` after [`CachingProvider::destroy`], `Unsupported`
    /// when the store has no live feed, or the store's subscribe error.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "tickcache::caching::follow_live", skip(self), fields(key = %key))
    )]
    pub async fn follow_live(&self, key: &SeriesKey) -> Result<(), TickcacheError> {
        if self.inner.is_destroyed() {
            return Err(TickcacheError::Destroyed);
        }
        let store = Arc::clone(&self.inner.store);
        let Some(feed) = store.as_live_feed() else {
            return Err(TickcacheError::unsupported("live feed"));
        };
        let (handle, mut rx) = feed
            .subscribe(key)
            .await
            .map_err(|e| tag_err(store.name(), e))?;

        let series = self.inner.entry(key);
        let policy = self.inner.policy;
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        #[cfg(feature = "tracing")]
        let session_key = key.clone();

        let join = tokio::spawn(async move {
            let mut provider_handle = Some(handle);
            let mut gate = MonotonicGate::default();
            loop {
                tokio::select! {
                    biased;
                    _ = &mut stop_rx => break,
                    maybe_p = rx.recv() => {
                        let Some(p) = maybe_p else { break };
                        if !gate.allow(p.timestamp()) {
                            #[cfg(feature = "tracing")]
                            tracing::warn!(key = %session_key, ts = p.timestamp(), "dropping out-of-order live point");
                            continue;
                        }
                        absorb(&series, vec![p], policy);
                    }
                }
            }
            if let Some(h) = provider_handle.take() {
                h.stop().await;
            }
            #[cfg(feature = "tracing")]
            tracing::debug!(key = %session_key, "live session ended");
        });

        let previous = self
            .inner
            .live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone(), FeedHandle::new(join, stop_tx));
        if let Some(old) = previous {
            old.stop().await;
        }
        Ok(())
    }

    /// Stop following `key`. Returns `false` if it was not followed.
    pub async fn unfollow_live(&self, key: &SeriesKey) -> bool {
        let handle = self
            .inner
            .live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        match handle {
            Some(h) => {
                h.stop().await;
                true
            }
            None => false,
        }
    }

    /// Whether a live session for `key` is still running.
    #[must_use]
    pub fn is_following(&self, key: &SeriesKey) -> bool {
        self.inner
            .live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .is_some_and(|h| !h.is_finished())
    }
}
