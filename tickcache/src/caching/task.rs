use std::sync::{Arc, Mutex};

use tokio::sync::watch;

use tickcache_core::{BackingStore, SeriesKey, TimeInterval, clip_points, sort_dedup};

use super::lock_series;
use super::pending::FetchState;
use super::series::{EvictionPolicy, SeriesState};
use crate::consumer::Delivery;
use crate::core::tag_err;

/// Everything a background fetch needs, detached from the provider.
pub(crate) struct FetchJob {
    pub(crate) store: Arc<dyn BackingStore>,
    pub(crate) series: Arc<Mutex<SeriesState>>,
    pub(crate) key: SeriesKey,
    pub(crate) id: u64,
    pub(crate) interval: TimeInterval,
    pub(crate) state: FetchState,
    pub(crate) cancel: watch::Receiver<bool>,
    pub(crate) policy: EvictionPolicy,
}

async fn cancelled(rx: &mut watch::Receiver<bool>) {
    // a dropped sender means the pending entry is gone
    let _ = rx.wait_for(|c| *c).await;
}

impl FetchJob {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "tickcache::caching::fetch",
            skip(self),
            fields(key = %self.key, id = self.id, interval = %self.interval),
        )
    )]
    pub(crate) async fn run(mut self) {
        let result = tokio::select! {
            biased;
            () = cancelled(&mut self.cancel) => {
                #[cfg(feature = "tracing")]
                tracing::debug!("fetch cancelled");
                return;
            }
            r = self.store.fetch(&self.key, self.interval) => r,
        };

        let mut points = match result {
            Ok(points) => points,
            Err(e) => {
                let e = tag_err(self.store.name(), e);
                {
                    let mut st = lock_series(&self.series);
                    st.take_pending(self.id);
                }
                self.state.finish();
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %e, "fetch failed; range stays uncached");
                #[cfg(not(feature = "tracing"))]
                let _ = e;
                return;
            }
        };
        sort_dedup(&mut points);
        let points = clip_points(&points, self.interval);

        let (subscribers, key) = {
            let mut st = lock_series(&self.series);
            if !self.state.begin_delivery() {
                return;
            }
            let Some(pending) = st.take_pending(self.id) else {
                self.state.finish();
                return;
            };
            if pending.subscribers.iter().any(|s| s.persist) {
                st.cache.merge(points.clone(), self.interval);
            }
            st.cache.set_recently_requested_time(pending.anchor);
            st.cache.evict(self.policy);
            st.delivering.push(self.state.clone());
            (pending.subscribers, self.key.clone())
        };

        for sub in &subscribers {
            let Some(covers) = sub.interval.intersection(&self.interval) else {
                continue;
            };
            sub.consumer.on_delivery(&Delivery {
                key: key.clone(),
                points: clip_points(&points, covers),
                covers,
            });
        }

        let mut st = lock_series(&self.series);
        st.delivering.retain(|s| !s.same(&self.state));
        self.state.finish();
    }
}
