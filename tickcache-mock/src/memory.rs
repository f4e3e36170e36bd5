use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc, oneshot, watch};

use tickcache_core::store::{BackingStore, LiveFeed, RankedStore};
use tickcache_core::{
    BucketLayout, DataPoint, FeedHandle, RankIndex, SeriesKey, SeriesKind, Side, TickcacheError,
    TimeInterval,
};

use crate::controller::{FetchBehavior, StoreController};

/// Tick series are stored once per instrument; the requested side only
/// selects which price a consumer reads.
pub(crate) fn storage_key(key: &SeriesKey) -> SeriesKey {
    match key.kind() {
        SeriesKind::Ticks => key.with_side(Side::Ask),
        SeriesKind::Bars(_) => key.clone(),
    }
}

pub(crate) struct InternalState {
    pub(crate) layout: BucketLayout,
    pub(crate) series: HashMap<SeriesKey, BTreeMap<i64, Vec<DataPoint>>>,
    pub(crate) ranks: HashMap<SeriesKey, RankIndex>,
    pub(crate) rules: HashMap<SeriesKey, FetchBehavior>,
    pub(crate) fetch_log: Vec<(SeriesKey, TimeInterval)>,
    pub(crate) live: HashMap<SeriesKey, Vec<mpsc::Sender<DataPoint>>>,
}

impl InternalState {
    pub(crate) fn new(layout: BucketLayout) -> Self {
        Self {
            layout,
            series: HashMap::new(),
            ranks: HashMap::new(),
            rules: HashMap::new(),
            fetch_log: Vec::new(),
            live: HashMap::new(),
        }
    }

    /// Insert a batch, replacing points with equal timestamps. Returns the
    /// number of new timestamps.
    pub(crate) fn insert(
        &mut self,
        key: &SeriesKey,
        points: Vec<DataPoint>,
    ) -> Result<usize, TickcacheError> {
        let kind = key.kind();
        for p in &points {
            let ok = match kind {
                SeriesKind::Ticks => p.as_tick().is_some(),
                SeriesKind::Bars(_) => p.as_bar().is_some(),
            };
            if !ok {
                return Err(TickcacheError::Data(format!(
                    "point at {} does not match series {key}",
                    p.timestamp()
                )));
            }
        }

        let skey = storage_key(key);
        let layout = self.layout;
        let buckets = self.series.entry(skey.clone()).or_default();
        let mut touched = BTreeSet::new();
        let mut added = 0;
        for p in points {
            let b = layout.bucket_index_for_time(kind, p.timestamp());
            let bucket = buckets.entry(b).or_default();
            match bucket.binary_search_by_key(&p.timestamp(), DataPoint::timestamp) {
                Ok(i) => bucket[i] = p,
                Err(i) => {
                    bucket.insert(i, p);
                    added += 1;
                }
            }
            touched.insert(b);
        }

        if kind == SeriesKind::Ticks {
            let sizes: Vec<(i64, u64)> = touched
                .iter()
                .map(|b| (*b, buckets.get(b).map_or(0, |v| v.len() as u64)))
                .collect();
            self.ranks.entry(skey).or_default().record_buckets(&sizes);
        }
        Ok(added)
    }

    fn range(&self, key: &SeriesKey, iv: TimeInterval) -> Vec<DataPoint> {
        let Some(buckets) = self.series.get(&storage_key(key)) else {
            return Vec::new();
        };
        let ids = self.layout.buckets_covering(key.kind(), iv);
        buckets
            .range(ids)
            .flat_map(|(_, pts)| tickcache_core::clip_points(pts, iv))
            .collect()
    }

    fn bounds(&self, key: &SeriesKey) -> Option<(i64, i64)> {
        let buckets = self.series.get(&storage_key(key))?;
        let first = buckets.values().find_map(|v| v.first())?;
        let last = buckets.values().rev().find_map(|v| v.last())?;
        Some((first.timestamp(), last.timestamp()))
    }
}

/// In-memory bucketed backing store driven by a [`StoreController`].
pub struct MemoryStore {
    name: &'static str,
    state: Arc<Mutex<InternalState>>,
    gate: watch::Receiver<bool>,
}

impl MemoryStore {
    /// Create a store and its controller.
    #[must_use]
    pub fn new_with_controller(
        name: &'static str,
        layout: BucketLayout,
    ) -> (Arc<Self>, StoreController) {
        let state = Arc::new(Mutex::new(InternalState::new(layout)));
        let (gate_tx, gate_rx) = watch::channel(true);
        let controller = StoreController::new(Arc::clone(&state), gate_tx);
        let me = Arc::new(Self {
            name,
            state,
            gate: gate_rx,
        });
        (me, controller)
    }

    async fn behavior_for(&self, key: &SeriesKey) -> FetchBehavior {
        let guard = self.state.lock().await;
        guard.rules.get(key).cloned().unwrap_or(FetchBehavior::Serve)
    }

    async fn wait_for_gate(&self) {
        let mut gate = self.gate.clone();
        // a dropped controller leaves the gate open
        let _ = gate.wait_for(|open| *open).await;
    }
}

#[async_trait]
impl BackingStore for MemoryStore {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn fetch(
        &self,
        key: &SeriesKey,
        interval: TimeInterval,
    ) -> Result<Vec<DataPoint>, TickcacheError> {
        {
            let mut guard = self.state.lock().await;
            guard.fetch_log.push((key.clone(), interval));
        }
        self.wait_for_gate().await;

        match self.behavior_for(key).await {
            FetchBehavior::Serve => {}
            FetchBehavior::Fail(e) => return Err(e),
            FetchBehavior::Hang => return std::future::pending().await,
            FetchBehavior::Delay(d) => tokio::time::sleep(d).await,
        }

        let guard = self.state.lock().await;
        Ok(guard.range(key, interval))
    }

    async fn earliest_known_time(&self, key: &SeriesKey) -> Result<Option<i64>, TickcacheError> {
        let guard = self.state.lock().await;
        Ok(guard.bounds(key).map(|(first, _)| first))
    }

    async fn latest_known_time(&self, key: &SeriesKey) -> Result<Option<i64>, TickcacheError> {
        let guard = self.state.lock().await;
        Ok(guard.bounds(key).map(|(_, last)| last))
    }

    fn as_ranked_store(&self) -> Option<&dyn RankedStore> {
        Some(self as &dyn RankedStore)
    }

    fn as_live_feed(&self) -> Option<&dyn LiveFeed> {
        Some(self as &dyn LiveFeed)
    }
}

#[async_trait]
impl RankedStore for MemoryStore {
    async fn count_before(&self, key: &SeriesKey, time: i64) -> Result<u64, TickcacheError> {
        if key.kind() != SeriesKind::Ticks {
            return Err(TickcacheError::unsupported("rank for bar series"));
        }
        let guard = self.state.lock().await;
        let skey = storage_key(key);
        let Some(rank) = guard.ranks.get(&skey) else {
            return Ok(0);
        };
        let buckets = guard.series.get(&skey);
        Ok(rank.count_before(&guard.layout, time, |bucket| {
            buckets
                .and_then(|b| b.get(&bucket))
                .map_or(0, |pts| pts.partition_point(|p| p.timestamp() < time) as u64)
        }))
    }
}

#[async_trait]
impl LiveFeed for MemoryStore {
    async fn subscribe(
        &self,
        key: &SeriesKey,
    ) -> Result<(FeedHandle, mpsc::Receiver<DataPoint>), TickcacheError> {
        let (tx, rx) = mpsc::channel::<DataPoint>(1024);
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let (in_tx, mut in_rx) = mpsc::channel::<DataPoint>(1024);

        {
            let mut guard = self.state.lock().await;
            guard.live.entry(storage_key(key)).or_default().push(in_tx);
        }

        let join = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = &mut stop_rx => break,
                    maybe_p = in_rx.recv() => {
                        let Some(p) = maybe_p else { break };
                        if tx.send(p).await.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Ok((FeedHandle::new(join, stop_tx), rx))
    }
}
