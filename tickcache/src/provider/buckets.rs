use std::collections::HashMap;
use std::sync::Arc;

use tickcache_core::{DataPoint, SeriesKey};

/// Bounded map of whole store buckets.
///
/// Each series remembers an anchor bucket (the midpoint of its latest
/// request); on overflow the buckets furthest from their series' anchor go
/// first.
pub(crate) struct BucketCache {
    capacity: usize,
    entries: HashMap<(SeriesKey, i64), Arc<[DataPoint]>>,
    anchors: HashMap<SeriesKey, i64>,
}

impl BucketCache {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            anchors: HashMap::new(),
        }
    }

    pub(crate) fn get(&self, key: &SeriesKey, bucket: i64) -> Option<Arc<[DataPoint]>> {
        self.entries.get(&(key.clone(), bucket)).cloned()
    }

    pub(crate) fn insert(&mut self, key: &SeriesKey, bucket: i64, points: Arc<[DataPoint]>) {
        self.entries.insert((key.clone(), bucket), points);
    }

    pub(crate) fn set_anchor(&mut self, key: &SeriesKey, bucket: i64) {
        self.anchors.insert(key.clone(), bucket);
    }

    /// Drop the buckets furthest from their anchors until within capacity.
    pub(crate) fn evict(&mut self) {
        let excess = self.entries.len().saturating_sub(self.capacity);
        if excess == 0 {
            return;
        }
        let mut ranked: Vec<(u64, (SeriesKey, i64))> = self
            .entries
            .keys()
            .map(|(key, bucket)| {
                let dist = self
                    .anchors
                    .get(key)
                    .map_or(u64::MAX, |anchor| anchor.abs_diff(*bucket));
                (dist, (key.clone(), *bucket))
            })
            .collect();
        ranked.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.1.cmp(&b.1.1)));
        for (_, id) in ranked.into_iter().take(excess) {
            self.entries.remove(&id);
        }
        self.anchors
            .retain(|key, _| self.entries.keys().any(|(k, _)| k == key));
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.anchors.clear();
    }
}
