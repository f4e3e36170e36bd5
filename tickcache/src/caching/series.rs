use std::collections::BTreeMap;

use tickcache_core::{DataPoint, IntervalSet, TimeInterval};

use super::pending::{FetchState, PendingFetch};

/// Eviction parameters shared by every series of a provider.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EvictionPolicy {
    pub(crate) budget: usize,
    pub(crate) shrink: u32,
}

/// Cached points of one series and the ranges they are complete for.
///
/// Every range in `ranges` holds every stored point of that range.
#[derive(Debug, Default)]
pub(crate) struct SeriesCache {
    points: BTreeMap<i64, DataPoint>,
    ranges: IntervalSet,
    recently_requested_time: Option<i64>,
    /// Whether the anchor follows the newest live point.
    live_anchored: bool,
    live_start: Option<i64>,
    live_end: Option<i64>,
}

impl SeriesCache {
    /// Merge fetched points; later data replaces equal timestamps.
    pub(crate) fn merge(&mut self, points: Vec<DataPoint>, covers: TimeInterval) {
        for p in points {
            self.points.insert(p.timestamp(), p);
        }
        self.ranges.add(covers);
    }

    /// Merge live points. Coverage runs from the first live point absorbed
    /// since the live run last lost points to eviction, up to the latest one.
    /// Out-of-order points are the caller's concern.
    ///
    /// Until a load sets the anchor, the anchor tracks the newest live point.
    pub(crate) fn absorb_live(&mut self, points: Vec<DataPoint>) {
        let Some(latest) = points.iter().map(DataPoint::timestamp).max() else {
            return;
        };
        let earliest = points.iter().map(DataPoint::timestamp).min().unwrap_or(latest);
        for p in points {
            self.points.insert(p.timestamp(), p);
        }
        let start = *self.live_start.get_or_insert(earliest);
        let end = self.live_end.map_or(latest, |e| e.max(latest));
        self.live_end = Some(end);
        self.ranges.add(TimeInterval::new(start, end));
        if self.recently_requested_time.is_none() || self.live_anchored {
            self.recently_requested_time = Some(end);
            self.live_anchored = true;
        }
    }

    pub(crate) fn points_in(&self, iv: TimeInterval) -> Vec<DataPoint> {
        self.points
            .range(iv.start()..=iv.end())
            .map(|(_, p)| p.clone())
            .collect()
    }

    pub(crate) const fn ranges(&self) -> &IntervalSet {
        &self.ranges
    }

    pub(crate) fn len(&self) -> usize {
        self.points.len()
    }

    pub(crate) const fn recently_requested_time(&self) -> Option<i64> {
        self.recently_requested_time
    }

    pub(crate) const fn set_recently_requested_time(&mut self, t: i64) {
        self.recently_requested_time = Some(t);
        self.live_anchored = false;
    }

    pub(crate) fn clear(&mut self) {
        self.points.clear();
        self.ranges.clear();
        self.live_start = None;
        self.live_end = None;
    }

    /// Shrink the cache around the anchor until it fits the budget.
    ///
    /// The retained half-width is divided by the shrink factor each round.
    /// The cache is cleared when there is no anchor, the anchor lies outside
    /// the cached points, or the half-width reaches zero first.
    pub(crate) fn evict(&mut self, policy: EvictionPolicy) {
        if self.points.len() <= policy.budget {
            return;
        }
        let (Some(anchor), Some((&first, _)), Some((&last, _))) = (
            self.recently_requested_time,
            self.points.first_key_value(),
            self.points.last_key_value(),
        ) else {
            self.clear();
            return;
        };
        if anchor < first || anchor > last {
            #[cfg(feature = "tracing")]
            tracing::debug!(anchor, first, last, "anchor outside cached points; clearing");
            self.clear();
            return;
        }

        let shrink = u64::from(policy.shrink.max(2));
        let mut half = anchor.abs_diff(first).max(anchor.abs_diff(last));
        loop {
            half /= shrink;
            if half == 0 {
                #[cfg(feature = "tracing")]
                tracing::debug!(anchor, "eviction window collapsed; clearing");
                self.clear();
                return;
            }
            let window = TimeInterval::new(
                anchor.saturating_sub_unsigned(half),
                anchor.saturating_add_unsigned(half),
            );
            let kept = self.points.range(window.start()..=window.end()).count();
            if kept <= policy.budget {
                self.retain_window(window);
                return;
            }
        }
    }

    fn retain_window(&mut self, window: TimeInterval) {
        let mut kept = self.points.split_off(&window.start());
        if let Some(after) = window.end().checked_add(1) {
            drop(kept.split_off(&after));
        }
        self.points = kept;
        self.ranges.cut(window);
        match self.live_end {
            Some(end) if window.contains(end) => {
                if let Some(start) = self.live_start.as_mut() {
                    *start = (*start).max(window.start());
                }
            }
            // the run lost its newest points; the next live point starts a new one
            _ => {
                self.live_start = None;
                self.live_end = None;
            }
        }
    }
}

/// Everything a provider tracks for one series.
#[derive(Default)]
pub(crate) struct SeriesState {
    pub(crate) cache: SeriesCache,
    pub(crate) pending: Vec<PendingFetch>,
    /// Tasks past their last cancellation check point, still delivering.
    pub(crate) delivering: Vec<FetchState>,
}

impl SeriesState {
    pub(crate) fn take_pending(&mut self, id: u64) -> Option<PendingFetch> {
        let pos = self.pending.iter().position(|p| p.id == id)?;
        Some(self.pending.swap_remove(pos))
    }
}
