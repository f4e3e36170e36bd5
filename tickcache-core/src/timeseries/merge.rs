use std::collections::{BTreeMap, btree_map::Entry};

use crate::{DataPoint, TimeInterval};

/// Merge point batches in priority order (first is highest).
///
/// - Points are keyed by timestamp; the first appearance wins for duplicates.
/// - The result is sorted by timestamp.
pub fn merge_points<I>(sources: I) -> Vec<DataPoint>
where
    I: IntoIterator<Item = Vec<DataPoint>>,
{
    let mut by_ts: BTreeMap<i64, DataPoint> = BTreeMap::new();
    for batch in sources {
        for p in batch {
            if let Entry::Vacant(v) = by_ts.entry(p.timestamp()) {
                v.insert(p);
            }
        }
    }
    by_ts.into_values().collect()
}

/// Sort a batch by timestamp and drop later duplicates in place.
///
/// The sort is stable, so among equal timestamps the earliest element in the
/// input is the one kept.
pub fn sort_dedup(points: &mut Vec<DataPoint>) {
    points.sort_by_key(DataPoint::timestamp);
    points.dedup_by_key(|p| p.timestamp());
}

/// Copy of the points of a sorted batch that fall inside `iv`.
#[must_use]
pub fn clip_points(points: &[DataPoint], iv: TimeInterval) -> Vec<DataPoint> {
    let lo = points.partition_point(|p| p.timestamp() < iv.start());
    let hi = points.partition_point(|p| p.timestamp() <= iv.end());
    if lo >= hi {
        return Vec::new();
    }
    points[lo..hi].to_vec()
}
