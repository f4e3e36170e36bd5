use std::future::Future;
use std::time::Duration;

use tickcache::{DataPoint, Provider, TickcacheError};
use tickcache_mock::FetchBehavior;

use crate::helpers::*;

#[tokio::test]
async fn previous_and_next_match_a_linear_scan() {
    let h = harness_with(
        tickcache_mock::fixtures::random_walk_ticks(21, 0, 300, 40),
        &[],
        |b| b,
    )
    .await;
    let k = tick_key();
    let p = h.cache.provider();
    let first = h.ticks.first().unwrap().timestamp;
    let last = h.ticks.last().unwrap().timestamp;

    let mut sample_times: Vec<i64> =
        vec![i64::MIN + 1, first - 1, first, last, last + 1, last + 10_000];
    sample_times.extend(h.ticks.iter().step_by(17).map(|t| t.timestamp));
    sample_times.extend(h.ticks.iter().step_by(23).map(|t| t.timestamp + 1));

    for t in sample_times {
        let prev = h.ticks.iter().rev().find(|x| x.timestamp < t).cloned().map(DataPoint::Tick);
        let next = h.ticks.iter().find(|x| x.timestamp > t).cloned().map(DataPoint::Tick);
        assert_eq!(p.get_previous_point(&k, t).await.unwrap(), prev, "previous of {t}");
        assert_eq!(p.get_next_point(&k, t).await.unwrap(), next, "next of {t}");
    }
}

#[tokio::test]
async fn neighbor_walk_crosses_empty_buckets() {
    let mut ticks = tickcache_mock::fixtures::random_walk_ticks(4, 0, 20, 30);
    let mut late = tickcache_mock::fixtures::random_walk_ticks(4, 50_000, 20, 30);
    ticks.append(&mut late);
    let h = harness_with(ticks, &[], |b| b).await;
    let k = tick_key();

    let gap_end = h.ticks[19].timestamp;
    let gap_start = h.ticks[20].timestamp;
    let p = h.cache.provider();
    assert_eq!(
        p.get_next_point(&k, gap_end).await.unwrap().map(|d| d.timestamp()),
        Some(gap_start)
    );
    assert_eq!(
        p.get_previous_point(&k, gap_start).await.unwrap().map(|d| d.timestamp()),
        Some(gap_end)
    );
}

/// Drive `walk` to completion, sampling the resident bucket count meanwhile.
async fn max_resident_during<F>(p: &Provider, walk: F) -> (Option<DataPoint>, usize)
where
    F: Future<Output = Result<Option<DataPoint>, TickcacheError>>,
{
    tokio::pin!(walk);
    let mut max_seen = p.cached_bucket_count();
    loop {
        tokio::select! {
            res = &mut walk => {
                max_seen = max_seen.max(p.cached_bucket_count());
                return (res.unwrap(), max_seen);
            }
            () = tokio::time::sleep(Duration::from_micros(200)) => {
                max_seen = max_seen.max(p.cached_bucket_count());
            }
        }
    }
}

#[tokio::test]
async fn neighbor_walks_stay_within_bucket_capacity() {
    let mut ticks = tickcache_mock::fixtures::random_walk_ticks(4, 0, 20, 30);
    let mut late = tickcache_mock::fixtures::random_walk_ticks(4, 50_000, 20, 30);
    ticks.append(&mut late);
    let h = harness_with(ticks, &[], |b| b.bucket_capacity(2)).await;
    let k = tick_key();
    h.ctl
        .set_behavior(k.clone(), FetchBehavior::Delay(Duration::from_millis(1)))
        .await;

    let gap_end = h.ticks[19].timestamp;
    let gap_start = h.ticks[20].timestamp;
    let p = h.cache.provider();

    let (next, max_seen) = max_resident_during(p, p.get_next_point(&k, gap_end)).await;
    assert_eq!(next.map(|d| d.timestamp()), Some(gap_start));
    assert!(max_seen <= 2, "forward walk held {max_seen} buckets");

    let (prev, max_seen) = max_resident_during(p, p.get_previous_point(&k, gap_start)).await;
    assert_eq!(prev.map(|d| d.timestamp()), Some(gap_end));
    assert!(max_seen <= 2, "backward walk held {max_seen} buckets");

    // a range wider than the capacity is returned whole but not kept whole
    let all = p.get_range(&k, 0, 52_000).await.unwrap();
    assert_eq!(all.len(), h.ticks.len());
    assert!(p.cached_bucket_count() <= 2);
}
