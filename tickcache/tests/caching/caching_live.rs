use rust_decimal::Decimal;
use tickcache::{CachingProvider, DataPoint, SeriesKey, Tick, TimeInterval};
use tickcache_mock::fixtures::random_walk_ticks;

use crate::helpers::*;

fn live_tick(ts: i64) -> Tick {
    Tick {
        timestamp: ts,
        ask: Decimal::new(110_020, 5),
        bid: Decimal::new(110_000, 5),
        ask_volume: Decimal::ONE,
        bid_volume: Decimal::ONE,
    }
}

fn tick_at(ts: i64) -> DataPoint {
    DataPoint::Tick(live_tick(ts))
}

fn timestamps(points: &[DataPoint]) -> Vec<i64> {
    points.iter().map(DataPoint::timestamp).collect()
}

#[tokio::test(flavor = "multi_thread")]
async fn followed_feed_extends_coverage_and_drops_stale_points() {
    let h = harness().await;
    let k = tick_key();
    h.cache.caching().follow_live(&k).await.unwrap();
    assert!(h.cache.caching().is_following(&k));

    for ts in [10_000, 10_010, 10_005, 10_020] {
        assert_eq!(h.ctl.push_live(&k, tick_at(ts)).await.unwrap(), 1);
    }

    let caching = h.cache.caching().clone();
    let watched = k.clone();
    eventually(move || caching.cached_ranges(&watched) == vec![TimeInterval::new(10_000, 10_020)])
        .await;
    let live = h.cache.caching().snapshot(&k, TimeInterval::new(9_000, 11_000));
    assert_eq!(timestamps(&live), vec![10_000, 10_010, 10_020]);

    // live coverage answers loads without the store
    let (c, mut rx) = channel();
    h.cache.caching().load_default(&k, 10_000, 10_020, c);
    let d = rx.try_recv().expect("live range is cached");
    assert_eq!(timestamps(&d.points), vec![10_000, 10_010, 10_020]);
    assert_eq!(h.ctl.fetch_count().await, 0);

    assert!(h.cache.caching().unfollow_live(&k).await);
    assert!(!h.cache.caching().unfollow_live(&k).await);
    assert!(!h.cache.caching().is_following(&k));
}

#[tokio::test(flavor = "multi_thread")]
async fn closed_feed_ends_the_session() {
    let h = harness().await;
    let k = tick_key();
    h.cache.caching().follow_live(&k).await.unwrap();
    h.ctl.end_live(&k).await;

    let caching = h.cache.caching().clone();
    let watched = k.clone();
    eventually(move || !caching.is_following(&watched)).await;
}

#[tokio::test(flavor = "multi_thread")]
async fn absorbed_points_merge_with_fetched_ranges() {
    let h = harness().await;
    let k = tick_key();
    let iv = TimeInterval::new(0, 500);
    let (c, mut rx) = channel();
    h.cache.caching().load_default(&k, 0, 500, c);
    collect_until_covered(&mut rx, iv).await;

    h.cache
        .caching()
        .absorb_live(&k, vec![tick_at(20_030), tick_at(20_000), tick_at(20_030)]);
    assert_eq!(
        h.cache.caching().cached_ranges(&k),
        vec![iv, TimeInterval::new(20_000, 20_030)]
    );
    let live = h.cache.caching().snapshot(&k, TimeInterval::new(20_000, 20_030));
    assert_eq!(timestamps(&live), vec![20_000, 20_030]);
}

/// Every cached range holds exactly what the store holds for it.
fn assert_cache_complete(
    caching: &CachingProvider,
    k: &SeriesKey,
    stored: &[Tick],
    budget: usize,
) {
    assert!(caching.cached_len(k) <= budget);
    for r in caching.cached_ranges(k) {
        assert_eq!(
            timestamps(&caching.snapshot(k, r)),
            timestamps(&expected_ticks(stored, r)),
            "range {r} incomplete"
        );
    }
}

/// Absorb one live tick every 10ms over `range`, storing each first.
async fn absorb_run(
    h: &Harness,
    stored: &mut Vec<Tick>,
    range: std::ops::RangeInclusive<i64>,
    budget: usize,
) {
    let k = tick_key();
    for ts in range.step_by(10) {
        h.ctl.insert(&k, vec![tick_at(ts)]).await.unwrap();
        stored.push(live_tick(ts));
        h.cache.caching().absorb_live(&k, vec![tick_at(ts)]);
        assert_cache_complete(h.cache.caching(), &k, stored, budget);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn live_and_loaded_ranges_stay_complete_under_small_budget() {
    const BUDGET: usize = 40;
    let h = harness_with(random_walk_ticks(42, 0, 500, 10), &[], |b| {
        b.cache_point_budget(BUDGET)
    })
    .await;
    let k = tick_key();
    let caching = h.cache.caching();
    let mut stored = h.ticks.clone();

    // live only: the newest points survive eviction
    absorb_run(&h, &mut stored, 10_000..=10_500, BUDGET).await;
    assert!(caching.cached_ranges(&k).last().is_some_and(|r| r.contains(10_500)));
    assert_eq!(caching.recently_requested_time(&k), Some(10_500));

    for (from, to) in [(0, 400), (10_200, 10_400)] {
        let iv = TimeInterval::new(from, to);
        let (c, mut rx) = channel();
        caching.load_default(&k, from, to, c);
        let got = collect_until_covered(&mut rx, iv).await;
        assert_eq!(flatten(&got), expected_ticks(&stored, iv));
        assert_cache_complete(caching, &k, &stored, BUDGET);

        // live keeps flowing while a load owns the anchor
        let next = stored.last().map_or(0, |t| t.timestamp) + 10;
        absorb_run(&h, &mut stored, next..=next + 200, BUDGET).await;
        assert_eq!(caching.recently_requested_time(&k), Some(iv.midpoint()));
    }
}
