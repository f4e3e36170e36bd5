use tickcache::TimeInterval;
use tickcache_mock::fixtures::random_walk_ticks;

use crate::helpers::*;

#[tokio::test(flavor = "multi_thread")]
async fn cache_stays_within_budget_and_coherent() {
    let h = harness_with(random_walk_ticks(7, 0, 1_000, 10), &[], |b| {
        b.cache_point_budget(50)
    })
    .await;
    let k = tick_key();
    let iv = TimeInterval::new(0, 6_000);

    let (c, mut rx) = channel();
    h.cache.caching().load_default(&k, 0, 6_000, c);
    let got = collect_until_covered(&mut rx, iv).await;
    // consumers get everything they asked for regardless of the budget
    assert_eq!(flatten(&got), expected_ticks(&h.ticks, iv));

    let caching = h.cache.caching();
    assert!(caching.cached_len(&k) <= 50);
    assert_eq!(caching.recently_requested_time(&k), Some(3_000));
    for r in caching.cached_ranges(&k) {
        assert_eq!(caching.snapshot(&k, r), expected_ticks(&h.ticks, r));
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn eviction_follows_the_most_recent_request() {
    let h = harness_with(random_walk_ticks(8, 0, 1_000, 10), &[], |b| {
        b.cache_point_budget(150)
    })
    .await;
    let k = tick_key();

    for (from, to) in [(0, 1_000), (4_000, 5_000)] {
        let (c, mut rx) = channel();
        h.cache.caching().load_default(&k, from, to, c);
        collect_until_covered(&mut rx, TimeInterval::new(from, to)).await;
    }

    let caching = h.cache.caching();
    let recent = TimeInterval::new(4_000, 5_000);
    assert!(caching.cached_len(&k) <= 150);
    assert!(caching.cached_len(&k) > 0);
    assert_eq!(caching.recently_requested_time(&k), Some(4_500));
    assert!(caching.snapshot(&k, TimeInterval::new(0, 1_000)).is_empty());
    for r in caching.cached_ranges(&k) {
        assert!(recent.contains_interval(&r));
        assert_eq!(caching.snapshot(&k, r), expected_ticks(&h.ticks, r));
    }
}
