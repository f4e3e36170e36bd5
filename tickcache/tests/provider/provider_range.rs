use tickcache::{TickcacheError, TimeInterval};
use tickcache_mock::FetchBehavior;

use crate::helpers::*;

#[tokio::test]
async fn range_matches_stored_points_and_reuses_buckets() {
    let h = harness().await;
    let k = tick_key();
    let p = h.cache.provider();

    let got = p.get_range(&k, 250, 1_750).await.unwrap();
    assert_eq!(got, expected_ticks(&h.ticks, TimeInterval::new(250, 1_750)));
    // buckets 0 and 1
    assert_eq!(h.ctl.fetch_count().await, 2);

    let again = p.get_range(&k, 900, 1_100).await.unwrap();
    assert_eq!(again, expected_ticks(&h.ticks, TimeInterval::new(900, 1_100)));
    assert_eq!(h.ctl.fetch_count().await, 2);
}

#[tokio::test]
async fn unbounded_range_is_clamped_to_known_times() {
    let h = harness().await;
    let k = tick_key();
    let all = h.cache.provider().get_range(&k, i64::MIN, i64::MAX).await.unwrap();
    assert_eq!(all.len(), h.ticks.len());

    let last = h.ticks.last().unwrap().timestamp;
    let buckets = usize::try_from(last / TICK_BUCKET_MS + 1).unwrap();
    assert_eq!(h.ctl.fetch_count().await, buckets);
}

#[tokio::test]
async fn empty_series_and_inverted_range() {
    let h = harness().await;
    let p = h.cache.provider();
    let unknown = tickcache::SeriesKey::parse("GBP/JPY", tickcache::Side::Ask, tickcache::Period::Tick)
        .unwrap();
    assert!(p.get_range(&unknown, 0, 1_000).await.unwrap().is_empty());

    let err = p.get_range(&tick_key(), 10, 5).await.unwrap_err();
    assert!(matches!(err, TickcacheError::InvalidArg(_)));
}

#[tokio::test]
async fn resident_buckets_are_bounded() {
    let h = harness_with(
        tickcache_mock::fixtures::random_walk_ticks(5, 0, 2_000, 10),
        &[],
        |b| b.bucket_capacity(3),
    )
    .await;
    let k = tick_key();
    let p = h.cache.provider();

    for start in (0..9_000).step_by(1_000) {
        p.get_range(&k, start, start + 999).await.unwrap();
        assert!(p.cached_bucket_count() <= 3);
    }
    // scrolling back past the resident window refetches
    let before = h.ctl.fetch_count().await;
    p.get_range(&k, 0, 999).await.unwrap();
    assert_eq!(h.ctl.fetch_count().await, before + 1);

    p.clear();
    assert_eq!(p.cached_bucket_count(), 0);
}

#[tokio::test]
async fn store_errors_are_tagged_with_the_store_name() {
    let h = harness().await;
    let k = tick_key();
    h.ctl
        .set_behavior(k.clone(), FetchBehavior::Fail(TickcacheError::Data("torn bucket".into())))
        .await;
    let err = h.cache.provider().get_range(&k, 0, 100).await.unwrap_err();
    assert_eq!(err, TickcacheError::store("mem", "data issue: torn bucket"));
}
