use std::sync::Arc;

use tickcache::{ChannelConsumer, Tickcache, TickcacheError, TimeInterval};
use tickcache_mock::MemoryStore;

use crate::helpers::*;

#[tokio::test(flavor = "multi_thread")]
async fn destroy_drops_caches_and_rejects_further_work() {
    let h = harness().await;
    let k = tick_key();
    let (c, mut rx) = channel();
    h.cache.caching().load_default(&k, 0, 200, c);
    collect_until_covered(&mut rx, TimeInterval::new(0, 200)).await;
    h.cache.caching().follow_live(&k).await.unwrap();

    h.cache.caching().destroy();
    assert!(h.cache.caching().is_destroyed());
    assert!(h.cache.caching().cached_ranges(&k).is_empty());
    assert!(!h.cache.caching().is_following(&k));

    let (c2, mut rx2) = channel();
    h.cache.caching().load_default(&k, 0, 200, c2);
    assert!(rx2.recv().await.is_none());
    assert_eq!(h.ctl.fetch_count().await, 1);
    assert_eq!(
        h.cache.caching().follow_live(&k).await,
        Err(TickcacheError::Destroyed)
    );

    // idempotent
    h.cache.caching().destroy();
}

#[test]
fn load_outside_a_runtime_is_ignored() {
    let (store, _ctl) = MemoryStore::new_with_controller("mem", layout());
    let cache = Tickcache::builder().with_store(store).build().unwrap();
    let (c, mut rx) = ChannelConsumer::new();
    cache.caching().load_default(&tick_key(), 0, 100, Arc::new(c));
    assert!(rx.try_recv().is_err());
    assert!(cache.caching().pending_ranges(&tick_key()).is_empty());
}

#[test]
fn builder_requires_a_store_and_a_valid_config() {
    let err = Tickcache::builder().build().err().unwrap();
    assert!(matches!(err, TickcacheError::InvalidArg(_)));

    let (store, _ctl) = MemoryStore::new_with_controller("mem", layout());
    let err = Tickcache::builder()
        .with_store(store)
        .eviction_shrink_factor(1)
        .build()
        .err()
        .unwrap();
    assert!(matches!(err, TickcacheError::InvalidArg(_)));
}
