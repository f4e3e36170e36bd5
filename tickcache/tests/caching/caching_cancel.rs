use std::sync::{Arc, Mutex, mpsc};
use std::time::Duration;

use tickcache::{Delivery, FnConsumer, TimeInterval};

use crate::helpers::*;

#[tokio::test(flavor = "multi_thread")]
async fn cancel_all_before_delivery_suppresses_it() {
    let h = harness().await;
    let k = tick_key();
    h.ctl.hold_fetches();

    let (c, mut rx) = channel();
    h.cache.caching().load_default(&k, 0, 1_000, c);
    h.ctl.wait_for_fetches(1).await;

    assert!(h.cache.caching().cancel_all());
    assert!(h.cache.caching().pending_ranges(&k).is_empty());

    h.ctl.release_fetches();
    // the consumer was dropped with its pending fetch
    assert!(rx.recv().await.is_none());
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(h.cache.caching().cached_ranges(&k).is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancel_all_reports_fetches_already_delivering() {
    let h = harness().await;
    let k = tick_key();

    let (entered_tx, entered_rx) = mpsc::channel::<()>();
    let (go_tx, go_rx) = mpsc::channel::<()>();
    let go_rx = Mutex::new(go_rx);
    let consumer = FnConsumer::new(move |_d: &Delivery| {
        let _ = entered_tx.send(());
        let _ = go_rx.lock().unwrap().recv_timeout(Duration::from_secs(5));
    });

    h.cache.caching().load_default(&k, 0, 300, Arc::new(consumer));
    tokio::task::block_in_place(|| entered_rx.recv_timeout(Duration::from_secs(5)))
        .expect("delivery never started");

    assert!(!h.cache.caching().cancel_all());
    go_tx.send(()).unwrap();

    let caching = h.cache.caching().clone();
    eventually(move || caching.cancel_all()).await;
    // a delivering fetch still completes
    assert_eq!(h.cache.caching().cached_ranges(&k), vec![TimeInterval::new(0, 300)]);
}

#[tokio::test(flavor = "multi_thread")]
async fn preempting_load_cancels_unrelated_fetches() {
    let h = harness().await;
    let k = tick_key();
    h.ctl.hold_fetches();

    let (c1, mut rx1) = channel();
    h.cache.caching().load_default(&k, 0, 1_000, c1);
    h.ctl.wait_for_fetches(1).await;

    let (c2, mut rx2) = channel();
    h.cache.caching().load(&k, 2_000, 2_400, true, true, c2);
    h.ctl.wait_for_fetches(2).await;
    assert_eq!(
        h.cache.caching().pending_ranges(&k),
        vec![TimeInterval::new(2_000, 2_400)]
    );

    h.ctl.release_fetches();
    assert!(rx1.recv().await.is_none());
    let iv = TimeInterval::new(2_000, 2_400);
    let got = collect_until_covered(&mut rx2, iv).await;
    assert_eq!(flatten(&got), expected_ticks(&h.ticks, iv));
    assert_eq!(h.cache.caching().cached_ranges(&k), vec![iv]);
}

#[tokio::test(flavor = "multi_thread")]
async fn preempting_load_keeps_overlapping_fetches() {
    let h = harness().await;
    let k = tick_key();
    h.ctl.hold_fetches();

    let (c1, mut rx1) = channel();
    h.cache.caching().load_default(&k, 0, 1_000, c1);
    h.ctl.wait_for_fetches(1).await;
    let (c2, mut rx2) = channel();
    h.cache.caching().load(&k, 900, 1_200, true, true, c2);
    h.ctl.wait_for_fetches(2).await;

    h.ctl.release_fetches();
    collect_until_covered(&mut rx1, TimeInterval::new(0, 1_000)).await;
    collect_until_covered(&mut rx2, TimeInterval::new(900, 1_200)).await;
    assert_eq!(h.cache.caching().cached_ranges(&k), vec![TimeInterval::new(0, 1_200)]);
}
