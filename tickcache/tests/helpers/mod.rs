// Shared fixtures so tests can `use crate::helpers::*;`
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use tickcache::{
    BucketLayout, ChannelConsumer, DataPoint, Delivery, IntervalSet, Period, SeriesKey, Side,
    Tick, Tickcache, TimeInterval,
};
use tickcache_mock::fixtures::{populate, random_walk_ticks};
use tickcache_mock::{MemoryStore, StoreController};

pub const SYMBOL: &str = "EUR/USD";

/// Bars per bucket used by every harness; keeps bar buckets small.
pub const POINTS_PER_BUCKET: u32 = 10;
/// Tick bucket width used by every harness.
pub const TICK_BUCKET_MS: i64 = 1_000;

pub fn key(side: Side, period: Period) -> SeriesKey {
    SeriesKey::parse(SYMBOL, side, period).unwrap()
}

pub fn tick_key() -> SeriesKey {
    key(Side::Ask, Period::Tick)
}

pub const fn layout() -> BucketLayout {
    BucketLayout::new(POINTS_PER_BUCKET, TICK_BUCKET_MS)
}

pub struct Harness {
    pub cache: Tickcache,
    pub ctl: StoreController,
    pub ticks: Vec<Tick>,
}

/// Store seeded ticks (and bars of `periods`) and wire a cache to it.
///
/// `tune` adjusts the builder before `build`.
pub async fn harness_with(
    ticks: Vec<Tick>,
    periods: &[Period],
    tune: impl FnOnce(tickcache::TickcacheBuilder) -> tickcache::TickcacheBuilder,
) -> Harness {
    let (store, ctl) = MemoryStore::new_with_controller("mem", layout());
    let inst = key(Side::Ask, Period::Tick).instrument().clone();
    populate(&ctl, &inst, &ticks, periods).await.unwrap();
    let builder = Tickcache::builder()
        .with_store(store)
        .points_per_bucket(POINTS_PER_BUCKET)
        .tick_bucket_ms(TICK_BUCKET_MS);
    let cache = tune(builder).build().unwrap();
    Harness { cache, ctl, ticks }
}

/// About 500 ticks over roughly the first 2.5 seconds.
pub async fn harness() -> Harness {
    harness_with(random_walk_ticks(42, 0, 500, 10), &[], |b| b).await
}

pub fn channel() -> (Arc<ChannelConsumer>, mpsc::UnboundedReceiver<Delivery>) {
    let (c, rx) = ChannelConsumer::new();
    (Arc::new(c), rx)
}

/// Ticks of `ticks` inside `iv`, as stored.
pub fn expected_ticks(ticks: &[Tick], iv: TimeInterval) -> Vec<DataPoint> {
    ticks
        .iter()
        .filter(|t| iv.contains(t.timestamp))
        .cloned()
        .map(DataPoint::Tick)
        .collect()
}

/// Receive deliveries until together they cover `iv`.
pub async fn collect_until_covered(
    rx: &mut mpsc::UnboundedReceiver<Delivery>,
    iv: TimeInterval,
) -> Vec<Delivery> {
    let mut covered = IntervalSet::new();
    let mut out = Vec::new();
    while !covered.covers(iv) {
        let d = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for delivery")
            .expect("consumer channel closed");
        covered.add(d.covers);
        out.push(d);
    }
    out
}

/// Merge deliveries into one timestamp-sorted list without duplicates.
pub fn flatten(deliveries: &[Delivery]) -> Vec<DataPoint> {
    let mut all: Vec<DataPoint> = deliveries.iter().flat_map(|d| d.points.clone()).collect();
    all.sort_by_key(DataPoint::timestamp);
    all.dedup_by_key(|p| p.timestamp());
    all
}

/// Poll `cond` every millisecond for up to five seconds.
pub async fn eventually(mut cond: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
