use std::sync::Arc;

use tickcache::{BucketLayout, CacheConfig, ChannelConsumer, Period, SeriesKey, Side, Tickcache};
use tickcache_mock::MemoryStore;
use tickcache_mock::fixtures::{populate, random_walk_ticks};
use tracing_subscriber::fmt::format::FmtSpan;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Suggested: RUST_LOG=debug (build with --features tracing for cache events)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .with_span_events(FmtSpan::CLOSE)
        .try_init();

    // 1. An in-memory store holding an hour of ticks plus 1m and 5m bars.
    let cfg = CacheConfig::default();
    let (store, ctl) = MemoryStore::new_with_controller("memory", BucketLayout::from_config(&cfg));
    let key = SeriesKey::parse("EUR/USD", Side::Bid, Period::OneMinute)?;
    let ticks = random_walk_ticks(1, 0, 20_000, 360);
    populate(&ctl, key.instrument(), &ticks, &[Period::OneMinute, Period::FiveMinutes]).await?;

    let cache = Tickcache::builder()
        .with_store(store)
        .config(cfg)
        .cache_point_budget(5_000)
        .build()?;

    // 2. First load goes to the store in the background.
    let (consumer, mut rx) = ChannelConsumer::new();
    let consumer = Arc::new(consumer);
    cache.caching().load_default(&key, 0, 30 * 60_000, consumer.clone());
    let first = rx.recv().await.ok_or("no delivery")?;
    println!(
        "fetched {} bars covering {} (store calls: {})",
        first.points.len(),
        first.covers,
        ctl.fetch_count().await
    );

    // 3. A narrower load is answered from the cache before `load` returns.
    cache.caching().load_default(&key, 10 * 60_000, 20 * 60_000, consumer);
    let cached = rx.try_recv()?;
    println!(
        "cached {} bars covering {} (store calls: {})",
        cached.points.len(),
        cached.covers,
        ctl.fetch_count().await
    );

    // 4. The resolving provider composes the bar still in progress.
    let five = key.with_period(Period::FiveMinutes);
    let now = ticks.last().map_or(0, |t| t.timestamp);
    if let Some(partial) = cache.provider().get_synthetic_in_progress_bar(&five, now).await? {
        println!("in-progress 5m bar over {}: {:?}", partial.covers, partial.bar);
    }

    println!("cached ranges: {:?}", cache.caching().cached_ranges(&key));
    Ok(())
}
