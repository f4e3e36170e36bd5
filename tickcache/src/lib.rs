//! tickcache retrieves tick and bar series from a bucketed backing store and
//! keeps a bounded, coherent in-memory cache of them.
//!
//! Overview
//! - [`Provider`] answers each call with fully resolved data. It keeps a small
//!   bounded cache of whole store buckets around the most recent requests.
//! - [`CachingProvider`] answers `load` requests incrementally: whatever is
//!   cached is delivered right away, missing sub-ranges are fetched in the
//!   background without duplicating in-flight or cached work, and results
//!   are merged into a per-series cache bounded by a point budget.
//! - Both are wired to one [`tickcache_core::BackingStore`] by [`Tickcache`].
//!
//! Key behaviors and trade-offs
//! - Deliveries may be partial and may repeat points already delivered;
//!   consumers must be idempotent.
//! - Eviction keeps a window around the most recently requested time; a
//!   cache whose anchor falls outside the cached points is cleared and
//!   refilled on demand.
//! - Fetch failures are not retried automatically. The next `load` that
//!   touches the range dispatches a new fetch.
//! - Bar loads are widened to store bucket boundaries, tick loads are not.
//!
//! Examples
//! ```rust,ignore
//! use std::sync::Arc;
//! use tickcache::{ChannelConsumer, Tickcache};
//! use tickcache_core::{Period, SeriesKey, Side};
//!
//! let cache = Tickcache::builder()
//!     .with_store(store)
//!     .cache_point_budget(50_000)
//!     .build()?;
//!
//! let key = SeriesKey::parse("EUR/USD", Side::Bid, Period::OneMinute)?;
//! let (consumer, mut rx) = ChannelConsumer::new();
//! cache.caching().load_default(&key, from, to, Arc::new(consumer));
//! while let Some(delivery) = rx.recv().await {
//!     // draw delivery.points
//! }
//!
//! let last = cache.provider().get_previous_point(&key, now).await?;
//! ```
//!
//! See `tickcache/examples/` for a runnable demonstration.
#![warn(missing_docs)]

pub mod caching;
pub mod consumer;
pub(crate) mod core;
pub mod provider;

pub use caching::CachingProvider;
pub use consumer::{ChannelConsumer, Consumer, Delivery, FnConsumer};
pub use crate::core::{Tickcache, TickcacheBuilder};
pub use provider::Provider;

// Re-export core types for convenience
pub use tickcache_core::{
    BackingStore, Bar, BucketLayout, CacheConfig, DataPoint, FeedHandle, Instrument, IntervalSet,
    LiveFeed, PartialBar, Period, RankedStore, SeriesKey, SeriesKind, Side, Tick, TickcacheError,
    TimeInterval,
};
