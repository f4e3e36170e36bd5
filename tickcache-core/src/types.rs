//! Re-export of foundational types from `tickcache-types`.
// Consolidated re-exports so downstream crates can depend on `tickcache-core` only

pub use tickcache_types::{
    Bar, CacheConfig, DataPoint, Instrument, Period, SeriesKey, SeriesKind, Side, Tick,
    TickcacheError, TimeInterval,
};

pub use rust_decimal::Decimal;
