//! tickcache-specific data transfer objects and configuration primitives.
#![warn(missing_docs)]

mod config;
mod error;
mod interval;
mod point;
mod series;

pub use config::CacheConfig;
pub use error::TickcacheError;
pub use interval::TimeInterval;
pub use point::{Bar, DataPoint, Tick};
pub use series::{Instrument, Period, SeriesKey, SeriesKind, Side};
