//! Data points carried by a series.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::Side;

/// A single quote tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tick {
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Best ask price.
    pub ask: Decimal,
    /// Best bid price.
    pub bid: Decimal,
    /// Volume available at the ask.
    pub ask_volume: Decimal,
    /// Volume available at the bid.
    pub bid_volume: Decimal,
}

impl Tick {
    /// Price on the given side.
    #[must_use]
    pub const fn price(&self, side: Side) -> Decimal {
        match side {
            Side::Ask => self.ask,
            Side::Bid => self.bid,
        }
    }

    /// Volume on the given side.
    #[must_use]
    pub const fn volume(&self, side: Side) -> Decimal {
        match side {
            Side::Ask => self.ask_volume,
            Side::Bid => self.bid_volume,
        }
    }
}

/// An OHLCV bar covering `[timestamp, timestamp + period)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bar {
    /// Bar open time, milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Open price.
    pub open: Decimal,
    /// Highest price.
    pub high: Decimal,
    /// Lowest price.
    pub low: Decimal,
    /// Close price.
    pub close: Decimal,
    /// Traded volume.
    pub volume: Decimal,
}

/// A point of a tick or bar series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataPoint {
    /// Tick payload.
    Tick(Tick),
    /// Bar payload.
    Bar(Bar),
}

impl DataPoint {
    /// Ordering/merge key of the point.
    #[must_use]
    pub const fn timestamp(&self) -> i64 {
        match self {
            Self::Tick(t) => t.timestamp,
            Self::Bar(b) => b.timestamp,
        }
    }

    /// Timestamp as a UTC datetime, if representable.
    #[must_use]
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp())
    }

    /// Borrow the tick payload, if this is a tick.
    #[must_use]
    pub const fn as_tick(&self) -> Option<&Tick> {
        match self {
            Self::Tick(t) => Some(t),
            Self::Bar(_) => None,
        }
    }

    /// Borrow the bar payload, if this is a bar.
    #[must_use]
    pub const fn as_bar(&self) -> Option<&Bar> {
        match self {
            Self::Bar(b) => Some(b),
            Self::Tick(_) => None,
        }
    }
}

impl From<Tick> for DataPoint {
    fn from(t: Tick) -> Self {
        Self::Tick(t)
    }
}

impl From<Bar> for DataPoint {
    fn from(b: Bar) -> Self {
        Self::Bar(b)
    }
}
