//! Series identity: instrument, side, period.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::TickcacheError;

/// Normalized instrument symbol (e.g. `EUR/USD`).
///
/// Cheap to clone; the symbol is stored behind an `Arc<str>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Instrument(Arc<str>);

impl Instrument {
    /// Create an instrument from a symbol, trimming whitespace and upper-casing it.
    ///
    /// # Errors
    /// Returns `InvalidArg` if the symbol is empty after trimming.
    pub fn new(symbol: &str) -> Result<Self, TickcacheError> {
        let s = symbol.trim();
        if s.is_empty() {
            return Err(TickcacheError::InvalidArg(
                "instrument symbol must not be empty".into(),
            ));
        }
        Ok(Self(Arc::from(s.to_ascii_uppercase())))
    }

    /// The normalized symbol.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Quote side of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    /// Offer side.
    Ask,
    /// Bid side.
    Bid,
}

impl Side {
    /// The other side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Ask => Self::Bid,
            Self::Bid => Self::Ask,
        }
    }
}

/// Series period: raw ticks or one of the fixed bar lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Period {
    /// Raw ticks, no aggregation.
    Tick,
    /// 1 second bars.
    OneSecond,
    /// 1 minute bars.
    OneMinute,
    /// 5 minute bars.
    FiveMinutes,
    /// 10 minute bars.
    TenMinutes,
    /// 15 minute bars.
    FifteenMinutes,
    /// 30 minute bars.
    ThirtyMinutes,
    /// 1 hour bars.
    OneHour,
    /// 4 hour bars.
    FourHours,
    /// 1 day bars.
    OneDay,
}

impl Period {
    /// All bar periods, finest first.
    pub const BARS: &'static [Self] = &[
        Self::OneSecond,
        Self::OneMinute,
        Self::FiveMinutes,
        Self::TenMinutes,
        Self::FifteenMinutes,
        Self::ThirtyMinutes,
        Self::OneHour,
        Self::FourHours,
        Self::OneDay,
    ];

    /// Bar length in milliseconds, `None` for ticks.
    #[must_use]
    pub const fn millis(self) -> Option<i64> {
        const SEC: i64 = 1_000;
        const MIN: i64 = 60 * SEC;
        const HOUR: i64 = 60 * MIN;
        match self {
            Self::Tick => None,
            Self::OneSecond => Some(SEC),
            Self::OneMinute => Some(MIN),
            Self::FiveMinutes => Some(5 * MIN),
            Self::TenMinutes => Some(10 * MIN),
            Self::FifteenMinutes => Some(15 * MIN),
            Self::ThirtyMinutes => Some(30 * MIN),
            Self::OneHour => Some(HOUR),
            Self::FourHours => Some(4 * HOUR),
            Self::OneDay => Some(24 * HOUR),
        }
    }

    /// True for [`Period::Tick`].
    #[must_use]
    pub const fn is_tick(self) -> bool {
        matches!(self, Self::Tick)
    }

    /// The next finer period used to compose an in-progress bar.
    ///
    /// `OneSecond` composes from ticks; `Tick` has no finer period.
    #[must_use]
    pub const fn finer(self) -> Option<Self> {
        match self {
            Self::Tick => None,
            Self::OneSecond => Some(Self::Tick),
            Self::OneMinute => Some(Self::OneSecond),
            Self::FiveMinutes | Self::TenMinutes | Self::FifteenMinutes | Self::ThirtyMinutes => {
                Some(Self::OneMinute)
            }
            Self::OneHour => Some(Self::ThirtyMinutes),
            Self::FourHours => Some(Self::OneHour),
            Self::OneDay => Some(Self::FourHours),
        }
    }

    /// Storage kind for this period.
    #[must_use]
    pub const fn kind(self) -> SeriesKind {
        match self {
            Self::Tick => SeriesKind::Ticks,
            other => SeriesKind::Bars(other),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Tick => "tick",
            Self::OneSecond => "1s",
            Self::OneMinute => "1m",
            Self::FiveMinutes => "5m",
            Self::TenMinutes => "10m",
            Self::FifteenMinutes => "15m",
            Self::ThirtyMinutes => "30m",
            Self::OneHour => "1h",
            Self::FourHours => "4h",
            Self::OneDay => "1d",
        };
        f.write_str(s)
    }
}

/// Storage kind of a series, used by bucket addressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeriesKind {
    /// Tick series, bucketed by fixed time width.
    Ticks,
    /// Bar series of the given (non-tick) period, bucketed by row count.
    Bars(Period),
}

/// Identity of one logical time series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeriesKey {
    instrument: Instrument,
    side: Side,
    period: Period,
}

impl SeriesKey {
    /// Build a key.
    #[must_use]
    pub const fn new(instrument: Instrument, side: Side, period: Period) -> Self {
        Self {
            instrument,
            side,
            period,
        }
    }

    /// Convenience: build a key from a symbol string.
    ///
    /// # Errors
    /// Returns `InvalidArg` if the symbol is empty.
    pub fn parse(symbol: &str, side: Side, period: Period) -> Result<Self, TickcacheError> {
        Ok(Self::new(Instrument::new(symbol)?, side, period))
    }

    /// Instrument of this series.
    #[must_use]
    pub const fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    /// Side of this series.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Period of this series.
    #[must_use]
    pub const fn period(&self) -> Period {
        self.period
    }

    /// Storage kind of this series.
    #[must_use]
    pub const fn kind(&self) -> SeriesKind {
        self.period.kind()
    }

    /// Same instrument and side with another period.
    #[must_use]
    pub fn with_period(&self, period: Period) -> Self {
        Self::new(self.instrument.clone(), self.side, period)
    }

    /// Same instrument and period on the other side.
    #[must_use]
    pub fn with_side(&self, side: Side) -> Self {
        Self::new(self.instrument.clone(), side, self.period)
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = match self.side {
            Side::Ask => "ask",
            Side::Bid => "bid",
        };
        write!(f, "{}/{}/{}", self.instrument, side, self.period)
    }
}
