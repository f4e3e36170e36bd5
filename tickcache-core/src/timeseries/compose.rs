use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::addressing::period_start;
use crate::{Bar, Period, Side, Tick, TimeInterval};

/// A bar of some period as it looked at a given instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialBar {
    /// Aggregated values; `timestamp` is the start of the bar's period.
    pub bar: Bar,
    /// Time span the aggregate accounts for: period start up to the query instant.
    pub covers: TimeInterval,
}

struct Agg {
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    volume: Decimal,
}

impl Agg {
    const fn first(open: Decimal, high: Decimal, low: Decimal, close: Decimal, vol: Decimal) -> Self {
        Self {
            open,
            high,
            low,
            close,
            volume: vol,
        }
    }

    fn push(&mut self, high: Decimal, low: Decimal, close: Decimal, vol: Decimal) {
        self.high = self.high.max(high);
        self.low = self.low.min(low);
        self.close = close;
        self.volume += vol;
    }
}

/// Aggregate finer bars followed by ticks into a single bar stamped `timestamp`.
///
/// Inputs must be sorted by time and every bar must precede every tick. Tick
/// prices and volumes are read from `side`. Returns `None` when both inputs
/// are empty.
#[must_use]
pub fn compose_bar(timestamp: i64, bars: &[Bar], ticks: &[Tick], side: Side) -> Option<Bar> {
    let mut agg: Option<Agg> = None;
    for b in bars {
        match agg.as_mut() {
            None => agg = Some(Agg::first(b.open, b.high, b.low, b.close, b.volume)),
            Some(a) => a.push(b.high, b.low, b.close, b.volume),
        }
    }
    for t in ticks {
        let (px, vol) = (t.price(side), t.volume(side));
        match agg.as_mut() {
            None => agg = Some(Agg::first(px, px, px, px, vol)),
            Some(a) => a.push(px, px, px, vol),
        }
    }
    agg.map(|a| Bar {
        timestamp,
        open: a.open,
        high: a.high,
        low: a.low,
        close: a.close,
        volume: a.volume,
    })
}

/// Reconstruct the bar of `period` containing `time` as it looked at `time`.
///
/// Finer bars that closed before the finer bar containing `time` are used as
/// is; the in-progress remainder comes from ticks up to and including `time`.
/// Inputs may extend beyond the bar and are filtered here; both must be
/// sorted by time. Returns `None` for `Period::Tick` or when nothing traded
/// in the window.
#[must_use]
pub fn compose_partial_bar(
    period: Period,
    time: i64,
    finer_bars: &[Bar],
    ticks: &[Tick],
    side: Side,
) -> Option<PartialBar> {
    let finer = period.finer()?;
    let start = period_start(period, time);
    // ticks take over where closed finer bars end
    let cutoff = if finer.is_tick() {
        start
    } else {
        period_start(finer, time)
    };

    let bars_lo = finer_bars.partition_point(|b| b.timestamp < start);
    let bars_hi = finer_bars.partition_point(|b| b.timestamp < cutoff);
    let ticks_lo = ticks.partition_point(|t| t.timestamp < cutoff);
    let ticks_hi = ticks.partition_point(|t| t.timestamp <= time);

    let bars = finer_bars.get(bars_lo..bars_hi.max(bars_lo)).unwrap_or(&[]);
    let ticks = ticks.get(ticks_lo..ticks_hi.max(ticks_lo)).unwrap_or(&[]);
    let bar = compose_bar(start, bars, ticks, side)?;
    Some(PartialBar {
        bar,
        covers: TimeInterval::new(start, time),
    })
}
