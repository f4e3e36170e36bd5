use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

use tickcache_core::addressing::period_start;
use tickcache_core::{
    Bar, DataPoint, Instrument, Period, SeriesKey, Side, Tick, TickcacheError, compose_bar,
};

use crate::StoreController;

/// Seeded random-walk tick series.
///
/// Starts at `start` with an ask of 1.10000 and a two pip spread; each next
/// tick is 1..=`max_step_ms` later and moves the mid by -3..=3 pips. The same
/// seed always yields the same series.
#[must_use]
pub fn random_walk_ticks(seed: u64, start: i64, count: usize, max_step_ms: i64) -> Vec<Tick> {
    let mut rng = StdRng::seed_from_u64(seed);
    let pip = Decimal::new(1, 5);
    let spread = pip * Decimal::from(2);
    let mut ask = Decimal::new(110_000, 5);
    let mut ts = start;
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(Tick {
            timestamp: ts,
            ask,
            bid: ask - spread,
            ask_volume: Decimal::from(rng.random_range(1..=10_i64)),
            bid_volume: Decimal::from(rng.random_range(1..=10_i64)),
        });
        ts += rng.random_range(1..=max_step_ms.max(1));
        ask += pip * Decimal::from(rng.random_range(-3..=3_i64));
    }
    out
}

/// Aggregate sorted ticks into bars of `period`, reading prices from `side`.
///
/// Periods without trades produce no bar.
#[must_use]
pub fn bars_from_ticks(ticks: &[Tick], period: Period, side: Side) -> Vec<Bar> {
    ticks
        .chunk_by(|a, b| period_start(period, a.timestamp) == period_start(period, b.timestamp))
        .filter_map(|chunk| {
            let ts = period_start(period, chunk.first()?.timestamp);
            compose_bar(ts, &[], chunk, side)
        })
        .collect()
}

/// Wrap ticks as data points.
#[must_use]
pub fn tick_points(ticks: &[Tick]) -> Vec<DataPoint> {
    ticks.iter().cloned().map(DataPoint::Tick).collect()
}

/// Wrap bars as data points.
#[must_use]
pub fn bar_points(bars: &[Bar]) -> Vec<DataPoint> {
    bars.iter().cloned().map(DataPoint::Bar).collect()
}

/// Store `ticks` for `instrument` plus, for both sides, bars of every
/// period in `periods` aggregated from those ticks.
///
/// # Errors
/// Propagates insert failures; `Period::Tick` in `periods` is skipped.
pub async fn populate(
    controller: &StoreController,
    instrument: &Instrument,
    ticks: &[Tick],
    periods: &[Period],
) -> Result<(), TickcacheError> {
    let tick_key = SeriesKey::new(instrument.clone(), Side::Ask, Period::Tick);
    controller.insert(&tick_key, tick_points(ticks)).await?;
    for &period in periods.iter().filter(|p| !p.is_tick()) {
        for side in [Side::Ask, Side::Bid] {
            let key = SeriesKey::new(instrument.clone(), side, period);
            let bars = bars_from_ticks(ticks, period, side);
            controller.insert(&key, bar_points(&bars)).await?;
        }
    }
    Ok(())
}
