use tickcache_core::addressing::period_start;
use tickcache_core::{
    Bar, PartialBar, Period, SeriesKey, Tick, TickcacheError, compose_partial_bar,
};

use super::Provider;

impl Provider {
    /// The bar of `key.period()` containing `time`, as it looked at `time`.
    ///
    /// Closed bars of the next finer period are combined with the ticks of the
    /// finer bar still in progress; tick prices come from `key.side()`.
    /// Returns `None` when nothing traded between the bar start and `time`.
    ///
    /// # Errors
    /// Returns `InvalidArg` for tick series, or the store's error tagged with
    /// its name.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "tickcache::provider::get_synthetic_in_progress_bar",
            skip(self),
            fields(key = %key, time = time),
        )
    )]
    pub async fn get_synthetic_in_progress_bar(
        &self,
        key: &SeriesKey,
        time: i64,
    ) -> Result<Option<PartialBar>, TickcacheError> {
        let period = key.period();
        let Some(finer) = period.finer() else {
            return Err(TickcacheError::InvalidArg(format!(
                "no in-progress bar for tick series {key}"
            )));
        };
        let start = period_start(period, time);

        let (bars, cutoff) = if finer.is_tick() {
            (Vec::new(), start)
        } else {
            let finer_key = key.with_period(finer);
            let cutoff = period_start(finer, time);
            let bars: Vec<Bar> = if cutoff > start {
                self.get_range(&finer_key, start, cutoff - 1)
                    .await?
                    .iter()
                    .filter_map(|p| p.as_bar().cloned())
                    .collect()
            } else {
                Vec::new()
            };
            (bars, cutoff)
        };

        let ticks: Vec<Tick> = self
            .get_range(&key.with_period(Period::Tick), cutoff, time)
            .await?
            .iter()
            .filter_map(|p| p.as_tick().cloned())
            .collect();

        Ok(compose_partial_bar(period, time, &bars, &ticks, key.side()))
    }
}
