use tickcache_core::{
    DataPoint, Instrument, Period, SeriesKey, SeriesKind, Side, TickcacheError, ensure_coherent,
};

use super::Provider;
use crate::core::tag_err;

impl Provider {
    /// Ask and bid series of one instrument over `[from, to]`, checked to line
    /// up point for point.
    ///
    /// # Errors
    /// Returns `Incoherent` when the two sides disagree, `InvalidArg` when
    /// `from > to`, or the store's error tagged with its name.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "tickcache::provider::get_coherent_range",
            skip(self),
            fields(instrument = %instrument, period = %period, from = from, to = to),
        )
    )]
    pub async fn get_coherent_range(
        &self,
        instrument: &Instrument,
        period: Period,
        from: i64,
        to: i64,
    ) -> Result<(Vec<DataPoint>, Vec<DataPoint>), TickcacheError> {
        let ask_key = SeriesKey::new(instrument.clone(), Side::Ask, period);
        let bid_key = SeriesKey::new(instrument.clone(), Side::Bid, period);
        let (ask, bid) = futures::try_join!(
            self.get_range(&ask_key, from, to),
            self.get_range(&bid_key, from, to)
        )?;
        if let Err(e) = ensure_coherent(&ask, &bid) {
            #[cfg(feature = "tracing")]
            tracing::warn!(instrument = %instrument, period = %period, error = %e, "ask/bid series disagree");
            return Err(e);
        }
        Ok((ask, bid))
    }

    /// Number of ticks stored strictly before `time`, answered by the store's
    /// rank index.
    ///
    /// # Errors
    /// Returns `Unsupported` for bar series or when the store has no rank
    /// index, otherwise the store's error tagged with its name.
    pub async fn rank_count_before(
        &self,
        key: &SeriesKey,
        time: i64,
    ) -> Result<u64, TickcacheError> {
        if key.kind() != SeriesKind::Ticks {
            return Err(TickcacheError::unsupported("rank for bar series"));
        }
        let Some(ranked) = self.store.as_ranked_store() else {
            return Err(TickcacheError::unsupported("rank"));
        };
        ranked
            .count_before(key, time)
            .await
            .map_err(|e| tag_err(self.store.name(), e))
    }
}
