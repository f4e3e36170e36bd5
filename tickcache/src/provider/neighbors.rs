use tickcache_core::{DataPoint, SeriesKey, TickcacheError};

use super::Provider;

impl Provider {
    /// The last point of `key` strictly before `time`.
    ///
    /// Walks buckets backward from the one containing `time`, never past the
    /// earliest time the store knows for the series. Each visited bucket
    /// becomes the eviction anchor as the walk reaches it.
    ///
    /// # Errors
    /// Returns the store's error tagged with its name.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "tickcache::provider::get_previous_point",
            skip(self),
            fields(key = %key, time = time),
        )
    )]
    pub async fn get_previous_point(
        &self,
        key: &SeriesKey,
        time: i64,
    ) -> Result<Option<DataPoint>, TickcacheError> {
        let Some(known) = self.known_span(key).await? else {
            return Ok(None);
        };
        if known.start() >= time {
            return Ok(None);
        }
        let target = (time - 1).min(known.end());
        let kind = key.kind();
        let first = self.layout.bucket_index_for_time(kind, known.start());
        let mut bucket = self.layout.bucket_index_for_time(kind, target);
        while bucket >= first {
            let pts = self.load_bucket(key, bucket).await?;
            let idx = pts.partition_point(|p| p.timestamp() < time);
            if idx > 0 {
                return Ok(pts.get(idx - 1).cloned());
            }
            bucket -= 1;
        }
        Ok(None)
    }

    /// The first point of `key` strictly after `time`.
    ///
    /// Walks buckets forward from the one containing `time`, never past the
    /// latest time the store knows for the series. Each visited bucket
    /// becomes the eviction anchor as the walk reaches it.
    ///
    /// # Errors
    /// Returns the store's error tagged with its name.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "tickcache::provider::get_next_point",
            skip(self),
            fields(key = %key, time = time),
        )
    )]
    pub async fn get_next_point(
        &self,
        key: &SeriesKey,
        time: i64,
    ) -> Result<Option<DataPoint>, TickcacheError> {
        let Some(known) = self.known_span(key).await? else {
            return Ok(None);
        };
        if known.end() <= time {
            return Ok(None);
        }
        let target = (time + 1).max(known.start());
        let kind = key.kind();
        let last = self.layout.bucket_index_for_time(kind, known.end());
        let mut bucket = self.layout.bucket_index_for_time(kind, target);
        while bucket <= last {
            let pts = self.load_bucket(key, bucket).await?;
            let idx = pts.partition_point(|p| p.timestamp() <= time);
            if let Some(p) = pts.get(idx) {
                return Ok(Some(p.clone()));
            }
            bucket += 1;
        }
        Ok(None)
    }
}
