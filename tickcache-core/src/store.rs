use async_trait::async_trait;

use crate::{DataPoint, SeriesKey, TickcacheError, TimeInterval};

/// Optional capability: count stored ticks preceding a time without scanning.
#[async_trait]
pub trait RankedStore: Send + Sync {
    /// Number of ticks of `key` stored strictly before `time`.
    async fn count_before(&self, key: &SeriesKey, time: i64) -> Result<u64, TickcacheError>;
}

/// Optional capability: push newly produced points as they occur.
#[async_trait]
pub trait LiveFeed: Send + Sync {
    /// Start a live session for one series.
    ///
    /// Points arrive on the receiver in production order. Dropping or
    /// stopping the handle ends the session.
    async fn subscribe(
        &self,
        key: &SeriesKey,
    ) -> Result<
        (
            crate::stream::FeedHandle,
            tokio::sync::mpsc::Receiver<DataPoint>,
        ),
        TickcacheError,
    >;
}

/// Bucketed storage answering range queries per series.
///
/// Implementations must return every stored point of `key` inside the
/// requested interval, sorted by timestamp. Capabilities beyond plain range
/// reads are advertised through the `as_*` accessors.
#[async_trait]
pub trait BackingStore: Send + Sync {
    /// A stable identifier used to tag errors (e.g. "memory", "sqlite").
    fn name(&self) -> &'static str;

    /// Fetch all points of `key` within `interval` (both ends inclusive).
    async fn fetch(
        &self,
        key: &SeriesKey,
        interval: TimeInterval,
    ) -> Result<Vec<DataPoint>, TickcacheError>;

    /// Timestamp of the earliest point stored for `key`, if any.
    async fn earliest_known_time(&self, key: &SeriesKey) -> Result<Option<i64>, TickcacheError>;

    /// Timestamp of the latest point stored for `key`, if any.
    async fn latest_known_time(&self, key: &SeriesKey) -> Result<Option<i64>, TickcacheError>;

    /// Advertise the rank index capability when supported.
    fn as_ranked_store(&self) -> Option<&dyn RankedStore> {
        None
    }

    /// Advertise the live feed capability when supported.
    fn as_live_feed(&self) -> Option<&dyn LiveFeed> {
        None
    }
}
