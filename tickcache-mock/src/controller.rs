use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, watch};

use tickcache_core::{DataPoint, SeriesKey, TickcacheError, TimeInterval};

use crate::memory::{InternalState, storage_key};

/// Instruction for how `fetch` should behave for a given series.
#[derive(Debug, Clone)]
pub enum FetchBehavior {
    /// Serve stored points (the default).
    Serve,
    /// Fail immediately with the provided error.
    Fail(TickcacheError),
    /// Never complete.
    Hang,
    /// Sleep, then serve stored points.
    Delay(Duration),
}

/// Controller handle used by tests to drive a [`crate::MemoryStore`] from the outside.
pub struct StoreController {
    state: Arc<Mutex<InternalState>>,
    gate: watch::Sender<bool>,
}

impl StoreController {
    pub(crate) const fn new(state: Arc<Mutex<InternalState>>, gate: watch::Sender<bool>) -> Self {
        Self { state, gate }
    }

    /// Store a batch of points for `key`.
    ///
    /// Points must match the series kind. Existing points with equal
    /// timestamps are replaced; the rank index of tick series is updated
    /// once for the whole batch. Returns the number of new timestamps.
    ///
    /// # Errors
    /// Returns `TickcacheError::Data` if a point does not match the series kind.
    pub async fn insert(
        &self,
        key: &SeriesKey,
        points: Vec<DataPoint>,
    ) -> Result<usize, TickcacheError> {
        let mut guard = self.state.lock().await;
        guard.insert(key, points)
    }

    /// Set the fetch behavior for a specific series key.
    pub async fn set_behavior(&self, key: SeriesKey, behavior: FetchBehavior) {
        let mut guard = self.state.lock().await;
        guard.rules.insert(key, behavior);
    }

    /// Block every fetch until [`StoreController::release_fetches`] is called.
    ///
    /// Fetches still show up in the fetch log while held.
    pub fn hold_fetches(&self) {
        self.gate.send_replace(false);
    }

    /// Let held and future fetches proceed.
    pub fn release_fetches(&self) {
        self.gate.send_replace(true);
    }

    /// Copy of every `(key, interval)` fetch request seen so far.
    pub async fn fetch_log(&self) -> Vec<(SeriesKey, TimeInterval)> {
        let guard = self.state.lock().await;
        guard.fetch_log.clone()
    }

    /// Number of fetch requests seen so far.
    pub async fn fetch_count(&self) -> usize {
        let guard = self.state.lock().await;
        guard.fetch_log.len()
    }

    /// Wait until at least `n` fetch requests have been logged.
    pub async fn wait_for_fetches(&self, n: usize) {
        while self.fetch_count().await < n {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    /// Store `point` and push it to every live session of its series.
    ///
    /// Returns the number of sessions that accepted the point.
    ///
    /// # Errors
    /// Returns `TickcacheError::Data` if the point does not match the series kind.
    pub async fn push_live(&self, key: &SeriesKey, point: DataPoint) -> Result<usize, TickcacheError> {
        // Clone senders so no lock is held across the sends.
        let senders = {
            let mut guard = self.state.lock().await;
            guard.insert(key, vec![point.clone()])?;
            guard.live.get(&storage_key(key)).cloned().unwrap_or_default()
        };
        let mut delivered = 0;
        for tx in senders {
            if tx.send(point.clone()).await.is_ok() {
                delivered += 1;
            }
        }
        Ok(delivered)
    }

    /// End every live session of `key`, as if the feed had closed.
    pub async fn end_live(&self, key: &SeriesKey) {
        let mut guard = self.state.lock().await;
        guard.live.remove(&storage_key(key));
    }

    /// Clear all configured behaviors and the fetch log.
    pub async fn clear_all_behaviors(&self) {
        let mut guard = self.state.lock().await;
        guard.rules.clear();
        guard.fetch_log.clear();
    }
}
