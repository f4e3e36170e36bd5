use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use tokio::sync::watch;

use tickcache_core::TimeInterval;

use crate::consumer::Consumer;

const RUNNING: u8 = 0;
const CANCELLED: u8 = 1;
const DELIVERING: u8 = 2;
const DONE: u8 = 3;

/// Lifecycle of one fetch task: `Running -> Cancelled` or
/// `Running -> Delivering -> Done`.
#[derive(Debug, Clone)]
pub(crate) struct FetchState(Arc<AtomicU8>);

impl FetchState {
    pub(crate) fn new() -> Self {
        Self(Arc::new(AtomicU8::new(RUNNING)))
    }

    /// Request cancellation. `false` once the task has started delivering.
    pub(crate) fn try_cancel(&self) -> bool {
        match self
            .0
            .compare_exchange(RUNNING, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => true,
            Err(current) => current != DELIVERING,
        }
    }

    /// Last cancellation check point of the task.
    pub(crate) fn begin_delivery(&self) -> bool {
        self.0
            .compare_exchange(RUNNING, DELIVERING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn finish(&self) {
        self.0.store(DONE, Ordering::Release);
    }

    #[cfg(test)]
    pub(crate) fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire) == CANCELLED
    }

    pub(crate) fn same(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// A consumer waiting on a fetch, with the range it asked for.
#[derive(Clone)]
pub(crate) struct Subscriber {
    pub(crate) consumer: Arc<dyn Consumer>,
    pub(crate) interval: TimeInterval,
    pub(crate) persist: bool,
}

/// One outstanding background fetch of a series.
pub(crate) struct PendingFetch {
    pub(crate) id: u64,
    pub(crate) interval: TimeInterval,
    /// Midpoint of the load that dispatched this fetch.
    pub(crate) anchor: i64,
    pub(crate) state: FetchState,
    pub(crate) cancel: watch::Sender<bool>,
    pub(crate) subscribers: Vec<Subscriber>,
}

impl PendingFetch {
    pub(crate) fn new(
        id: u64,
        interval: TimeInterval,
        anchor: i64,
        first: Subscriber,
    ) -> (Self, watch::Receiver<bool>) {
        let (cancel, cancel_rx) = watch::channel(false);
        let me = Self {
            id,
            interval,
            anchor,
            state: FetchState::new(),
            cancel,
            subscribers: vec![first],
        };
        (me, cancel_rx)
    }

    /// Cancel the task and interrupt its store call.
    pub(crate) fn cancel(&self) -> bool {
        let ok = self.state.try_cancel();
        if ok {
            self.cancel.send_replace(true);
        }
        ok
    }
}
