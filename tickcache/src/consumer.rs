//! Delivery targets for [`crate::CachingProvider::load`].

use tokio::sync::mpsc;

use tickcache_core::{DataPoint, SeriesKey, TimeInterval};

/// One batch of points handed to a consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    /// Series the points belong to.
    pub key: SeriesKey,
    /// Points sorted by timestamp, all inside `covers`.
    pub points: Vec<DataPoint>,
    /// Time range this batch is complete for.
    pub covers: TimeInterval,
}

/// Receiver of (possibly partial, possibly repeated) deliveries.
///
/// Called from the thread that issued `load` for cached data and from
/// background fetch tasks otherwise; implementations must not block. Cached
/// data is delivered with the series lock held, so a consumer must not call
/// back into the provider that is delivering to it.
pub trait Consumer: Send + Sync {
    /// Handle one delivery.
    fn on_delivery(&self, delivery: &Delivery);
}

/// Consumer forwarding every delivery into an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelConsumer {
    tx: mpsc::UnboundedSender<Delivery>,
}

impl ChannelConsumer {
    /// Create a consumer and the receiving end of its channel.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Delivery>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Consumer for ChannelConsumer {
    fn on_delivery(&self, delivery: &Delivery) {
        // receiver gone: nobody is listening anymore
        let _ = self.tx.send(delivery.clone());
    }
}

/// Consumer backed by a closure.
pub struct FnConsumer<F>(F);

impl<F> FnConsumer<F>
where
    F: Fn(&Delivery) + Send + Sync,
{
    /// Wrap a closure.
    pub const fn new(f: F) -> Self {
        Self(f)
    }
}

impl<F> Consumer for FnConsumer<F>
where
    F: Fn(&Delivery) + Send + Sync,
{
    fn on_delivery(&self, delivery: &Delivery) {
        (self.0)(delivery);
    }
}
