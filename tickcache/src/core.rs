use std::sync::Arc;

use tickcache_core::{BackingStore, BucketLayout, TickcacheError};
use tickcache_types::CacheConfig;

use crate::caching::CachingProvider;
use crate::provider::Provider;

/// Both query surfaces wired to one backing store.
pub struct Tickcache {
    store: Arc<dyn BackingStore>,
    cfg: CacheConfig,
    provider: Provider,
    caching: CachingProvider,
}

/// Builder for a [`Tickcache`] with custom configuration.
pub struct TickcacheBuilder {
    store: Option<Arc<dyn BackingStore>>,
    cfg: CacheConfig,
}

impl Default for TickcacheBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TickcacheBuilder {
    /// Create a builder with the default [`CacheConfig`] and no store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: None,
            cfg: CacheConfig::default(),
        }
    }

    /// Set the backing store. A later call replaces an earlier one.
    #[must_use]
    pub fn with_store(mut self, store: Arc<dyn BackingStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, cfg: CacheConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Bars per store bucket.
    ///
    /// Must match the layout the store was written with; bar loads are
    /// aligned to these buckets.
    #[must_use]
    pub const fn points_per_bucket(mut self, n: u32) -> Self {
        self.cfg.points_per_bucket = n;
        self
    }

    /// Time width of a tick bucket in milliseconds.
    #[must_use]
    pub const fn tick_bucket_ms(mut self, ms: i64) -> Self {
        self.cfg.tick_bucket_ms = ms;
        self
    }

    /// Maximum number of points the incremental cache keeps per series.
    ///
    /// Behavior and trade-offs:
    /// - Larger budgets serve more scrolling without refetching at the cost
    ///   of memory.
    /// - Exceeding the budget shrinks the retained window around the most
    ///   recently requested time.
    #[must_use]
    pub const fn cache_point_budget(mut self, n: usize) -> Self {
        self.cfg.cache_point_budget = n;
        self
    }

    /// Divisor applied to the retained half-width on each eviction round.
    #[must_use]
    pub const fn eviction_shrink_factor(mut self, factor: u32) -> Self {
        self.cfg.eviction_shrink_factor = factor;
        self
    }

    /// Default for cancelling pending fetches that do not overlap a new load.
    ///
    /// Useful when a chart jumps far away and in-flight work for the old
    /// range is no longer wanted.
    #[must_use]
    pub const fn preempt_unrelated(mut self, yes: bool) -> Self {
        self.cfg.preempt_unrelated = yes;
        self
    }

    /// Number of store buckets the synchronous provider keeps resident.
    #[must_use]
    pub const fn bucket_capacity(mut self, n: usize) -> Self {
        self.cfg.bucket_capacity = n;
        self
    }

    /// Build the [`Tickcache`].
    ///
    /// # Errors
    /// Returns `InvalidArg` if no store was set via [`TickcacheBuilder::with_store`]
    /// or the configuration fails [`CacheConfig::validate`].
    pub fn build(self) -> Result<Tickcache, TickcacheError> {
        self.cfg.validate()?;
        let Some(store) = self.store else {
            return Err(TickcacheError::InvalidArg(
                "no backing store configured; add one via with_store(...)".to_string(),
            ));
        };
        let layout = BucketLayout::from_config(&self.cfg);
        let provider = Provider::new(Arc::clone(&store), layout, self.cfg.bucket_capacity);
        let caching = CachingProvider::new(Arc::clone(&store), &self.cfg);
        Ok(Tickcache {
            store,
            cfg: self.cfg,
            provider,
            caching,
        })
    }
}

impl Tickcache {
    /// Start building a new `Tickcache`.
    #[must_use]
    pub fn builder() -> TickcacheBuilder {
        TickcacheBuilder::new()
    }

    /// The fully resolving query surface.
    #[must_use]
    pub const fn provider(&self) -> &Provider {
        &self.provider
    }

    /// The incremental query surface.
    #[must_use]
    pub const fn caching(&self) -> &CachingProvider {
        &self.caching
    }

    /// The backing store both surfaces read from.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn BackingStore> {
        &self.store
    }

    /// Effective configuration.
    #[must_use]
    pub const fn config(&self) -> &CacheConfig {
        &self.cfg
    }
}

/// Attribute a store error to the store that produced it.
///
/// Errors that already carry their origin or describe the request rather
/// than the store pass through unchanged.
pub(crate) fn tag_err(store: &str, e: TickcacheError) -> TickcacheError {
    match e {
        e @ (TickcacheError::Store { .. }
        | TickcacheError::NotFound { .. }
        | TickcacheError::Unsupported { .. }
        | TickcacheError::InvalidArg(_)
        | TickcacheError::Incoherent { .. }
        | TickcacheError::Destroyed) => e,
        other => TickcacheError::Store {
            store: store.to_string(),
            msg: other.to_string(),
        },
    }
}
