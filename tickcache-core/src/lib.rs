//! tickcache-core
//!
//! Core contracts, data structures, and utilities shared across the tickcache ecosystem.
//!
//! - `types`: series keys, data points, intervals, configuration and errors.
//! - `interval_set`: mergeable set of closed integer intervals.
//! - `addressing`: bucket layout of the backing store and the tick rank index.
//! - `store`: the `BackingStore` trait and its optional capabilities.
//! - `timeseries`: helpers to merge, compose and cross-check point series.
//!
//! Async runtime (Tokio)
//! ---------------------
//! Live feeds are exposed as `(stream::FeedHandle, tokio::sync::mpsc::Receiver<DataPoint>)`
//! and `FeedHandle` wraps a `tokio::task::JoinHandle<()>` with a
//! `tokio::sync::oneshot::Sender<()>` for cooperative shutdown, so code that
//! follows live feeds must run under a Tokio 1.x runtime.
#![warn(missing_docs)]

/// Bucket layout and rank index of the backing store.
pub mod addressing;
/// Mergeable set of closed integer intervals.
pub mod interval_set;
/// Backing store contract and capability traits.
pub mod store;
/// Live feed handle and drop-time helpers.
pub mod stream;
/// Time-series utilities for merging, composing and coherence checks.
pub mod timeseries;
pub mod types;

pub use addressing::{BucketLayout, RankEntry, RankIndex};
pub use interval_set::IntervalSet;
pub use store::{BackingStore, LiveFeed, RankedStore};
pub use stream::FeedHandle;
pub use timeseries::coherence::ensure_coherent;
pub use timeseries::compose::{PartialBar, compose_bar, compose_partial_bar};
pub use timeseries::merge::{clip_points, merge_points, sort_dedup};
pub use types::*;
