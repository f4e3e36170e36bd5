//! tickcache-mock
//!
//! A deterministic in-memory backing store for tests and examples.
//!
//! [`MemoryStore`] keeps every series in buckets laid out exactly like a real
//! bucketed store, maintains the tick rank index on each batched insert and
//! serves a manually driven live feed. The paired [`StoreController`] scripts
//! per-series behaviors (fail, hang, delay), gates fetches so tests can
//! observe in-flight work, and exposes the fetch log.

mod controller;
/// Seeded random-walk tick and bar generators.
pub mod fixtures;
mod memory;

pub use controller::{FetchBehavior, StoreController};
pub use memory::MemoryStore;
