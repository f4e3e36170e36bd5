//! Time-series utilities shared by the store, the providers and tests.
//!
//! Modules include:
//! - `merge`: merge and deduplicate point batches, clip them to an interval
//! - `compose`: aggregate finer bars and ticks into a coarser (possibly in-progress) bar
//! - `coherence`: cross-check paired ask/bid series
/// Ask/bid coherence checks.
pub mod coherence;
/// Bar composition from finer bars and ticks.
pub mod compose;
/// Merge utilities for joining point batches.
pub mod merge;
