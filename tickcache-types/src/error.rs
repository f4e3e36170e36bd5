use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the tickcache workspace.
///
/// This wraps capability mismatches, argument validation errors, store-tagged
/// failures, not-found conditions, and paired-series coherence violations.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TickcacheError {
    /// The requested capability is not implemented by the backing store.
    #[error("unsupported capability: {capability}")]
    Unsupported {
        /// A capability string describing what was requested (e.g. "rank").
        capability: String,
    },

    /// Issues with the returned or expected data (unsorted batches, wrong kind, etc.).
    #[error("data issue: {0}")]
    Data(String),

    /// Invalid input argument.
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// The backing store returned an error.
    #[error("{store} failed: {msg}")]
    Store {
        /// Store name that failed.
        store: String,
        /// Human-readable error message.
        msg: String,
    },

    /// A resource could not be found.
    #[error("not found: {what}")]
    NotFound {
        /// Description of the missing resource, e.g. "bounds for EUR/USD".
        what: String,
    },

    /// Paired ask/bid series disagree on length or boundary timestamps.
    #[error("incoherent data: {detail} (ask={ask_len}, bid={bid_len})")]
    Incoherent {
        /// Number of points on the ask side.
        ask_len: usize,
        /// Number of points on the bid side.
        bid_len: usize,
        /// Description of the first mismatch found.
        detail: String,
    },

    /// The provider was destroyed; no further calls are valid.
    #[error("provider destroyed")]
    Destroyed,

    /// Unknown/opaque error.
    #[error("unknown error: {0}")]
    Other(String),
}

impl TickcacheError {
    /// Helper: build an `Unsupported` error for a capability string.
    #[must_use]
    pub fn unsupported(cap: impl Into<String>) -> Self {
        Self::Unsupported {
            capability: cap.into(),
        }
    }

    /// Helper: build a `Store` error with the store name and message.
    pub fn store(store: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Store {
            store: store.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `NotFound` error for a description of the missing resource.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Helper: build an `Incoherent` error.
    pub fn incoherent(ask_len: usize, bid_len: usize, detail: impl Into<String>) -> Self {
        Self::Incoherent {
            ask_len,
            bid_len,
            detail: detail.into(),
        }
    }

    /// Returns true if this error should be surfaced to users as actionable.
    ///
    /// Capability absence and benign not-found conditions are not actionable.
    #[must_use]
    pub const fn is_actionable(&self) -> bool {
        !matches!(self, Self::Unsupported { .. } | Self::NotFound { .. })
    }
}
