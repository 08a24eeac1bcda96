//! In-memory memoization of the generated ledger.
//!
//! The cache holds a single document keyed by the [`LedgerSettings`] it was
//! generated from. It is primed at startup, served on every request, and
//! emptied on demand so the next read regenerates.
//!
//! [`LedgerSettings`]: crate::domain::settings::LedgerSettings

mod document;
pub(crate) mod lock;

pub use document::{
    CACHE_CLEAR_METRIC, CACHE_HIT_METRIC, CACHE_MISS_METRIC, DocumentCache, GENERATE_MS_METRIC,
};
