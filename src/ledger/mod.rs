//! Ledger document synthesis.
//!
//! The generator only depends on [`LedgerWriter`]; [`ExampleLedgerWriter`] is
//! the implementation wired into the server.

mod example;
mod format;

pub use example::ExampleLedgerWriter;

use thiserror::Error;
use time::Date;

use crate::application::random::{RandomRange, RangeError};

#[derive(Debug, Error)]
pub enum WriterError {
    #[error("invalid ledger period: {reason}")]
    InvalidPeriod { reason: String },
    #[error("failed to draw random value: {0}")]
    Rng(#[from] RangeError),
    #[error("invalid calendar date: {0}")]
    Date(#[from] time::error::ComponentRange),
    #[error("ledger writer failed: {0}")]
    Other(String),
}

impl WriterError {
    pub fn invalid_period(reason: impl Into<String>) -> Self {
        Self::InvalidPeriod {
            reason: reason.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }
}

/// Produces the text of a ledger for a resolved set of dates.
///
/// Implementations draw any randomness they need from `rng` so a seeded
/// generation stays reproducible.
pub trait LedgerWriter: Send + Sync {
    fn write(
        &self,
        birth: Date,
        start: Date,
        end: Date,
        reformat: bool,
        rng: &RandomRange,
    ) -> Result<String, WriterError>;
}
