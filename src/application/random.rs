//! Shared pseudo-random state used by ledger generation.

use std::sync::Mutex;

use rand::{Rng, SeedableRng, rngs::StdRng};
use thiserror::Error;

use crate::cache::lock::mutex_lock;

const SOURCE: &str = "application::random";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("invalid range: low {low} must be below high {high}")]
    InvalidRange { low: i64, high: i64 },
}

/// Integer sampler over one shared pseudo-random stream.
///
/// Supplying a seed reseeds the stream right before the draw, so repeated
/// calls with the same seed return the same value. Without a seed the draw
/// continues from wherever the stream currently is.
pub struct RandomRange {
    state: Mutex<StdRng>,
}

impl RandomRange {
    /// Start from operating-system entropy.
    pub fn from_entropy() -> Self {
        Self {
            state: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Start from a fixed seed.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            state: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Draw an integer uniformly from `[low, high)`.
    pub fn sample(&self, low: i64, high: i64, seed: Option<u64>) -> Result<i64, RangeError> {
        if low >= high {
            return Err(RangeError::InvalidRange { low, high });
        }

        let mut rng = mutex_lock(&self.state, SOURCE, "sample");
        if let Some(seed) = seed {
            *rng = StdRng::seed_from_u64(seed);
        }
        Ok(rng.gen_range(low..high))
    }
}

impl Default for RandomRange {
    fn default() -> Self {
        Self::from_entropy()
    }
}
