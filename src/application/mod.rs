//! Application services: randomness, ledger generation, and error mapping.

pub mod error;
pub mod generator;
pub mod random;
