//! Serve a randomly generated Beancount example ledger over HTTP.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod ledger;

pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
