//! Memcache - A lightweight in-process expiring cache
//!
//! Provides a concurrent key-value store where every item carries an expiration
//! deadline, with lazy expiry on read and a periodic background sweep.

pub mod cache;
pub mod config;
pub mod error;
mod tasks;

pub use cache::{Cache, CacheStats, CountMode, Expiration, Item};
pub use config::Config;
pub use error::{CacheError, Result};
