//! Cache Module
//!
//! Provides the in-memory store with per-item expiration and sweep eviction.

mod entry;
mod stats;
mod store;


// Re-export public types
pub use entry::{Expiration, Item};
pub use stats::CacheStats;
pub use store::{Cache, CountMode};

pub(crate) use store::Store;
