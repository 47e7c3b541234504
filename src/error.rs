//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache operations.
///
/// The lookup variants carry the key that was requested.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// `delete` targeted a key absent from the map
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// `get` targeted a key absent from the map
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// `get` targeted a key whose lifetime has passed
    #[error("Item lifetime has expired: {0}")]
    Expired(String),

    /// The background sweeper thread panicked before it could be joined
    #[error("Sweeper thread panicked")]
    SweeperPanicked,
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;
