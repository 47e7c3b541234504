//! Background Tasks Module
//!
//! Contains background tasks that run periodically for the lifetime of a cache.
//!
//! # Tasks
//! - Expiration sweeper: removes expired items at the configured interval

mod sweeper;

pub(crate) use sweeper::Sweeper;
