//! Cache Statistics Module
//!
//! Tracks cache read outcomes and sweep evictions.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Stats Counters ==
/// Lock-free counters updated from both shared and exclusive critical sections.
#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    expired: AtomicU64,
    evictions: AtomicU64,
}

impl StatsCounters {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_expired(&self) {
        self.expired.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_evictions(&self, count: usize) {
        self.evictions.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Takes a point-in-time copy of the counters.
    pub(crate) fn snapshot(&self, total_entries: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expired: self.expired.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            total_entries,
        }
    }
}

// == Cache Stats ==
/// Snapshot of cache performance metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of successful reads
    pub hits: u64,
    /// Number of reads for absent keys
    pub misses: u64,
    /// Number of reads that found an expired item
    pub expired: u64,
    /// Number of items removed by sweep passes
    pub evictions: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses + expired), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses + self.expired;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
