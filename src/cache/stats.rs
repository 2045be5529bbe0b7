//! Cache Statistics Module
//!
//! Tracks lookup outcomes and generational housekeeping.

use serde::Serialize;

// == Cache Stats ==
/// Counters describing how a cache has been used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups that found the key
    pub hits: u64,
    /// Lookups that confirmed the key is absent
    pub misses: u64,
    /// Lookups that ran out of time
    pub timeouts: u64,
    /// Segments evicted by the generational policy
    pub evictions: u64,
    /// Emergency purges performed
    pub purges: u64,
    /// Current number of entries
    pub total_entries: usize,
    /// Current number of live segments
    pub segment_count: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate over every lookup, timeouts included.
    ///
    /// Returns 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses + self.timeouts;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_timeout(&mut self) {
        self.timeouts += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_purge(&mut self) {
        self.purges += 1;
    }
}
