//! Generational Cache Module
//!
//! Age-ordered key-value store made of fixed-size segments held in a ring
//! buffer. Entries are never removed one by one: once the total entry limit
//! is reached the oldest whole segment is detached and handed to a
//! [`SegmentDisposer`]. Lookups walk segments newest to oldest and give up
//! when their time budget is spent.
//!
//! The cache is single-writer: every method takes `&mut self` and no
//! locking happens here. Wrap it in [`SharedCache`](crate::cache::SharedCache)
//! for access from several threads.

use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;

use tracing::{debug, info};

use crate::cache::{CacheStats, DropInPlace, RingBuffer, SearchResult, Segment, SegmentDisposer};
use crate::clock::{Duration, Timepoint};
use crate::config::CacheConfig;

// == Generational Cache ==
/// Bounded cache that evicts whole generations of entries at a time.
pub struct GenerationalCache<K, V> {
    config: CacheConfig,
    /// Oldest segment at logical index 0
    segments: RingBuffer<Segment<K, V>>,
    /// Sum of all segment lengths
    total_count: usize,
    disposer: Box<dyn SegmentDisposer<K, V>>,
    stats: CacheStats,
}

impl<K, V> GenerationalCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    // == Constructors ==
    /// Creates a cache that drops evicted segments in place.
    ///
    /// # Panics
    /// If any configuration value is zero.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_disposer(config, DropInPlace)
    }

    /// Creates a cache that hands evicted segments to `disposer`.
    ///
    /// The disposer only ever sees segments that are already detached from
    /// the cache.
    ///
    /// # Panics
    /// If any configuration value is zero.
    pub fn with_disposer<D>(config: CacheConfig, disposer: D) -> Self
    where
        D: SegmentDisposer<K, V> + 'static,
    {
        if let Err(err) = config.validate() {
            panic!("{}", err);
        }
        Self {
            config,
            segments: RingBuffer::new(config.max_segment_count),
            total_count: 0,
            disposer: Box::new(disposer),
            stats: CacheStats::new(),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Number of entries across all segments, masked duplicates included.
    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }

    /// Live segments, oldest first.
    pub fn segments(&self) -> impl DoubleEndedIterator<Item = &Segment<K, V>> + '_ {
        self.segments.iter()
    }

    // == Search ==
    /// Looks up `key`, giving up once `budget` has elapsed.
    ///
    /// Segments are checked newest first. The clock is read after each
    /// segment that misses, so the search overruns its budget by at most one
    /// segment lookup. A zero budget still checks the newest segment.
    pub fn search<Q>(&mut self, key: &Q, budget: Duration) -> SearchResult<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let started = Timepoint::now();
        for segment in self.segments.iter().rev() {
            if let Some(value) = segment.get(key) {
                self.stats.record_hit();
                return SearchResult::InTime(Some(value.clone()));
            }
            if started.elapsed() >= budget {
                self.stats.record_timeout();
                return SearchResult::OutOfTime;
            }
        }
        self.stats.record_miss();
        SearchResult::InTime(None)
    }

    // == Insert ==
    /// Stores `key -> value` in the newest segment.
    ///
    /// Evicts the oldest segment first when the cache is at
    /// `max_total_count`. A copy of `key` in an older segment is left in
    /// place and masked by the new one until it ages out.
    pub fn insert(&mut self, key: K, value: V) {
        if let Some(existing) = self
            .segments
            .last_mut()
            .and_then(|newest| newest.get_mut(&key))
        {
            *existing = value;
            return;
        }

        if self.total_count == self.config.max_total_count {
            self.evict_oldest();
        }
        let newest = self.writable_segment();
        newest.insert(key, value);
        self.total_count += 1;
    }

    // == Emergency Purge ==
    /// Drops every segment immediately, bypassing the disposer.
    pub fn purge_now(&mut self) {
        let dropped = self.total_count;
        self.segments.clear();
        self.total_count = 0;
        self.stats.record_purge();
        info!(dropped_entries = dropped, "emergency purge");
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.total_entries = self.total_count;
        stats.segment_count = self.segments.len();
        stats
    }

    /// Newest segment with room for one more entry, appending one if needed.
    fn writable_segment(&mut self) -> &mut Segment<K, V> {
        let needs_segment = self
            .segments
            .last()
            .map_or(true, |newest| newest.len() >= self.config.segment_size);
        if needs_segment {
            if self.segments.is_full() {
                self.evict_oldest();
            }
            debug!(
                segment_count = self.segments.len() + 1,
                "starting new segment"
            );
            self.segments
                .append_last(Segment::with_capacity(self.config.segment_size));
        }
        let newest = self.segments.len() - 1;
        &mut self.segments[newest]
    }

    fn evict_oldest(&mut self) {
        let segment = self.segments.remove_first();
        self.total_count -= segment.len();
        self.stats.record_eviction();
        debug!(
            evicted_entries = segment.len(),
            remaining_entries = self.total_count,
            "evicting oldest segment"
        );
        self.disposer.dispose(segment);
    }

    /// Panics if a structural invariant does not hold.
    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        let config = &self.config;
        assert!(self.segments.len() <= config.max_segment_count);
        assert!(self.total_count <= config.max_total_count);

        let sum: usize = self.segments.iter().map(Segment::len).sum();
        assert_eq!(self.total_count, sum, "total_count out of sync");

        let sealed = self.segments.len().saturating_sub(1);
        for (index, segment) in self.segments.iter().enumerate() {
            if index < sealed {
                assert_eq!(segment.len(), config.segment_size, "segment {} not full", index);
            } else {
                assert!(segment.len() <= config.segment_size);
            }
        }
    }
}

impl<K, V> GenerationalCache<K, V> {
    // == Teardown ==
    /// Hands every remaining segment to the disposer, oldest first, and
    /// returns how many were handed off. Not counted as evictions.
    pub fn dispose_all(&mut self) -> usize {
        let mut released = 0;
        while !self.segments.is_empty() {
            let segment = self.segments.remove_first();
            self.total_count -= segment.len();
            self.disposer.dispose(segment);
            released += 1;
        }
        if released > 0 {
            debug!(released_segments = released, "segments handed to disposer");
        }
        released
    }
}

impl<K, V> fmt::Debug for GenerationalCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationalCache")
            .field("config", &self.config)
            .field("segment_count", &self.segments.len())
            .field("total_count", &self.total_count)
            .finish()
    }
}
