//! Segment Disposal Hook
//!
//! Receives segments after the cache has detached them. Implementations
//! decide where the release work runs; see
//! [`BackgroundDisposer`](crate::tasks::BackgroundDisposer) for moving it
//! off the inserting thread.

use crate::cache::Segment;

// == Segment Disposer ==
/// Takes ownership of an evicted segment.
///
/// Called synchronously from the insert that triggered the eviction, so an
/// implementation should hand the segment off rather than do slow work here.
pub trait SegmentDisposer<K, V>: Send {
    fn dispose(&mut self, segment: Segment<K, V>);
}

/// Drops evicted segments immediately on the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct DropInPlace;

impl<K, V> SegmentDisposer<K, V> for DropInPlace {
    fn dispose(&mut self, segment: Segment<K, V>) {
        drop(segment);
    }
}

impl<K, V, F> SegmentDisposer<K, V> for F
where
    F: FnMut(Segment<K, V>) + Send,
{
    fn dispose(&mut self, segment: Segment<K, V>) {
        self(segment)
    }
}
