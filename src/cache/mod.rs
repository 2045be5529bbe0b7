//! Cache Module
//!
//! Generational in-memory caching with time-bounded lookups and deferred
//! disposal of evicted segments.

mod disposer;
mod generational;
mod result;
mod ring_buffer;
mod segment;
mod shared;
mod stats;


// Re-export public types
pub use disposer::{DropInPlace, SegmentDisposer};
pub use generational::GenerationalCache;
pub use result::SearchResult;
pub use ring_buffer::{Iter, RingBuffer};
pub use segment::Segment;
pub use shared::SharedCache;
pub use stats::CacheStats;
