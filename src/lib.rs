//! Segment Cache - A time-bounded generational in-memory cache
//!
//! Stores values that are expensive to produce but cheap to regenerate.
//! Lookups answer within a caller-given time budget, old entries are evicted
//! a whole segment at a time, and evicted segments are released off the
//! caller's thread.

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod registry;
pub mod tasks;

pub use cache::{GenerationalCache, SearchResult, Segment, SegmentDisposer, SharedCache};
pub use clock::{Duration, Timepoint, UNLIMITED};
pub use config::{CacheConfig, Config};
pub use error::{CacheError, Result};
pub use registry::{PurgeRegistry, Purgeable, Registration};
pub use tasks::{spawn_disposal_worker, spawn_pressure_listener, PressureMonitor};
