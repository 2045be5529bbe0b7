//! Clock Module
//!
//! Monotonic time points used to bound lookup latency. Never used to
//! timestamp cache entries.

use std::ops::Sub;
use std::time::Instant;

pub use std::time::Duration;

/// Budget that never runs out. A search given this budget always completes.
pub const UNLIMITED: Duration = Duration::MAX;

// == Timepoint ==
/// Opaque instant on the monotonic clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timepoint(Instant);

impl Timepoint {
    /// Reads the monotonic clock.
    pub fn now() -> Self {
        Self(Instant::now())
    }

    /// Time elapsed since this point.
    pub fn elapsed(&self) -> Duration {
        Self::now() - *self
    }
}

impl Sub for Timepoint {
    type Output = Duration;

    /// Saturates at zero when `rhs` is later than `self`.
    fn sub(self, rhs: Self) -> Duration {
        self.0.saturating_duration_since(rhs.0)
    }
}

/// Runs `f` and returns how long it took.
pub fn measure_execution_time<F: FnOnce()>(f: F) -> Duration {
    let start = Timepoint::now();
    f();
    Timepoint::now() - start
}
