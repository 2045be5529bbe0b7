//! Background Tasks Module
//!
//! Work that runs off the cache owner's thread.
//!
//! # Tasks
//! - Segment disposal: finalizes evicted segments on a dedicated thread
//! - Pressure listener: broadcasts emergency purges on memory pressure

mod disposal;
mod pressure;

pub use disposal::{spawn_disposal_worker, BackgroundDisposer, DisposalWorker};
pub use pressure::{spawn_pressure_listener, PressureMonitor};
