//! Segment Disposal Worker
//!
//! Dedicated thread that finalizes evicted segments so that releasing
//! expensive values never runs on the thread whose insert caused the
//! eviction.
//!
//! Segments travel over a bounded queue by value: once sent, the cache
//! holds no reference to them. When the queue is full they go to an
//! unbounded overflow channel drained by the same worker, so an insert
//! never waits and never releases a segment itself. The worker keeps
//! draining after every sender is gone, so segments evicted by a cache
//! finish disposal even after the cache itself has been dropped.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error, info, warn};

use crate::cache::{Segment, SegmentDisposer};
use crate::error::{CacheError, Result};

// == Background Disposer ==
/// [`SegmentDisposer`] that queues segments for the disposal worker.
///
/// Never blocks and never releases a segment on the calling thread. A full
/// queue spills into the overflow channel; if the worker has stopped, the
/// segment is released on a short-lived spill thread.
pub struct BackgroundDisposer<K, V> {
    queue: mpsc::Sender<Segment<K, V>>,
    overflow: mpsc::UnboundedSender<Segment<K, V>>,
}

impl<K, V> Clone for BackgroundDisposer<K, V> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            overflow: self.overflow.clone(),
        }
    }
}

impl<K, V> fmt::Debug for BackgroundDisposer<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackgroundDisposer")
            .field("queued", &(self.queue.max_capacity() - self.queue.capacity()))
            .finish()
    }
}

impl<K, V> SegmentDisposer<K, V> for BackgroundDisposer<K, V>
where
    K: Send + 'static,
    V: Send + 'static,
{
    fn dispose(&mut self, segment: Segment<K, V>) {
        let segment = match self.queue.try_send(segment) {
            Ok(()) => return,
            Err(TrySendError::Full(segment)) => segment,
            Err(TrySendError::Closed(segment)) => return release_on_spill_thread(segment),
        };

        debug!(
            entries = segment.len(),
            "disposal queue full, using overflow channel"
        );
        if let Err(mpsc::error::SendError(segment)) = self.overflow.send(segment) {
            release_on_spill_thread(segment);
        }
    }
}

/// Last resort once the worker is gone: release on a detached thread.
fn release_on_spill_thread<K, V>(segment: Segment<K, V>)
where
    K: Send + 'static,
    V: Send + 'static,
{
    warn!(
        entries = segment.len(),
        "disposal worker stopped, releasing segment on a spill thread"
    );
    let spawned = thread::Builder::new()
        .name("segment-disposal-spill".to_string())
        .spawn(move || drop(segment));
    if let Err(err) = spawned {
        error!(%err, "failed to spawn spill thread");
    }
}

// == Disposal Worker ==
/// Handle to the disposal thread.
#[derive(Debug)]
pub struct DisposalWorker {
    handle: JoinHandle<()>,
    finalized: Arc<AtomicU64>,
}

impl DisposalWorker {
    /// Segments finalized so far.
    pub fn finalized(&self) -> u64 {
        self.finalized.load(Ordering::Acquire)
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the worker to drain its queue and exit, returning the total
    /// number of segments finalized.
    ///
    /// Only returns once every [`BackgroundDisposer`] clone has been dropped.
    pub fn join(self) -> Result<u64> {
        self.handle.join().map_err(|_| CacheError::WorkerPanicked)?;
        Ok(self.finalized.load(Ordering::Acquire))
    }
}

/// Starts the disposal thread.
///
/// `finalize` runs on the worker thread for every evicted segment, whether
/// it arrived through the bounded queue or the overflow channel; dropping
/// the segment there is enough to move its release off the inserting
/// thread.
///
/// # Arguments
/// * `capacity` - Segments the bounded queue holds before spilling over
/// * `finalize` - Called with each segment on the worker thread
pub fn spawn_disposal_worker<K, V, F>(
    capacity: usize,
    mut finalize: F,
) -> Result<(BackgroundDisposer<K, V>, DisposalWorker)>
where
    K: Send + 'static,
    V: Send + 'static,
    F: FnMut(Segment<K, V>) + Send + 'static,
{
    if capacity == 0 {
        return Err(CacheError::InvalidConfig(
            "disposal queue capacity must be greater than 0".to_string(),
        ));
    }

    let (queue, mut queued) = mpsc::channel::<Segment<K, V>>(capacity);
    let (overflow, mut overflowed) = mpsc::unbounded_channel::<Segment<K, V>>();
    let finalized = Arc::new(AtomicU64::new(0));
    let counter = Arc::clone(&finalized);

    // Channels only, no IO or timer drivers needed
    let runtime = tokio::runtime::Builder::new_current_thread().build()?;

    let handle = thread::Builder::new()
        .name("segment-disposal".to_string())
        .spawn(move || {
            info!(capacity, "segment disposal worker started");
            let disposed = Arc::clone(&counter);
            runtime.block_on(async move {
                loop {
                    let segment = tokio::select! {
                        biased;
                        Some(segment) = queued.recv() => segment,
                        Some(segment) = overflowed.recv() => segment,
                        else => break,
                    };
                    let entries = segment.len();
                    finalize(segment);
                    disposed.fetch_add(1, Ordering::Release);
                    debug!(entries, "segment disposed");
                }
            });
            info!(
                finalized = counter.load(Ordering::Acquire),
                "segment disposal worker exiting"
            );
        })?;

    Ok((
        BackgroundDisposer { queue, overflow },
        DisposalWorker { handle, finalized },
    ))
}
