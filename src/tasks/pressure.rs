//! Memory Pressure Listener
//!
//! Background task that broadcasts an emergency purge to every registered
//! cache whenever memory pressure is signalled.

use std::sync::Arc;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::registry::PurgeRegistry;

// == Pressure Monitor ==
/// Signal source for memory pressure. Cheap to clone; safe to signal from
/// any thread, including ones outside the tokio runtime.
#[derive(Debug, Clone, Default)]
pub struct PressureMonitor {
    notify: Arc<Notify>,
}

impl PressureMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports memory pressure. Signals raised while a purge is already
    /// pending are coalesced into it.
    pub fn signal(&self) {
        self.notify.notify_one();
    }

    async fn wait(&self) {
        self.notify.notified().await;
    }
}

/// Spawns a task that runs [`PurgeRegistry::broadcast_purge`] on every
/// pressure signal.
///
/// The purge itself runs on the blocking pool since dropping segments can
/// take a while.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
pub fn spawn_pressure_listener(
    registry: Arc<PurgeRegistry>,
    monitor: PressureMonitor,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Starting memory pressure listener");

        loop {
            monitor.wait().await;

            let registry = Arc::clone(&registry);
            match tokio::task::spawn_blocking(move || registry.broadcast_purge()).await {
                Ok(purged) => info!("Memory pressure: purged {} caches", purged),
                Err(err) => warn!("Memory pressure purge failed: {}", err),
            }
        }
    })
}
