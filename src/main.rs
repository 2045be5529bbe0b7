//! Segment Cache - test drive
//!
//! Runs a synthetic resource-loading workload against a shared generational
//! cache: every request searches the cache under a time budget, produces the
//! value on a miss or a timeout, and inserts it. Evicted segments are
//! released on the disposal worker thread.
//!
//! Send SIGUSR1 to simulate memory pressure; Ctrl+C or SIGTERM to stop.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use segment_cache::{
    spawn_disposal_worker, spawn_pressure_listener, Config, PressureMonitor, PurgeRegistry,
    SearchResult, Segment, SharedCache,
};

/// Number of distinct resources the workload cycles through
const RESOURCE_SPACE: u64 = 4096;

/// Size of each synthetic resource in bytes
const RESOURCE_BYTES: usize = 16 * 1024;

type Resource = Arc<Vec<u8>>;

/// Main entry point for the test drive.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load and validate configuration from environment variables
/// 3. Start the segment disposal worker
/// 4. Create the shared cache, registered with the global purge registry
/// 5. Start the memory pressure listener and its signal bridge
/// 6. Run the workload until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "segment_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Segment Cache test drive");

    let config = Config::from_env();
    config.validate().context("invalid configuration")?;
    info!(
        "Configuration loaded: segment_size={}, max_segment_count={}, max_total_count={}, budget={}us",
        config.cache.segment_size,
        config.cache.max_segment_count,
        config.cache.max_total_count,
        config.search_budget_micros
    );

    let (disposer, disposal_worker) =
        spawn_disposal_worker(config.disposal_queue_capacity, drop::<Segment<String, Resource>>)
            .context("failed to start disposal worker")?;

    let cache = SharedCache::with_disposer(config.cache, disposer);
    info!(registration = %cache.registration_id(), "Cache initialized");

    let monitor = PressureMonitor::new();
    let pressure_handle = spawn_pressure_listener(PurgeRegistry::global(), monitor.clone());
    let bridge_handle = spawn_pressure_bridge(monitor);

    tokio::select! {
        _ = run_workload(cache.clone(), &config) => {}
        _ = shutdown_signal() => {}
    }

    pressure_handle.abort();
    bridge_handle.abort();

    let stats = cache.stats();
    info!("Final stats: {}", serde_json::to_string(&stats)?);

    // Dropping the last cache handle closes the disposal queue
    drop(cache);
    let finalized = tokio::task::spawn_blocking(move || disposal_worker.join())
        .await
        .context("disposal worker join task failed")??;
    info!("Disposal worker finished after {} segments", finalized);

    info!("Shutdown complete");
    Ok(())
}

/// Request loop following the cache's consumer protocol: search, produce on
/// anything but a hit, then insert.
async fn run_workload(cache: SharedCache<String, Resource>, config: &Config) {
    let budget = config.search_budget();
    let mut requests = tokio::time::interval(Duration::from_millis(1));
    let mut reports = tokio::time::interval(Duration::from_secs(config.stats_interval));
    let mut sequence = Sequence::new(0x5eed);

    loop {
        tokio::select! {
            _ = requests.tick() => {
                let key = format!("resource-{}", sequence.next_id() % RESOURCE_SPACE);
                match cache.search(key.as_str(), budget) {
                    SearchResult::InTime(Some(resource)) => {
                        debug!(%key, bytes = resource.len(), "hit");
                    }
                    SearchResult::InTime(None) => {
                        debug!(%key, "miss");
                        produce_and_insert(&cache, key);
                    }
                    SearchResult::OutOfTime => {
                        debug!(%key, "lookup ran out of time, producing anyway");
                        produce_and_insert(&cache, key);
                    }
                }
            }
            _ = reports.tick() => {
                let stats = cache.stats();
                match serde_json::to_string(&stats) {
                    Ok(json) => info!("Cache stats: {} hit_rate={:.3}", json, stats.hit_rate()),
                    Err(err) => warn!("Failed to serialize stats: {}", err),
                }
            }
        }
    }
}

/// Produces the resource for `key` and caches it.
fn produce_and_insert(cache: &SharedCache<String, Resource>, key: String) {
    let resource = produce(&key);
    cache.insert(key, resource);
}

/// Stands in for an expensive fetch-and-decode step.
fn produce(key: &str) -> Resource {
    let seed = key.bytes().fold(0u8, |acc, b| acc.wrapping_add(b));
    Arc::new(vec![seed; RESOURCE_BYTES])
}

/// Skewed pseudo-random request sequence so that some keys repeat often.
struct Sequence(u64);

impl Sequence {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_id(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let raw = self.0 >> 33;
        // Square the unit value to favour low ids
        let unit = (raw % 1024) as f64 / 1024.0;
        (unit * unit * RESOURCE_SPACE as f64) as u64
    }
}

/// Forwards SIGUSR1 to the pressure monitor.
fn spawn_pressure_bridge(monitor: PressureMonitor) -> JoinHandle<()> {
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            let mut pressure =
                match signal::unix::signal(signal::unix::SignalKind::user_defined1()) {
                    Ok(stream) => stream,
                    Err(err) => {
                        warn!("Failed to install SIGUSR1 handler: {}", err);
                        return;
                    }
                };
            while pressure.recv().await.is_some() {
                info!("Received SIGUSR1, signalling memory pressure");
                monitor.signal();
            }
        }

        #[cfg(not(unix))]
        {
            let _monitor = monitor;
            std::future::pending::<()>().await;
        }
    })
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }
}
