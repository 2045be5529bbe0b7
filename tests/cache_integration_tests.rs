//! Integration Tests for the Segment Cache
//!
//! Exercises the public API end to end: generational eviction with
//! background disposal, emergency purges through the registry, and
//! concurrent access through the shared handle.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration as StdDuration;

use segment_cache::cache::DropInPlace;
use segment_cache::{
    spawn_disposal_worker, CacheConfig, Duration, GenerationalCache, PurgeRegistry, SearchResult,
    Segment, SharedCache, UNLIMITED,
};

// == Helper Functions ==

fn scenario_config() -> CacheConfig {
    CacheConfig::new(2, 2, 3)
}

fn key(name: &str) -> String {
    name.to_string()
}

/// Value that records which thread released it.
struct ReleaseTracer {
    releases: Arc<Mutex<Vec<Option<String>>>>,
}

impl Drop for ReleaseTracer {
    fn drop(&mut self) {
        let name = thread::current().name().map(str::to_string);
        self.releases.lock().unwrap().push(name);
    }
}

// == Generational Eviction ==

#[test]
fn test_scenario_with_background_disposal() {
    let (tx, rx) = mpsc::channel();
    let (disposer, worker) = spawn_disposal_worker(4, move |segment: Segment<String, u32>| {
        tx.send(segment.into_iter().collect::<Vec<_>>()).unwrap();
    })
    .unwrap();

    let mut cache = GenerationalCache::with_disposer(scenario_config(), disposer);
    cache.insert(key("A"), 1);
    cache.insert(key("B"), 2);
    assert_eq!(cache.total_count(), 2);

    cache.insert(key("C"), 3);
    assert_eq!(cache.total_count(), 3);

    cache.insert(key("D"), 4);
    assert_eq!(cache.total_count(), 2);

    let evicted = rx.recv_timeout(StdDuration::from_secs(5)).unwrap();
    assert_eq!(evicted, vec![(key("A"), 1), (key("B"), 2)]);

    assert_eq!(cache.search("A", UNLIMITED), SearchResult::InTime(None));
    assert_eq!(cache.search("D", UNLIMITED), SearchResult::InTime(Some(4)));

    drop(cache);
    assert_eq!(worker.join().unwrap(), 1);
}

#[test]
fn test_pending_disposals_outlive_cache() {
    let (gate_tx, gate_rx) = mpsc::channel::<()>();
    let (disposer, worker) = spawn_disposal_worker(16, move |_segment: Segment<u32, Vec<u8>>| {
        let _ = gate_rx.recv();
    })
    .unwrap();

    let mut cache = GenerationalCache::with_disposer(CacheConfig::new(1, 2, 2), disposer);
    for i in 0..6u32 {
        cache.insert(i, vec![0u8; 1024]);
    }
    assert_eq!(cache.stats().evictions, 4);

    // The worker is still blocked on the first segment
    drop(cache);
    assert!(!worker.is_finished());

    for _ in 0..4 {
        gate_tx.send(()).unwrap();
    }
    assert_eq!(worker.join().unwrap(), 4);
}

#[test]
fn test_saturated_disposal_queue_keeps_release_off_inserting_thread() {
    let (gate_tx, gate_rx) = mpsc::channel::<()>();
    let (disposer, worker) =
        spawn_disposal_worker(1, move |segment: Segment<u32, Arc<ReleaseTracer>>| {
            let _ = gate_rx.recv();
            drop(segment);
        })
        .unwrap();

    let registry = Arc::new(PurgeRegistry::new());
    let cache = SharedCache::with_registry(CacheConfig::new(1, 2, 2), disposer, &registry);
    let releases = Arc::new(Mutex::new(Vec::new()));
    for i in 0..8u32 {
        let value = Arc::new(ReleaseTracer {
            releases: releases.clone(),
        });
        cache.insert(i, value);
    }
    assert_eq!(cache.stats().evictions, 6);
    assert!(releases.lock().unwrap().is_empty());

    // Teardown of the live segments also goes through the worker
    drop(cache);
    assert!(releases.lock().unwrap().is_empty());

    drop(gate_tx);
    assert_eq!(worker.join().unwrap(), 8);

    let releases = releases.lock().unwrap();
    assert_eq!(releases.len(), 8);
    assert!(releases
        .iter()
        .all(|name| name.as_deref() == Some("segment-disposal")));
}

#[test]
fn test_zero_budget_against_many_segments() {
    let mut cache = GenerationalCache::new(CacheConfig::new(4, 8, 32));
    for i in 0..32u32 {
        cache.insert(i, i);
    }

    // Newest segment holds 28..32
    assert_eq!(cache.search(&30, Duration::ZERO), SearchResult::InTime(Some(30)));
    assert_eq!(cache.search(&0, Duration::ZERO), SearchResult::OutOfTime);
    assert_eq!(cache.search(&0, UNLIMITED), SearchResult::InTime(Some(0)));
    assert_eq!(cache.search(&99, UNLIMITED), SearchResult::InTime(None));
}

// == Emergency Purge ==

#[test]
fn test_registry_broadcast_purges_all_live_caches() {
    let registry = Arc::new(PurgeRegistry::new());
    let first: SharedCache<String, u32> =
        SharedCache::with_registry(scenario_config(), DropInPlace, &registry);
    let second: SharedCache<String, u32> =
        SharedCache::with_registry(scenario_config(), DropInPlace, &registry);
    let gone: SharedCache<String, u32> =
        SharedCache::with_registry(scenario_config(), DropInPlace, &registry);
    drop(gone);

    first.insert(key("a"), 1);
    second.insert(key("b"), 2);
    assert_eq!(registry.len(), 2);

    assert_eq!(registry.broadcast_purge(), 2);
    assert_eq!(first.search("a", UNLIMITED), SearchResult::InTime(None));
    assert_eq!(second.search("b", UNLIMITED), SearchResult::InTime(None));
}

#[test]
fn test_purge_bypasses_disposer() {
    let (disposer, worker) = spawn_disposal_worker(4, drop::<Segment<String, u32>>).unwrap();
    let registry = Arc::new(PurgeRegistry::new());
    let cache = SharedCache::with_registry(scenario_config(), disposer, &registry);

    cache.insert(key("a"), 1);
    cache.insert(key("b"), 2);
    cache.insert(key("c"), 3);
    cache.purge_now();
    assert_eq!(cache.total_count(), 0);

    drop(cache);
    assert_eq!(worker.join().unwrap(), 0);
}

#[test]
fn test_global_registry_tracks_shared_caches() {
    let cache: SharedCache<String, u32> = SharedCache::new(scenario_config());
    cache.insert(key("a"), 1);

    PurgeRegistry::global().broadcast_purge();
    assert_eq!(cache.search("a", UNLIMITED), SearchResult::InTime(None));

    let id = cache.registration_id();
    drop(cache);
    assert!(PurgeRegistry::global().deregister(id).is_err());
}

#[test]
fn test_concurrent_purge_keeps_invariants() {
    let registry = Arc::new(PurgeRegistry::new());
    let cache: SharedCache<u32, u32> =
        SharedCache::with_registry(CacheConfig::new(4, 4, 16), DropInPlace, &registry);

    let writer = {
        let cache = cache.clone();
        thread::spawn(move || {
            for i in 0..5_000u32 {
                cache.insert(i, i);
                let total = cache.total_count();
                assert!(total <= 16, "total {} exceeds limit", total);
            }
        })
    };
    let purger = {
        let registry = registry.clone();
        thread::spawn(move || {
            for _ in 0..200 {
                registry.broadcast_purge();
                thread::yield_now();
            }
        })
    };

    writer.join().unwrap();
    purger.join().unwrap();

    cache.insert(9_999, 1);
    assert_eq!(cache.search(&9_999, UNLIMITED), SearchResult::InTime(Some(1)));
    assert!(cache.stats().purges >= 200);
}
