//! Shared Cache Module
//!
//! Thread-safe handle around a [`GenerationalCache`] that takes part in
//! emergency purges. Every operation, purges included, runs under one
//! mutex, so a purge broadcast from another thread never interleaves with
//! an insert or a search.
//!
//! Dropping the last handle passes the remaining segments to the disposer,
//! so a background disposer also takes over the final teardown.

use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::cache::{CacheStats, DropInPlace, GenerationalCache, SearchResult, SegmentDisposer};
use crate::clock::Duration;
use crate::config::CacheConfig;
use crate::registry::{PurgeRegistry, Purgeable, Registration, RegistrationId};

struct SharedInner<K, V> {
    cache: Mutex<GenerationalCache<K, V>>,
    registration: Registration,
}

impl<K, V> Purgeable for SharedInner<K, V>
where
    K: Eq + Hash + Clone + Send,
    V: Clone + Send,
{
    fn perform_emergency_purge(&self) {
        self.cache.lock().purge_now();
    }
}

impl<K, V> Drop for SharedInner<K, V> {
    fn drop(&mut self) {
        self.cache.get_mut().dispose_all();
    }
}

// == Shared Cache ==
/// Cloneable, thread-safe generational cache registered for emergency
/// purges. Deregisters when the last clone is dropped.
pub struct SharedCache<K, V> {
    inner: Arc<SharedInner<K, V>>,
}

impl<K, V> Clone for SharedCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> SharedCache<K, V>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    /// Creates a cache registered with the global registry that drops
    /// evicted segments in place.
    ///
    /// # Panics
    /// If any configuration value is zero.
    pub fn new(config: CacheConfig) -> Self {
        Self::with_disposer(config, DropInPlace)
    }

    /// Creates a cache registered with the global registry.
    pub fn with_disposer<D>(config: CacheConfig, disposer: D) -> Self
    where
        D: SegmentDisposer<K, V> + 'static,
    {
        Self::with_registry(config, disposer, &PurgeRegistry::global())
    }

    /// Creates a cache registered with `registry`.
    pub fn with_registry<D>(config: CacheConfig, disposer: D, registry: &Arc<PurgeRegistry>) -> Self
    where
        D: SegmentDisposer<K, V> + 'static,
    {
        let cache = GenerationalCache::with_disposer(config, disposer);
        let inner = Arc::new_cyclic(|weak: &Weak<SharedInner<K, V>>| {
            let target: Weak<dyn Purgeable> = weak.clone();
            SharedInner {
                cache: Mutex::new(cache),
                registration: registry.register(target),
            }
        });
        Self { inner }
    }

    /// See [`GenerationalCache::search`].
    pub fn search<Q>(&self, key: &Q, budget: Duration) -> SearchResult<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.cache.lock().search(key, budget)
    }

    /// See [`GenerationalCache::insert`].
    pub fn insert(&self, key: K, value: V) {
        self.inner.cache.lock().insert(key, value);
    }

    /// Drops all data immediately, bypassing the disposer.
    pub fn purge_now(&self) {
        self.inner.cache.lock().purge_now();
    }

    pub fn total_count(&self) -> usize {
        self.inner.cache.lock().total_count()
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.cache.lock().stats()
    }

    pub fn config(&self) -> CacheConfig {
        *self.inner.cache.lock().config()
    }

    /// Id under which this cache is registered for purges.
    pub fn registration_id(&self) -> RegistrationId {
        self.inner.registration.id()
    }
}
