//! Purge Registry
//!
//! Process-wide list of caches that can be told to drop everything at once,
//! for example when the host reports memory pressure.
//!
//! Registration is explicit: [`PurgeRegistry::register`] returns a
//! [`Registration`] guard and the entry is removed when the guard drops.
//! The registry only holds weak handles, so it never keeps a cache alive.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::Mutex;
use tracing::{debug, error, info};

use crate::error::{CacheError, Result};

static GLOBAL_REGISTRY: OnceLock<Arc<PurgeRegistry>> = OnceLock::new();

// == Purgeable ==
/// Something that can release all of its cached data on demand.
///
/// May be called from any thread, concurrently with the owner's own use.
pub trait Purgeable: Send + Sync {
    fn perform_emergency_purge(&self);
}

// == Registration Id ==
/// Identity of one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationId(u64);

impl RegistrationId {
    #[cfg(test)]
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// == Purge Registry ==
#[derive(Default)]
pub struct PurgeRegistry {
    next_id: AtomicU64,
    entries: Mutex<Vec<(RegistrationId, Weak<dyn Purgeable>)>>,
}

impl PurgeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> Arc<PurgeRegistry> {
        GLOBAL_REGISTRY
            .get_or_init(|| Arc::new(PurgeRegistry::new()))
            .clone()
    }

    // == Register ==
    /// Adds a weak handle to `target`. The returned guard deregisters it
    /// when dropped.
    pub fn register(self: &Arc<Self>, target: Weak<dyn Purgeable>) -> Registration {
        let id = RegistrationId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.lock().push((id, target));
        debug!(%id, "purgeable registered");
        Registration {
            registry: Arc::clone(self),
            id,
        }
    }

    // == Deregister ==
    /// Removes the handle registered under `id`.
    ///
    /// Returns [`CacheError::NotRegistered`] if there is none, which means
    /// some owner's lifecycle is broken.
    pub fn deregister(&self, id: RegistrationId) -> Result<()> {
        let mut entries = self.entries.lock();
        match entries.iter().position(|(entry_id, _)| *entry_id == id) {
            Some(position) => {
                entries.swap_remove(position);
                debug!(%id, "purgeable deregistered");
                Ok(())
            }
            None => Err(CacheError::NotRegistered(id)),
        }
    }

    // == Broadcast ==
    /// Purges every registered target that is still alive and returns how
    /// many were purged. Dead handles are skipped.
    ///
    /// The lock is released before any target is purged, so a target may
    /// register or deregister from inside its purge.
    pub fn broadcast_purge(&self) -> usize {
        let snapshot: Vec<Weak<dyn Purgeable>> = self
            .entries
            .lock()
            .iter()
            .map(|(_, target)| target.clone())
            .collect();

        let mut purged = 0;
        for target in snapshot.iter().filter_map(Weak::upgrade) {
            target.perform_emergency_purge();
            purged += 1;
        }
        info!(
            purged,
            skipped = snapshot.len() - purged,
            "broadcast emergency purge"
        );
        purged
    }

    /// Number of registrations, dead handles included.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl fmt::Debug for PurgeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PurgeRegistry")
            .field("registrations", &self.len())
            .finish()
    }
}

// == Registration Guard ==
/// Keeps a target registered until dropped.
#[must_use = "dropping a Registration deregisters the target immediately"]
pub struct Registration {
    registry: Arc<PurgeRegistry>,
    id: RegistrationId,
}

impl Registration {
    pub fn id(&self) -> RegistrationId {
        self.id
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration").field("id", &self.id).finish()
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        if let Err(err) = self.registry.deregister(self.id) {
            error!(%err, "registration vanished before its guard was dropped");
            if !std::thread::panicking() {
                panic!("{}", err);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    /// Purge target that only counts how often it was purged.
    #[derive(Default)]
    pub(crate) struct CountingTarget {
        pub(crate) purges: AtomicUsize,
    }

    impl Purgeable for CountingTarget {
        fn perform_emergency_purge(&self) {
            self.purges.fetch_add(1, Ordering::SeqCst);
        }
    }

    pub(crate) fn weak_of(target: &Arc<CountingTarget>) -> Weak<dyn Purgeable> {
        let weak: Weak<CountingTarget> = Arc::downgrade(target);
        weak
    }
}
