//! Read-through caching with in-flight request collapsing.

use crate::store::{CacheStore, MemoryStore};
use log::{debug, info, warn};
use silica_ir::HardwareDescription;
use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, PoisonError};

enum Slot {
    Pending,
    Done(Arc<HardwareDescription>),
    Abandoned,
}

struct InFlight {
    slot: Mutex<Slot>,
    ready: Condvar,
}

impl InFlight {
    fn new() -> Self {
        Self {
            slot: Mutex::new(Slot::Pending),
            ready: Condvar::new(),
        }
    }

    fn settle(&self, value: Slot) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = value;
        self.ready.notify_all();
    }

    /// Blocks until the leader settles. `None` means it gave up.
    fn wait(&self) -> Option<Arc<HardwareDescription>> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            match &*slot {
                Slot::Pending => {
                    slot = self
                        .ready
                        .wait(slot)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                Slot::Done(description) => return Some(Arc::clone(description)),
                Slot::Abandoned => return None,
            }
        }
    }
}

/// Unregisters the leader's flight when dropped, waking waiters with
/// `Abandoned` unless a result was published first.
struct Leader<'c> {
    cache: &'c HardwareCache,
    identity: &'c str,
    flight: Arc<InFlight>,
    published: bool,
}

impl Leader<'_> {
    fn publish(mut self, description: Arc<HardwareDescription>) -> Arc<HardwareDescription> {
        self.cache.unregister(self.identity);
        self.flight.settle(Slot::Done(Arc::clone(&description)));
        self.published = true;
        description
    }
}

impl Drop for Leader<'_> {
    fn drop(&mut self) {
        if !self.published {
            self.cache.unregister(self.identity);
            self.flight.settle(Slot::Abandoned);
        }
    }
}

/// A [`CacheStore`] front that runs at most one computation per identity
/// at a time.
///
/// The first request for an identity becomes the leader: it reads the store
/// and, on a miss, computes and writes back. Requests arriving meanwhile
/// wait for the leader and share its result. A failed computation is not
/// shared; each waiter then runs its own.
pub struct HardwareCache {
    store: Arc<dyn CacheStore>,
    in_flight: Mutex<HashMap<String, Arc<InFlight>>>,
}

impl HardwareCache {
    /// Creates a cache over `store`.
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a cache over a fresh [`MemoryStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    fn unregister(&self, identity: &str) {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(identity);
    }

    /// Returns the description for `identity`, running `compute` only if
    /// neither the store nor a concurrent request provides it.
    pub fn get_or_compute<E, F>(
        &self,
        identity: &str,
        compute: F,
    ) -> Result<Arc<HardwareDescription>, E>
    where
        F: FnOnce() -> Result<HardwareDescription, E>,
    {
        loop {
            let (flight, leading) = {
                let mut in_flight = self
                    .in_flight
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                match in_flight.get(identity) {
                    Some(flight) => (Arc::clone(flight), false),
                    None => {
                        let flight = Arc::new(InFlight::new());
                        in_flight.insert(identity.to_string(), Arc::clone(&flight));
                        (flight, true)
                    }
                }
            };

            if leading {
                let leader = Leader {
                    cache: self,
                    identity,
                    flight,
                    published: false,
                };
                return self.lead(leader, compute);
            }

            debug!("waiting for in-flight transformation {identity}");
            if let Some(description) = flight.wait() {
                return Ok(description);
            }
        }
    }

    fn lead<E, F>(&self, leader: Leader<'_>, compute: F) -> Result<Arc<HardwareDescription>, E>
    where
        F: FnOnce() -> Result<HardwareDescription, E>,
    {
        let identity = leader.identity;
        match self.store.load(identity) {
            Ok(Some(description)) => {
                info!("cache hit for {identity}");
                return Ok(leader.publish(Arc::new(description)));
            }
            Ok(None) => info!("cache miss for {identity}"),
            Err(e) => warn!("cache read failed for {identity}, treating as miss: {e}"),
        }

        let description = compute()?;
        if let Err(e) = self.store.store(identity, &description) {
            warn!("cache write failed for {identity}: {e}");
        }
        Ok(leader.publish(Arc::new(description)))
    }
}
