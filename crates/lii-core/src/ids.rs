//! Reference-counted temperature channel identifiers.
//!
//! Temperature channels are numbered by positive integers. Linked temperature
//! calculators in several runs share one logical channel number, so the pool
//! counts references instead of handing out a fresh number per plugin.
//!
//! The registry is owned by the processing session and cloned into every place
//! that creates temperature calculators; it is not process-wide state.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

#[derive(Default)]
struct Pool {
    counts: BTreeMap<u32, usize>,
}

impl Pool {
    fn lowest_free(&self) -> u32 {
        let mut candidate = 1;
        for id in self.counts.keys() {
            if *id != candidate {
                break;
            }
            candidate += 1;
        }
        candidate
    }
}

/// Shared allocator for temperature channel IDs.
#[derive(Clone, Default)]
pub struct TemperatureChannelRegistry {
    pool: Arc<Mutex<Pool>>,
}

impl TemperatureChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Pool> {
        // a poisoned pool still holds consistent counts
        self.pool.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Allocate the lowest unused ID with a reference count of one.
    pub fn allocate(&self) -> ChannelIdLease {
        let mut pool = self.lock();
        let id = pool.lowest_free();
        pool.counts.insert(id, 1);
        debug!(id, "allocated temperature channel id");
        ChannelIdLease {
            id,
            registry: self.clone(),
        }
    }

    /// Take another reference on `id`, registering it if it is unknown.
    pub fn retain(&self, id: u32) -> ChannelIdLease {
        let mut pool = self.lock();
        *pool.counts.entry(id).or_insert(0) += 1;
        ChannelIdLease {
            id,
            registry: self.clone(),
        }
    }

    fn release(&self, id: u32) {
        let mut pool = self.lock();
        if let Some(count) = pool.counts.get_mut(&id) {
            *count -= 1;
            if *count == 0 {
                pool.counts.remove(&id);
                debug!(id, "released temperature channel id");
            }
        }
    }

    /// Current reference count of `id` (0 when free).
    pub fn ref_count(&self, id: u32) -> usize {
        self.lock().counts.get(&id).copied().unwrap_or(0)
    }

    /// IDs currently in use, ascending.
    pub fn ids_in_use(&self) -> Vec<u32> {
        self.lock().counts.keys().copied().collect()
    }
}

impl fmt::Debug for TemperatureChannelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemperatureChannelRegistry")
            .field("ids", &self.ids_in_use())
            .finish()
    }
}

/// One reference on a temperature channel ID; released on drop.
pub struct ChannelIdLease {
    id: u32,
    registry: TemperatureChannelRegistry,
}

impl ChannelIdLease {
    pub fn id(&self) -> u32 {
        self.id
    }
}

impl Clone for ChannelIdLease {
    fn clone(&self) -> Self {
        self.registry.retain(self.id)
    }
}

impl Drop for ChannelIdLease {
    fn drop(&mut self) {
        self.registry.release(self.id);
    }
}

impl fmt::Debug for ChannelIdLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChannelIdLease({})", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn dropping_every_lease_empties_the_pool(
            fresh in 1usize..12,
            shares in prop::collection::vec(0usize..12, 0..20),
        ) {
            let registry = TemperatureChannelRegistry::new();
            let mut leases: Vec<ChannelIdLease> = (0..fresh).map(|_| registry.allocate()).collect();
            let ids: Vec<u32> = leases.iter().map(ChannelIdLease::id).collect();
            prop_assert_eq!(ids, (1..=fresh as u32).collect::<Vec<_>>());
            for share in shares {
                let extra = leases[share % fresh].clone();
                leases.push(extra);
            }
            drop(leases);
            prop_assert!(registry.ids_in_use().is_empty());
        }
    }

    #[test]
    fn allocation_reuses_lowest_free_id() {
        let registry = TemperatureChannelRegistry::new();
        let a = registry.allocate();
        let b = registry.allocate();
        assert_eq!((a.id(), b.id()), (1, 2));
        drop(a);
        let c = registry.allocate();
        assert_eq!(c.id(), 1);
        assert_eq!(registry.ids_in_use(), vec![1, 2]);
    }

    #[test]
    fn shared_id_lives_until_last_lease() {
        let registry = TemperatureChannelRegistry::new();
        let a = registry.allocate();
        let shared = a.clone();
        assert_eq!(registry.ref_count(a.id()), 2);
        drop(a);
        assert_eq!(registry.ref_count(shared.id()), 1);
        let next = registry.allocate();
        assert_eq!(next.id(), 2);
        drop(shared);
        assert_eq!(registry.ref_count(1), 0);
    }

    #[test]
    fn separate_registries_are_independent() {
        let first = TemperatureChannelRegistry::new();
        let second = TemperatureChannelRegistry::new();
        let _a = first.allocate();
        assert_eq!(second.allocate().id(), 1);
    }
}
