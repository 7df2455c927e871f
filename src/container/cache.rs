//! Single-instance cache: one constructed instance per type per container.

use std::any::{Any, TypeId};
use std::sync::Arc;

use dashmap::DashMap;

use crate::type_key::TypeKey;

#[derive(Clone)]
pub(crate) struct CacheEntry {
    pub(crate) key: TypeKey,
    pub(crate) instance: Arc<dyn Any + Send + Sync>,
}

/// Type-keyed instance map. Find-or-insert keyed by `TypeId`; within one
/// cache lifetime at most one instance is ever stored per type, no matter
/// how many resolution paths request it.
#[derive(Default)]
pub(crate) struct InstanceCache {
    entries: DashMap<TypeId, CacheEntry>,
}

impl InstanceCache {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        let entry = self.entries.get(&TypeId::of::<T>())?;
        // Clone out and release the shard before the caller recurses.
        let instance = entry.instance.clone();
        drop(entry);
        instance.downcast::<T>().ok()
    }

    pub(crate) fn insert<T: Send + Sync + 'static>(&self, instance: Arc<T>) {
        let key = TypeKey::of::<T>();
        self.entries.insert(key.id(), CacheEntry {
            key,
            instance,
        });
    }

    pub(crate) fn contains(&self, id: TypeId) -> bool {
        self.entries.contains_key(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Point-in-time snapshot: entry handles (not instances) are copied, so
    /// both caches observe the same already-constructed objects while later
    /// insertions stay private to each side. Entries whose key matches
    /// `exclude` are not inherited.
    pub(crate) fn snapshot(&self, exclude: &dyn Fn(TypeKey) -> bool) -> InstanceCache {
        let entries = DashMap::new();
        for entry in self.entries.iter() {
            if !exclude(entry.value().key) {
                entries.insert(*entry.key(), entry.value().clone());
            }
        }
        InstanceCache { entries }
    }

    /// Copy entries from `donor` that this cache does not already have; on a
    /// key collision the local entry wins and the donor's is discarded.
    pub(crate) fn absorb(&self, donor: &InstanceCache) {
        for entry in donor.entries.iter() {
            self.entries
                .entry(*entry.key())
                .or_insert_with(|| entry.value().clone());
        }
    }

    pub(crate) fn keys(&self) -> Vec<TypeKey> {
        self.entries.iter().map(|e| e.value().key).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_most_one_entry_per_type() {
        let cache = InstanceCache::new();
        cache.insert(Arc::new(1u32));
        cache.insert(Arc::new(2u32));
        assert_eq!(cache.len(), 1);
        assert_eq!(*cache.get::<u32>().unwrap(), 2);
    }

    #[test]
    fn snapshot_is_point_in_time() {
        let cache = InstanceCache::new();
        cache.insert(Arc::new(10u32));

        let snap = cache.snapshot(&|_| false);
        cache.insert(Arc::new(String::from("post-snapshot")));
        snap.insert(Arc::new(5i64));

        assert!(snap.get::<String>().is_none());
        assert!(cache.get::<i64>().is_none());
        // The pre-snapshot instance is the same allocation on both sides.
        assert!(Arc::ptr_eq(
            &cache.get::<u32>().unwrap(),
            &snap.get::<u32>().unwrap()
        ));
    }

    #[test]
    fn snapshot_honors_the_exclusion_predicate() {
        let cache = InstanceCache::new();
        cache.insert(Arc::new(10u32));
        cache.insert(Arc::new(String::from("kept")));

        let snap = cache.snapshot(&|key| key.id() == TypeId::of::<u32>());
        assert!(snap.get::<u32>().is_none());
        assert_eq!(*snap.get::<String>().unwrap(), "kept");
    }

    #[test]
    fn absorb_keeps_local_entries_on_collision() {
        let receiver = InstanceCache::new();
        let donor = InstanceCache::new();
        receiver.insert(Arc::new(1u32));
        donor.insert(Arc::new(2u32));
        donor.insert(Arc::new(String::from("new")));

        receiver.absorb(&donor);
        assert_eq!(*receiver.get::<u32>().unwrap(), 1);
        assert_eq!(*receiver.get::<String>().unwrap(), "new");
    }
}
