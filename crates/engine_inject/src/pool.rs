//! The shared instance pool.
//!
//! Holds the single instance of every injectable type. Startup tasks insert
//! into it concurrently, so it is backed by a [`DashMap`] and insertion goes
//! through the entry API: a type is constructed at most once no matter how
//! many tasks race for it.

use std::any::TypeId;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::error::InjectError;
use crate::injectable::{Injectable, Instance, TypeKey, downcast_instance};

/// One pooled instance and the order in which it was discovered.
#[derive(Clone)]
pub struct PoolEntry {
    pub key: TypeKey,
    pub instance: Instance,
    /// Discovery order. Eager registrations use their registration index;
    /// lazily constructed instances are numbered after all of them.
    pub seq: usize,
}

impl std::fmt::Debug for PoolEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolEntry")
            .field("key", &self.key.name)
            .field("seq", &self.seq)
            .finish()
    }
}

/// Append-only, concurrently writable set of instances keyed by type.
#[derive(Debug, Default)]
pub struct InstancePool {
    entries: DashMap<TypeId, PoolEntry>,
    next_seq: AtomicUsize,
}

impl InstancePool {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start numbering lazily discovered instances at `seq`.
    pub fn reserve_from(&self, seq: usize) {
        self.next_seq.fetch_max(seq, Ordering::SeqCst);
    }

    /// Take a discovery number for an instance found after the eager ones.
    pub fn reserve_seq(&self) -> usize {
        self.next_seq.fetch_add(1, Ordering::SeqCst)
    }

    /// Return the instance of `key`, constructing and inserting it if absent.
    ///
    /// `construct` runs while the map shard is locked and must not touch the
    /// pool. The flag is `true` when this call created the instance.
    pub fn get_or_insert_with(
        &self,
        key: TypeKey,
        seq: usize,
        construct: impl FnOnce() -> Instance,
    ) -> (Instance, bool) {
        match self.entries.entry(key.id) {
            Entry::Occupied(occupied) => (Arc::clone(&occupied.get().instance), false),
            Entry::Vacant(vacant) => {
                let instance = construct();
                vacant.insert(PoolEntry {
                    key,
                    instance: Arc::clone(&instance),
                    seq,
                });
                (instance, true)
            }
        }
    }

    /// Insert a pre-built instance. Returns `false` if its type is already
    /// pooled, in which case the existing instance is kept.
    pub fn insert(&self, instance: Instance) -> bool {
        let key = instance.type_key();
        match self.entries.entry(key.id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                let seq = self.reserve_seq();
                vacant.insert(PoolEntry { key, instance, seq });
                true
            }
        }
    }

    #[must_use]
    pub fn get(&self, id: TypeId) -> Option<Instance> {
        self.entries.get(&id).map(|entry| Arc::clone(&entry.instance))
    }

    #[must_use]
    pub fn contains(&self, id: TypeId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Fetch the single instance of `T`.
    ///
    /// # Errors
    ///
    /// Returns [`InjectError::NotInstantiated`] if `T` is not pooled.
    pub fn resolve<T: Injectable>(&self) -> Result<Arc<T>, InjectError> {
        self.get(TypeId::of::<T>())
            .as_ref()
            .and_then(downcast_instance::<T>)
            .ok_or(InjectError::NotInstantiated {
                required: std::any::type_name::<T>(),
            })
    }

    /// All entries in discovery order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<PoolEntry> {
        let mut entries: Vec<PoolEntry> = self
            .entries
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        entries.sort_by_key(|entry| entry.seq);
        entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Alpha;
    impl Injectable for Alpha {}

    #[derive(Default)]
    struct Beta;
    impl Injectable for Beta {}

    #[test]
    fn test_get_or_insert_is_idempotent() {
        let pool = InstancePool::new();
        let key = TypeKey::of::<Alpha>();
        let (first, created) = pool.get_or_insert_with(key, 0, || Arc::new(Alpha));
        assert!(created);
        let (second, created) = pool.get_or_insert_with(key, 1, || Arc::new(Alpha));
        assert!(!created);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_insert_keeps_existing() {
        let pool = InstancePool::new();
        assert!(pool.insert(Arc::new(Alpha)));
        assert!(!pool.insert(Arc::new(Alpha)));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_resolve() {
        let pool = InstancePool::new();
        pool.insert(Arc::new(Alpha));
        assert!(pool.resolve::<Alpha>().is_ok());
        assert!(matches!(
            pool.resolve::<Beta>(),
            Err(InjectError::NotInstantiated { .. })
        ));
    }

    #[test]
    fn test_snapshot_orders_by_seq() {
        let pool = InstancePool::new();
        pool.get_or_insert_with(TypeKey::of::<Beta>(), 5, || Arc::new(Beta));
        pool.get_or_insert_with(TypeKey::of::<Alpha>(), 2, || Arc::new(Alpha));
        let names: Vec<_> = pool.snapshot().iter().map(|e| e.key.short_name()).collect();
        assert_eq!(names, vec!["Alpha", "Beta"]);
    }

    #[test]
    fn test_reserve_from_moves_counter_forward() {
        let pool = InstancePool::new();
        pool.reserve_from(10);
        assert_eq!(pool.reserve_seq(), 10);
        assert_eq!(pool.reserve_seq(), 11);
        pool.reserve_from(3);
        assert_eq!(pool.reserve_seq(), 12);
    }

    #[test]
    fn test_concurrent_insertion_constructs_once() {
        use std::sync::atomic::AtomicUsize;

        static CONSTRUCTED: AtomicUsize = AtomicUsize::new(0);
        let pool = Arc::new(InstancePool::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let pool = Arc::clone(&pool);
                std::thread::spawn(move || {
                    pool.get_or_insert_with(TypeKey::of::<Alpha>(), i, || {
                        CONSTRUCTED.fetch_add(1, Ordering::SeqCst);
                        Arc::new(Alpha)
                    })
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(CONSTRUCTED.load(Ordering::SeqCst), 1);
        assert_eq!(pool.len(), 1);
    }
}
