//! Cache Store Module
//!
//! The concurrent key-value container the TTL layer writes through to.
//! [`ConcurrentStore`] names the capabilities the cache relies on;
//! [`ShardedStore`] provides them on top of a sharded `DashMap`.

use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use dashmap::DashMap;
use tracing::{debug, warn};

// == Store Trait ==
/// Thread-safe associative container with no notion of expiry.
///
/// Every method takes `&self`; implementations must lock per key (or per
/// shard), never across the whole map.
pub trait ConcurrentStore<K, V>: Send + Sync + 'static {
    /// Returns a copy of the value stored under `key`.
    fn get(&self, key: &K) -> Option<V>
    where
        V: Clone;

    /// Inserts or overwrites the value under `key`.
    fn set(&self, key: K, value: V);

    /// Removes `key`. Returns whether anything was removed.
    fn delete(&self, key: &K) -> bool;

    /// Runs `f` against the live slot for `key` while holding its lock.
    ///
    /// Returns `None` without calling `f` when the key is absent. Mutations
    /// made by `f` are visible to every later reader.
    fn update_if_present<R>(&self, key: &K, f: impl FnOnce(&mut V) -> R) -> Option<R>;

    /// Runs `f` against the value for `key` under a shared lock.
    ///
    /// Concurrent readers of the same slot do not block each other.
    fn read_if_present<R>(&self, key: &K, f: impl FnOnce(&V) -> R) -> Option<R>;

    /// Removes `key` only if `pred` holds for its current value, evaluated
    /// under the slot's lock.
    fn remove_if(&self, key: &K, pred: impl FnOnce(&V) -> bool) -> bool;

    /// Visits entries in place until `visitor` returns `false`.
    ///
    /// The visitor runs while locks are held and must not call back into
    /// the same store. Use [`for_each_while`](Self::for_each_while) for
    /// caller-supplied visitors.
    fn scan_while(&self, visitor: impl FnMut(&K, &V) -> bool);

    /// Visits copies of the entries until `visitor` returns `false`.
    ///
    /// No lock is held while `visitor` runs, so it may read or write the
    /// same store. Iteration is weakly consistent: concurrent writes may or
    /// may not be observed.
    fn for_each_while(&self, visitor: impl FnMut(&K, &V) -> bool)
    where
        K: Clone,
        V: Clone;

    /// Number of stored entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Occupied slots as a percentage of allocated capacity.
    fn fill_rate(&self) -> usize;

    /// Starts growing capacity to at least `target` entries and returns
    /// without waiting. A call made while a resize is running is ignored.
    fn grow(&self, target: usize);
}

// == Sharded Store ==
/// Default store: a `DashMap` plus a flag guarding background resizes.
pub struct ShardedStore<K, V> {
    map: Arc<DashMap<K, V>>,
    growing: Arc<AtomicBool>,
}

impl<K, V> ShardedStore<K, V>
where
    K: Eq + Hash,
{
    // == Constructor ==
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a store pre-sized for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: Arc::new(DashMap::with_capacity(capacity)),
            growing: Arc::new(AtomicBool::new(false)),
        }
    }

    // == Capacity ==
    /// Entries the store can hold without reallocating.
    pub fn capacity(&self) -> usize {
        self.map.capacity()
    }
}

impl<K, V> fmt::Debug for ShardedStore<K, V>
where
    K: Eq + Hash,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardedStore")
            .field("len", &self.map.len())
            .field("capacity", &self.map.capacity())
            .field("growing", &self.growing.load(Ordering::Relaxed))
            .finish()
    }
}

impl<K, V> Default for ShardedStore<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> ConcurrentStore<K, V> for ShardedStore<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.map.get(key).map(|slot| slot.value().clone())
    }

    fn set(&self, key: K, value: V) {
        self.map.insert(key, value);
    }

    fn delete(&self, key: &K) -> bool {
        self.map.remove(key).is_some()
    }

    fn update_if_present<R>(&self, key: &K, f: impl FnOnce(&mut V) -> R) -> Option<R> {
        self.map.get_mut(key).map(|mut slot| f(slot.value_mut()))
    }

    fn read_if_present<R>(&self, key: &K, f: impl FnOnce(&V) -> R) -> Option<R> {
        self.map.get(key).map(|slot| f(slot.value()))
    }

    fn remove_if(&self, key: &K, pred: impl FnOnce(&V) -> bool) -> bool {
        self.map.remove_if(key, |_, value| pred(value)).is_some()
    }

    fn scan_while(&self, mut visitor: impl FnMut(&K, &V) -> bool) {
        for slot in self.map.iter() {
            if !visitor(slot.key(), slot.value()) {
                break;
            }
        }
    }

    fn for_each_while(&self, mut visitor: impl FnMut(&K, &V) -> bool)
    where
        K: Clone,
        V: Clone,
    {
        // Copy one shard at a time and release its lock before visiting
        for shard in self.map.shards() {
            let batch: Vec<(K, V)> = shard
                .read()
                .iter()
                .map(|(key, value)| (key.clone(), value.get().clone()))
                .collect();

            for (key, value) in &batch {
                if !visitor(key, value) {
                    return;
                }
            }
        }
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn fill_rate(&self) -> usize {
        let capacity = self.map.capacity();
        if capacity == 0 {
            0
        } else {
            self.map.len() * 100 / capacity
        }
    }

    fn grow(&self, target: usize) {
        if self.map.capacity() >= target {
            return;
        }

        if self
            .growing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(target, "Resize already in progress, ignoring grow request");
            return;
        }

        let map = Arc::clone(&self.map);
        let flag = GrowFlag(Arc::clone(&self.growing));

        let spawned = thread::Builder::new()
            .name("ttlcache-grow".to_string())
            .spawn(move || {
                let _flag = flag;
                reserve_shards(&map, target);
                debug!(target, capacity = map.capacity(), "Store resize finished");
            });

        // On spawn failure the closure, and the flag guard with it, is dropped.
        if let Err(err) = spawned {
            warn!("Failed to start store resize: {}", err);
        }
    }
}

/// Clears the in-progress flag when the resize ends, even by panic.
struct GrowFlag(Arc<AtomicBool>);

impl Drop for GrowFlag {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Reserves room in every shard so the map holds at least `target` entries.
fn reserve_shards<K, V>(map: &DashMap<K, V>, target: usize)
where
    K: Eq + Hash,
{
    let shards = map.shards();
    let per_shard = target.div_ceil(shards.len());

    for shard in shards {
        let mut guard = shard.write();
        let additional = per_shard.saturating_sub(guard.len());
        guard.reserve(additional);
    }
}
