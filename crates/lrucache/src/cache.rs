//! LruCache: fixed-capacity cache with least-recently-used eviction

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use ahash::RandomState;
use dlist::{InvariantError, List, NodeId};
use parking_lot::RwLock;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::stats::CacheStats;

/// Upper bound on entries reserved up front; larger caches grow on demand
const PREALLOC_LIMIT: usize = 4096;

/// Key/value pair stored in a recency list node
struct Entry<K, V> {
    key: K,
    value: V,
}

/// State guarded by the cache lock
struct Inner<K, V> {
    /// Front = most recently used, back = least recently used
    list: List<Entry<K, V>>,

    /// Key -> node holding that key
    map: HashMap<K, NodeId, RandomState>,
}

impl<K, V> Inner<K, V> {
    fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.min(PREALLOC_LIMIT);
        Self {
            list: List::with_capacity(capacity),
            map: HashMap::with_capacity_and_hasher(capacity, RandomState::new()),
        }
    }
}

/// Thread-safe LRU cache with fixed capacity
///
/// Share it between threads with `Arc<LruCache<K, V>>`. `set`, `get`,
/// `remove` and `clear` hold the lock exclusively for their whole duration.
pub struct LruCache<K, V> {
    inner: RwLock<Inner<K, V>>,

    /// Cache statistics
    stats: CacheStats,

    /// Maximum number of entries
    capacity: usize,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// Create a new cache, or `None` if `capacity` is less than 1
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of entries; any integer type
    pub fn new<C: TryInto<usize>>(capacity: C) -> Option<Self> {
        Self::try_new(capacity).ok()
    }

    /// Create a new cache, failing with [`Error::InvalidCapacity`] if
    /// `capacity` is less than 1
    pub fn try_new<C: TryInto<usize>>(capacity: C) -> Result<Self> {
        let capacity = match capacity.try_into() {
            Ok(capacity) if capacity >= 1 => capacity,
            _ => {
                warn!("Rejecting LRU cache with non-positive capacity");
                return Err(Error::InvalidCapacity);
            }
        };

        debug!(capacity, "Created LRU cache");

        Ok(Self {
            inner: RwLock::new(Inner::with_capacity(capacity)),
            stats: CacheStats::new(),
            capacity,
        })
    }

    /// Insert or overwrite `key`, making it the most recently used entry
    ///
    /// Inserting a new key into a full cache evicts the least recently used
    /// entry.
    ///
    /// # Returns
    /// * `bool` - `true` if `key` was already present
    pub fn set(&self, key: K, value: V) -> bool {
        let mut guard = self.inner.write();
        let inner = &mut *guard;

        if let Some(&id) = inner.map.get(&key) {
            if let Some(entry) = inner.list.get_mut(id) {
                entry.value = value;
            }
            inner.list.move_to_front(id);
            self.stats.record_update();
            return true;
        }

        let id = inner.list.push_front(Entry {
            key: key.clone(),
            value,
        });
        inner.map.insert(key, id);
        self.stats.record_insert();

        if inner.list.len() > self.capacity {
            if let Some(evicted) = inner.list.pop_back() {
                inner.map.remove(&evicted.key);
                self.stats.record_eviction();
                trace!(capacity = self.capacity, "Evicted least recently used entry");
            }
        }

        false
    }

    /// Get the value for `key`, making it the most recently used entry
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut guard = self.inner.write();
        let inner = &mut *guard;

        let Some(&id) = inner.map.get(key) else {
            self.stats.record_miss();
            return None;
        };

        inner.list.move_to_front(id);
        self.stats.record_hit();
        inner.list.get(id).map(|entry| entry.value.clone())
    }

    /// Get the value for `key` without changing its recency
    pub fn peek<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let inner = self.inner.read();
        let id = *inner.map.get(key)?;
        inner.list.get(id).map(|entry| entry.value.clone())
    }

    /// Check if `key` is present without changing its recency
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.read().map.contains_key(key)
    }

    /// Remove `key` and return its value
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut guard = self.inner.write();
        let inner = &mut *guard;

        let id = inner.map.remove(key)?;
        inner.list.remove(id).map(|entry| entry.value)
    }

    /// Remove every entry; capacity is unchanged
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        let discarded = inner.map.len();
        *inner = Inner::with_capacity(self.capacity);
        debug!(discarded, "Cleared LRU cache");
    }

    /// Keys ordered from most to least recently used
    pub fn keys(&self) -> Vec<K> {
        self.inner
            .read()
            .list
            .iter()
            .map(|entry| entry.key.clone())
            .collect()
    }

    /// Get current number of entries
    pub fn len(&self) -> usize {
        self.inner.read().map.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.inner.read().map.is_empty()
    }

    /// Get cache capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Verify that the map and the recency list describe the same entries
    /// and that the cache is within capacity
    pub fn check_invariants(&self) -> std::result::Result<(), InvariantError> {
        let inner = self.inner.read();
        inner.list.check_invariants()?;

        if inner.map.len() != inner.list.len() {
            return Err(InvariantError::new(format!(
                "map holds {} keys but list holds {} nodes",
                inner.map.len(),
                inner.list.len()
            )));
        }
        if inner.list.len() > self.capacity {
            return Err(InvariantError::new(format!(
                "{} entries exceed capacity {}",
                inner.list.len(),
                self.capacity
            )));
        }

        let consistent = inner
            .map
            .iter()
            .all(|(key, &id)| inner.list.get(id).is_some_and(|entry| entry.key == *key));
        if !consistent {
            return Err(InvariantError::new("map entry points at a node with another key"));
        }

        Ok(())
    }
}
