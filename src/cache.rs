//! LRU byte cache
//!
//! Bounded by a byte budget rather than an entry count. Payloads are handed
//! out as `Arc<Vec<u8>>` so readers can keep a result alive past eviction.
//! All mutations are serialized by a single mutex.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::Mutex;

/// Byte-budgeted LRU cache keyed by raw key bytes
pub struct LruCache {
    /// Byte budget; eviction keeps `current_bytes <= max_bytes`
    max_bytes: usize,

    /// Map + recency order, mutated together under one lock
    inner: Mutex<Inner>,
}

struct Inner {
    /// key -> payload + recency tick
    entries: HashMap<Vec<u8>, Entry>,

    /// recency tick -> key; smallest tick is the eviction candidate
    order: BTreeMap<u64, Vec<u8>>,

    /// Sum of payload sizes currently held
    current_bytes: usize,

    /// Monotone counter; a fresh tick on every insert and hit
    next_tick: u64,
}

struct Entry {
    data: Arc<Vec<u8>>,
    tick: u64,
}

impl LruCache {
    /// Create a cache with the given byte budget
    pub fn new(max_bytes: usize) -> Self {
        Self {
            max_bytes,
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                order: BTreeMap::new(),
                current_bytes: 0,
                next_tick: 0,
            }),
        }
    }

    /// Look up a key, marking it most recently used on a hit
    pub fn get(&self, key: &[u8]) -> Option<Arc<Vec<u8>>> {
        let mut inner = self.inner.lock();
        let tick = inner.bump_tick();
        let entry = inner.entries.get_mut(key)?;
        let old_tick = entry.tick;
        entry.tick = tick;
        let data = Arc::clone(&entry.data);
        inner.order.remove(&old_tick);
        inner.order.insert(tick, key.to_vec());
        Some(data)
    }

    /// Insert or replace a key's payload, then evict least-recently-used
    /// entries until the byte budget holds
    pub fn put(&self, key: &[u8], data: Arc<Vec<u8>>) {
        let mut inner = self.inner.lock();
        inner.remove(key);
        let tick = inner.bump_tick();
        inner.current_bytes += data.len();
        inner.order.insert(tick, key.to_vec());
        inner.entries.insert(key.to_vec(), Entry { data, tick });
        while inner.current_bytes > self.max_bytes {
            if !inner.evict_oldest() {
                break;
            }
        }
    }

    /// Drop a key if cached; no-op otherwise
    pub fn invalidate(&self, key: &[u8]) {
        self.inner.lock().remove(key);
    }

    /// Drop everything
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
        inner.current_bytes = 0;
    }

    /// Bytes currently held
    pub fn current_bytes(&self) -> usize {
        self.inner.lock().current_bytes
    }

    /// Configured byte budget
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// True if nothing is cached
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Inner {
    fn bump_tick(&mut self) -> u64 {
        let tick = self.next_tick;
        self.next_tick += 1;
        tick
    }

    fn remove(&mut self, key: &[u8]) {
        if let Some(entry) = self.entries.remove(key) {
            self.current_bytes -= entry.data.len();
            self.order.remove(&entry.tick);
        }
    }

    fn evict_oldest(&mut self) -> bool {
        let Some((&tick, _)) = self.order.first_key_value() else {
            return false;
        };
        let key = self.order.remove(&tick).unwrap_or_default();
        if let Some(entry) = self.entries.remove(&key) {
            self.current_bytes -= entry.data.len();
        }
        true
    }
}
