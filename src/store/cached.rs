//! Cached blob store
//!
//! Read-through LRU wrapper around [`BlobStore`] for read-heavy workloads.
//! Writes and removals invalidate the cached payload; reads fill the cache
//! and hand out shared payloads.

use std::path::PathBuf;
use std::sync::Arc;

use crate::cache::LruCache;
use crate::error::Result;
use crate::store::BlobStore;

/// A [`BlobStore`] bound to one bucket with an LRU read cache in front
pub struct CachedStore {
    store: BlobStore,
    bucket: String,
    cache: LruCache,
}

impl CachedStore {
    /// Create a cached store over `root`/`bucket` with the given cache budget.
    pub fn new(root: impl Into<PathBuf>, bucket: impl Into<String>, cache_bytes: usize) -> Self {
        Self {
            store: BlobStore::new(root),
            bucket: bucket.into(),
            cache: LruCache::new(cache_bytes),
        }
    }

    /// Ensure the bucket exists.
    pub fn init(&self) -> Result<()> {
        self.store.init(&self.bucket)
    }

    /// Write through to the store and drop any stale cached payload.
    pub fn put(&self, key: &[u8], data: &[u8]) -> Result<()> {
        self.store.put(&self.bucket, key, data, None)?;
        self.cache.invalidate(key);
        Ok(())
    }

    /// Read the latest version, serving from cache when possible.
    pub fn get(&self, key: &[u8]) -> Result<Arc<Vec<u8>>> {
        if let Some(hit) = self.cache.get(key) {
            return Ok(hit);
        }
        let data = Arc::new(self.store.get(&self.bucket, key, None)?);
        self.cache.put(key, Arc::clone(&data));
        Ok(data)
    }

    /// Remove all versions of a key, invalidating the cache first.
    pub fn remove(&self, key: &[u8]) -> Result<bool> {
        self.cache.invalidate(key);
        self.store.remove(&self.bucket, key, None)
    }

    pub fn exists(&self, key: &[u8]) -> Result<bool> {
        self.store.exists(&self.bucket, key)
    }

    pub fn list(&self) -> Result<Vec<Vec<u8>>> {
        self.store.list(&self.bucket)
    }

    pub fn size_of(&self, key: &[u8]) -> Result<u64> {
        self.store.size_of(&self.bucket, key, None)
    }

    /// Direct access to the underlying store
    pub fn store(&self) -> &BlobStore {
        &self.store
    }

    /// Direct access to the cache
    pub fn cache(&self) -> &LruCache {
        &self.cache
    }
}
