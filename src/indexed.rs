//! Indexed store facade
//!
//! Composition of a [`BlobStore`] and a [`BlobIndexer`] over one fixed
//! bucket. Writes go through the store first and update the index only on
//! success, so the index never claims a key the store does not hold.
//! Reads go straight to the store; existence and metadata queries are
//! answered from memory.

use std::path::{Path, PathBuf};

use crate::config::{StoreConfig, DEFAULT_INDEX_FILE};
use crate::error::{Result, StoreError};
use crate::index::{BlobIndexer, BlobMeta};
use crate::store::BlobStore;

/// Blob store with automatic index maintenance for one bucket
pub struct IndexedStore {
    store: BlobStore,
    bucket: String,
    indexer: BlobIndexer,
}

impl IndexedStore {
    /// Create a facade over `root`/`bucket` with default configuration.
    pub fn new(root: impl Into<PathBuf>, bucket: impl Into<String>) -> Self {
        let root = root.into();
        Self {
            indexer: BlobIndexer::new(root.join(DEFAULT_INDEX_FILE)),
            store: BlobStore::new(root),
            bucket: bucket.into(),
        }
    }

    /// Create a facade from a config (root, retention, snapshot file name).
    pub fn with_config(config: &StoreConfig, bucket: impl Into<String>) -> Self {
        Self {
            indexer: BlobIndexer::new(config.index_path()),
            store: BlobStore::with_config(config),
            bucket: bucket.into(),
        }
    }

    /// Create the bucket, then warm the index: load the snapshot if one
    /// exists, rebuild from disk otherwise (or when the snapshot is corrupt).
    pub fn init(&self) -> Result<()> {
        self.store.init(&self.bucket)?;
        match self.indexer.load_snapshot() {
            Ok(true) => Ok(()),
            Ok(false) => self.indexer.rebuild(&self.store, &self.bucket),
            Err(e) => {
                tracing::warn!(error = %e, "index snapshot unusable, rebuilding");
                self.indexer.rebuild(&self.store, &self.bucket)
            }
        }
    }

    /// Store a blob and index it. Keys containing tab or newline are
    /// rejected: the snapshot format is line- and tab-delimited.
    pub fn put(&self, key: &[u8], data: &[u8]) -> Result<()> {
        if key.iter().any(|&b| b == b'\t' || b == b'\n') {
            return Err(StoreError::InvalidArgument(
                "key contains tab or newline".to_string(),
            ));
        }
        self.store.put(&self.bucket, key, data, None)?;
        self.indexer.on_put(key, data.len() as u64);
        Ok(())
    }

    /// Read the latest version of a key.
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        self.store.get(&self.bucket, key, None)
    }

    /// Remove all versions of a key; the index entry goes away only when the
    /// store actually removed something.
    pub fn remove(&self, key: &[u8]) -> Result<bool> {
        let removed = self.store.remove(&self.bucket, key, None)?;
        if removed {
            self.indexer.on_remove(key);
        }
        Ok(removed)
    }

    // =========================================================================
    // Indexed Lookups
    // =========================================================================

    pub fn exists(&self, key: &[u8]) -> bool {
        self.indexer.exists(key)
    }

    pub fn get_meta(&self, key: &[u8]) -> Option<BlobMeta> {
        self.indexer.get_meta(key)
    }

    pub fn count(&self) -> usize {
        self.indexer.count()
    }

    pub fn total_bytes(&self) -> u64 {
        self.indexer.total_bytes()
    }

    /// All indexed keys, ascending.
    pub fn list(&self) -> Vec<Vec<u8>> {
        self.indexer.all_keys()
    }

    pub fn keys_with_prefix(&self, prefix: &[u8]) -> Vec<Vec<u8>> {
        self.indexer.keys_with_prefix(prefix)
    }

    pub fn keys_in_range(&self, start: &[u8], end: &[u8]) -> Vec<Vec<u8>> {
        self.indexer.keys_in_range(start, end)
    }

    // =========================================================================
    // Operational Control
    // =========================================================================

    /// Persist the index snapshot.
    pub fn save_index(&self) -> Result<()> {
        self.indexer.save_snapshot()
    }

    /// Load the index snapshot; `Ok(false)` when none exists.
    pub fn load_index(&self) -> Result<bool> {
        self.indexer.load_snapshot()
    }

    /// Rebuild the index from disk.
    pub fn rebuild_index(&self) -> Result<()> {
        self.indexer.rebuild(&self.store, &self.bucket)
    }

    /// Direct access to the underlying store
    pub fn store(&self) -> &BlobStore {
        &self.store
    }

    /// Direct access to the indexer
    pub fn indexer(&self) -> &BlobIndexer {
        &self.indexer
    }

    /// The bucket this facade operates on
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Root directory of the underlying store
    pub fn root(&self) -> &Path {
        self.store.root()
    }
}
