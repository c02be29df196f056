//! Configuration for ShardStore
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Number of versions retained per key unless configured otherwise.
pub const DEFAULT_KEEP_VERSIONS: usize = 3;

/// Default byte budget for the LRU read cache.
pub const DEFAULT_CACHE_BYTES: usize = 64 * 1024 * 1024;

/// File name of the persisted index snapshot, relative to the store root.
pub const DEFAULT_INDEX_FILE: &str = ".blob_index";

/// Main configuration for a ShardStore instance
#[derive(Debug, Clone)]
pub struct StoreConfig {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory holding all buckets
    pub root: PathBuf,

    /// How many versions of a key survive a put (lexicographically greatest)
    pub keep_versions: usize,

    // -------------------------------------------------------------------------
    // Cache Configuration
    // -------------------------------------------------------------------------
    /// Byte budget for the LRU read cache
    pub cache_bytes: usize,

    // -------------------------------------------------------------------------
    // Index Configuration
    // -------------------------------------------------------------------------
    /// Snapshot file name, relative to `root`
    pub index_file: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./shardstore_data"),
            keep_versions: DEFAULT_KEEP_VERSIONS,
            cache_bytes: DEFAULT_CACHE_BYTES,
            index_file: DEFAULT_INDEX_FILE.to_string(),
        }
    }
}

impl StoreConfig {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Absolute path of the index snapshot file.
    pub fn index_path(&self) -> PathBuf {
        self.root.join(&self.index_file)
    }
}

/// Builder for StoreConfig
#[derive(Default)]
pub struct ConfigBuilder {
    config: StoreConfig,
}

impl ConfigBuilder {
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.root = root.into();
        self
    }

    /// Retained version count. Values below 1 are clamped to 1 — a put must
    /// never reap the version it just wrote.
    pub fn keep_versions(mut self, keep: usize) -> Self {
        self.config.keep_versions = keep.max(1);
        self
    }

    pub fn cache_bytes(mut self, bytes: usize) -> Self {
        self.config.cache_bytes = bytes;
        self
    }

    pub fn index_file(mut self, name: impl Into<String>) -> Self {
        self.config.index_file = name.into();
        self
    }

    pub fn build(self) -> StoreConfig {
        self.config
    }
}
