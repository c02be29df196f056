//! Dynamic indexer
//!
//! In-memory index kept alongside a blob store: a hash view for O(1) point
//! lookups and an ordered view for prefix/range scans. Both views live
//! behind one mutex and always describe the same key set; metadata is owned
//! by the hash view only, so the two can never skew.
//!
//! The index can be rebuilt from disk (stat fan-out over a worker pool),
//! persisted to a snapshot file for warm restarts, and kept current through
//! `on_put`/`on_remove` notifications from the owning store.

mod snapshot;

use std::collections::{BTreeSet, HashMap};
use std::ops::Bound;
use std::path::PathBuf;
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};

use crossbeam::channel;
use parking_lot::Mutex;

use crate::error::{Result, StoreError};
use crate::fio;
use crate::store::BlobStore;

/// Keys handed to a rebuild worker per channel message
const REBUILD_CHUNK: usize = 1024;

/// Upper bound on rebuild worker threads
const MAX_REBUILD_WORKERS: usize = 8;

/// Metadata tracked per indexed key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlobMeta {
    /// Blob size in bytes (latest version)
    pub size: u64,

    /// Unix timestamp (seconds) of the last index update for this key
    pub mod_time: u64,
}

/// Hash + ordered index over a bucket's keys
pub struct BlobIndexer {
    /// Snapshot file location (`<root>/.blob_index` by default)
    snapshot_path: PathBuf,

    /// Both views, mutated together
    inner: Mutex<Views>,
}

#[derive(Default)]
struct Views {
    /// Single source of truth for per-key metadata
    metas: HashMap<Vec<u8>, BlobMeta>,

    /// The same keys in byte order, for prefix/range scans
    ordered: BTreeSet<Vec<u8>>,
}

impl BlobIndexer {
    /// Create an empty indexer persisting to `snapshot_path`.
    pub fn new(snapshot_path: impl Into<PathBuf>) -> Self {
        Self {
            snapshot_path: snapshot_path.into(),
            inner: Mutex::new(Views::default()),
        }
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Record a put: fresh metadata in the hash view, key in the ordered view.
    pub fn on_put(&self, key: &[u8], size: u64) {
        let meta = BlobMeta {
            size,
            mod_time: now_timestamp(),
        };
        let mut views = self.inner.lock();
        views.metas.insert(key.to_vec(), meta);
        views.ordered.insert(key.to_vec());
    }

    /// Record a removal; no-op if the key was never indexed.
    pub fn on_remove(&self, key: &[u8]) {
        let mut views = self.inner.lock();
        views.metas.remove(key);
        views.ordered.remove(key);
    }

    /// Drop both views. Blobs on disk are untouched.
    pub fn clear(&self) {
        let mut views = self.inner.lock();
        views.metas.clear();
        views.ordered.clear();
    }

    /// Rebuild from disk by listing the bucket and statting every key on a
    /// worker pool. Keys that fail to stat (e.g. removed concurrently) are
    /// skipped.
    pub fn rebuild(&self, store: &BlobStore, bucket: &str) -> Result<()> {
        let keys = store.list(bucket)?;
        let total = keys.len();
        let workers = rebuild_workers(total);

        // Queue every chunk up front and close the channel; workers drain it
        // and exit on their own even if a later spawn fails.
        let (task_tx, task_rx) = channel::unbounded::<Vec<Vec<u8>>>();
        for chunk in keys.chunks(REBUILD_CHUNK) {
            let _ = task_tx.send(chunk.to_vec());
        }
        drop(task_tx);

        let (meta_tx, meta_rx) = channel::unbounded::<(Vec<u8>, BlobMeta)>();

        let collected: Result<Vec<(Vec<u8>, BlobMeta)>> = thread::scope(|scope| {
            for id in 0..workers {
                let task_rx = task_rx.clone();
                let meta_tx = meta_tx.clone();
                thread::Builder::new()
                    .name(format!("shardstore-rebuild-{id}"))
                    .spawn_scoped(scope, move || {
                        for chunk in task_rx {
                            for key in chunk {
                                match store.size_of(bucket, &key, None) {
                                    Ok(size) => {
                                        let meta = BlobMeta {
                                            size,
                                            mod_time: now_timestamp(),
                                        };
                                        if meta_tx.send((key, meta)).is_err() {
                                            return;
                                        }
                                    }
                                    Err(e) => {
                                        tracing::debug!(error = %e, "rebuild: skipping key");
                                    }
                                }
                            }
                        }
                    })?;
            }
            drop(meta_tx);
            drop(task_rx);

            Ok(meta_rx.into_iter().collect())
        });

        let metas = collected?;
        let mut views = self.inner.lock();
        views.metas.clear();
        views.ordered.clear();
        for (key, meta) in metas {
            views.ordered.insert(key.clone());
            views.metas.insert(key, meta);
        }
        tracing::debug!(bucket, total, indexed = views.metas.len(), "index rebuilt");
        Ok(())
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Persist both views to the snapshot file (atomic write).
    pub fn save_snapshot(&self) -> Result<()> {
        let encoded = {
            let views = self.inner.lock();
            snapshot::encode(&views.metas, &views.ordered)
        };
        fio::write_atomic(&self.snapshot_path, &encoded)
    }

    /// Load the snapshot file, replacing both views. Returns `Ok(false)` if
    /// the file does not exist; a malformed snapshot is `Corruption`.
    pub fn load_snapshot(&self) -> Result<bool> {
        let bytes = match fio::read_all(&self.snapshot_path) {
            Ok(b) => b,
            Err(StoreError::NotFound) => return Ok(false),
            Err(e) => return Err(e),
        };
        let records = snapshot::decode(&bytes)?;
        let mut views = self.inner.lock();
        views.metas.clear();
        views.ordered.clear();
        for (key, meta) in records {
            views.ordered.insert(key.clone());
            views.metas.insert(key, meta);
        }
        Ok(true)
    }

    // =========================================================================
    // Point Lookups
    // =========================================================================

    /// O(1) existence check against the hash view.
    pub fn exists(&self, key: &[u8]) -> bool {
        self.inner.lock().metas.contains_key(key)
    }

    /// Metadata for a key, if indexed.
    pub fn get_meta(&self, key: &[u8]) -> Option<BlobMeta> {
        self.inner.lock().metas.get(key).copied()
    }

    /// Number of indexed keys.
    pub fn count(&self) -> usize {
        self.inner.lock().metas.len()
    }

    /// Sum of indexed blob sizes.
    pub fn total_bytes(&self) -> u64 {
        self.inner.lock().metas.values().map(|m| m.size).sum()
    }

    // =========================================================================
    // Range Scans
    // =========================================================================

    /// All keys in ascending order. The result is a snapshot; the lock is
    /// released before it is returned.
    pub fn all_keys(&self) -> Vec<Vec<u8>> {
        self.inner.lock().ordered.iter().cloned().collect()
    }

    /// Keys beginning with `prefix`, ascending.
    pub fn keys_with_prefix(&self, prefix: &[u8]) -> Vec<Vec<u8>> {
        let views = self.inner.lock();
        views
            .ordered
            .range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|k| k.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Keys in `[start, end)`, ascending. Empty when `start >= end`.
    pub fn keys_in_range(&self, start: &[u8], end: &[u8]) -> Vec<Vec<u8>> {
        if start >= end {
            return Vec::new();
        }
        let views = self.inner.lock();
        views
            .ordered
            .range::<[u8], _>((Bound::Included(start), Bound::Excluded(end)))
            .cloned()
            .collect()
    }
}

fn rebuild_workers(total_keys: usize) -> usize {
    let cores = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);
    cores.min(MAX_REBUILD_WORKERS).min(total_keys.max(1))
}

fn now_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
