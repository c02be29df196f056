//! Blob store
//!
//! Bucketed, content-sharded key→bytes storage with bounded multi-version
//! retention and durable atomic writes.
//!
//! ## Responsibilities
//! - Bucket lifecycle (init is idempotent; buckets are never implicitly deleted)
//! - Versioned put/get/remove with atomic file visibility
//! - Key and version enumeration straight off the directory tree
//! - Reaping versions beyond the retention limit after each put
//!
//! The store itself is stateless apart from its root path; every operation
//! resolves paths through the codec in [`crate::path`] and touches the
//! filesystem directly. Concurrent readers are safe under rename atomicity;
//! concurrent writers to the same key are the caller's responsibility.

mod cached;
mod mapped;

pub use cached::CachedStore;
pub use mapped::MappedBlob;

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{StoreConfig, DEFAULT_KEEP_VERSIONS};
use crate::error::{Result, StoreError};
use crate::{fio, path};

/// Bucketed blob storage rooted at a single directory
pub struct BlobStore {
    /// Root directory holding all buckets
    root: PathBuf,

    /// Versions retained per key after a put
    keep_versions: usize,
}

impl BlobStore {
    /// Create a store handle with default retention. No I/O happens until
    /// `init` or the first operation.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            keep_versions: DEFAULT_KEEP_VERSIONS,
        }
    }

    /// Create a store handle from a config (root + retention).
    pub fn with_config(config: &StoreConfig) -> Self {
        Self {
            root: config.root.clone(),
            keep_versions: config.keep_versions.max(1),
        }
    }

    /// Root directory of this store
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Ensure the root and the bucket's data directory exist, and sweep any
    /// temp sidecars left behind by a crashed writer. Idempotent.
    pub fn init(&self, bucket: &str) -> Result<()> {
        let data = self.data_dir(bucket)?;
        fs::create_dir_all(&data)?;
        let swept = fio::sweep_temps(&data)?;
        if swept > 0 {
            tracing::debug!(bucket, swept, "removed orphaned temp files");
        }
        Ok(())
    }

    /// Store a blob under (bucket, key, version). `None` (or `Some("")`)
    /// writes the unversioned file. After the write lands, versions beyond
    /// the retention limit are unlinked best-effort.
    pub fn put(
        &self,
        bucket: &str,
        key: &[u8],
        data: &[u8],
        version: Option<&str>,
    ) -> Result<()> {
        let path = self.blob_path(bucket, key, version)?;
        fio::write_atomic(&path, data)?;
        self.reap_versions(bucket, key);
        Ok(())
    }

    /// Fetch a blob. An absent version (`None`/`Some("")`) resolves to the
    /// lexicographically greatest existing version. Fails with `NotFound`
    /// when the key (or the requested version) does not exist.
    pub fn get(&self, bucket: &str, key: &[u8], version: Option<&str>) -> Result<Vec<u8>> {
        let path = self.resolve_path(bucket, key, version)?;
        fio::read_all(&path)
    }

    /// Read a local file and store its contents under the key.
    pub fn put_from_file(
        &self,
        bucket: &str,
        key: &[u8],
        file: &Path,
        version: Option<&str>,
    ) -> Result<()> {
        let data = fio::read_all(file)?;
        self.put(bucket, key, &data, version)
    }

    /// Fetch a blob and write it atomically to a local file.
    pub fn get_to_file(
        &self,
        bucket: &str,
        key: &[u8],
        file: &Path,
        version: Option<&str>,
    ) -> Result<()> {
        let data = self.get(bucket, key, version)?;
        fio::write_atomic(file, &data)
    }

    /// Remove one version (`Some(v)`) or every version (`None`) of a key.
    /// Returns whether anything was removed.
    pub fn remove(&self, bucket: &str, key: &[u8], version: Option<&str>) -> Result<bool> {
        match normalize_version(version) {
            Some(v) => {
                let path = self.blob_path(bucket, key, Some(v))?;
                match fs::remove_file(&path) {
                    Ok(()) => Ok(true),
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
                    Err(e) => Err(StoreError::Io(e)),
                }
            }
            None => {
                let mut any = false;
                for v in self.list_versions(bucket, key)? {
                    let path = self.blob_path(bucket, key, some_if_nonempty(&v))?;
                    match fs::remove_file(&path) {
                        Ok(()) => any = true,
                        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                        Err(e) => return Err(StoreError::Io(e)),
                    }
                }
                Ok(any)
            }
        }
    }

    /// True iff at least one version of the key exists.
    pub fn exists(&self, bucket: &str, key: &[u8]) -> Result<bool> {
        Ok(!self.list_versions(bucket, key)?.is_empty())
    }

    /// All keys in a bucket, deduplicated across versions, in ascending
    /// byte order. Undecodable file names are skipped.
    pub fn list(&self, bucket: &str) -> Result<Vec<Vec<u8>>> {
        let data = self.data_dir(bucket)?;
        let mut keys = BTreeSet::new();
        let shards = match fs::read_dir(&data) {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::Io(e)),
        };
        for shard in shards {
            let shard = shard?.path();
            if !shard.is_dir() {
                continue;
            }
            for entry in fs::read_dir(&shard)? {
                let entry = entry?;
                let name = entry.file_name();
                let Some(name) = name.to_str() else { continue };
                let Some((hex, _version)) = path::split_file_name(name) else {
                    continue;
                };
                if let Ok(key) = path::decode_hex(hex) {
                    keys.insert(key);
                }
            }
        }
        Ok(keys.into_iter().collect())
    }

    /// Every version id stored for a key. The unversioned file, if present,
    /// appears as the empty string.
    pub fn list_versions(&self, bucket: &str, key: &[u8]) -> Result<Vec<String>> {
        let hex = path::encode_key(key)?;
        let shard_dir = self.data_dir(bucket)?.join(path::shard_for(&hex));
        let mut versions = Vec::new();
        let entries = match fs::read_dir(&shard_dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(versions),
            Err(e) => return Err(StoreError::Io(e)),
        };
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            match path::split_file_name(name) {
                Some((h, None)) if h == hex => versions.push(String::new()),
                Some((h, Some(v))) if h == hex => versions.push(v.to_string()),
                _ => {}
            }
        }
        Ok(versions)
    }

    /// Lexicographically greatest version id for a key, or `None` when the
    /// key has no versions at all.
    pub fn latest_version(&self, bucket: &str, key: &[u8]) -> Result<Option<String>> {
        Ok(self.list_versions(bucket, key)?.into_iter().max())
    }

    /// Size in bytes of one version (latest when `None`). `NotFound` if absent.
    pub fn size_of(&self, bucket: &str, key: &[u8], version: Option<&str>) -> Result<u64> {
        let path = self.resolve_path(bucket, key, version)?;
        fio::file_size(&path)
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// `<root>/<bucket>/data`, validating the bucket name.
    fn data_dir(&self, bucket: &str) -> Result<PathBuf> {
        if bucket.is_empty() {
            return Err(StoreError::InvalidArgument("empty bucket name".to_string()));
        }
        if bucket.contains('/') || bucket.contains('\0') {
            return Err(StoreError::InvalidArgument(format!(
                "bucket name contains forbidden character: {bucket:?}"
            )));
        }
        Ok(self.root.join(bucket).join("data"))
    }

    /// Full path for (bucket, key, version) without touching the filesystem.
    pub(crate) fn blob_path(
        &self,
        bucket: &str,
        key: &[u8],
        version: Option<&str>,
    ) -> Result<PathBuf> {
        let hex = path::encode_key(key)?;
        let name = path::file_name(&hex, version)?;
        Ok(self
            .data_dir(bucket)?
            .join(path::shard_for(&hex))
            .join(name))
    }

    /// Path for a read: an empty version resolves to the latest on disk.
    pub(crate) fn resolve_path(
        &self,
        bucket: &str,
        key: &[u8],
        version: Option<&str>,
    ) -> Result<PathBuf> {
        match normalize_version(version) {
            Some(v) => self.blob_path(bucket, key, Some(v)),
            None => {
                let latest = self
                    .latest_version(bucket, key)?
                    .ok_or(StoreError::NotFound)?;
                self.blob_path(bucket, key, some_if_nonempty(&latest))
            }
        }
    }

    /// Unlink versions beyond the retention limit, newest first. Best-effort:
    /// enumeration or unlink failures are logged and swallowed.
    fn reap_versions(&self, bucket: &str, key: &[u8]) {
        let mut versions = match self.list_versions(bucket, key) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(bucket, error = %e, "version reap: enumeration failed");
                return;
            }
        };
        versions.sort_unstable_by(|a, b| b.cmp(a));
        for v in versions.iter().skip(self.keep_versions) {
            let path = match self.blob_path(bucket, key, some_if_nonempty(v)) {
                Ok(p) => p,
                Err(_) => continue,
            };
            if let Err(e) = fs::remove_file(&path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(bucket, version = %v, error = %e, "version reap: unlink failed");
                }
            }
        }
    }
}

/// `Some("")` and `None` both mean "no version id".
fn normalize_version(version: Option<&str>) -> Option<&str> {
    match version {
        Some("") | None => None,
        Some(v) => Some(v),
    }
}

fn some_if_nonempty(v: &str) -> Option<&str> {
    if v.is_empty() {
        None
    } else {
        Some(v)
    }
}
