//! Atomic file I/O
//!
//! Write-to-temp-and-rename writes, mmap-backed reads, and cleanup of
//! crash-orphaned temp sidecars.
//!
//! A write lands in a `.tmp-<pid>-<name>` sibling first and is renamed over
//! the target only after a full flush and sync. Readers therefore never see
//! a partially written blob: a crash leaves either the previous file or a
//! dot-prefixed sidecar, and dot-prefixed names are invisible to the path
//! codec.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use memmap2::{Advice, Mmap};

use crate::error::{Result, StoreError};

/// Write `data` to `path` atomically: temp sibling, flush, sync, rename.
///
/// The parent directory is created if missing. On rename failure the temp
/// file is unlinked before the error is returned.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let parent = path.parent().ok_or_else(|| {
        StoreError::InvalidArgument(format!("path has no parent: {}", path.display()))
    })?;
    fs::create_dir_all(parent)?;

    let tmp = temp_sibling(path)?;
    {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp)?;
        file.write_all(data)?;
        file.flush()?;
        file.sync_all()?;
    }

    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(StoreError::Io(e));
    }
    Ok(())
}

/// Read an entire file through a read-only sequential-advised mapping.
///
/// Zero-length files return an empty buffer without mapping (mmap of length
/// zero is an error on most platforms).
pub fn read_all(path: &Path) -> Result<Vec<u8>> {
    let meta = fs::metadata(path).map_err(StoreError::from_io_read)?;
    if meta.len() == 0 {
        return Ok(Vec::new());
    }
    let file = File::open(path).map_err(StoreError::from_io_read)?;
    let map = unsafe { Mmap::map(&file)? };
    let _ = map.advise(Advice::Sequential);
    Ok(map.to_vec())
}

/// Size of a file in bytes. Fails with `NotFound` if absent.
pub fn file_size(path: &Path) -> Result<u64> {
    let meta = fs::metadata(path).map_err(StoreError::from_io_read)?;
    Ok(meta.len())
}

/// Remove `.tmp-*` sidecars under `dir` (one level of subdirectories deep,
/// matching the shard layout). Returns the number of files removed.
pub fn sweep_temps(dir: &Path) -> Result<usize> {
    let mut removed = 0;
    if !dir.is_dir() {
        return Ok(0);
    }
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            for sub in fs::read_dir(&path)? {
                let sub = sub?;
                if is_temp(&sub.file_name().to_string_lossy()) {
                    fs::remove_file(sub.path())?;
                    removed += 1;
                }
            }
        } else if is_temp(&entry.file_name().to_string_lossy()) {
            fs::remove_file(path)?;
            removed += 1;
        }
    }
    Ok(removed)
}

fn is_temp(name: &str) -> bool {
    name.starts_with(".tmp-")
}

fn temp_sibling(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            StoreError::InvalidArgument(format!("invalid file name: {}", path.display()))
        })?;
    Ok(path.with_file_name(format!(".tmp-{}-{}", std::process::id(), name)))
}
