//! Memory-mapped blob reads
//!
//! Zero-copy read handle for large blobs: the payload stays in the page
//! cache and is unmapped when the handle drops.

use std::fs::File;

use memmap2::Mmap;

use crate::error::{Result, StoreError};
use crate::store::BlobStore;

/// RAII handle over a read-only mapping of one blob version
pub struct MappedBlob {
    /// `None` for zero-length blobs, which are valid but cannot be mapped
    map: Option<Mmap>,
}

impl MappedBlob {
    /// Map a blob for reading. Bucket is always explicit; an absent version
    /// resolves to the latest one, like [`BlobStore::get`].
    pub fn open(
        store: &BlobStore,
        bucket: &str,
        key: &[u8],
        version: Option<&str>,
    ) -> Result<Self> {
        let path = store.resolve_path(bucket, key, version)?;
        let file = File::open(&path).map_err(StoreError::from_io_read)?;
        let len = file.metadata()?.len();
        let map = if len == 0 {
            None
        } else {
            Some(unsafe { Mmap::map(&file)? })
        };
        Ok(Self { map })
    }

    /// The mapped bytes (empty slice for a zero-length blob)
    pub fn data(&self) -> &[u8] {
        self.map.as_deref().unwrap_or(&[])
    }

    /// Blob length in bytes
    pub fn len(&self) -> usize {
        self.data().len()
    }

    /// True for zero-length blobs
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
