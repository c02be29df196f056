//! Batch and async helpers
//!
//! Sequential batch operations with per-item outcomes, and thread-per-op
//! asynchronous wrappers. The scheduling model is plain OS threads; callers
//! join the returned handles when they need the results.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::error::Result;
use crate::store::BlobStore;

/// Outcome of a single item in a batch put
pub struct BatchResult {
    pub key: Vec<u8>,
    pub outcome: Result<()>,
}

/// Write multiple blobs in order. Failures do not stop the batch; every
/// item gets its own outcome.
pub fn batch_put(
    store: &BlobStore,
    bucket: &str,
    items: Vec<(Vec<u8>, Vec<u8>)>,
) -> Vec<BatchResult> {
    items
        .into_iter()
        .map(|(key, data)| {
            let outcome = store.put(bucket, &key, &data, None);
            BatchResult { key, outcome }
        })
        .collect()
}

/// Read multiple blobs in order; missing keys surface as `NotFound` in
/// their slot.
pub fn batch_get(
    store: &BlobStore,
    bucket: &str,
    keys: Vec<Vec<u8>>,
) -> Vec<(Vec<u8>, Result<Vec<u8>>)> {
    keys.into_iter()
        .map(|key| {
            let outcome = store.get(bucket, &key, None);
            (key, outcome)
        })
        .collect()
}

/// Write a blob on a dedicated thread. The handle resolves to the put's
/// outcome when joined.
pub fn async_put(
    store: Arc<BlobStore>,
    bucket: String,
    key: Vec<u8>,
    data: Vec<u8>,
) -> Result<JoinHandle<Result<()>>> {
    let handle = thread::Builder::new()
        .name("shardstore-put".to_string())
        .spawn(move || store.put(&bucket, &key, &data, None))?;
    Ok(handle)
}

/// Read a blob on a dedicated thread.
pub fn async_get(
    store: Arc<BlobStore>,
    bucket: String,
    key: Vec<u8>,
) -> Result<JoinHandle<Result<Vec<u8>>>> {
    let handle = thread::Builder::new()
        .name("shardstore-get".to_string())
        .spawn(move || store.get(&bucket, &key, None))?;
    Ok(handle)
}
