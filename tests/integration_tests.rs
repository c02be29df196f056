//! Integration tests for ShardStore
//!
//! End-to-end flows across the facade, the mapped reader, and the batch
//! helpers. Component-level coverage lives in the dedicated test files:
//! - Blob store: tests/store_tests.rs
//! - Dynamic indexer + facade: tests/index_tests.rs
//! - LRU cache: tests/cache_tests.rs
//! - Static batch indexer: tests/fast_tests.rs

use std::sync::Arc;

use shardstore::{batch, BlobStore, IndexedStore, MappedBlob};
use tempfile::TempDir;

const BUCKET: &str = "default";

// =============================================================================
// Indexed Store Lifecycle
// =============================================================================

#[test]
fn test_full_lifecycle() {
    let temp = TempDir::new().unwrap();

    let store = IndexedStore::new(temp.path(), BUCKET);
    store.init().unwrap();

    // Write a handful of keys, read them back through every surface.
    store.put(b"logs/2024-01-01", b"jan").unwrap();
    store.put(b"logs/2024-02-01", b"feb").unwrap();
    store.put(b"media/cat.png", b"png-bytes").unwrap();

    assert_eq!(store.count(), 3);
    assert_eq!(store.get(b"logs/2024-01-01").unwrap(), b"jan");
    assert_eq!(
        store.keys_with_prefix(b"logs/"),
        vec![b"logs/2024-01-01".to_vec(), b"logs/2024-02-01".to_vec()]
    );

    // Persist, restart, verify the warm index answers without a rebuild.
    store.save_index().unwrap();
    drop(store);

    let reopened = IndexedStore::new(temp.path(), BUCKET);
    reopened.init().unwrap();
    assert_eq!(reopened.count(), 3);
    assert!(reopened.exists(b"media/cat.png"));

    // Remove and confirm both store and index agree.
    assert!(reopened.remove(b"media/cat.png").unwrap());
    assert!(!reopened.exists(b"media/cat.png"));
    assert!(reopened.get(b"media/cat.png").is_err());
    assert_eq!(reopened.count(), 2);
}

#[test]
fn test_index_agrees_with_disk_after_many_ops() {
    let temp = TempDir::new().unwrap();
    let store = IndexedStore::new(temp.path(), BUCKET);
    store.init().unwrap();

    for i in 0..100u32 {
        store
            .put(format!("key{i:03}").as_bytes(), &vec![0u8; i as usize])
            .unwrap();
    }
    for i in (0..100u32).step_by(3) {
        store.remove(format!("key{i:03}").as_bytes()).unwrap();
    }

    let listed = store.list();
    let on_disk = store.store().list(BUCKET).unwrap();
    assert_eq!(listed, on_disk);
    assert_eq!(store.count(), listed.len());
}

// =============================================================================
// Mapped Reads
// =============================================================================

#[test]
fn test_mapped_blob_reads_payload() {
    let temp = TempDir::new().unwrap();
    let store = BlobStore::new(temp.path());
    store.init(BUCKET).unwrap();

    let payload = vec![0xabu8; 64 * 1024];
    store.put(BUCKET, b"big", &payload, None).unwrap();

    let mapped = MappedBlob::open(&store, BUCKET, b"big", None).unwrap();
    assert_eq!(mapped.len(), payload.len());
    assert_eq!(mapped.data(), payload.as_slice());
}

#[test]
fn test_mapped_blob_zero_length() {
    let temp = TempDir::new().unwrap();
    let store = BlobStore::new(temp.path());
    store.init(BUCKET).unwrap();

    store.put(BUCKET, b"empty", b"", None).unwrap();

    let mapped = MappedBlob::open(&store, BUCKET, b"empty", None).unwrap();
    assert!(mapped.is_empty());
    assert_eq!(mapped.data(), b"");
}

#[test]
fn test_mapped_blob_specific_version() {
    let temp = TempDir::new().unwrap();
    let store = BlobStore::new(temp.path());
    store.init(BUCKET).unwrap();

    store.put(BUCKET, b"k", b"old", Some("v1")).unwrap();
    store.put(BUCKET, b"k", b"new", Some("v2")).unwrap();

    let old = MappedBlob::open(&store, BUCKET, b"k", Some("v1")).unwrap();
    assert_eq!(old.data(), b"old");

    let latest = MappedBlob::open(&store, BUCKET, b"k", None).unwrap();
    assert_eq!(latest.data(), b"new");
}

#[test]
fn test_mapped_blob_missing_key() {
    let temp = TempDir::new().unwrap();
    let store = BlobStore::new(temp.path());
    store.init(BUCKET).unwrap();

    assert!(MappedBlob::open(&store, BUCKET, b"ghost", None).is_err());
}

// =============================================================================
// Batch / Async Helpers
// =============================================================================

#[test]
fn test_batch_put_reports_per_item_outcomes() {
    let temp = TempDir::new().unwrap();
    let store = BlobStore::new(temp.path());
    store.init(BUCKET).unwrap();

    let items = vec![
        (b"good".to_vec(), b"1".to_vec()),
        (Vec::new(), b"2".to_vec()), // empty key: invalid
        (b"also-good".to_vec(), b"3".to_vec()),
    ];
    let results = batch::batch_put(&store, BUCKET, items);

    assert_eq!(results.len(), 3);
    assert!(results[0].outcome.is_ok());
    assert!(results[1].outcome.is_err());
    assert!(results[2].outcome.is_ok());

    // Success and failure coexist; the successes landed.
    assert!(store.exists(BUCKET, b"good").unwrap());
    assert!(store.exists(BUCKET, b"also-good").unwrap());
}

#[test]
fn test_batch_get_preserves_order() {
    let temp = TempDir::new().unwrap();
    let store = BlobStore::new(temp.path());
    store.init(BUCKET).unwrap();

    store.put(BUCKET, b"a", b"1", None).unwrap();
    store.put(BUCKET, b"c", b"3", None).unwrap();

    let results = batch::batch_get(
        &store,
        BUCKET,
        vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()],
    );

    assert_eq!(results[0].1.as_ref().unwrap(), b"1");
    assert!(results[1].1.is_err());
    assert_eq!(results[2].1.as_ref().unwrap(), b"3");
}

#[test]
fn test_async_put_then_get() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(BlobStore::new(temp.path()));
    store.init(BUCKET).unwrap();

    let handle = batch::async_put(
        Arc::clone(&store),
        BUCKET.to_string(),
        b"k".to_vec(),
        b"async-value".to_vec(),
    )
    .unwrap();
    handle.join().unwrap().unwrap();

    let handle = batch::async_get(Arc::clone(&store), BUCKET.to_string(), b"k".to_vec()).unwrap();
    assert_eq!(handle.join().unwrap().unwrap(), b"async-value");
}
