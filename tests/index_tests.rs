//! Tests for the dynamic indexer and the indexed store facade
//!
//! These tests verify:
//! - Hash-view point lookups and ordered-view scans stay in sync
//! - Prefix and range queries in ascending order
//! - Snapshot save/load round trips and corruption handling
//! - Rebuild from disk
//! - Write-through maintenance in the facade

use shardstore::{BlobIndexer, BlobStore, IndexedStore, StoreError};
use tempfile::TempDir;

const BUCKET: &str = "default";

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_indexed() -> (TempDir, IndexedStore) {
    let temp = TempDir::new().unwrap();
    let store = IndexedStore::new(temp.path(), BUCKET);
    store.init().unwrap();
    (temp, store)
}

fn put_keys(store: &IndexedStore, keys: &[&[u8]]) {
    for key in keys {
        store.put(key, b"payload").unwrap();
    }
}

// =============================================================================
// Point Lookups
// =============================================================================

#[test]
fn test_put_updates_both_views() {
    let (_temp, store) = setup_indexed();

    store.put(b"k", b"12345").unwrap();

    assert!(store.exists(b"k"));
    let meta = store.get_meta(b"k").unwrap();
    assert_eq!(meta.size, 5);
    assert!(meta.mod_time > 0);
    assert_eq!(store.list(), vec![b"k".to_vec()]);
}

#[test]
fn test_put_overwrite_updates_meta() {
    let (_temp, store) = setup_indexed();

    store.put(b"k", b"1").unwrap();
    store.put(b"k", b"12345678").unwrap();

    assert_eq!(store.get_meta(b"k").unwrap().size, 8);
    assert_eq!(store.count(), 1);
}

#[test]
fn test_remove_clears_both_views() {
    let (_temp, store) = setup_indexed();

    store.put(b"k", b"data").unwrap();
    assert!(store.remove(b"k").unwrap());

    assert!(!store.exists(b"k"));
    assert!(store.get_meta(b"k").is_none());
    assert!(store.list().is_empty());

    // Removing again reports false and leaves the index untouched.
    assert!(!store.remove(b"k").unwrap());
}

#[test]
fn test_count_and_total_bytes() {
    let (_temp, store) = setup_indexed();

    store.put(b"a", &[0u8; 10]).unwrap();
    store.put(b"b", &[0u8; 32]).unwrap();

    assert_eq!(store.count(), 2);
    assert_eq!(store.total_bytes(), 42);
}

// =============================================================================
// Ordered Scans
// =============================================================================

#[test]
fn test_prefix_and_range_scenario() {
    let (_temp, store) = setup_indexed();

    store.put(b"apple", b"a").unwrap();
    store.put(b"apricot", b"b").unwrap();
    store.put(b"banana", b"c").unwrap();
    store.put(b"cherry", b"d").unwrap();

    assert_eq!(
        store.keys_with_prefix(b"ap"),
        vec![b"apple".to_vec(), b"apricot".to_vec()]
    );
    assert_eq!(
        store.keys_in_range(b"apricot", b"cherry"),
        vec![b"apricot".to_vec(), b"banana".to_vec()]
    );
}

#[test]
fn test_prefix_scan_matches_filter() {
    let (_temp, store) = setup_indexed();
    let keys: [&[u8]; 6] = [b"aa", b"ab", b"abc", b"b", b"ba", b"c"];
    put_keys(&store, &keys);

    let expected: Vec<Vec<u8>> = keys
        .iter()
        .filter(|k| k.starts_with(b"ab"))
        .map(|k| k.to_vec())
        .collect();
    assert_eq!(store.keys_with_prefix(b"ab"), expected);

    // Empty prefix matches everything, ascending.
    let all: Vec<Vec<u8>> = keys.iter().map(|k| k.to_vec()).collect();
    assert_eq!(store.keys_with_prefix(b""), all);
}

#[test]
fn test_range_scan_half_open() {
    let (_temp, store) = setup_indexed();
    put_keys(&store, &[b"a", b"b", b"c", b"d"]);

    // [b, d) includes the start, excludes the end.
    assert_eq!(
        store.keys_in_range(b"b", b"d"),
        vec![b"b".to_vec(), b"c".to_vec()]
    );
    assert!(store.keys_in_range(b"d", b"b").is_empty());
    assert!(store.keys_in_range(b"x", b"x").is_empty());
}

#[test]
fn test_list_is_sorted() {
    let (_temp, store) = setup_indexed();
    put_keys(&store, &[b"zeta", b"alpha", b"mid"]);

    assert_eq!(
        store.list(),
        vec![b"alpha".to_vec(), b"mid".to_vec(), b"zeta".to_vec()]
    );
}

// =============================================================================
// Snapshot Persistence
// =============================================================================

#[test]
fn test_snapshot_roundtrip() {
    let (_temp, store) = setup_indexed();

    store.put(b"a", &[0u8; 7]).unwrap();
    store.put(b"b", &[0u8; 9]).unwrap();
    let meta_a = store.get_meta(b"a").unwrap();
    let meta_b = store.get_meta(b"b").unwrap();

    store.save_index().unwrap();
    store.indexer().clear();
    assert_eq!(store.count(), 0);

    assert!(store.load_index().unwrap());
    assert_eq!(store.get_meta(b"a").unwrap(), meta_a);
    assert_eq!(store.get_meta(b"b").unwrap(), meta_b);
    assert_eq!(store.list(), vec![b"a".to_vec(), b"b".to_vec()]);
}

#[test]
fn test_load_missing_snapshot_returns_false() {
    let temp = TempDir::new().unwrap();
    let indexer = BlobIndexer::new(temp.path().join(".blob_index"));

    assert!(!indexer.load_snapshot().unwrap());
}

#[test]
fn test_corrupt_snapshot_is_an_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(".blob_index");
    std::fs::write(&path, b"key-without-tabs\n").unwrap();

    let indexer = BlobIndexer::new(&path);
    assert!(matches!(
        indexer.load_snapshot(),
        Err(StoreError::Corruption(_))
    ));
}

#[test]
fn test_init_falls_back_to_rebuild_on_corrupt_snapshot() {
    let temp = TempDir::new().unwrap();

    // Seed blobs through a first facade and persist a snapshot.
    {
        let store = IndexedStore::new(temp.path(), BUCKET);
        store.init().unwrap();
        store.put(b"kept", b"123").unwrap();
        store.save_index().unwrap();
    }

    // Corrupt the snapshot; a fresh facade must rebuild from disk.
    std::fs::write(temp.path().join(".blob_index"), b"garbage line\n").unwrap();

    let store = IndexedStore::new(temp.path(), BUCKET);
    store.init().unwrap();
    assert!(store.exists(b"kept"));
    assert_eq!(store.get_meta(b"kept").unwrap().size, 3);
}

#[test]
fn test_warm_restart_from_snapshot() {
    let temp = TempDir::new().unwrap();

    {
        let store = IndexedStore::new(temp.path(), BUCKET);
        store.init().unwrap();
        store.put(b"persisted", b"abcd").unwrap();
        store.save_index().unwrap();
    }

    let store = IndexedStore::new(temp.path(), BUCKET);
    store.init().unwrap();
    assert!(store.exists(b"persisted"));
    assert_eq!(store.get_meta(b"persisted").unwrap().size, 4);
}

// =============================================================================
// Rebuild
// =============================================================================

#[test]
fn test_rebuild_indexes_disk_state() {
    let temp = TempDir::new().unwrap();

    // Write blobs with a bare store, bypassing any index.
    let raw = BlobStore::new(temp.path());
    raw.init(BUCKET).unwrap();
    raw.put(BUCKET, b"one", &[0u8; 11], None).unwrap();
    raw.put(BUCKET, b"two", &[0u8; 22], None).unwrap();

    let store = IndexedStore::new(temp.path(), BUCKET);
    store.init().unwrap();

    assert_eq!(store.count(), 2);
    assert_eq!(store.get_meta(b"one").unwrap().size, 11);
    assert_eq!(store.get_meta(b"two").unwrap().size, 22);
}

#[test]
fn test_rebuild_many_keys() {
    let temp = TempDir::new().unwrap();
    let raw = BlobStore::new(temp.path());
    raw.init(BUCKET).unwrap();

    for i in 0..500u32 {
        let key = format!("key{i:05}");
        raw.put(BUCKET, key.as_bytes(), &vec![0u8; i as usize % 64], None)
            .unwrap();
    }

    let store = IndexedStore::new(temp.path(), BUCKET);
    store.rebuild_index().unwrap();

    assert_eq!(store.count(), 500);
    assert_eq!(store.get_meta(b"key00063").unwrap().size, 63);
    assert_eq!(store.keys_with_prefix(b"key0049").len(), 10);
}

// =============================================================================
// Facade Semantics
// =============================================================================

#[test]
fn test_facade_reads_come_from_store() {
    let (_temp, store) = setup_indexed();

    store.put(b"k", b"payload").unwrap();
    assert_eq!(store.get(b"k").unwrap(), b"payload");

    let missing = store.get(b"missing");
    assert!(matches!(missing, Err(StoreError::NotFound)));
}

#[test]
fn test_facade_rejects_tab_and_newline_keys() {
    let (_temp, store) = setup_indexed();

    assert!(matches!(
        store.put(b"bad\tkey", b"v"),
        Err(StoreError::InvalidArgument(_))
    ));
    assert!(matches!(
        store.put(b"bad\nkey", b"v"),
        Err(StoreError::InvalidArgument(_))
    ));
}

#[test]
fn test_failed_remove_keeps_index_entry() {
    let (_temp, store) = setup_indexed();

    store.put(b"k", b"v").unwrap();

    // Removing a different key leaves the indexed one alone.
    assert!(!store.remove(b"other").unwrap());
    assert!(store.exists(b"k"));
}
