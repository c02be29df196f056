//! # ShardStore
//!
//! An embeddable blob storage engine with:
//! - Content-sharded, bucketed key→bytes layout on plain files
//! - Durable atomic writes (write-to-temp-and-rename)
//! - Bounded multi-version retention per key
//! - In-memory index for O(1) lookups and ordered prefix/range scans
//! - Byte-budgeted LRU read cache with shared payloads
//! - Memory-mapped zero-copy reads
//! - A one-shot batch indexer for static `(key, size, offset)` workloads
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     IndexedStore                             │
//! │         (write-through index maintenance, one bucket)        │
//! └──────────────┬──────────────────────────┬───────────────────┘
//!                │                          │
//!        ┌───────▼────────┐        ┌────────▼────────┐
//!        │   BlobStore    │        │   BlobIndexer   │
//!        │ (sharded files,│        │ (hash + ordered │
//!        │  versioning)   │        │  views, snapshot)│
//!        └───────┬────────┘        └─────────────────┘
//!                │
//!        ┌───────▼────────┐
//!        │  Atomic I/O    │
//!        │ (tmp + rename, │
//!        │  mmap reads)   │
//!        └────────────────┘
//! ```
//!
//! The `fast` module is a separate one-shot pipeline (mmap ingest → arena
//! keys → open-addressing table → batched prefetched lookups) and shares
//! nothing with the live store except the error type.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod path;
pub mod fio;
pub mod cache;
pub mod store;
pub mod index;
pub mod indexed;
pub mod batch;
pub mod fast;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, StoreError};
pub use config::StoreConfig;
pub use cache::LruCache;
pub use store::{BlobStore, CachedStore, MappedBlob};
pub use index::{BlobIndexer, BlobMeta};
pub use indexed::IndexedStore;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of ShardStore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
