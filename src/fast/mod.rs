//! Static batch indexer
//!
//! One-shot pipeline over a static `(key, size, offset)` stream:
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌────────────────┐   ┌──────────────┐
//! │ mmap +   │──▶│ arena     │──▶│ open-addressing│──▶│ batched      │
//! │ parse    │   │ key copy  │   │ table build    │   │ lookups +    │
//! │          │   │ (threads) │   │ (serial)       │   │ prefetch     │
//! └──────────┘   └───────────┘   └────────────────┘   └──────────────┘
//! ```
//!
//! Keys are first captured as ranges into the input mapping, then copied
//! into a bump arena by a pool of workers claiming contiguous chunks off an
//! atomic cursor. That decouples key lifetime from the input mapping and
//! packs keys tightly for the probe loop. Query hashes are precomputed at
//! parse time so the answer loop can prefetch the probe-start slot a fixed
//! distance ahead of the lookup actually touching it.

mod arena;
mod input;
mod output;
mod table;

pub use arena::{Arena, MAX_ARENA_BYTES};
pub use input::{InputMap, Parser};
pub use output::{QueryWriter, OUTPUT_BUF_BYTES};
pub use table::{fnv1a, StaticTable};

use std::fs::File;
use std::io::Write;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

use crate::error::{Result, StoreError};

/// How many lookups ahead the probe-start slot is prefetched
pub const PREFETCH_DIST: usize = 16;

/// Records claimed per fetch-add by an arena-copy worker
const COPY_CHUNK: usize = 8192;

/// Arena bytes reserved per record on top of the slack
const ARENA_BYTES_PER_RECORD: usize = 40;

/// Fixed arena headroom for long-tail keys
const ARENA_SLACK: usize = 4 * 1024 * 1024;

/// Upper bound on arena-copy workers
const MAX_COPY_WORKERS: usize = 8;

/// One ingested record. `key_off` starts as an offset into the input
/// mapping and is rewritten to an arena offset by the copy stage.
struct Record {
    key_off: usize,
    key_len: u32,
    size: u64,
    offset: u64,
}

/// One parsed query with its precomputed hash
struct Query {
    key_off: usize,
    key_len: u32,
    hash: u64,
}

/// Run the full pipeline: map `input`, answer every query to `out`.
pub fn run<W: Write>(input: &File, out: W) -> Result<()> {
    let map = InputMap::open(input)?;
    run_on(map.bytes(), out)
}

/// Pipeline over an already-materialized input buffer.
pub fn run_on<W: Write>(buf: &[u8], out: W) -> Result<()> {
    let mut parser = Parser::new(buf);

    // Ingest phase: N records, keys as ranges into the input.
    let n = parser.u64()? as usize;
    parser.skip_line();
    let mut records = Vec::with_capacity(n);
    for _ in 0..n {
        let (key_off, key_len) = parser.token()?;
        let size = parser.u64()?;
        let offset = parser.u64()?;
        parser.skip_line();
        records.push(Record {
            key_off,
            key_len,
            size,
            offset,
        });
    }

    // Copy keys into the arena in parallel, then build the table serially.
    let arena = Arena::new(arena_capacity(n))?;
    copy_keys(buf, &arena, &mut records)?;

    let mut table = StaticTable::with_capacity(n);
    for record in &records {
        let key = arena.get(record.key_off as u32, record.key_len);
        table.insert(
            record.key_off as u32,
            record.key_len,
            fnv1a(key),
            record.size,
            record.offset,
        );
    }

    // Query phase: capture keys and precompute hashes.
    let q = parser.u64()? as usize;
    parser.skip_line();
    let mut queries = Vec::with_capacity(q);
    for _ in 0..q {
        let (key_off, key_len) = parser.token()?;
        parser.skip_line();
        let key = &buf[key_off..key_off + key_len as usize];
        queries.push(Query {
            key_off,
            key_len,
            hash: fnv1a(key),
        });
    }

    // Answer phase: look-ahead prefetch, answers in query order.
    let mut writer = QueryWriter::new(out);
    for i in 0..queries.len() {
        if let Some(ahead) = queries.get(i + PREFETCH_DIST) {
            table.prefetch(ahead.hash);
        }
        let query = &queries[i];
        let key = &buf[query.key_off..query.key_off + query.key_len as usize];
        match table.find(&arena, key, query.hash) {
            Some((size, offset)) => writer.found(size, offset)?,
            None => writer.not_found()?,
        }
    }
    writer.finish()?;
    Ok(())
}

fn arena_capacity(n: usize) -> usize {
    n.saturating_mul(ARENA_BYTES_PER_RECORD)
        .saturating_add(ARENA_SLACK)
        .min(MAX_ARENA_BYTES)
}

/// Copy every record's key into the arena, rewriting `key_off` in place.
/// Workers claim contiguous chunks of the record vector via fetch-add.
fn copy_keys(buf: &[u8], arena: &Arena, records: &mut [Record]) -> Result<()> {
    let total = records.len();
    if total == 0 {
        return Ok(());
    }
    let workers = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .min(MAX_COPY_WORKERS);

    let cursor = AtomicUsize::new(0);
    let exhausted = AtomicBool::new(false);
    let shared = SharedRecords::new(records);

    thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| loop {
                let start = cursor.fetch_add(COPY_CHUNK, Ordering::Relaxed);
                if start >= total || exhausted.load(Ordering::Relaxed) {
                    break;
                }
                let end = (start + COPY_CHUNK).min(total);
                for i in start..end {
                    // Safety: [start, end) was claimed exclusively by this
                    // worker's fetch-add; no other thread touches index i.
                    let record = unsafe { shared.get_mut(i) };
                    let key = &buf[record.key_off..record.key_off + record.key_len as usize];
                    match arena.alloc(key) {
                        Some(off) => record.key_off = off as usize,
                        None => {
                            exhausted.store(true, Ordering::Relaxed);
                            return;
                        }
                    }
                }
            });
        }
    });

    if exhausted.load(Ordering::Relaxed) {
        return Err(StoreError::ResourceExhausted(
            "key arena exhausted".to_string(),
        ));
    }
    Ok(())
}

/// Shares a record slice across copy workers. Soundness rests on the
/// chunked fetch-add protocol above: each index is written by exactly one
/// worker, and the `thread::scope` join orders all writes before the
/// builder reads them.
struct SharedRecords<'a> {
    ptr: *mut Record,
    _marker: PhantomData<&'a mut [Record]>,
}

unsafe impl Sync for SharedRecords<'_> {}

impl<'a> SharedRecords<'a> {
    fn new(records: &'a mut [Record]) -> Self {
        Self {
            ptr: records.as_mut_ptr(),
            _marker: PhantomData,
        }
    }

    /// Caller must hold an exclusive claim on index `i`.
    #[allow(clippy::mut_from_ref)]
    unsafe fn get_mut(&self, i: usize) -> &mut Record {
        &mut *self.ptr.add(i)
    }
}
