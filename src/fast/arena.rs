//! Bump arena for key storage
//!
//! Append-only byte arena over an anonymous mapping with huge-page advice.
//! Allocation is a relaxed atomic fetch-add on the bump cursor, so workers
//! can copy keys in concurrently; claimed regions never overlap. There is
//! no per-object free — everything lives until the arena drops.

use std::sync::atomic::{AtomicUsize, Ordering};

use memmap2::{MmapMut, MmapOptions};

use crate::error::{Result, StoreError};

/// Arena offsets are `u32`, which caps capacity at 4 GiB
pub const MAX_ARENA_BYTES: usize = u32::MAX as usize;

/// Append-only byte arena with an atomic bump cursor
pub struct Arena {
    /// Backing mapping; kept alive for the arena's lifetime
    _map: MmapMut,

    /// Base of the mapping, captured once at construction
    base: *mut u8,

    capacity: usize,

    /// Next free offset; only ever incremented
    cursor: AtomicUsize,
}

// Safety: `base` points into `_map`, which lives as long as the arena, and
// every allocation owns a disjoint region claimed via fetch-add. Bytes are
// written exactly once (by `alloc`) before any reader can obtain the offset.
unsafe impl Send for Arena {}
unsafe impl Sync for Arena {}

impl Arena {
    /// Reserve an arena of `capacity` bytes.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 || capacity > MAX_ARENA_BYTES {
            return Err(StoreError::InvalidArgument(format!(
                "arena capacity out of range: {capacity}"
            )));
        }
        let mut map = MmapOptions::new().len(capacity).map_anon()?;
        #[cfg(target_os = "linux")]
        let _ = map.advise(memmap2::Advice::HugePage);
        let base = map.as_mut_ptr();
        Ok(Self {
            _map: map,
            base,
            capacity,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Copy `src` into the arena, appending a terminating zero byte.
    /// Returns the offset of the copy, or `None` when the arena is full —
    /// the caller must fail its operation cleanly.
    pub fn alloc(&self, src: &[u8]) -> Option<u32> {
        let need = src.len() + 1;
        let off = self.cursor.fetch_add(need, Ordering::Relaxed);
        if off + need > self.capacity {
            return None;
        }
        unsafe {
            let dst = self.base.add(off);
            std::ptr::copy_nonoverlapping(src.as_ptr(), dst, src.len());
            *dst.add(src.len()) = 0;
        }
        Some(off as u32)
    }

    /// Bytes previously allocated at `offset` with length `len`.
    ///
    /// Offsets must come from `alloc`; the length must not exceed the
    /// allocation's.
    pub fn get(&self, offset: u32, len: u32) -> &[u8] {
        debug_assert!(offset as usize + len as usize <= self.capacity);
        unsafe { std::slice::from_raw_parts(self.base.add(offset as usize), len as usize) }
    }

    /// Total capacity in bytes
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes handed out so far (including failed over-capacity claims)
    pub fn used(&self) -> usize {
        self.cursor.load(Ordering::Relaxed).min(self.capacity)
    }
}
