//! Input mapping and stream parsing for the static indexer
//!
//! The whole input is mapped read-only up front (populated, sequential +
//! willneed advice) and parsed in place; keys are captured as ranges into
//! the mapping and copied out later by the arena stage.
//!
//! Stream grammar:
//!
//! ```text
//! N\n
//! key size offset\n      (N times; fields split on space or tab)
//! Q\n
//! qkey\n                 (Q times)
//! ```

use std::fs::File;

use memmap2::{Advice, Mmap, MmapOptions};

use crate::error::{Result, StoreError};

/// Read-only populated mapping of the whole input stream
pub struct InputMap {
    map: Mmap,
}

impl InputMap {
    /// Map `file`. Fails fast when the input is not a regular file or is
    /// empty — the pipeline has nothing sensible to do in either case.
    pub fn open(file: &File) -> Result<Self> {
        let meta = file.metadata()?;
        if !meta.is_file() {
            return Err(StoreError::InvalidArgument(
                "input is not a regular file".to_string(),
            ));
        }
        if meta.len() == 0 {
            return Err(StoreError::InvalidArgument("input is empty".to_string()));
        }
        let mut options = MmapOptions::new();
        #[cfg(target_os = "linux")]
        options.populate();
        let map = unsafe { options.map(file)? };
        let _ = map.advise(Advice::Sequential);
        let _ = map.advise(Advice::WillNeed);
        #[cfg(target_os = "linux")]
        let _ = map.advise(Advice::HugePage);
        Ok(Self { map })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.map
    }
}

/// Cursor-based parser over the mapped bytes
pub struct Parser<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Parse an unsigned decimal integer, skipping leading spaces/tabs.
    pub fn u64(&mut self) -> Result<u64> {
        self.skip_spaces();
        let start = self.pos;
        let mut value: u64 = 0;
        while let Some(&b) = self.buf.get(self.pos) {
            if !b.is_ascii_digit() {
                break;
            }
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(u64::from(b - b'0')))
                .ok_or_else(|| self.error("integer overflow"))?;
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("expected unsigned integer"));
        }
        Ok(value)
    }

    /// Capture a whitespace-free token as `(offset, len)` into the input.
    pub fn token(&mut self) -> Result<(usize, u32)> {
        self.skip_spaces();
        let start = self.pos;
        while let Some(&b) = self.buf.get(self.pos) {
            if b <= b' ' {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("expected key token"));
        }
        Ok((start, (self.pos - start) as u32))
    }

    /// Advance past the rest of the current line, consuming the newline.
    pub fn skip_line(&mut self) {
        while let Some(&b) = self.buf.get(self.pos) {
            self.pos += 1;
            if b == b'\n' {
                break;
            }
        }
    }

    fn skip_spaces(&mut self) {
        while let Some(&b) = self.buf.get(self.pos) {
            if b != b' ' && b != b'\t' {
                break;
            }
            self.pos += 1;
        }
    }

    fn error(&self, what: &str) -> StoreError {
        StoreError::Corruption(format!("batch stream: {} at byte {}", what, self.pos))
    }
}
