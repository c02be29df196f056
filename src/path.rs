//! Path codec
//!
//! Maps raw keys onto the sharded on-disk layout and back:
//!
//! ```text
//! <root>/<bucket>/data/<xx>/<hex(key)>           # unversioned
//! <root>/<bucket>/data/<xx>/<hex(key)>.<vid>     # versioned
//! ```
//!
//! `<xx>` is the first two characters of the key's lowercase hex encoding.
//! The version delimiter is a single `.` — a character that cannot occur in
//! hex, so a file name always splits unambiguously into (hex, version).

use crate::error::{Result, StoreError};

/// Version delimiter in file names. Must never be a hex character.
pub const VERSION_DELIM: char = '.';

/// Shard name for keys whose hex encoding is shorter than two characters.
pub const SHARD_SENTINEL: &str = "zz";

/// Hex-encode a key for use as a file name. Keys must be non-empty.
pub fn encode_key(key: &[u8]) -> Result<String> {
    if key.is_empty() {
        return Err(StoreError::InvalidArgument("empty key".to_string()));
    }
    let mut out = String::with_capacity(key.len() * 2);
    for b in key {
        out.push(hex_digit(b >> 4));
        out.push(hex_digit(b & 0x0f));
    }
    Ok(out)
}

/// Decode a lowercase/uppercase hex string back into raw key bytes.
pub fn decode_hex(hex: &str) -> Result<Vec<u8>> {
    let bytes = hex.as_bytes();
    if bytes.len() % 2 != 0 {
        return Err(StoreError::InvalidArgument(format!(
            "hex string has odd length: {hex:?}"
        )));
    }
    let mut out = Vec::with_capacity(bytes.len() / 2);
    for pair in bytes.chunks_exact(2) {
        let hi = hex_val(pair[0])?;
        let lo = hex_val(pair[1])?;
        out.push((hi << 4) | lo);
    }
    Ok(out)
}

/// Shard directory name: first two hex characters, or the sentinel when the
/// encoding is too short.
pub fn shard_for(hex: &str) -> &str {
    if hex.len() >= 2 {
        &hex[..2]
    } else {
        SHARD_SENTINEL
    }
}

/// File name for a key's hex encoding and an optional version id.
pub fn file_name(hex: &str, version: Option<&str>) -> Result<String> {
    match version {
        None | Some("") => Ok(hex.to_string()),
        Some(v) => {
            validate_version(v)?;
            Ok(format!("{hex}{VERSION_DELIM}{v}"))
        }
    }
}

/// Split a file name into its hex component and optional version id.
///
/// Returns `None` for names that cannot belong to the layout (dot-prefixed
/// temp sidecars and other hidden files).
pub fn split_file_name(name: &str) -> Option<(&str, Option<&str>)> {
    if name.is_empty() || name.starts_with(VERSION_DELIM) {
        return None;
    }
    match name.find(VERSION_DELIM) {
        Some(idx) => Some((&name[..idx], Some(&name[idx + 1..]))),
        None => Some((name, None)),
    }
}

/// Version ids become file-name suffixes; reject anything that could escape
/// the shard directory or produce an unparseable name.
pub fn validate_version(version: &str) -> Result<()> {
    if version.is_empty() {
        return Err(StoreError::InvalidArgument(
            "empty version id".to_string(),
        ));
    }
    if version.contains('/') || version.contains('\0') {
        return Err(StoreError::InvalidArgument(format!(
            "version id contains forbidden character: {version:?}"
        )));
    }
    Ok(())
}

fn hex_digit(nibble: u8) -> char {
    match nibble {
        0..=9 => (b'0' + nibble) as char,
        _ => (b'a' + nibble - 10) as char,
    }
}

fn hex_val(c: u8) -> Result<u8> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'a'..=b'f' => Ok(10 + c - b'a'),
        b'A'..=b'F' => Ok(10 + c - b'A'),
        _ => Err(StoreError::InvalidArgument(format!(
            "invalid hex character: {:?}",
            c as char
        ))),
    }
}
