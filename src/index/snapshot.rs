//! Index snapshot codec
//!
//! One record per line: `key\tsize\tmod_time\n`. Keys are written as raw
//! bytes; the facade refuses keys containing tab or newline at put time, so
//! no escaping is needed here. Sizes and timestamps are unsigned decimal.

use std::collections::{BTreeSet, HashMap};

use crate::error::{Result, StoreError};
use crate::index::BlobMeta;

/// Serialize the index in ascending key order.
pub(crate) fn encode(
    metas: &HashMap<Vec<u8>, BlobMeta>,
    ordered: &BTreeSet<Vec<u8>>,
) -> Vec<u8> {
    let mut out = Vec::with_capacity(ordered.len() * 32);
    for key in ordered {
        let Some(meta) = metas.get(key) else { continue };
        out.extend_from_slice(key);
        out.push(b'\t');
        out.extend_from_slice(meta.size.to_string().as_bytes());
        out.push(b'\t');
        out.extend_from_slice(meta.mod_time.to_string().as_bytes());
        out.push(b'\n');
    }
    out
}

/// Parse a snapshot. Any malformed line is `Corruption`; callers are
/// expected to fall back to a rebuild.
pub(crate) fn decode(bytes: &[u8]) -> Result<Vec<(Vec<u8>, BlobMeta)>> {
    let mut records = Vec::new();
    for (lineno, line) in bytes.split(|&b| b == b'\n').enumerate() {
        if line.is_empty() {
            continue;
        }
        records.push(decode_line(line).ok_or_else(|| {
            StoreError::Corruption(format!("snapshot line {}: malformed record", lineno + 1))
        })?);
    }
    Ok(records)
}

fn decode_line(line: &[u8]) -> Option<(Vec<u8>, BlobMeta)> {
    let tab1 = line.iter().position(|&b| b == b'\t')?;
    let rest = &line[tab1 + 1..];
    let tab2 = rest.iter().position(|&b| b == b'\t')?;
    let key = line[..tab1].to_vec();
    if key.is_empty() {
        return None;
    }
    let size = parse_u64(&rest[..tab2])?;
    let mod_time = parse_u64(&rest[tab2 + 1..])?;
    Some((key, BlobMeta { size, mod_time }))
}

fn parse_u64(field: &[u8]) -> Option<u64> {
    if field.is_empty() {
        return None;
    }
    let mut value: u64 = 0;
    for &b in field {
        if !b.is_ascii_digit() {
            return None;
        }
        value = value
            .checked_mul(10)?
            .checked_add(u64::from(b - b'0'))?;
    }
    Some(value)
}
