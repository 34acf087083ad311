//! Cell key layout.
//!
//! ```text
//! [row] 0x00 [family] 0x00 [qualifier] 0x00 [!version: u64 BE]
//! ```
//!
//! Under RocksDB's bytewise comparator this sorts by row, family and
//! qualifier, then newest version first. Components must not contain NUL.

use crate::error::{Error, Result};
use crate::versioned::Version;

const SEPARATOR: u8 = 0x00;
const VERSION_LEN: usize = 8;

fn check(component: &str, bytes: &[u8]) -> Result<()> {
    if bytes.contains(&SEPARATOR) {
        return Err(Error::InvalidColumn(format!(
            "{} '{}' contains a NUL byte",
            component,
            String::from_utf8_lossy(bytes)
        )));
    }
    Ok(())
}

fn push_component(key: &mut Vec<u8>, bytes: &[u8]) {
    key.extend_from_slice(bytes);
    key.push(SEPARATOR);
}

/// `row 0x00`: every cell of the row.
pub fn row_prefix(row: &[u8]) -> Result<Vec<u8>> {
    check("row", row)?;
    let mut key = Vec::with_capacity(row.len() + 1);
    push_component(&mut key, row);
    Ok(key)
}

/// `row 0x00 family 0x00`: every cell of one family.
pub fn family_prefix(row: &[u8], family: &[u8]) -> Result<Vec<u8>> {
    check("family", family)?;
    let mut key = row_prefix(row)?;
    push_component(&mut key, family);
    Ok(key)
}

/// `row 0x00 family 0x00 qualifier 0x00`: every version of one column.
pub fn column_prefix(row: &[u8], family: &[u8], qualifier: &[u8]) -> Result<Vec<u8>> {
    check("qualifier", qualifier)?;
    let mut key = family_prefix(row, family)?;
    push_component(&mut key, qualifier);
    Ok(key)
}

pub fn cell_key(row: &[u8], family: &[u8], qualifier: &[u8], version: Version) -> Result<Vec<u8>> {
    let mut key = column_prefix(row, family, qualifier)?;
    key.extend_from_slice(&(!version).to_be_bytes());
    Ok(key)
}

/// Smallest key greater than every key starting with `prefix`.
///
/// Prefixes built here end with the separator, so bumping it to `0x01` is
/// enough.
pub fn prefix_end(prefix: &[u8]) -> Vec<u8> {
    let mut end = prefix.to_vec();
    match end.last_mut() {
        Some(last) if *last == SEPARATOR => *last = SEPARATOR + 1,
        _ => end.push(0xff),
    }
    end
}

/// Borrowed view of a decoded cell key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellKey<'a> {
    pub row: &'a [u8],
    pub family: &'a [u8],
    pub qualifier: &'a [u8],
    pub version: Version,
}

pub fn parse_key(key: &[u8]) -> Result<CellKey<'_>> {
    let malformed = || Error::io(format!("malformed cell key ({} bytes)", key.len()));
    if key.len() < VERSION_LEN + 3 {
        return Err(malformed());
    }
    let (names, version) = key.split_at(key.len() - VERSION_LEN);
    let mut parts = names.splitn(4, |b| *b == SEPARATOR);
    let (Some(row), Some(family), Some(qualifier), Some(rest)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(malformed());
    };
    if !rest.is_empty() {
        return Err(malformed());
    }
    let mut bytes = [0u8; VERSION_LEN];
    bytes.copy_from_slice(version);
    Ok(CellKey {
        row,
        family,
        qualifier,
        version: !u64::from_be_bytes(bytes),
    })
}
