//! The cell store interface and an in-memory implementation.
//!
//! The mapping engine never talks to a store itself; [`Table`](crate::Table)
//! and the CLI drive a [`CellStore`] with the requests built in
//! [`mutation`](crate::mutation). Two stores ship with the crate:
//!
//! - [`MemoryStore`]: ordered in-memory cells, used by tests
//! - [`RocksStore`](crate::RocksStore): RocksDB-backed cells

mod memory;

pub use memory::MemoryStore;

use chrono::Utc;

use crate::cell::Cell;
use crate::error::{Error, Result};
use crate::mutation::{ColumnFilter, Delete, Get, Put, Scan};
use crate::versioned::Version;

/// Storage client for cells.
///
/// Reads return cells in store order: row, family, qualifier, then newest
/// version first, with at most `max_versions` versions per column. Writes
/// without an explicit version receive one "now" timestamp per `Put`; a write
/// to an existing `(row, family, qualifier, version)` replaces its value.
pub trait CellStore: Send + Sync {
    fn put(&self, put: &Put) -> Result<()>;

    fn delete(&self, delete: &Delete) -> Result<()>;

    /// Cells of one row. Empty when the row does not exist.
    fn get(&self, get: &Get) -> Result<Vec<Cell>>;

    /// One entry per non-empty row in `[start, stop)`, in row order.
    fn scan(&self, scan: &Scan) -> Result<Vec<Vec<Cell>>>;
}

/// Current time in milliseconds since the Unix epoch.
pub fn now_millis() -> Version {
    Utc::now().timestamp_millis().max(0) as Version
}

pub(crate) fn check_row(row: &[u8]) -> Result<()> {
    if row.is_empty() {
        return Err(Error::InvalidColumn("row key must not be empty".to_string()));
    }
    Ok(())
}

/// Applies column selection, time range and the per-column version limit to
/// a stream of cells arriving in store order.
pub(crate) struct VersionFilter<'f> {
    filter: &'f ColumnFilter,
    column: Option<(Vec<u8>, Vec<u8>, Vec<u8>)>,
    versions: usize,
}

impl<'f> VersionFilter<'f> {
    pub(crate) fn new(filter: &'f ColumnFilter) -> Self {
        Self {
            filter,
            column: None,
            versions: 0,
        }
    }

    pub(crate) fn admit(&mut self, row: &[u8], family: &[u8], qualifier: &[u8], version: Version) -> bool {
        if !self.filter.selects(family, qualifier) || !self.filter.in_range(version) {
            return false;
        }
        let same = matches!(&self.column, Some((r, f, q)) if r == row && f == family && q == qualifier);
        if !same {
            self.column = Some((row.to_vec(), family.to_vec(), qualifier.to_vec()));
            self.versions = 0;
        }
        if self.versions >= self.filter.max_versions {
            return false;
        }
        self.versions += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_filter_limits_per_column() {
        let filter = ColumnFilter {
            max_versions: 2,
            ..Default::default()
        };
        let mut vf = VersionFilter::new(&filter);
        assert!(vf.admit(b"r", b"f", b"q", 9));
        assert!(vf.admit(b"r", b"f", b"q", 8));
        assert!(!vf.admit(b"r", b"f", b"q", 7));
        assert!(vf.admit(b"r", b"f", b"other", 7));
        assert!(vf.admit(b"r2", b"f", b"q", 1));
    }

    #[test]
    fn test_version_filter_time_range_before_limit() {
        let filter = ColumnFilter {
            time_range: Some(crate::mutation::TimeRange::new(0, 8)),
            ..Default::default()
        };
        let mut vf = VersionFilter::new(&filter);
        assert!(!vf.admit(b"r", b"f", b"q", 9));
        assert!(vf.admit(b"r", b"f", b"q", 7));
        assert!(!vf.admit(b"r", b"f", b"q", 6));
    }

    #[test]
    fn test_now_millis_is_recent() {
        // 2020-01-01T00:00:00Z
        assert!(now_millis() > 1_577_836_800_000);
    }
}
