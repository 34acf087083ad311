//! Store request builders: [`Put`], [`Get`], [`Delete`] and [`Scan`].
//!
//! These assemble store-native requests from row keys, families, qualifiers
//! and versioned values. They do no structural mapping of their own; the
//! [`Mapper`](crate::Mapper) fills a `Put` from a record and a
//! [`CellStore`](crate::store::CellStore) executes them.
//!
//! | Request    | Purpose                                                   |
//! |------------|-----------------------------------------------------------|
//! | [`Put`]    | Column writes for one row                                 |
//! | [`Get`]    | Read one row, optionally restricted by [`ColumnFilter`]   |
//! | [`Delete`] | Remove a row, a family, a column, or one column version   |
//! | [`Scan`]   | Read a row range `[start, stop)`                          |

use std::fmt;

use crate::descriptor::Entity;
use crate::error::{Error, Result};
use crate::mapper::Mapper;
use crate::versioned::Version;

/// One column write produced by the encoder.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ColumnWrite {
    pub family: Vec<u8>,
    pub qualifier: Vec<u8>,
    pub value: Vec<u8>,
    /// `None` lets the store assign its current time.
    pub version: Option<Version>,
}

impl ColumnWrite {
    pub fn new(
        family: impl Into<Vec<u8>>,
        qualifier: impl Into<Vec<u8>>,
        value: impl Into<Vec<u8>>,
        version: Option<Version>,
    ) -> Self {
        Self {
            family: family.into(),
            qualifier: qualifier.into(),
            value: value.into(),
            version,
        }
    }
}

impl fmt::Debug for ColumnWrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}:{} = {}",
            String::from_utf8_lossy(&self.family),
            String::from_utf8_lossy(&self.qualifier),
            String::from_utf8_lossy(&self.value)
        )?;
        match self.version {
            Some(v) => write!(f, " @{})", v),
            None => write!(f, " @-)"),
        }
    }
}

// ============================================================================
// Put
// ============================================================================

/// Column writes for one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Put {
    row: Vec<u8>,
    columns: Vec<ColumnWrite>,
}

impl Put {
    pub fn new(row: impl Into<Vec<u8>>) -> Self {
        Self {
            row: row.into(),
            columns: Vec::new(),
        }
    }

    pub fn row(&self) -> &[u8] {
        &self.row
    }

    pub fn columns(&self) -> &[ColumnWrite] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<ColumnWrite> {
        self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Add a write stamped by the store on arrival.
    pub fn add_column(
        &mut self,
        family: impl Into<Vec<u8>>,
        qualifier: impl Into<Vec<u8>>,
        value: impl Into<Vec<u8>>,
    ) -> &mut Self {
        self.add(ColumnWrite::new(family, qualifier, value, None))
    }

    /// Add a write with an explicit version.
    pub fn add_versioned_column(
        &mut self,
        family: impl Into<Vec<u8>>,
        qualifier: impl Into<Vec<u8>>,
        value: impl Into<Vec<u8>>,
        version: Version,
    ) -> &mut Self {
        self.add(ColumnWrite::new(family, qualifier, value, Some(version)))
    }

    pub fn add(&mut self, write: ColumnWrite) -> &mut Self {
        self.columns.push(write);
        self
    }

    pub fn extend(&mut self, writes: impl IntoIterator<Item = ColumnWrite>) -> &mut Self {
        self.columns.extend(writes);
        self
    }
}

/// Sources a [`Put`] can be built from.
///
/// Implemented for `&T` where `T: Entity` and for a pre-built `Put`. A
/// pre-built `Put` converts to itself but cannot be merged into another one.
pub trait ToPut {
    fn to_put(self, mapper: &Mapper) -> Result<Put>;

    /// Append this source's writes to `target`.
    fn merge_into(self, mapper: &Mapper, target: &mut Put) -> Result<()>;
}

impl<T: Entity> ToPut for &T {
    fn to_put(self, mapper: &Mapper) -> Result<Put> {
        let descriptor = mapper.descriptor::<T>()?;
        let row = crate::encoder::row_key(&descriptor, self)?.ok_or(Error::MissingRowKey {
            entity: descriptor.entity_name(),
        })?;
        let mut put = Put::new(row);
        put.extend(crate::encoder::encode(&descriptor, self)?);
        Ok(put)
    }

    fn merge_into(self, mapper: &Mapper, target: &mut Put) -> Result<()> {
        let descriptor = mapper.descriptor::<T>()?;
        if let Some(row) = crate::encoder::row_key(&descriptor, self)? {
            if row != target.row {
                return Err(Error::merge(format!(
                    "{} has row key '{}' but the target put is for row '{}'",
                    descriptor.entity_name(),
                    String::from_utf8_lossy(&row),
                    String::from_utf8_lossy(&target.row)
                )));
            }
        }
        target.extend(crate::encoder::encode(&descriptor, self)?);
        Ok(())
    }
}

impl ToPut for Put {
    fn to_put(self, _mapper: &Mapper) -> Result<Put> {
        Ok(self)
    }

    fn merge_into(self, _mapper: &Mapper, _target: &mut Put) -> Result<()> {
        Err(Error::merge(
            "cannot merge a pre-built put into another put; pass the record instead",
        ))
    }
}

// ============================================================================
// Read filters
// ============================================================================

/// Half-open version range `[min, max)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub min: Version,
    pub max: Version,
}

impl TimeRange {
    pub fn new(min: Version, max: Version) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, version: Version) -> bool {
        self.min <= version && version < self.max
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSelector {
    Family(Vec<u8>),
    Column { family: Vec<u8>, qualifier: Vec<u8> },
}

/// Column restrictions and version limits shared by [`Get`] and [`Scan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnFilter {
    /// Empty selects every column.
    pub columns: Vec<ColumnSelector>,
    /// Newest versions returned per column. Zero returns nothing.
    pub max_versions: usize,
    pub time_range: Option<TimeRange>,
}

impl Default for ColumnFilter {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            max_versions: 1,
            time_range: None,
        }
    }
}

impl ColumnFilter {
    pub fn selects(&self, family: &[u8], qualifier: &[u8]) -> bool {
        self.columns.is_empty()
            || self.columns.iter().any(|c| match c {
                ColumnSelector::Family(f) => f == family,
                ColumnSelector::Column { family: f, qualifier: q } => f == family && q == qualifier,
            })
    }

    pub fn in_range(&self, version: Version) -> bool {
        self.time_range.map_or(true, |r| r.contains(version))
    }
}

/// Builder methods common to [`Get`] and [`Scan`].
macro_rules! column_filter_methods {
    () => {
        pub fn add_family(mut self, family: impl Into<Vec<u8>>) -> Self {
            self.filter.columns.push(ColumnSelector::Family(family.into()));
            self
        }

        pub fn add_column(
            mut self,
            family: impl Into<Vec<u8>>,
            qualifier: impl Into<Vec<u8>>,
        ) -> Self {
            self.filter.columns.push(ColumnSelector::Column {
                family: family.into(),
                qualifier: qualifier.into(),
            });
            self
        }

        pub fn with_max_versions(mut self, max_versions: usize) -> Self {
            self.filter.max_versions = max_versions;
            self
        }

        pub fn with_time_range(mut self, min: Version, max: Version) -> Self {
            self.filter.time_range = Some(TimeRange::new(min, max));
            self
        }

        pub fn filter(&self) -> &ColumnFilter {
            &self.filter
        }
    };
}

/// Read one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Get {
    row: Vec<u8>,
    filter: ColumnFilter,
}

impl Get {
    pub fn new(row: impl Into<Vec<u8>>) -> Self {
        Self {
            row: row.into(),
            filter: ColumnFilter::default(),
        }
    }

    pub fn row(&self) -> &[u8] {
        &self.row
    }

    column_filter_methods!();
}

/// Read a row range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scan {
    start: Option<Vec<u8>>,
    stop: Option<Vec<u8>>,
    limit: Option<usize>,
    filter: ColumnFilter,
}

impl Scan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inclusive lower bound.
    pub fn with_start_row(mut self, row: impl Into<Vec<u8>>) -> Self {
        self.start = Some(row.into());
        self
    }

    /// Exclusive upper bound.
    pub fn with_stop_row(mut self, row: impl Into<Vec<u8>>) -> Self {
        self.stop = Some(row.into());
        self
    }

    /// Maximum number of rows returned.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn start_row(&self) -> Option<&[u8]> {
        self.start.as_deref()
    }

    pub fn stop_row(&self) -> Option<&[u8]> {
        self.stop.as_deref()
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// True when `row` is past the stop row.
    pub fn is_past_stop(&self, row: &[u8]) -> bool {
        self.stop.as_deref().is_some_and(|stop| row >= stop)
    }

    column_filter_methods!();
}

// ============================================================================
// Delete
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    /// Every column of a family.
    Family(Vec<u8>),
    /// Every version of one column.
    Column { family: Vec<u8>, qualifier: Vec<u8> },
    /// One version of one column.
    Version {
        family: Vec<u8>,
        qualifier: Vec<u8>,
        version: Version,
    },
}

/// Remove data from one row. With no targets the whole row is removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delete {
    row: Vec<u8>,
    targets: Vec<DeleteTarget>,
}

impl Delete {
    pub fn new(row: impl Into<Vec<u8>>) -> Self {
        Self {
            row: row.into(),
            targets: Vec::new(),
        }
    }

    pub fn row(&self) -> &[u8] {
        &self.row
    }

    pub fn targets(&self) -> &[DeleteTarget] {
        &self.targets
    }

    pub fn is_whole_row(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn delete_family(mut self, family: impl Into<Vec<u8>>) -> Self {
        self.targets.push(DeleteTarget::Family(family.into()));
        self
    }

    pub fn delete_column(
        mut self,
        family: impl Into<Vec<u8>>,
        qualifier: impl Into<Vec<u8>>,
    ) -> Self {
        self.targets.push(DeleteTarget::Column {
            family: family.into(),
            qualifier: qualifier.into(),
        });
        self
    }

    pub fn delete_version(
        mut self,
        family: impl Into<Vec<u8>>,
        qualifier: impl Into<Vec<u8>>,
        version: Version,
    ) -> Self {
        self.targets.push(DeleteTarget::Version {
            family: family.into(),
            qualifier: qualifier.into(),
            version,
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_builder() {
        let mut put = Put::new("u1");
        put.add_column("name", "", "Ann")
            .add_versioned_column("scores", "math", "90", 7);
        assert_eq!(put.row(), b"u1");
        assert_eq!(put.len(), 2);
        assert_eq!(put.columns()[0].version, None);
        assert_eq!(put.columns()[1], ColumnWrite::new("scores", "math", "90", Some(7)));
    }

    #[test]
    fn test_column_filter_selection() {
        let get = Get::new("u1").add_family("name").add_column("scores", "math");
        let filter = get.filter();
        assert!(filter.selects(b"name", b""));
        assert!(filter.selects(b"scores", b"math"));
        assert!(!filter.selects(b"scores", b"art"));
        assert!(!filter.selects(b"other", b""));
        assert!(ColumnFilter::default().selects(b"anything", b"at-all"));
    }

    #[test]
    fn test_time_range_is_half_open() {
        let get = Get::new("r").with_time_range(10, 20);
        assert!(get.filter().in_range(10));
        assert!(get.filter().in_range(19));
        assert!(!get.filter().in_range(20));
        assert!(!get.filter().in_range(9));
    }

    #[test]
    fn test_scan_bounds() {
        let scan = Scan::new().with_start_row("b").with_stop_row("d").with_limit(5);
        assert_eq!(scan.start_row(), Some(&b"b"[..]));
        assert!(!scan.is_past_stop(b"c"));
        assert!(scan.is_past_stop(b"d"));
        assert_eq!(scan.limit(), Some(5));
        assert!(!Scan::new().is_past_stop(b"zzz"));
    }

    #[test]
    fn test_delete_targets() {
        assert!(Delete::new("r").is_whole_row());
        let delete = Delete::new("r")
            .delete_family("tags")
            .delete_version("scores", "math", 3);
        assert_eq!(delete.targets().len(), 2);
        assert!(!delete.is_whole_row());
    }
}
