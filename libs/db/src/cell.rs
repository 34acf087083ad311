//! The cell: one `(row, family, qualifier, value, timestamp)` fact.
//!
//! Cells for a row arrive grouped by family, then by qualifier, with the
//! newest version of a column first. [`store_order`] is that ordering and
//! [`group_rows`] splits a flat, row-ordered stream into per-row streams.

use std::cmp::{Ordering, Reverse};
use std::fmt;
use std::iter::Peekable;

use crate::versioned::Version;

/// An immutable stored fact.
///
/// `qualifier` may be empty: a family holding one scalar value directly.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Cell {
    row: Vec<u8>,
    family: Vec<u8>,
    qualifier: Vec<u8>,
    value: Vec<u8>,
    timestamp: Version,
}

impl Cell {
    pub fn new(
        row: impl Into<Vec<u8>>,
        family: impl Into<Vec<u8>>,
        qualifier: impl Into<Vec<u8>>,
        value: impl Into<Vec<u8>>,
        timestamp: Version,
    ) -> Self {
        Self {
            row: row.into(),
            family: family.into(),
            qualifier: qualifier.into(),
            value: value.into(),
            timestamp,
        }
    }

    #[inline]
    pub fn row(&self) -> &[u8] {
        &self.row
    }

    #[inline]
    pub fn family(&self) -> &[u8] {
        &self.family
    }

    #[inline]
    pub fn qualifier(&self) -> &[u8] {
        &self.qualifier
    }

    #[inline]
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    #[inline]
    pub fn timestamp(&self) -> Version {
        self.timestamp
    }

    /// Same row, family and qualifier (version ignored).
    pub fn same_column(&self, other: &Cell) -> bool {
        self.row == other.row && self.family == other.family && self.qualifier == other.qualifier
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cell({}/{}:{}@{} = {})",
            String::from_utf8_lossy(&self.row),
            String::from_utf8_lossy(&self.family),
            String::from_utf8_lossy(&self.qualifier),
            self.timestamp,
            String::from_utf8_lossy(&self.value),
        )
    }
}

/// Store ordering: row, family, qualifier ascending, then newest version first.
pub fn store_order(a: &Cell, b: &Cell) -> Ordering {
    (&a.row, &a.family, &a.qualifier, Reverse(a.timestamp)).cmp(&(
        &b.row,
        &b.family,
        &b.qualifier,
        Reverse(b.timestamp),
    ))
}

/// Split a row-ordered cell stream into one `Vec<Cell>` per row.
///
/// Consecutive cells with the same row key form one group. The input is
/// consumed lazily, one row at a time.
pub fn group_rows<I>(cells: I) -> RowGroups<I::IntoIter>
where
    I: IntoIterator<Item = Cell>,
{
    RowGroups {
        cells: cells.into_iter().peekable(),
    }
}

/// Iterator returned by [`group_rows`].
pub struct RowGroups<I: Iterator<Item = Cell>> {
    cells: Peekable<I>,
}

impl<I: Iterator<Item = Cell>> Iterator for RowGroups<I> {
    type Item = Vec<Cell>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.cells.next()?;
        let mut row = vec![first];
        while let Some(next) = self.cells.next_if(|c| c.row == row[0].row) {
            row.push(next);
        }
        Some(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_order_newest_version_first() {
        let mut cells = vec![
            Cell::new("r1", "b", "", "x", 1),
            Cell::new("r1", "a", "q", "old", 1),
            Cell::new("r1", "a", "q", "new", 5),
            Cell::new("r0", "z", "", "y", 1),
        ];
        cells.sort_by(store_order);

        let order: Vec<_> = cells
            .iter()
            .map(|c| (c.row().to_vec(), c.family().to_vec(), c.timestamp()))
            .collect();
        assert_eq!(
            order,
            vec![
                (b"r0".to_vec(), b"z".to_vec(), 1),
                (b"r1".to_vec(), b"a".to_vec(), 5),
                (b"r1".to_vec(), b"a".to_vec(), 1),
                (b"r1".to_vec(), b"b".to_vec(), 1),
            ]
        );
    }

    #[test]
    fn test_group_rows() {
        let cells = vec![
            Cell::new("u1", "name", "", "Ann", 1),
            Cell::new("u1", "age", "", "30", 1),
            Cell::new("u2", "name", "", "Bob", 1),
        ];
        let rows: Vec<_> = group_rows(cells).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].len(), 2);
        assert_eq!(rows[1][0].value(), b"Bob");
    }

    #[test]
    fn test_group_rows_empty() {
        assert_eq!(group_rows(Vec::<Cell>::new()).count(), 0);
    }

    #[test]
    fn test_same_column_ignores_version() {
        let a = Cell::new("r", "f", "q", "1", 1);
        let b = Cell::new("r", "f", "q", "2", 2);
        let c = Cell::new("r", "f", "other", "1", 1);
        assert!(a.same_column(&b));
        assert!(!a.same_column(&c));
    }
}
