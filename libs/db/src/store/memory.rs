use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::trace;

use super::{check_row, now_millis, CellStore, VersionFilter};
use crate::cell::Cell;
use crate::error::{Error, Result};
use crate::mutation::{Delete, DeleteTarget, Get, Put, Scan};
use crate::versioned::Version;

/// Sorts like the store: row, family, qualifier, newest version first.
type CellKey = (Vec<u8>, Vec<u8>, Vec<u8>, Reverse<Version>);

/// Ordered in-memory cell store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    cells: RwLock<BTreeMap<CellKey, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored cells, all versions included.
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<CellKey, Vec<u8>>>> {
        self.cells
            .read()
            .map_err(|_| Error::io("memory store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<CellKey, Vec<u8>>>> {
        self.cells
            .write()
            .map_err(|_| Error::io("memory store lock poisoned"))
    }
}

fn row_start(row: &[u8]) -> CellKey {
    (row.to_vec(), Vec::new(), Vec::new(), Reverse(Version::MAX))
}

fn matches_target(target: &DeleteTarget, key: &CellKey) -> bool {
    let (_, family, qualifier, Reverse(version)) = key;
    match target {
        DeleteTarget::Family(f) => f == family,
        DeleteTarget::Column { family: f, qualifier: q } => f == family && q == qualifier,
        DeleteTarget::Version {
            family: f,
            qualifier: q,
            version: v,
        } => f == family && q == qualifier && v == version,
    }
}

impl CellStore for MemoryStore {
    fn put(&self, put: &Put) -> Result<()> {
        check_row(put.row())?;
        let now = now_millis();
        let mut cells = self.write()?;
        for column in put.columns() {
            let version = column.version.unwrap_or(now);
            cells.insert(
                (
                    put.row().to_vec(),
                    column.family.clone(),
                    column.qualifier.clone(),
                    Reverse(version),
                ),
                column.value.clone(),
            );
        }
        trace!(row = %String::from_utf8_lossy(put.row()), columns = put.len(), "Put");
        Ok(())
    }

    fn delete(&self, delete: &Delete) -> Result<()> {
        let mut cells = self.write()?;
        let doomed: Vec<CellKey> = cells
            .range(row_start(delete.row())..)
            .map(|(k, _)| k)
            .take_while(|k| k.0 == delete.row())
            .filter(|k| delete.is_whole_row() || delete.targets().iter().any(|t| matches_target(t, k)))
            .cloned()
            .collect();
        for key in &doomed {
            cells.remove(key);
        }
        trace!(row = %String::from_utf8_lossy(delete.row()), removed = doomed.len(), "Delete");
        Ok(())
    }

    fn get(&self, get: &Get) -> Result<Vec<Cell>> {
        let cells = self.read()?;
        let mut versions = VersionFilter::new(get.filter());
        Ok(cells
            .range(row_start(get.row())..)
            .take_while(|(k, _)| k.0 == get.row())
            .filter(|((row, family, qualifier, Reverse(version)), _)| {
                versions.admit(row, family, qualifier, *version)
            })
            .map(|((row, family, qualifier, Reverse(version)), value)| {
                Cell::new(row.clone(), family.clone(), qualifier.clone(), value.clone(), *version)
            })
            .collect())
    }

    fn scan(&self, scan: &Scan) -> Result<Vec<Vec<Cell>>> {
        let cells = self.read()?;
        let lower = match scan.start_row() {
            Some(start) => Bound::Included(row_start(start)),
            None => Bound::Unbounded,
        };
        let limit = scan.limit().unwrap_or(usize::MAX);
        if limit == 0 {
            return Ok(Vec::new());
        }
        let mut versions = VersionFilter::new(scan.filter());
        let mut rows: Vec<Vec<Cell>> = Vec::new();
        let mut current: Vec<Cell> = Vec::new();

        for ((row, family, qualifier, Reverse(version)), value) in
            cells.range((lower, Bound::Unbounded))
        {
            if scan.is_past_stop(row) {
                break;
            }
            if current.first().is_some_and(|c| c.row() != row.as_slice()) {
                rows.push(std::mem::take(&mut current));
                if rows.len() >= limit {
                    return Ok(rows);
                }
            }
            if versions.admit(row, family, qualifier, *version) {
                current.push(Cell::new(
                    row.clone(),
                    family.clone(),
                    qualifier.clone(),
                    value.clone(),
                    *version,
                ));
            }
        }
        if !current.is_empty() && rows.len() < limit {
            rows.push(current);
        }
        Ok(rows)
    }
}
