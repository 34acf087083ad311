//! RocksDB-backed cell store.

use std::path::{Path, PathBuf};

use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, Direction, IteratorMode, WriteBatch, DB};
use tracing::{debug, info};

use super::config::StoreConfig;
use super::handle::{DatabaseHandle, StoreMode, StoreOptions};
use super::keys;
use crate::cell::Cell;
use crate::error::{Error, Result};
use crate::mutation::{Delete, DeleteTarget, Get, Put, Scan};
use crate::store::{check_row, now_millis, CellStore, VersionFilter};

/// The single column family holding every cell.
pub const CELLS_CF: &str = "cells";

/// Cell store over one RocksDB database.
///
/// # Example
///
/// ```ignore
/// let store = RocksStore::open(path, StoreConfig::default())?;
/// let mut put = Put::new("u1");
/// put.add_column("name", "", "Ann");
/// store.put(&put)?;
/// let cells = store.get(&Get::new("u1"))?;
/// ```
pub struct RocksStore {
    db_path: PathBuf,
    handle: DatabaseHandle,
    config: StoreConfig,
    // Kept alive for the lifetime of the DB.
    _block_cache: rocksdb::Cache,
}

impl RocksStore {
    /// Open (creating if missing) for reading and writing.
    pub fn open(db_path: &Path, config: StoreConfig) -> Result<Self> {
        Self::open_with_mode(db_path, config, StoreMode::ReadWrite)
    }

    /// Open an existing database for reading.
    pub fn open_readonly(db_path: &Path, config: StoreConfig) -> Result<Self> {
        Self::open_with_mode(db_path, config, StoreMode::ReadOnly)
    }

    #[tracing::instrument(skip(db_path, config), fields(path = ?db_path))]
    pub fn open_with_mode(db_path: &Path, config: StoreConfig, mode: StoreMode) -> Result<Self> {
        validate_path(db_path)?;

        let block_cache = rocksdb::Cache::new_lru_cache(config.cache_size_bytes);
        info!(
            cache_mb = config.cache_size_bytes / (1024 * 1024),
            "Created block cache"
        );

        let options = StoreOptions::default_for(mode);
        let cfs = vec![ColumnFamilyDescriptor::new(
            CELLS_CF,
            config.cf_options(&block_cache),
        )];
        let handle = match mode {
            StoreMode::ReadOnly => DatabaseHandle::ReadOnly(DB::open_cf_descriptors_read_only(
                &options, db_path, cfs, false,
            )?),
            StoreMode::ReadWrite => {
                DatabaseHandle::ReadWrite(DB::open_cf_descriptors(&options, db_path, cfs)?)
            }
        };
        debug!(?mode, "Opened cell store");

        Ok(Self {
            db_path: db_path.to_path_buf(),
            handle,
            config,
            _block_cache: block_cache,
        })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    pub fn mode(&self) -> StoreMode {
        self.handle.mode()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Flush memtables to disk.
    pub fn flush(&self) -> Result<()> {
        let db = self.writable()?;
        db.flush_cf(cf(db)?)?;
        Ok(())
    }

    fn writable(&self) -> Result<&DB> {
        self.handle.writable().ok_or_else(|| {
            Error::io(format!(
                "cell store at {} is open read-only",
                self.db_path.display()
            ))
        })
    }

    /// Cells from `start` onward, in key order, until `keep` says stop.
    fn for_each_from(
        &self,
        start: &[u8],
        mut keep: impl FnMut(keys::CellKey<'_>, &[u8]) -> bool,
    ) -> Result<()> {
        let db = self.handle.db();
        for item in db.iterator_cf(cf(db)?, IteratorMode::From(start, Direction::Forward)) {
            let (key, value) = item?;
            if !keep(keys::parse_key(&key[..])?, &value[..]) {
                break;
            }
        }
        Ok(())
    }
}

fn cf(db: &DB) -> Result<&ColumnFamily> {
    db.cf_handle(CELLS_CF)
        .ok_or_else(|| Error::io(format!("column family '{}' not found", CELLS_CF)))
}

fn validate_path(db_path: &Path) -> Result<()> {
    match db_path.try_exists() {
        Err(e) => Err(e.into()),
        Ok(true) if db_path.is_file() => Err(Error::io(format!(
            "Path is a file: {}",
            db_path.display()
        ))),
        Ok(true) if db_path.is_symlink() => Err(Error::io(format!(
            "Path is a symlink: {}",
            db_path.display()
        ))),
        Ok(_) => Ok(()),
    }
}

fn to_cell(key: &keys::CellKey<'_>, value: &[u8]) -> Cell {
    Cell::new(key.row, key.family, key.qualifier, value, key.version)
}

impl CellStore for RocksStore {
    #[tracing::instrument(skip_all, fields(row = %String::from_utf8_lossy(put.row()), columns = put.len()))]
    fn put(&self, put: &Put) -> Result<()> {
        check_row(put.row())?;
        let db = self.writable()?;
        let cells = cf(db)?;
        let now = now_millis();
        let mut batch = WriteBatch::default();
        for column in put.columns() {
            let key = keys::cell_key(
                put.row(),
                &column.family,
                &column.qualifier,
                column.version.unwrap_or(now),
            )?;
            batch.put_cf(cells, key, &column.value);
        }
        db.write(batch)?;
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(row = %String::from_utf8_lossy(delete.row())))]
    fn delete(&self, delete: &Delete) -> Result<()> {
        let db = self.writable()?;
        let cells = cf(db)?;
        let row = delete.row();
        let mut batch = WriteBatch::default();
        if delete.is_whole_row() {
            let prefix = keys::row_prefix(row)?;
            let end = keys::prefix_end(&prefix);
            batch.delete_range_cf(cells, prefix, end);
        }
        for target in delete.targets() {
            match target {
                DeleteTarget::Family(family) => {
                    let prefix = keys::family_prefix(row, family)?;
                    let end = keys::prefix_end(&prefix);
                    batch.delete_range_cf(cells, prefix, end);
                }
                DeleteTarget::Column { family, qualifier } => {
                    let prefix = keys::column_prefix(row, family, qualifier)?;
                    let end = keys::prefix_end(&prefix);
                    batch.delete_range_cf(cells, prefix, end);
                }
                DeleteTarget::Version {
                    family,
                    qualifier,
                    version,
                } => {
                    batch.delete_cf(cells, keys::cell_key(row, family, qualifier, *version)?);
                }
            }
        }
        db.write(batch)?;
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(row = %String::from_utf8_lossy(get.row())))]
    fn get(&self, get: &Get) -> Result<Vec<Cell>> {
        let prefix = keys::row_prefix(get.row())?;
        let mut versions = VersionFilter::new(get.filter());
        let mut out = Vec::new();
        self.for_each_from(&prefix, |key, value| {
            if key.row != get.row() {
                return false;
            }
            if versions.admit(key.row, key.family, key.qualifier, key.version) {
                out.push(to_cell(&key, value));
            }
            true
        })?;
        Ok(out)
    }

    #[tracing::instrument(skip_all)]
    fn scan(&self, scan: &Scan) -> Result<Vec<Vec<Cell>>> {
        let limit = scan.limit().unwrap_or(usize::MAX);
        if limit == 0 {
            return Ok(Vec::new());
        }
        let start = match scan.start_row() {
            Some(row) => keys::row_prefix(row)?,
            None => Vec::new(),
        };
        let mut versions = VersionFilter::new(scan.filter());
        let mut rows: Vec<Vec<Cell>> = Vec::new();
        let mut current: Vec<Cell> = Vec::new();
        self.for_each_from(&start, |key, value| {
            if scan.is_past_stop(key.row) {
                return false;
            }
            if current.first().is_some_and(|c| c.row() != key.row) {
                rows.push(std::mem::take(&mut current));
                if rows.len() >= limit {
                    return false;
                }
            }
            if versions.admit(key.row, key.family, key.qualifier, key.version) {
                current.push(to_cell(&key, value));
            }
            true
        })?;
        if !current.is_empty() && rows.len() < limit {
            rows.push(current);
        }
        debug!(rows = rows.len(), "Scan complete");
        Ok(rows)
    }
}
