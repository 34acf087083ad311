//! Database handle types for the RocksDB cell store.
//!
//! - `DatabaseHandle`: the opened DB, tagged with its access mode
//! - `StoreMode`: how the database should be opened
//! - `StoreOptions`: default RocksDB options per access mode

use rocksdb::{Options, DB};

// ============================================================================
// DatabaseHandle
// ============================================================================

/// An opened database and the mode it was opened in.
pub enum DatabaseHandle {
    /// Read-only database access
    ReadOnly(DB),
    /// Exclusive read-write access
    ReadWrite(DB),
}

impl DatabaseHandle {
    pub fn db(&self) -> &DB {
        match self {
            DatabaseHandle::ReadOnly(db) | DatabaseHandle::ReadWrite(db) => db,
        }
    }

    /// The DB, if writes are permitted.
    pub fn writable(&self) -> Option<&DB> {
        match self {
            DatabaseHandle::ReadWrite(db) => Some(db),
            DatabaseHandle::ReadOnly(_) => None,
        }
    }

    pub fn mode(&self) -> StoreMode {
        match self {
            DatabaseHandle::ReadOnly(_) => StoreMode::ReadOnly,
            DatabaseHandle::ReadWrite(_) => StoreMode::ReadWrite,
        }
    }
}

// ============================================================================
// StoreMode
// ============================================================================

/// Store access mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    /// Reads only; any number of readers may share a database directory.
    ReadOnly,
    /// Read-write access, one instance at a time
    ReadWrite,
}

// ============================================================================
// StoreOptions
// ============================================================================

/// RocksDB options for opening the cell store in a given mode.
pub struct StoreOptions;

impl StoreOptions {
    /// Read-write opens create the database and the `cells` family on first
    /// use and size background work to the machine (at most 8 jobs).
    /// Read-only opens require an existing database.
    pub fn default_for(mode: StoreMode) -> Options {
        let mut options = Options::default();
        options.set_error_if_exists(false);
        let writable = mode == StoreMode::ReadWrite;
        options.create_if_missing(writable);
        options.create_missing_column_families(writable);
        if writable {
            let jobs = std::thread::available_parallelism()
                .map(|p| p.get() as i32)
                .unwrap_or(4);
            options.increase_parallelism(jobs);
            options.set_max_background_jobs(jobs.min(8));
        }
        options
    }
}
