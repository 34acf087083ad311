//! RocksDB cell store.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    CellStore trait                       │
//! │   put / delete / get / scan over Put, Delete, Get, Scan  │
//! └──────────────────────────────────────────────────────────┘
//!                              ▲
//!                              │ implements
//!                  ┌───────────┴───────────┐
//!                  │      RocksStore       │
//!                  │  - DatabaseHandle     │
//!                  │  - shared LRU cache   │
//!                  └───────────┬───────────┘
//!                              ▼
//!          "cells" CF: row 0 family 0 qualifier 0 !version
//! ```
//!
//! One column family holds every cell; the key layout in [`keys`] gives the
//! store ordering (row, family, qualifier, newest version first) directly
//! from RocksDB's bytewise comparator.

mod config;
mod handle;
pub mod keys;
mod store;

pub use config::StoreConfig;
pub use handle::{DatabaseHandle, StoreMode, StoreOptions};
pub use store::{RocksStore, CELLS_CF};
