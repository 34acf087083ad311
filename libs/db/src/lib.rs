// Entity to wide-column cell mapping for cellmap

//! Maps strongly-typed records onto sparse, versioned wide-column rows and
//! back.
//!
//! A row is a set of cells `(row, family, qualifier, value, version)`. A
//! record type implements [`Entity`] to register its row key and attributes;
//! each attribute is classified once (scalar, nested entity, versioned scalar,
//! versioned collection or versioned map) into a cached [`EntityDescriptor`].
//! The [`Mapper`] then encodes records into column writes and decodes a row's
//! cell stream into a record.
//!
//! ```text
//!   write:  record ──► Mapper::to_put ──► Put ──► CellStore::put
//!   read:   CellStore::get ──► cells ──► Mapper::decode ──► record
//! ```

use std::borrow::Borrow;

pub mod cell;
pub mod codec;
pub mod config;
pub mod decoder;
pub mod descriptor;
pub mod encoder;
pub mod error;
pub mod field;
pub mod mapper;
pub mod mutation;
pub mod naming;
pub mod registry;
pub mod rocksdb;
pub mod store;
pub mod table;
pub mod versioned;

pub use cell::{group_rows, store_order, Cell};
pub use codec::CellValue;
pub use config::{CellmapConfig, MapperConfig};
pub use decoder::DecodeMany;
pub use descriptor::{
    Attribute, AttributeInfo, Classification, DescriptorBuilder, Entity, EntityDescriptor,
};
pub use error::{Error, Result};
pub use field::{Field, FieldShape};
pub use mapper::Mapper;
pub use mutation::{ColumnFilter, ColumnWrite, Delete, DeleteTarget, Get, Put, Scan, ToPut};
pub use naming::NamingPolicy;
pub use registry::{DescriptorRegistry, NamePool};
pub use crate::rocksdb::{RocksStore, StoreConfig, StoreMode};
pub use store::{CellStore, MemoryStore};
pub use table::Table;
pub use versioned::{Version, Versioned};

/// Encode `record` under `policy` using the process-wide descriptor cache.
pub fn encode<T: Entity>(record: &T, policy: NamingPolicy) -> Result<Vec<ColumnWrite>> {
    let descriptor = DescriptorRegistry::global().descriptor::<T>(policy)?;
    encoder::encode(&descriptor, record)
}

/// Decode one row's cells under `policy`; `None` for an empty stream.
pub fn decode<T, I>(cells: I, policy: NamingPolicy) -> Result<Option<T>>
where
    T: Entity,
    I: IntoIterator,
    I::Item: Borrow<Cell>,
{
    let descriptor = DescriptorRegistry::global().descriptor::<T>(policy)?;
    decoder::decode(&descriptor, cells)
}
