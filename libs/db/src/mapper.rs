//! The mapping facade: a naming policy bound to the descriptor registry.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use crate::cell::Cell;
use crate::codec::CellValue;
use crate::config::MapperConfig;
use crate::decoder::{self, DecodeMany};
use crate::descriptor::{Entity, EntityDescriptor};
use crate::encoder;
use crate::error::Result;
use crate::mutation::{ColumnWrite, Put, ToPut};
use crate::naming::NamingPolicy;
use crate::registry::DescriptorRegistry;

/// Encodes records to column writes and decodes cell streams to records
/// under one configuration.
///
/// `Mapper` is cheap to clone and safe to share between threads; all state it
/// touches lives in the read-mostly descriptor registry.
///
/// # Example
///
/// ```
/// use cellmap_db::{Cell, DescriptorBuilder, Entity, Mapper, MapperConfig, NamingPolicy};
///
/// #[derive(Debug, Default, PartialEq)]
/// struct Note {
///     id: String,
///     body: Option<String>,
/// }
///
/// impl Entity for Note {
///     fn describe(d: &mut DescriptorBuilder<'_, Self>) {
///         d.row_key("id", |n| &n.id, |n| &mut n.id)
///             .field("body", |n| &n.body, |n| &mut n.body);
///     }
/// }
///
/// let mapper = Mapper::new(MapperConfig::default().with_naming_policy(NamingPolicy::Identity));
/// let note = Note { id: "n1".into(), body: Some("hello".into()) };
///
/// let put = mapper.to_put(&note)?;
/// let cells: Vec<Cell> = put
///     .columns()
///     .iter()
///     .map(|w| Cell::new(put.row(), w.family.clone(), w.qualifier.clone(), w.value.clone(), 1))
///     .collect();
/// assert_eq!(mapper.decode::<Note, _>(cells)?, Some(note));
/// # Ok::<(), cellmap_db::Error>(())
/// ```
#[derive(Clone)]
pub struct Mapper {
    config: MapperConfig,
    registry: &'static DescriptorRegistry,
}

impl Default for Mapper {
    fn default() -> Self {
        Self::new(MapperConfig::default())
    }
}

impl fmt::Debug for Mapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapper").field("config", &self.config).finish()
    }
}

impl Mapper {
    /// Mapper over the process-wide registry.
    pub fn new(config: MapperConfig) -> Self {
        Self::with_registry(config, DescriptorRegistry::global())
    }

    pub fn with_registry(config: MapperConfig, registry: &'static DescriptorRegistry) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn naming_policy(&self) -> NamingPolicy {
        self.config.naming_policy
    }

    pub fn descriptor<T: Entity>(&self) -> Result<Arc<EntityDescriptor<T>>> {
        self.registry.descriptor::<T>(self.config.naming_policy)
    }

    /// Column writes for `record`, excluding its row key.
    pub fn encode<T: Entity>(&self, record: &T) -> Result<Vec<ColumnWrite>> {
        encoder::encode(&*self.descriptor::<T>()?, record)
    }

    pub fn row_key<T: Entity>(&self, record: &T) -> Result<Option<Vec<u8>>> {
        encoder::row_key(&*self.descriptor::<T>()?, record)
    }

    /// Build a `Put` from a record (`&T`) or pass a pre-built `Put` through.
    pub fn to_put<P: ToPut>(&self, source: P) -> Result<Put> {
        source.to_put(self)
    }

    /// Merge a record's writes into an existing `Put`.
    ///
    /// Fails when `source` is itself a pre-built `Put`, or when the record's
    /// row key differs from the target row.
    pub fn merge_into<P: ToPut>(&self, source: P, target: &mut Put) -> Result<()> {
        source.merge_into(self, target)
    }

    pub fn decode<T, I>(&self, cells: I) -> Result<Option<T>>
    where
        T: Entity,
        I: IntoIterator,
        I::Item: Borrow<Cell>,
    {
        decoder::decode(&*self.descriptor::<T>()?, cells)
    }

    pub fn decode_many<T, R>(&self, rows: R) -> Result<DecodeMany<T, R::IntoIter>>
    where
        T: Entity,
        R: IntoIterator,
        R::Item: IntoIterator,
        <R::Item as IntoIterator>::Item: Borrow<Cell>,
    {
        Ok(decoder::decode_many(self.descriptor::<T>()?, rows))
    }

    pub fn decode_scalar<V, I>(&self, cells: I) -> Result<Option<V>>
    where
        V: CellValue,
        I: IntoIterator,
        I::Item: Borrow<Cell>,
    {
        decoder::decode_scalar(cells)
    }
}
