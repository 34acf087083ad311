//! Cell stream to record.
//!
//! The decoder consumes the cells of exactly one row in store order and
//! builds the record incrementally, so the row never has to be buffered.
//! Routing is decided by the classification stored in the descriptor:
//!
//! ```text
//!   cell ──► family lookup ──┬─ unknown ─────────────────────► skip
//!                            ├─ Scalar ──────── at most once ─► assign
//!                            ├─ Versioned Scalar ─────────────► assign, last wins
//!                            ├─ Versioned Collection ─────────► append
//!                            ├─ Versioned Map ── by qualifier ► insert, last wins
//!                            └─ Nested Entity ── by qualifier ► member (same rules)
//! ```
//!
//! Unknown families and qualifiers are skipped so that rows written by newer
//! versions of a type still decode.

use std::borrow::Borrow;
use std::collections::HashSet;
use std::sync::Arc;

use tracing::trace;

use crate::cell::Cell;
use crate::codec::CellValue;
use crate::descriptor::{Access, Attribute, Classification, Entity, EntityDescriptor};
use crate::error::{Error, Result};

/// Decode one row's cells into a record.
///
/// Returns `Ok(None)` for an empty stream. All cells must share one row key.
pub fn decode<T, I>(descriptor: &EntityDescriptor<T>, cells: I) -> Result<Option<T>>
where
    T: Entity,
    I: IntoIterator,
    I::Item: Borrow<Cell>,
{
    let mut cells = cells.into_iter();
    let Some(first) = cells.next() else {
        return Ok(None);
    };
    let first = first.borrow();
    let mut decoder = RowDecoder::new(descriptor, first.row())?;
    decoder.accept(first)?;
    for cell in cells {
        decoder.accept(cell.borrow())?;
    }
    Ok(Some(decoder.finish()))
}

/// Decode a non-entity target from one row's cells.
///
/// Zero cells give `None`, one cell gives its value, more than one is an
/// ambiguous result.
pub fn decode_scalar<V, I>(cells: I) -> Result<Option<V>>
where
    V: CellValue,
    I: IntoIterator,
    I::Item: Borrow<Cell>,
{
    let mut cells = cells.into_iter();
    let Some(first) = cells.next() else {
        return Ok(None);
    };
    let extra = cells.count();
    if extra > 0 {
        return Err(Error::AmbiguousResult {
            type_name: V::TYPE_NAME,
            cells: extra + 1,
        });
    }
    V::decode_or_default(first.borrow().value()).map(Some)
}

/// Lazily decode a sequence of row streams.
pub fn decode_many<T, R>(descriptor: Arc<EntityDescriptor<T>>, rows: R) -> DecodeMany<T, R::IntoIter>
where
    T: Entity,
    R: IntoIterator,
    R::Item: IntoIterator,
    <R::Item as IntoIterator>::Item: Borrow<Cell>,
{
    DecodeMany {
        descriptor,
        rows: rows.into_iter(),
    }
}

/// Iterator returned by [`decode_many`]. Empty rows are skipped.
///
/// A clone continues independently from the current position, so the
/// sequence can be replayed whenever the row iterator is `Clone`.
pub struct DecodeMany<T, I> {
    descriptor: Arc<EntityDescriptor<T>>,
    rows: I,
}

impl<T, I: Clone> Clone for DecodeMany<T, I> {
    fn clone(&self) -> Self {
        Self {
            descriptor: Arc::clone(&self.descriptor),
            rows: self.rows.clone(),
        }
    }
}

impl<T, I> Iterator for DecodeMany<T, I>
where
    T: Entity,
    I: Iterator,
    I::Item: IntoIterator,
    <I::Item as IntoIterator>::Item: Borrow<Cell>,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let row = self.rows.next()?;
            match decode(&*self.descriptor, row) {
                Ok(Some(record)) => return Some(Ok(record)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Marker for "the attribute itself" in the scalar-seen set, as opposed to a
/// member of a nested entity.
const WHOLE: usize = usize::MAX;

/// Per-row decode state.
struct RowDecoder<'d, T> {
    descriptor: &'d EntityDescriptor<T>,
    record: T,
    row: Vec<u8>,
    /// Last family resolved and its attribute index.
    current: Option<(Vec<u8>, Option<usize>)>,
    /// Scalar columns already assigned: (attribute, nested member or WHOLE).
    seen: HashSet<(usize, usize)>,
}

impl<'d, T: Entity> RowDecoder<'d, T> {
    fn new(descriptor: &'d EntityDescriptor<T>, row: &[u8]) -> Result<Self> {
        let mut record = T::default();
        if let Some(key) = &descriptor.row_key {
            key.access.absorb(&mut record, b"", row, 0)?;
        }
        Ok(Self {
            descriptor,
            record,
            row: row.to_vec(),
            current: None,
            seen: HashSet::new(),
        })
    }

    /// Cells arrive grouped by family, so the previous resolution usually
    /// applies to the next cell as well.
    fn resolve(&mut self, family: &[u8]) -> Option<usize> {
        if let Some((cached, index)) = &self.current {
            if cached.as_slice() == family {
                return *index;
            }
        }
        let index = self.descriptor.lookup(family).map(|(i, _)| i);
        self.current = Some((family.to_vec(), index));
        index
    }

    fn accept(&mut self, cell: &Cell) -> Result<()> {
        if cell.row() != self.row.as_slice() {
            return Err(Error::MixedRows {
                expected: String::from_utf8_lossy(&self.row).into_owned(),
                found: String::from_utf8_lossy(cell.row()).into_owned(),
            });
        }
        let Some(index) = self.resolve(cell.family()) else {
            trace!(
                entity = self.descriptor.entity_name(),
                family = %String::from_utf8_lossy(cell.family()),
                "Skipping unknown family"
            );
            return Ok(());
        };
        let descriptor = self.descriptor;
        let attribute = &descriptor.attributes[index];
        match &attribute.access {
            Access::Scalar(f) => {
                if !self.fixed_qualifier(attribute, cell) {
                    return Ok(());
                }
                if !self.seen.insert((index, WHOLE)) {
                    return Err(ambiguous(descriptor, attribute.name, None, cell));
                }
                f.absorb(&mut self.record, cell.qualifier(), cell.value(), cell.timestamp())
            }
            Access::Versioned(f) | Access::Collection(f) => {
                if !self.fixed_qualifier(attribute, cell) {
                    return Ok(());
                }
                f.absorb(&mut self.record, cell.qualifier(), cell.value(), cell.timestamp())
            }
            Access::Map(f) => {
                f.absorb(&mut self.record, cell.qualifier(), cell.value(), cell.timestamp())
            }
            Access::Nested(n) => {
                let Some((member, classification)) = n.lookup(cell.qualifier()) else {
                    trace!(
                        entity = n.nested_entity(),
                        qualifier = %String::from_utf8_lossy(cell.qualifier()),
                        "Skipping unknown nested qualifier"
                    );
                    return Ok(());
                };
                if classification == Classification::Scalar
                    && !self.seen.insert((index, member))
                {
                    let member_name = n.member_name(member);
                    return Err(ambiguous(descriptor, attribute.name, Some(member_name), cell));
                }
                n.absorb(&mut self.record, member, cell.value(), cell.timestamp())
            }
        }
    }

    fn fixed_qualifier(&self, attribute: &Attribute<T>, cell: &Cell) -> bool {
        if cell.qualifier() == attribute.qualifier() {
            return true;
        }
        trace!(
            entity = self.descriptor.entity_name(),
            attribute = attribute.name(),
            qualifier = %String::from_utf8_lossy(cell.qualifier()),
            "Skipping unknown qualifier"
        );
        false
    }

    fn finish(self) -> T {
        self.record
    }
}

fn ambiguous<T: Entity>(
    descriptor: &EntityDescriptor<T>,
    attribute: &str,
    member: Option<&str>,
    cell: &Cell,
) -> Error {
    let attribute = match member {
        Some(m) => format!("{}.{}", attribute, m),
        None => attribute.to_string(),
    };
    Error::AmbiguousScalar {
        entity: descriptor.entity_name(),
        attribute,
        column: format!(
            "{}:{}",
            String::from_utf8_lossy(cell.family()),
            String::from_utf8_lossy(cell.qualifier())
        ),
    }
}

#[cfg(test)]
#[path = "decoder_tests.rs"]
mod decoder_tests;
