//! Attribute types and their shapes.
//!
//! [`Field`] is the type-shape query the descriptor builder classifies
//! attributes with, plus the typed primitives decode and encode use to move
//! one cell in or out of an attribute. Routing (which cells reach which
//! attribute, with which qualifier) lives in the decoder and encoder.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::codec::CellValue;
use crate::error::{Error, Result};
use crate::versioned::{Version, Versioned};

/// Structural shape of an attribute type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldShape {
    /// A single directly-typed value.
    Scalar,
    /// One `Versioned<V>`.
    Versioned,
    /// A sequence of `Versioned<V>` sharing one column.
    VersionedList,
    /// Qualifier name to `Versioned<V>`.
    VersionedMap,
    /// A bare key/value mapping; not representable as columns.
    Mapping,
}

impl fmt::Display for FieldShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FieldShape::Scalar => "scalar",
            FieldShape::Versioned => "versioned column",
            FieldShape::VersionedList => "collection of versioned columns",
            FieldShape::VersionedMap => "map of versioned columns",
            FieldShape::Mapping => "generic key/value mapping",
        };
        f.write_str(s)
    }
}

/// One value leaving an attribute on encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValue {
    /// Qualifier taken from the value itself (map entries only).
    pub key: Option<Vec<u8>>,
    pub value: Vec<u8>,
    pub version: Option<Version>,
}

impl FieldValue {
    fn plain(value: Vec<u8>) -> Self {
        Self {
            key: None,
            value,
            version: None,
        }
    }

    fn versioned(value: Vec<u8>, version: Version) -> Self {
        Self {
            key: None,
            value,
            version: Some(version),
        }
    }
}

/// An attribute type that maps onto the column space.
pub trait Field: Default + Send + Sync + 'static {
    const SHAPE: FieldShape;

    /// Name of the underlying value type, for diagnostics.
    const VALUE_TYPE: &'static str;

    /// True when encode should skip the attribute.
    fn is_unset(&self) -> bool;

    /// Take one cell. `key` is the cell qualifier; only maps use it.
    fn absorb(&mut self, key: &[u8], value: &[u8], version: Version) -> Result<()>;

    /// Produce the values to write, in a stable order for ordered types.
    fn emit(&self, out: &mut Vec<FieldValue>) -> Result<()>;
}

/// Plain scalar attributes: always set, so always written.
macro_rules! scalar_field {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Field for $ty {
                const SHAPE: FieldShape = FieldShape::Scalar;
                const VALUE_TYPE: &'static str = <$ty as CellValue>::TYPE_NAME;

                fn is_unset(&self) -> bool {
                    false
                }

                fn absorb(&mut self, _key: &[u8], value: &[u8], _version: Version) -> Result<()> {
                    *self = <$ty as CellValue>::decode_or_default(value)?;
                    Ok(())
                }

                fn emit(&self, out: &mut Vec<FieldValue>) -> Result<()> {
                    out.push(FieldValue::plain(self.to_cell_bytes()));
                    Ok(())
                }
            }
        )*
    };
}

scalar_field!(
    String,
    bool,
    i8,
    i16,
    i32,
    i64,
    i128,
    u8,
    u16,
    u32,
    u64,
    u128,
    f32,
    f64,
    DateTime<Utc>,
    NaiveDate,
    Uuid,
);

impl<V: CellValue> Field for Option<V> {
    const SHAPE: FieldShape = FieldShape::Scalar;
    const VALUE_TYPE: &'static str = V::TYPE_NAME;

    fn is_unset(&self) -> bool {
        self.is_none()
    }

    fn absorb(&mut self, _key: &[u8], value: &[u8], _version: Version) -> Result<()> {
        *self = Some(V::decode_or_default(value)?);
        Ok(())
    }

    fn emit(&self, out: &mut Vec<FieldValue>) -> Result<()> {
        if let Some(v) = self {
            out.push(FieldValue::plain(v.to_cell_bytes()));
        }
        Ok(())
    }
}

impl<V: CellValue> Field for Option<Versioned<V>> {
    const SHAPE: FieldShape = FieldShape::Versioned;
    const VALUE_TYPE: &'static str = V::TYPE_NAME;

    fn is_unset(&self) -> bool {
        self.is_none()
    }

    fn absorb(&mut self, _key: &[u8], value: &[u8], version: Version) -> Result<()> {
        *self = Some(Versioned::new(V::decode_or_default(value)?, version));
        Ok(())
    }

    fn emit(&self, out: &mut Vec<FieldValue>) -> Result<()> {
        if let Some(v) = self {
            out.push(FieldValue::versioned(v.value().to_cell_bytes(), v.version()));
        }
        Ok(())
    }
}

impl<V: CellValue> Field for Vec<Versioned<V>> {
    const SHAPE: FieldShape = FieldShape::VersionedList;
    const VALUE_TYPE: &'static str = V::TYPE_NAME;

    fn is_unset(&self) -> bool {
        self.is_empty()
    }

    fn absorb(&mut self, _key: &[u8], value: &[u8], version: Version) -> Result<()> {
        self.push(Versioned::new(V::decode_or_default(value)?, version));
        Ok(())
    }

    fn emit(&self, out: &mut Vec<FieldValue>) -> Result<()> {
        out.extend(
            self.iter()
                .map(|v| FieldValue::versioned(v.value().to_cell_bytes(), v.version())),
        );
        Ok(())
    }
}

fn map_key(key: &[u8]) -> Result<String> {
    String::from_utf8(key.to_vec()).map_err(|e| Error::codec("qualifier", e))
}

fn map_entry<V: CellValue>(key: &str, v: &Versioned<V>) -> FieldValue {
    FieldValue {
        key: Some(key.as_bytes().to_vec()),
        value: v.value().to_cell_bytes(),
        version: Some(v.version()),
    }
}

impl<V: CellValue> Field for BTreeMap<String, Versioned<V>> {
    const SHAPE: FieldShape = FieldShape::VersionedMap;
    const VALUE_TYPE: &'static str = V::TYPE_NAME;

    fn is_unset(&self) -> bool {
        self.is_empty()
    }

    fn absorb(&mut self, key: &[u8], value: &[u8], version: Version) -> Result<()> {
        self.insert(
            map_key(key)?,
            Versioned::new(V::decode_or_default(value)?, version),
        );
        Ok(())
    }

    fn emit(&self, out: &mut Vec<FieldValue>) -> Result<()> {
        out.extend(self.iter().map(|(k, v)| map_entry(k, v)));
        Ok(())
    }
}

impl<V: CellValue> Field for HashMap<String, Versioned<V>> {
    const SHAPE: FieldShape = FieldShape::VersionedMap;
    const VALUE_TYPE: &'static str = V::TYPE_NAME;

    fn is_unset(&self) -> bool {
        self.is_empty()
    }

    fn absorb(&mut self, key: &[u8], value: &[u8], version: Version) -> Result<()> {
        self.insert(
            map_key(key)?,
            Versioned::new(V::decode_or_default(value)?, version),
        );
        Ok(())
    }

    fn emit(&self, out: &mut Vec<FieldValue>) -> Result<()> {
        // Sorted so repeated encodes of one record produce identical output.
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        out.extend(entries.into_iter().map(|(k, v)| map_entry(k, v)));
        Ok(())
    }
}

/// Bare string maps have a shape so the descriptor builder can reject them
/// with a configuration error instead of mapping them ambiguously.
macro_rules! mapping_field {
    ($($map:ident),*) => {
        $(
            impl Field for $map<String, String> {
                const SHAPE: FieldShape = FieldShape::Mapping;
                const VALUE_TYPE: &'static str = "String";

                fn is_unset(&self) -> bool {
                    self.is_empty()
                }

                fn absorb(&mut self, _key: &[u8], _value: &[u8], _version: Version) -> Result<()> {
                    Err(unsupported_mapping())
                }

                fn emit(&self, _out: &mut Vec<FieldValue>) -> Result<()> {
                    Err(unsupported_mapping())
                }
            }
        )*
    };
}

mapping_field!(BTreeMap, HashMap);

fn unsupported_mapping() -> Error {
    Error::UnsupportedAttribute {
        entity: "<mapping>",
        attribute: String::new(),
        reason: FieldShape::Mapping.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shapes() {
        assert_eq!(<String as Field>::SHAPE, FieldShape::Scalar);
        assert_eq!(<Option<i64> as Field>::SHAPE, FieldShape::Scalar);
        assert_eq!(<Option<Versioned<i64>> as Field>::SHAPE, FieldShape::Versioned);
        assert_eq!(<Vec<Versioned<i64>> as Field>::SHAPE, FieldShape::VersionedList);
        assert_eq!(
            <BTreeMap<String, Versioned<i64>> as Field>::SHAPE,
            FieldShape::VersionedMap
        );
        assert_eq!(
            <HashMap<String, Versioned<String>> as Field>::SHAPE,
            FieldShape::VersionedMap
        );
        assert_eq!(<HashMap<String, String> as Field>::SHAPE, FieldShape::Mapping);
    }

    #[test]
    fn test_option_scalar() {
        let mut name: Option<String> = None;
        assert!(name.is_unset());
        name.absorb(b"", b"Ann", 10).unwrap();
        assert_eq!(name.as_deref(), Some("Ann"));

        let mut out = Vec::new();
        name.emit(&mut out).unwrap();
        assert_eq!(out, vec![FieldValue::plain(b"Ann".to_vec())]);
    }

    #[test]
    fn test_versioned_scalar_overwrites() {
        let mut v: Option<Versioned<i64>> = None;
        v.absorb(b"", b"1", 10).unwrap();
        v.absorb(b"", b"2", 5).unwrap();
        assert_eq!(v, Some(Versioned::new(2, 5)));
    }

    #[test]
    fn test_list_appends_in_order() {
        let mut list: Vec<Versioned<String>> = Vec::new();
        list.absorb(b"", b"a", 3).unwrap();
        list.absorb(b"", b"a", 3).unwrap();
        assert_eq!(list.len(), 2);

        let mut out = Vec::new();
        list.emit(&mut out).unwrap();
        assert!(out.iter().all(|fv| fv.key.is_none() && fv.version == Some(3)));
    }

    #[test]
    fn test_map_last_write_wins() {
        let mut scores: BTreeMap<String, Versioned<i64>> = BTreeMap::new();
        scores.absorb(b"math", b"90", 1).unwrap();
        scores.absorb(b"math", b"95", 2).unwrap();
        scores.absorb(b"art", b"88", 2).unwrap();
        assert_eq!(scores.len(), 2);
        assert_eq!(scores["math"], Versioned::new(95, 2));
    }

    #[test]
    fn test_hash_map_emit_is_sorted() {
        let mut scores: HashMap<String, Versioned<i64>> = HashMap::new();
        for (k, v) in [("math", 90), ("art", 88), ("music", 70)] {
            scores.insert(k.to_string(), Versioned::new(v, 1));
        }
        let mut out = Vec::new();
        scores.emit(&mut out).unwrap();
        let keys: Vec<_> = out.iter().map(|fv| fv.key.clone().unwrap()).collect();
        assert_eq!(keys, vec![b"art".to_vec(), b"math".to_vec(), b"music".to_vec()]);
    }

    #[test]
    fn test_map_rejects_non_utf8_qualifier() {
        let mut scores: BTreeMap<String, Versioned<i64>> = BTreeMap::new();
        assert!(scores.absorb(&[0xff], b"1", 1).is_err());
    }

    #[test]
    fn test_mapping_refuses_cells() {
        let mut props: HashMap<String, String> = HashMap::new();
        assert!(props.absorb(b"k", b"v", 1).is_err());
    }
}
