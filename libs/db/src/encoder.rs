//! Record to column writes.
//!
//! The row-key attribute becomes the mutation's row key, never a column.
//! Unset attributes are skipped. Every other attribute is written according
//! to its classification:
//!
//! | Classification        | Family          | Qualifier                  | Version   |
//! |-----------------------|-----------------|----------------------------|-----------|
//! | Scalar                | attribute       | fixed (empty by default)   | store     |
//! | Versioned Scalar      | attribute       | fixed                      | value's   |
//! | Versioned Collection  | attribute       | fixed, shared by elements  | element's |
//! | Versioned Map         | attribute       | map key                    | entry's   |
//! | Nested Entity         | outer attribute | nested attribute           | member's  |

use crate::descriptor::{Access, Entity, EntityDescriptor, NestedValue};
use crate::error::Result;
use crate::field::FieldValue;
use crate::mutation::ColumnWrite;

/// Encode `record` into column writes, in attribute declaration order.
pub fn encode<T: Entity>(descriptor: &EntityDescriptor<T>, record: &T) -> Result<Vec<ColumnWrite>> {
    let mut writes = Vec::with_capacity(descriptor.len());
    let mut values: Vec<FieldValue> = Vec::new();
    let mut nested: Vec<NestedValue> = Vec::new();

    for attribute in &descriptor.attributes {
        match &attribute.access {
            Access::Scalar(f) | Access::Versioned(f) | Access::Collection(f) => {
                if f.is_unset(record) {
                    continue;
                }
                values.clear();
                f.emit(record, &mut values)?;
                writes.extend(values.drain(..).map(|v| ColumnWrite {
                    family: attribute.column.to_vec(),
                    qualifier: attribute.qualifier.to_vec(),
                    value: v.value,
                    version: v.version,
                }));
            }
            Access::Map(f) => {
                if f.is_unset(record) {
                    continue;
                }
                values.clear();
                f.emit(record, &mut values)?;
                writes.extend(values.drain(..).map(|v| ColumnWrite {
                    family: attribute.column.to_vec(),
                    qualifier: v.key.unwrap_or_default(),
                    value: v.value,
                    version: v.version,
                }));
            }
            Access::Nested(n) => {
                if n.is_unset(record) {
                    continue;
                }
                nested.clear();
                n.emit(record, &mut nested)?;
                writes.extend(nested.drain(..).map(|m| ColumnWrite {
                    family: attribute.column.to_vec(),
                    qualifier: m.qualifier.to_vec(),
                    value: m.value.value,
                    version: m.value.version,
                }));
            }
        }
    }
    Ok(writes)
}

/// Encoded row key of `record`, or `None` when the type declares none.
pub fn row_key<T: Entity>(descriptor: &EntityDescriptor<T>, record: &T) -> Result<Option<Vec<u8>>> {
    let Some(key) = &descriptor.row_key else {
        return Ok(None);
    };
    let mut values = Vec::with_capacity(1);
    key.access.emit(record, &mut values)?;
    Ok(values.pop().map(|v| v.value))
}
