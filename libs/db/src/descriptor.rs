//! Entity descriptors: the structural map between a record type and the
//! column space.
//!
//! A record type registers its attributes once through [`Entity::describe`].
//! The builder classifies every attribute from its type shape, resolves the
//! stored family (or, inside a nested entity, qualifier) name through the
//! naming policy, and produces an immutable [`EntityDescriptor`] that decode
//! and encode consult without further type inspection.
//!
//! ```text
//!   Entity::describe ──► DescriptorBuilder ──► EntityDescriptor<T>
//!                          │  classify(FieldShape)      ├─ row key binding
//!                          │  NamingPolicy::translate   ├─ attributes (declaration order)
//!                          │  NamePool::intern          └─ column → attribute index
//!                          ▼
//!                    DescriptorRegistry (cache)
//! ```
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeMap;
//! use cellmap_db::{DescriptorBuilder, Entity, Versioned};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct User {
//!     id: String,
//!     name: Option<String>,
//!     scores: BTreeMap<String, Versioned<i64>>,
//! }
//!
//! impl Entity for User {
//!     fn describe(d: &mut DescriptorBuilder<'_, Self>) {
//!         d.row_key("id", |u| &u.id, |u| &mut u.id)
//!             .field("name", |u| &u.name, |u| &mut u.name)
//!             .field("scores", |u| &u.scores, |u| &mut u.scores);
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::field::{Field, FieldShape, FieldValue};
use crate::naming::NamingPolicy;
use crate::registry::DescriptorRegistry;
use crate::versioned::Version;

/// A record type that maps onto one row.
pub trait Entity: Default + Send + Sync + 'static {
    /// Register the row key and attributes of this type.
    fn describe(builder: &mut DescriptorBuilder<'_, Self>);
}

/// How an attribute maps onto the column space. Computed once per attribute
/// when the descriptor is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// One value in the attribute's column.
    Scalar,
    /// Another entity whose attributes become qualifiers under the family.
    NestedEntity,
    /// One value plus its version.
    VersionedScalar,
    /// Many versioned values sharing the attribute's column.
    VersionedCollection,
    /// Versioned values keyed by qualifier.
    VersionedMap,
}

impl Classification {
    /// Classification for a column attribute of the given shape. `None` for
    /// shapes that cannot be mapped.
    pub fn of_shape(shape: FieldShape) -> Option<Self> {
        match shape {
            FieldShape::Scalar => Some(Classification::Scalar),
            FieldShape::Versioned => Some(Classification::VersionedScalar),
            FieldShape::VersionedList => Some(Classification::VersionedCollection),
            FieldShape::VersionedMap => Some(Classification::VersionedMap),
            FieldShape::Mapping => None,
        }
    }

    pub fn is_versioned(&self) -> bool {
        matches!(
            self,
            Classification::VersionedScalar
                | Classification::VersionedCollection
                | Classification::VersionedMap
        )
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Classification::Scalar => "scalar",
            Classification::NestedEntity => "nested entity",
            Classification::VersionedScalar => "versioned scalar",
            Classification::VersionedCollection => "versioned collection",
            Classification::VersionedMap => "versioned map",
        };
        f.write_str(s)
    }
}

// ============================================================================
// Type-erased accessors
// ============================================================================

/// Reads and writes one column attribute of a `T`.
pub(crate) trait FieldAccess<T>: Send + Sync {
    fn is_unset(&self, record: &T) -> bool;
    fn absorb(&self, record: &mut T, key: &[u8], value: &[u8], version: Version) -> Result<()>;
    fn emit(&self, record: &T, out: &mut Vec<FieldValue>) -> Result<()>;
}

struct Accessor<T, F> {
    get: fn(&T) -> &F,
    get_mut: fn(&mut T) -> &mut F,
}

impl<T: 'static, F: Field> FieldAccess<T> for Accessor<T, F> {
    fn is_unset(&self, record: &T) -> bool {
        (self.get)(record).is_unset()
    }

    fn absorb(&self, record: &mut T, key: &[u8], value: &[u8], version: Version) -> Result<()> {
        (self.get_mut)(record).absorb(key, value, version)
    }

    fn emit(&self, record: &T, out: &mut Vec<FieldValue>) -> Result<()> {
        (self.get)(record).emit(out)
    }
}

/// One value leaving a nested entity, addressed by the member's qualifier.
pub(crate) struct NestedValue {
    pub(crate) qualifier: Arc<[u8]>,
    pub(crate) value: FieldValue,
}

/// Reads and writes a nested entity attribute of a `T`.
pub(crate) trait NestedAccess<T>: Send + Sync {
    fn nested_entity(&self) -> &'static str;

    /// Resolve a qualifier to a member of the nested entity.
    fn lookup(&self, qualifier: &[u8]) -> Option<(usize, Classification)>;

    fn member_name(&self, member: usize) -> &'static str;

    fn is_unset(&self, record: &T) -> bool;

    /// Store a cell into a member, creating the nested record on first use.
    fn absorb(&self, record: &mut T, member: usize, value: &[u8], version: Version)
        -> Result<()>;

    fn emit(&self, record: &T, out: &mut Vec<NestedValue>) -> Result<()>;

    fn members(&self) -> Vec<AttributeInfo>;
}

struct NestedAccessor<T, N: Entity> {
    get: fn(&T) -> &Option<N>,
    get_mut: fn(&mut T) -> &mut Option<N>,
    descriptor: Arc<EntityDescriptor<N>>,
}

impl<T: 'static, N: Entity> NestedAccess<T> for NestedAccessor<T, N> {
    fn nested_entity(&self) -> &'static str {
        self.descriptor.entity_name()
    }

    fn lookup(&self, qualifier: &[u8]) -> Option<(usize, Classification)> {
        self.descriptor
            .lookup(qualifier)
            .map(|(i, a)| (i, a.classification()))
    }

    fn member_name(&self, member: usize) -> &'static str {
        self.descriptor.attributes[member].name
    }

    fn is_unset(&self, record: &T) -> bool {
        (self.get)(record).is_none()
    }

    fn absorb(
        &self,
        record: &mut T,
        member: usize,
        value: &[u8],
        version: Version,
    ) -> Result<()> {
        let nested = (self.get_mut)(record).get_or_insert_with(N::default);
        match &self.descriptor.attributes[member].access {
            Access::Scalar(f) | Access::Versioned(f) | Access::Collection(f) => {
                f.absorb(nested, b"", value, version)
            }
            // Nested descriptors are validated to hold column attributes only.
            Access::Map(_) | Access::Nested(_) => Ok(()),
        }
    }

    fn emit(&self, record: &T, out: &mut Vec<NestedValue>) -> Result<()> {
        let Some(nested) = (self.get)(record) else {
            return Ok(());
        };
        let mut values = Vec::new();
        for member in &self.descriptor.attributes {
            let (Access::Scalar(f) | Access::Versioned(f) | Access::Collection(f)) =
                &member.access
            else {
                continue;
            };
            if f.is_unset(nested) {
                continue;
            }
            values.clear();
            f.emit(nested, &mut values)?;
            out.extend(values.drain(..).map(|value| NestedValue {
                qualifier: Arc::clone(&member.column),
                value,
            }));
        }
        Ok(())
    }

    fn members(&self) -> Vec<AttributeInfo> {
        self.descriptor.attributes.iter().map(Attribute::info).collect()
    }
}

/// Classification together with the accessor it routes to.
pub(crate) enum Access<T> {
    Scalar(Box<dyn FieldAccess<T>>),
    Versioned(Box<dyn FieldAccess<T>>),
    Collection(Box<dyn FieldAccess<T>>),
    Map(Box<dyn FieldAccess<T>>),
    Nested(Box<dyn NestedAccess<T>>),
}

impl<T> Access<T> {
    fn classification(&self) -> Classification {
        match self {
            Access::Scalar(_) => Classification::Scalar,
            Access::Versioned(_) => Classification::VersionedScalar,
            Access::Collection(_) => Classification::VersionedCollection,
            Access::Map(_) => Classification::VersionedMap,
            Access::Nested(_) => Classification::NestedEntity,
        }
    }
}

// ============================================================================
// Descriptor
// ============================================================================

/// The row-key binding of an entity.
pub(crate) struct RowKey<T> {
    pub(crate) name: &'static str,
    pub(crate) value_type: &'static str,
    pub(crate) access: Box<dyn FieldAccess<T>>,
}

/// One mapped attribute.
pub struct Attribute<T> {
    pub(crate) name: &'static str,
    /// Stored family name (top level) or qualifier (inside a nested entity).
    pub(crate) column: Arc<[u8]>,
    /// Fixed qualifier for Scalar / Versioned Scalar / Versioned Collection.
    pub(crate) qualifier: Arc<[u8]>,
    pub(crate) value_type: &'static str,
    pub(crate) access: Access<T>,
}

impl<T> Attribute<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn column(&self) -> &[u8] {
        &self.column
    }

    pub fn qualifier(&self) -> &[u8] {
        &self.qualifier
    }

    pub fn classification(&self) -> Classification {
        self.access.classification()
    }

    pub fn info(&self) -> AttributeInfo {
        let nested = match &self.access {
            Access::Nested(n) => n.members(),
            _ => Vec::new(),
        };
        AttributeInfo {
            name: self.name,
            column: String::from_utf8_lossy(&self.column).into_owned(),
            qualifier: String::from_utf8_lossy(&self.qualifier).into_owned(),
            classification: self.classification(),
            value_type: self.value_type,
            nested,
        }
    }
}

/// Owned, printable summary of an attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeInfo {
    pub name: &'static str,
    pub column: String,
    pub qualifier: String,
    pub classification: Classification,
    pub value_type: &'static str,
    /// Members of a nested entity; empty otherwise.
    pub nested: Vec<AttributeInfo>,
}

/// Immutable structural description of an entity type under one naming
/// policy. Obtained from the [`DescriptorRegistry`] and shared through `Arc`.
pub struct EntityDescriptor<T> {
    entity: &'static str,
    policy: NamingPolicy,
    pub(crate) row_key: Option<RowKey<T>>,
    pub(crate) attributes: Vec<Attribute<T>>,
    index: HashMap<Arc<[u8]>, usize>,
}

impl<T: Entity> EntityDescriptor<T> {
    pub fn entity_name(&self) -> &'static str {
        self.entity
    }

    pub fn naming_policy(&self) -> NamingPolicy {
        self.policy
    }

    /// Name of the row-key attribute, if one is declared.
    pub fn row_key_name(&self) -> Option<&'static str> {
        self.row_key.as_ref().map(|k| k.name)
    }

    pub fn row_key_type(&self) -> Option<&'static str> {
        self.row_key.as_ref().map(|k| k.value_type)
    }

    pub fn attributes(&self) -> impl Iterator<Item = &Attribute<T>> {
        self.attributes.iter()
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute<T>> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Resolve a stored column name to its attribute.
    pub fn lookup(&self, column: &[u8]) -> Option<(usize, &Attribute<T>)> {
        self.index
            .get(column)
            .map(|&i| (i, &self.attributes[i]))
    }

    /// Stored family names in declaration order.
    pub fn families(&self) -> Vec<&[u8]> {
        self.attributes.iter().map(|a| a.column()).collect()
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn describe(&self) -> Vec<AttributeInfo> {
        self.attributes.iter().map(Attribute::info).collect()
    }

    /// Check that this descriptor can serve as a nested entity.
    pub(crate) fn check_nestable(&self) -> Result<()> {
        if let Some(key) = &self.row_key {
            return Err(not_nestable(self.entity, key.name, "declares a row key"));
        }
        for attribute in &self.attributes {
            if !attribute.qualifier.is_empty() {
                return Err(not_nestable(
                    self.entity,
                    attribute.name,
                    "members of a nested entity are addressed by name",
                ));
            }
            match attribute.classification() {
                Classification::NestedEntity => {
                    return Err(not_nestable(
                        self.entity,
                        attribute.name,
                        "nested entities may not contain nested entities",
                    ))
                }
                Classification::VersionedMap => {
                    return Err(not_nestable(
                        self.entity,
                        attribute.name,
                        "a versioned map needs its own family",
                    ))
                }
                _ => {}
            }
        }
        Ok(())
    }
}

impl<T: Entity> fmt::Debug for EntityDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityDescriptor")
            .field("entity", &self.entity)
            .field("policy", &self.policy)
            .field("row_key", &self.row_key_name())
            .field("attributes", &self.describe())
            .finish()
    }
}

fn not_nestable(entity: &'static str, attribute: &str, reason: &str) -> Error {
    Error::UnsupportedAttribute {
        entity,
        attribute: attribute.to_string(),
        reason: format!("not usable as a nested entity: {}", reason),
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Collects attribute registrations for one entity type.
///
/// Registration methods chain; the first configuration error is kept and
/// returned when the registry builds the descriptor.
pub struct DescriptorBuilder<'r, T> {
    registry: &'r DescriptorRegistry,
    entity: &'static str,
    policy: NamingPolicy,
    nested: bool,
    row_key: Option<RowKey<T>>,
    attributes: Vec<Attribute<T>>,
    error: Option<Error>,
}

impl<'r, T: Entity> DescriptorBuilder<'r, T> {
    pub(crate) fn new(registry: &'r DescriptorRegistry, policy: NamingPolicy, nested: bool) -> Self {
        Self {
            registry,
            entity: std::any::type_name::<T>(),
            policy,
            nested,
            row_key: None,
            attributes: Vec::new(),
            error: None,
        }
    }

    pub fn naming_policy(&self) -> NamingPolicy {
        self.policy
    }

    /// Declare the row-key attribute. Its value is read from the row key on
    /// decode and supplies the row key on encode; it never becomes a column.
    pub fn row_key<F: Field>(
        &mut self,
        name: &'static str,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> &mut Self {
        if self.error.is_some() {
            return self;
        }
        if F::SHAPE != FieldShape::Scalar {
            return self.fail(Error::UnsupportedRowKey {
                entity: self.entity,
                attribute: name.to_string(),
                shape: F::SHAPE,
            });
        }
        if self.nested {
            return self.fail(not_nestable(self.entity, name, "declares a row key"));
        }
        if let Some(existing) = &self.row_key {
            let reason = format!("row key already declared as '{}'", existing.name);
            return self.fail(self.unsupported(name, reason));
        }
        self.row_key = Some(RowKey {
            name,
            value_type: F::VALUE_TYPE,
            access: Box::new(Accessor { get, get_mut }),
        });
        self
    }

    /// Declare a column attribute. Scalar, Versioned Scalar and Versioned
    /// Collection attributes use the empty qualifier.
    pub fn field<F: Field>(
        &mut self,
        name: &'static str,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> &mut Self {
        self.add_field(name, None, get, get_mut)
    }

    /// Declare a column attribute stored under a fixed qualifier.
    pub fn field_at<F: Field>(
        &mut self,
        name: &'static str,
        qualifier: &str,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> &mut Self {
        self.add_field(name, Some(qualifier), get, get_mut)
    }

    /// Declare a nested entity attribute. The nested type's attributes become
    /// qualifiers under this attribute's family.
    ///
    /// A nested value whose members are all unset writes no cells, so it
    /// reads back as `None` rather than `Some(N::default())`.
    pub fn nested<N: Entity>(
        &mut self,
        name: &'static str,
        get: fn(&T) -> &Option<N>,
        get_mut: fn(&mut T) -> &mut Option<N>,
    ) -> &mut Self {
        if self.error.is_some() {
            return self;
        }
        if self.nested {
            return self.fail(not_nestable(
                self.entity,
                name,
                "nested entities may not contain nested entities",
            ));
        }
        let descriptor = match self.registry.nested_descriptor::<N>(self.policy) {
            Ok(d) => d,
            Err(e) => return self.fail(e),
        };
        let access = Access::Nested(Box::new(NestedAccessor {
            get,
            get_mut,
            descriptor: Arc::clone(&descriptor),
        }));
        self.push(name, None, descriptor.entity_name(), access)
    }

    fn add_field<F: Field>(
        &mut self,
        name: &'static str,
        qualifier: Option<&str>,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> &mut Self {
        if self.error.is_some() {
            return self;
        }
        if self.nested && qualifier.is_some() {
            let reason = "members of a nested entity are addressed by name".to_string();
            return self.fail(self.unsupported(name, reason));
        }
        let accessor: Box<dyn FieldAccess<T>> = Box::new(Accessor { get, get_mut });
        let access = match F::SHAPE {
            FieldShape::Scalar => Access::Scalar(accessor),
            FieldShape::Versioned => Access::Versioned(accessor),
            FieldShape::VersionedList => Access::Collection(accessor),
            FieldShape::Mapping => {
                let reason = format!(
                    "{} (use a map of Versioned values for qualifier-keyed columns)",
                    F::SHAPE
                );
                return self.fail(self.unsupported(name, reason));
            }
            FieldShape::VersionedMap => {
                if self.nested {
                    return self.fail(not_nestable(
                        self.entity,
                        name,
                        "a versioned map needs its own family",
                    ));
                }
                if qualifier.is_some() {
                    let reason = "a versioned map takes its qualifiers from its keys".to_string();
                    return self.fail(self.unsupported(name, reason));
                }
                Access::Map(accessor)
            }
        };
        self.push(name, qualifier, F::VALUE_TYPE, access)
    }

    fn push(
        &mut self,
        name: &'static str,
        qualifier: Option<&str>,
        value_type: &'static str,
        access: Access<T>,
    ) -> &mut Self {
        let stored = self.policy.translate(name);
        if let Some(first) = self
            .attributes
            .iter()
            .find(|a| a.column.as_ref() == stored.as_bytes())
        {
            let err = Error::DuplicateColumn {
                entity: self.entity,
                column: stored,
                first: first.name.to_string(),
                second: name.to_string(),
            };
            return self.fail(err);
        }
        let registry = self.registry;
        let names = registry.names();
        self.attributes.push(Attribute {
            name,
            column: names.intern(&stored),
            qualifier: names.intern(qualifier.unwrap_or("")),
            value_type,
            access,
        });
        self
    }

    fn unsupported(&self, name: &str, reason: String) -> Error {
        Error::UnsupportedAttribute {
            entity: self.entity,
            attribute: name.to_string(),
            reason,
        }
    }

    fn fail(&mut self, error: Error) -> &mut Self {
        if self.error.is_none() {
            self.error = Some(error);
        }
        self
    }

    pub(crate) fn build(self) -> Result<EntityDescriptor<T>> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let index = self
            .attributes
            .iter()
            .enumerate()
            .map(|(i, a)| (Arc::clone(&a.column), i))
            .collect();
        Ok(EntityDescriptor {
            entity: self.entity,
            policy: self.policy,
            row_key: self.row_key,
            attributes: self.attributes,
            index,
        })
    }
}

#[cfg(test)]
#[path = "descriptor_tests.rs"]
mod descriptor_tests;
