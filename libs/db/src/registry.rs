//! Process-wide descriptor cache.
//!
//! Descriptors are keyed by `(type, naming policy)`. A descriptor is built at
//! most once per key in steady state: concurrent first requests may both build,
//! but only the first published result is kept and every caller receives that
//! instance. Builds run outside any map lock, so a type that nests another
//! type can request the nested descriptor while being built. Failed builds
//! are not cached.
//!
//! [`NamePool`] interns the stored family and qualifier names so every
//! descriptor shares one allocation per distinct name.

use std::any::{Any, TypeId};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use tracing::debug;

use crate::descriptor::{DescriptorBuilder, Entity, EntityDescriptor};
use crate::error::Result;
use crate::naming::NamingPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct DescriptorKey {
    type_id: TypeId,
    policy: NamingPolicy,
}

type AnyDescriptor = Arc<dyn Any + Send + Sync>;

/// Thread-safe interner for stored names.
#[derive(Debug, Default)]
pub struct NamePool {
    names: DashMap<Box<str>, Arc<[u8]>>,
}

impl NamePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the shared bytes for `name`, interning it on first use.
    pub fn intern(&self, name: &str) -> Arc<[u8]> {
        if let Some(bytes) = self.names.get(name) {
            return Arc::clone(bytes.value());
        }
        let bytes = self
            .names
            .entry(Box::from(name))
            .or_insert_with(|| Arc::from(name.as_bytes()));
        Arc::clone(bytes.value())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Cache of entity descriptors.
///
/// Most callers use [`DescriptorRegistry::global`]. Separate registries are
/// useful in tests that need to observe a cold cache.
#[derive(Default)]
pub struct DescriptorRegistry {
    descriptors: DashMap<DescriptorKey, AnyDescriptor>,
    names: NamePool,
}

impl DescriptorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry.
    pub fn global() -> &'static DescriptorRegistry {
        static GLOBAL: OnceLock<DescriptorRegistry> = OnceLock::new();
        GLOBAL.get_or_init(DescriptorRegistry::new)
    }

    pub fn names(&self) -> &NamePool {
        &self.names
    }

    /// Number of cached descriptors.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn contains<T: Entity>(&self, policy: NamingPolicy) -> bool {
        self.descriptors.contains_key(&key::<T>(policy))
    }

    /// Descriptor for `T` under `policy`, building it on first request.
    pub fn descriptor<T: Entity>(&self, policy: NamingPolicy) -> Result<Arc<EntityDescriptor<T>>> {
        if let Some(cached) = self.cached::<T>(policy) {
            return Ok(cached);
        }
        let built = self.build::<T>(policy, false)?;
        Ok(self.publish(policy, built))
    }

    /// Descriptor for `N` used as a nested entity. A descriptor already cached
    /// for top-level use is reused once it is checked to be nestable.
    pub(crate) fn nested_descriptor<N: Entity>(
        &self,
        policy: NamingPolicy,
    ) -> Result<Arc<EntityDescriptor<N>>> {
        if let Some(cached) = self.cached::<N>(policy) {
            cached.check_nestable()?;
            return Ok(cached);
        }
        let built = self.build::<N>(policy, true)?;
        Ok(self.publish(policy, built))
    }

    fn cached<T: Entity>(&self, policy: NamingPolicy) -> Option<Arc<EntityDescriptor<T>>> {
        let entry = self.descriptors.get(&key::<T>(policy))?;
        Arc::clone(entry.value()).downcast::<EntityDescriptor<T>>().ok()
    }

    fn build<T: Entity>(&self, policy: NamingPolicy, nested: bool) -> Result<EntityDescriptor<T>> {
        let mut builder = DescriptorBuilder::<T>::new(self, policy, nested);
        T::describe(&mut builder);
        let descriptor = builder.build()?;
        debug!(
            entity = descriptor.entity_name(),
            policy = %policy,
            attributes = descriptor.len(),
            nested,
            "Built entity descriptor"
        );
        Ok(descriptor)
    }

    /// Insert unless another thread got there first; return the winner.
    fn publish<T: Entity>(
        &self,
        policy: NamingPolicy,
        built: EntityDescriptor<T>,
    ) -> Arc<EntityDescriptor<T>> {
        let built = Arc::new(built);
        let winner = {
            let entry = self
                .descriptors
                .entry(key::<T>(policy))
                .or_insert_with(|| Arc::clone(&built) as AnyDescriptor);
            Arc::clone(entry.value())
        };
        winner.downcast::<EntityDescriptor<T>>().unwrap_or(built)
    }
}

fn key<T: 'static>(policy: NamingPolicy) -> DescriptorKey {
    DescriptorKey {
        type_id: TypeId::of::<T>(),
        policy,
    }
}
