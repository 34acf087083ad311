//! Typed access to a cell store.

use crate::codec::CellValue;
use crate::descriptor::Entity;
use crate::error::{Error, Result};
use crate::mapper::Mapper;
use crate::mutation::{Delete, Get, Scan};
use crate::store::CellStore;

/// A [`CellStore`] read and written through a [`Mapper`].
///
/// Reads built here request `max_versions` from the mapper configuration;
/// requests passed in by the caller are used as given.
pub struct Table<S> {
    store: S,
    mapper: Mapper,
}

impl<S: CellStore> Table<S> {
    pub fn new(store: S, mapper: Mapper) -> Self {
        Self { store, mapper }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn mapper(&self) -> &Mapper {
        &self.mapper
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Write every set attribute of `record` under its row key.
    pub fn put<T: Entity>(&self, record: &T) -> Result<()> {
        let put = self.mapper.to_put(record)?;
        self.store.put(&put)
    }

    /// Read the record stored under `row_key`.
    pub fn get<T: Entity, K: CellValue>(&self, row_key: &K) -> Result<Option<T>> {
        let get = Get::new(row_key.to_cell_bytes())
            .with_max_versions(self.mapper.config().max_versions);
        self.get_with(&get)
    }

    pub fn get_with<T: Entity>(&self, get: &Get) -> Result<Option<T>> {
        let cells = self.store.get(get)?;
        self.mapper.decode(&cells)
    }

    pub fn scan<T: Entity>(&self, scan: &Scan) -> Result<Vec<T>> {
        let rows = self.store.scan(scan)?;
        self.mapper.decode_many::<T, _>(rows)?.collect()
    }

    /// Remove the whole row of `record`.
    pub fn delete<T: Entity>(&self, record: &T) -> Result<()> {
        let descriptor = self.mapper.descriptor::<T>()?;
        let row = self.mapper.row_key(record)?.ok_or(Error::MissingRowKey {
            entity: descriptor.entity_name(),
        })?;
        self.delete_row(row)
    }

    pub fn delete_row(&self, row: impl Into<Vec<u8>>) -> Result<()> {
        self.store.delete(&Delete::new(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapperConfig;
    use crate::descriptor::DescriptorBuilder;
    use crate::naming::NamingPolicy;
    use crate::store::MemoryStore;
    use crate::versioned::Versioned;

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Sensor {
        serial: u64,
        label: Option<String>,
        readings: Vec<Versioned<f64>>,
    }

    impl Entity for Sensor {
        fn describe(d: &mut DescriptorBuilder<'_, Self>) {
            d.row_key("serial", |s| &s.serial, |s| &mut s.serial)
                .field("label", |s| &s.label, |s| &mut s.label)
                .field("readings", |s| &s.readings, |s| &mut s.readings);
        }
    }

    fn table(max_versions: usize) -> Table<MemoryStore> {
        let config = MapperConfig::default()
            .with_naming_policy(NamingPolicy::LowerCaseWithUnderscores)
            .with_max_versions(max_versions);
        Table::new(MemoryStore::new(), Mapper::new(config))
    }

    fn sensor(serial: u64) -> Sensor {
        Sensor {
            serial,
            label: Some(format!("sensor-{serial}")),
            readings: vec![Versioned::new(1.5, 20), Versioned::new(1.25, 10)],
        }
    }

    #[test]
    fn test_put_get_round_trip() {
        let table = table(10);
        table.put(&sensor(7)).unwrap();
        let loaded: Sensor = table.get(&7_u64).unwrap().unwrap();
        assert_eq!(loaded, sensor(7));
    }

    #[test]
    fn test_get_respects_max_versions() {
        let table = table(1);
        table.put(&sensor(7)).unwrap();
        let loaded: Sensor = table.get(&7_u64).unwrap().unwrap();
        assert_eq!(loaded.readings, vec![Versioned::new(1.5, 20)]);
    }

    #[test]
    fn test_get_missing_row() {
        let table = table(1);
        assert_eq!(table.get::<Sensor, _>(&1_u64).unwrap(), None);
    }

    #[test]
    fn test_scan_and_delete() {
        let table = table(10);
        for serial in [3, 1, 2] {
            table.put(&sensor(serial)).unwrap();
        }
        let all: Vec<Sensor> = table.scan(&Scan::new().with_max_versions(10)).unwrap();
        let serials: Vec<_> = all.iter().map(|s| s.serial).collect();
        assert_eq!(serials, vec![1, 2, 3]);

        table.delete(&sensor(2)).unwrap();
        assert_eq!(table.get::<Sensor, _>(&2_u64).unwrap(), None);
        assert_eq!(table.scan::<Sensor>(&Scan::new()).unwrap().len(), 2);
    }
}
