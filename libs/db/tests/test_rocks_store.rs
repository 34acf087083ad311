//! RocksStore behaviour against a real database in a temp directory.

mod common;

use cellmap_db::{
    CellStore, Delete, Error, Get, Mapper, MapperConfig, NamingPolicy, Put, RocksStore, Scan,
    StoreConfig, StoreMode, Table,
};
use common::{full_user, User};
use tempfile::TempDir;

fn small_config() -> StoreConfig {
    StoreConfig::with_cache_size(8 * 1024 * 1024)
}

fn seeded(dir: &TempDir) -> RocksStore {
    let store = RocksStore::open(dir.path(), small_config()).expect("open store");
    for row in ["r1", "r2", "r3"] {
        let mut put = Put::new(row);
        put.add_versioned_column("f", "a", format!("{row}-a1"), 10)
            .add_versioned_column("f", "a", format!("{row}-a2"), 20)
            .add_versioned_column("f", "b", format!("{row}-b"), 10)
            .add_versioned_column("g", "", format!("{row}-g"), 10);
        store.put(&put).unwrap();
    }
    store
}

fn values(cells: &[cellmap_db::Cell]) -> Vec<String> {
    cells
        .iter()
        .map(|c| String::from_utf8_lossy(c.value()).into_owned())
        .collect()
}

#[test]
fn test_get_returns_store_order() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = seeded(&dir);
    assert_eq!(store.mode(), StoreMode::ReadWrite);

    let cells = store.get(&Get::new("r2")).unwrap();
    assert_eq!(values(&cells), vec!["r2-a2", "r2-b", "r2-g"]);

    let cells = store.get(&Get::new("r2").with_max_versions(5)).unwrap();
    assert_eq!(values(&cells), vec!["r2-a2", "r2-a1", "r2-b", "r2-g"]);
    assert_eq!(cells[0].timestamp(), 20);

    let cells = store
        .get(&Get::new("r2").add_column("f", "a").with_max_versions(5))
        .unwrap();
    assert_eq!(values(&cells), vec!["r2-a2", "r2-a1"]);

    let cells = store
        .get(&Get::new("r2").with_max_versions(5).with_time_range(0, 20))
        .unwrap();
    assert_eq!(values(&cells), vec!["r2-a1", "r2-b", "r2-g"]);

    assert!(store.get(&Get::new("r9")).unwrap().is_empty());
}

#[test]
fn test_scan_bounds_and_limit() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = seeded(&dir);

    let rows = store.scan(&Scan::new()).unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r.len() == 3));

    let rows = store
        .scan(&Scan::new().with_start_row("r2").with_stop_row("r3"))
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0].row(), b"r2");

    let rows = store.scan(&Scan::new().with_limit(2).add_family("g")).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(values(&rows[1]), vec!["r2-g"]);
}

#[test]
fn test_delete_targets() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = seeded(&dir);
    let all = |row: &str| store.get(&Get::new(row).with_max_versions(10)).unwrap();

    store
        .delete(&Delete::new("r1").delete_version("f", "a", 20))
        .unwrap();
    assert_eq!(values(&all("r1")), vec!["r1-a1", "r1-b", "r1-g"]);

    store.delete(&Delete::new("r1").delete_column("f", "b")).unwrap();
    assert_eq!(values(&all("r1")), vec!["r1-a1", "r1-g"]);

    store.delete(&Delete::new("r1").delete_family("g")).unwrap();
    assert_eq!(values(&all("r1")), vec!["r1-a1"]);

    store.delete(&Delete::new("r2")).unwrap();
    assert!(all("r2").is_empty());
    assert_eq!(values(&all("r3")).len(), 4);
}

#[test]
fn test_unversioned_put_gets_store_time() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = RocksStore::open(dir.path(), small_config()).unwrap();
    let before = cellmap_db::store::now_millis();
    let mut put = Put::new("r1");
    put.add_column("f", "a", "x").add_column("f", "b", "y");
    store.put(&put).unwrap();

    let cells = store.get(&Get::new("r1")).unwrap();
    assert_eq!(cells.len(), 2);
    assert!(cells[0].timestamp() >= before);
    assert_eq!(cells[0].timestamp(), cells[1].timestamp());
}

#[test]
fn test_invalid_columns_rejected() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = RocksStore::open(dir.path(), small_config()).unwrap();

    let mut put = Put::new("r1");
    put.add_column("f\0x", "a", "x");
    assert!(matches!(store.put(&put).unwrap_err(), Error::InvalidColumn(_)));

    let put = Put::new("");
    assert!(matches!(store.put(&put).unwrap_err(), Error::InvalidColumn(_)));
}

#[test]
fn test_reopen_and_read_only() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    {
        let store = seeded(&dir);
        store.flush().unwrap();
    }

    let store = RocksStore::open_readonly(dir.path(), small_config()).unwrap();
    assert_eq!(store.mode(), StoreMode::ReadOnly);
    assert_eq!(store.path(), dir.path());
    assert_eq!(values(&store.get(&Get::new("r3")).unwrap()), vec!["r3-a2", "r3-b", "r3-g"]);

    let mut put = Put::new("r4");
    put.add_column("f", "a", "x");
    let err = store.put(&put).unwrap_err();
    assert!(matches!(err, Error::Io(ref m) if m.contains("read-only")));
    assert!(store.delete(&Delete::new("r1")).is_err());
}

#[test]
fn test_open_rejects_file_path() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let file = dir.path().join("not-a-dir");
    std::fs::write(&file, b"x").unwrap();
    let err = RocksStore::open(&file, small_config()).err().unwrap();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn test_table_over_rocks_store() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = RocksStore::open(dir.path(), small_config()).unwrap();
    let config = MapperConfig::default()
        .with_naming_policy(NamingPolicy::LowerCaseWithUnderscores)
        .with_max_versions(10);
    let table = Table::new(store, Mapper::new(config));

    for id in ["u2", "u1"] {
        table.put(&full_user(id)).unwrap();
    }
    let loaded: User = table.get(&"u1".to_string()).unwrap().unwrap();
    assert_eq!(loaded, full_user("u1"));

    let users: Vec<User> = table.scan(&Scan::new().with_max_versions(10)).unwrap();
    assert_eq!(users, vec![full_user("u1"), full_user("u2")]);

    table.delete(&full_user("u2")).unwrap();
    assert_eq!(table.get::<User, _>(&"u2".to_string()).unwrap(), None);

    let cells = table.store().get(&Get::new("u1").add_family("scores")).unwrap();
    assert_eq!(cells.len(), 2);
}
