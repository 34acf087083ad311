//! End-to-end tests for the `cellmap` binary.
//!
//! Cells are written through `cellmap cells put`, then read back with
//! `get` and `scan` in each output format.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

/// Run the cellmap binary, returning (success, stdout, stderr).
fn run_cellmap(args: &[&str]) -> (bool, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_cellmap"))
        .args(args)
        .env("CELLMAP_LOG", "off")
        .output()
        .expect("Failed to execute cellmap");

    (
        output.status.success(),
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
    )
}

fn cells(db: &Path, args: &[&str]) -> (bool, String, String) {
    let db = db.to_str().expect("utf-8 temp path");
    let mut full = vec!["cells", "--db-dir", db];
    full.extend_from_slice(args);
    run_cellmap(&full)
}

fn seed(db: &Path) {
    for (row, family, qualifier, value, version) in [
        ("u1", "name", "", "Ann", "100"),
        ("u1", "scores", "math", "90", "100"),
        ("u1", "scores", "math", "95", "200"),
        ("u1", "scores", "art", "88", "200"),
        ("u2", "name", "", "Bob", "100"),
    ] {
        let (ok, _, stderr) = cells(db, &["put", row, family, qualifier, value, "--version", version]);
        assert!(ok, "put failed: {stderr}");
    }
}

#[test]
fn test_get_tsv() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    seed(dir.path());

    let (ok, stdout, _) = cells(dir.path(), &["get", "u1", "--format", "tsv"]);
    assert!(ok);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            "u1\tname\t\t100\tAnn",
            "u1\tscores\tart\t200\t88",
            "u1\tscores\tmath\t200\t95",
        ]
    );

    let (ok, stdout, _) = cells(
        dir.path(),
        &["get", "u1", "--family", "scores", "--versions", "5", "-f", "tsv"],
    );
    assert!(ok);
    assert_eq!(stdout.lines().count(), 3);
    assert!(stdout.contains("u1\tscores\tmath\t100\t90"));
}

#[test]
fn test_scan_json() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    seed(dir.path());

    let (ok, stdout, stderr) = cells(dir.path(), &["scan", "--family", "name", "--format", "json"]);
    assert!(ok, "scan failed: {stderr}");
    let cells: serde_json::Value = serde_json::from_str(&stdout).expect("valid json");
    let cells = cells.as_array().expect("array");
    assert_eq!(cells.len(), 2);
    assert_eq!(cells[0]["row"], "u1");
    assert_eq!(cells[0]["value"], "Ann");
    assert_eq!(cells[1]["row"], "u2");
    assert_eq!(cells[1]["version"], 100);

    let (ok, stdout, _) = cells_tsv_scan(dir.path(), &["--start", "u2"]);
    assert!(ok);
    assert_eq!(stdout.trim(), "u2\tname\t\t100\tBob");
}

fn cells_tsv_scan(db: &Path, extra: &[&str]) -> (bool, String, String) {
    let mut args = vec!["scan", "-f", "tsv"];
    args.extend_from_slice(extra);
    cells(db, &args)
}

#[test]
fn test_scan_table_format() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    seed(dir.path());

    let (ok, stdout, _) = cells(dir.path(), &["scan", "--limit", "1"]);
    assert!(ok);
    assert!(stdout.starts_with("ROW"));
    assert!(stdout.contains("1970-01-01 00:00:00.200"));
    assert!(stdout.contains("(3 cells)"));
    assert!(!stdout.contains("Bob"));
}

#[test]
fn test_delete_levels() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    seed(dir.path());

    let (ok, _, _) = cells(
        dir.path(),
        &["delete", "u1", "--family", "scores", "--qualifier", "math", "--version", "200"],
    );
    assert!(ok);
    let (_, stdout, _) = cells(dir.path(), &["get", "u1", "--family", "scores", "-f", "tsv"]);
    assert!(stdout.contains("math\t100\t90"));

    let (ok, _, _) = cells(dir.path(), &["delete", "u1", "--family", "scores"]);
    assert!(ok);
    let (_, stdout, _) = cells(dir.path(), &["get", "u1", "-f", "tsv"]);
    assert_eq!(stdout.trim(), "u1\tname\t\t100\tAnn");

    let (ok, _, _) = cells(dir.path(), &["delete", "u1"]);
    assert!(ok);
    let (_, stdout, _) = cells(dir.path(), &["get", "u1", "-f", "tsv"]);
    assert!(stdout.trim().is_empty());
}

#[test]
fn test_delete_qualifier_requires_family() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let (ok, _, stderr) = cells(dir.path(), &["delete", "u1", "--qualifier", "math"]);
    assert!(!ok);
    assert!(stderr.contains("--family"));
}

#[test]
fn test_names() {
    let (ok, stdout, _) = run_cellmap(&[
        "names",
        "--policy",
        "lower-case-with-dashes",
        "homeAddress",
        "userName",
    ]);
    assert!(ok);
    assert_eq!(stdout, "home-address\nuser-name\n");

    let (ok, stdout, _) = run_cellmap(&["names", "--all", "userName"]);
    assert!(ok);
    assert!(stdout.contains("userName\tupper-case-with-underscores\tUSER_NAME"));
    assert_eq!(stdout.lines().count(), 4);

    let (ok, _, stderr) = run_cellmap(&["names", "--policy", "camelCase", "x"]);
    assert!(!ok);
    assert!(stderr.contains("unknown naming policy"));
}

#[test]
fn test_config_file_sets_policy() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = dir.path().join("cellmap.toml");
    std::fs::write(&config, "[mapper]\nnaming_policy = \"upper_case_with_underscores\"\n").unwrap();
    let config = config.to_str().unwrap();

    let (ok, stdout, _) = run_cellmap(&["--config", config, "names", "accountStatus"]);
    assert!(ok);
    assert_eq!(stdout.trim(), "ACCOUNT_STATUS");

    let bad = dir.path().join("bad.toml");
    std::fs::write(&bad, "[mapper]\nnaming_policy = \"snake\"\n").unwrap();
    let (ok, _, stderr) = run_cellmap(&["--config", bad.to_str().unwrap(), "names", "x"]);
    assert!(!ok);
    assert!(stderr.contains("unknown naming policy: snake"));
}
