use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use cellmap_db::{
    Cell, CellStore, CellmapConfig, Delete, Get, Put, RocksStore, Scan, StoreMode, Version,
};
use chrono::DateTime;
use clap::{Args as ClapArgs, Subcommand, ValueEnum};
use serde::Serialize;

#[allow(unused_imports)]
use tracing::{debug, error, info, trace, warn};

#[derive(Debug, ClapArgs)]
#[clap(args_conflicts_with_subcommands = false)]
pub struct Command {
    /// Path to the RocksDB database directory
    #[clap(long, short = 'p')]
    pub db_dir: PathBuf,

    #[clap(subcommand)]
    pub verb: Verb,
}

#[derive(Debug, Subcommand)]
pub enum Verb {
    /// Dump rows in key order
    Scan(ScanArgs),
    /// Dump one row
    Get(GetArgs),
    /// Write one cell
    Put(PutArgs),
    /// Delete a row, a family, a column or one version
    Delete(DeleteArgs),
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default)]
pub enum OutputFormat {
    /// Tab-separated values
    Tsv,
    /// Formatted table with aligned columns (default)
    #[default]
    Table,
    /// JSON array of cells
    Json,
}

#[derive(Debug, ClapArgs)]
pub struct ScanArgs {
    /// First row (inclusive)
    #[clap(long)]
    pub start: Option<String>,

    /// Stop row (exclusive)
    #[clap(long)]
    pub stop: Option<String>,

    /// Maximum number of rows (default: 100)
    #[clap(long, default_value = "100")]
    pub limit: usize,

    /// Restrict to these families
    #[clap(long = "family", short = 'F')]
    pub families: Vec<String>,

    /// Versions per column (default: mapper.max_versions)
    #[clap(long)]
    pub versions: Option<usize>,

    /// Output format
    #[clap(long, short = 'f', value_enum, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(Debug, ClapArgs)]
pub struct GetArgs {
    pub row: String,

    /// Restrict to these families
    #[clap(long = "family", short = 'F')]
    pub families: Vec<String>,

    /// Versions per column (default: mapper.max_versions)
    #[clap(long)]
    pub versions: Option<usize>,

    /// Output format
    #[clap(long, short = 'f', value_enum, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(Debug, ClapArgs)]
pub struct PutArgs {
    pub row: String,
    pub family: String,
    /// Use "" for the family's own value
    pub qualifier: String,
    pub value: String,

    /// Explicit version in milliseconds (default: now)
    #[clap(long)]
    pub version: Option<Version>,
}

#[derive(Debug, ClapArgs)]
pub struct DeleteArgs {
    pub row: String,

    /// Delete only this family
    #[clap(long)]
    pub family: Option<String>,

    /// Delete only this column within --family
    #[clap(long, requires = "family")]
    pub qualifier: Option<String>,

    /// Delete only this version of the column
    #[clap(long, requires = "qualifier")]
    pub version: Option<Version>,
}

pub fn run(cmd: &Command, config: &CellmapConfig) -> anyhow::Result<()> {
    trace!("Running command: {:?}", cmd);

    match &cmd.verb {
        Verb::Scan(args) => run_scan(&cmd.db_dir, args, config),
        Verb::Get(args) => run_get(&cmd.db_dir, args, config),
        Verb::Put(args) => run_put(&cmd.db_dir, args, config),
        Verb::Delete(args) => run_delete(&cmd.db_dir, args, config),
    }
}

fn open(db_dir: &Path, config: &CellmapConfig, mode: StoreMode) -> anyhow::Result<RocksStore> {
    RocksStore::open_with_mode(db_dir, config.store.clone(), mode)
        .with_context(|| format!("opening cell store at {}", db_dir.display()))
}

fn run_scan(db_dir: &Path, args: &ScanArgs, config: &CellmapConfig) -> anyhow::Result<()> {
    let store = open(db_dir, config, StoreMode::ReadOnly)?;
    let mut scan = Scan::new()
        .with_limit(args.limit)
        .with_max_versions(args.versions.unwrap_or(config.mapper.max_versions));
    if let Some(start) = &args.start {
        scan = scan.with_start_row(start.as_str());
    }
    if let Some(stop) = &args.stop {
        scan = scan.with_stop_row(stop.as_str());
    }
    for family in &args.families {
        scan = scan.add_family(family.as_str());
    }

    let rows = store.scan(&scan)?;
    debug!(rows = rows.len(), "Scanned cell store");
    let cells: Vec<Cell> = rows.into_iter().flatten().collect();
    print_cells(&cells, args.format)
}

fn run_get(db_dir: &Path, args: &GetArgs, config: &CellmapConfig) -> anyhow::Result<()> {
    let store = open(db_dir, config, StoreMode::ReadOnly)?;
    let mut get = Get::new(args.row.as_str())
        .with_max_versions(args.versions.unwrap_or(config.mapper.max_versions));
    for family in &args.families {
        get = get.add_family(family.as_str());
    }
    let cells = store.get(&get)?;
    print_cells(&cells, args.format)
}

fn run_put(db_dir: &Path, args: &PutArgs, config: &CellmapConfig) -> anyhow::Result<()> {
    let store = open(db_dir, config, StoreMode::ReadWrite)?;
    let mut put = Put::new(args.row.as_str());
    match args.version {
        Some(version) => put.add_versioned_column(
            args.family.as_str(),
            args.qualifier.as_str(),
            args.value.as_str(),
            version,
        ),
        None => put.add_column(
            args.family.as_str(),
            args.qualifier.as_str(),
            args.value.as_str(),
        ),
    };
    store.put(&put)?;
    info!(row = %args.row, family = %args.family, "Wrote cell");
    Ok(())
}

fn run_delete(db_dir: &Path, args: &DeleteArgs, config: &CellmapConfig) -> anyhow::Result<()> {
    let store = open(db_dir, config, StoreMode::ReadWrite)?;
    let row = args.row.as_str();
    let delete = match (&args.family, &args.qualifier, args.version) {
        (Some(family), Some(qualifier), Some(version)) => {
            Delete::new(row).delete_version(family.as_str(), qualifier.as_str(), version)
        }
        (Some(family), Some(qualifier), None) => {
            Delete::new(row).delete_column(family.as_str(), qualifier.as_str())
        }
        (Some(family), None, _) => Delete::new(row).delete_family(family.as_str()),
        (None, _, _) => Delete::new(row),
    };
    store.delete(&delete)?;
    info!(row = %args.row, "Deleted cells");
    Ok(())
}

// ============================================================================
// Output
// ============================================================================

#[derive(Debug, Serialize)]
struct CellRecord {
    row: String,
    family: String,
    qualifier: String,
    version: Version,
    value: String,
}

impl From<&Cell> for CellRecord {
    fn from(cell: &Cell) -> Self {
        Self {
            row: String::from_utf8_lossy(cell.row()).into_owned(),
            family: String::from_utf8_lossy(cell.family()).into_owned(),
            qualifier: String::from_utf8_lossy(cell.qualifier()).into_owned(),
            version: cell.timestamp(),
            value: String::from_utf8_lossy(cell.value()).into_owned(),
        }
    }
}

fn print_cells(cells: &[Cell], format: OutputFormat) -> anyhow::Result<()> {
    let records: Vec<CellRecord> = cells.iter().map(CellRecord::from).collect();
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    let mut table = Table::new(vec!["ROW", "FAMILY", "QUALIFIER", "VERSION", "VALUE"]);
    for record in records {
        table.add_row(vec![
            record.row,
            record.family,
            record.qualifier,
            format_version(record.version, format),
            record.value,
        ]);
    }
    table.print(format);
    Ok(())
}

/// Milliseconds in TSV; UTC date and time in tables.
fn format_version(millis: Version, format: OutputFormat) -> String {
    match format {
        OutputFormat::Table => i64::try_from(millis)
            .ok()
            .and_then(DateTime::from_timestamp_millis)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S%.3f").to_string())
            .unwrap_or_else(|| millis.to_string()),
        OutputFormat::Tsv | OutputFormat::Json => millis.to_string(),
    }
}

struct Table {
    headers: Vec<&'static str>,
    rows: Vec<Vec<String>>,
}

impl Table {
    fn new(headers: Vec<&'static str>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    fn add_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    fn print(&self, format: OutputFormat) {
        match format {
            OutputFormat::Table => self.print_table(),
            OutputFormat::Tsv | OutputFormat::Json => self.print_tsv(),
        }
    }

    fn print_tsv(&self) {
        for row in &self.rows {
            println!("{}", row.join("\t"));
        }
    }

    fn print_table(&self) {
        if self.rows.is_empty() {
            return;
        }

        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.len()).collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let line = |cells: Vec<String>| {
            cells
                .iter()
                .zip(&widths)
                .map(|(c, w)| format!("{:width$}", c, width = *w))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };
        println!("{}", line(self.headers.iter().map(|h| h.to_string()).collect()));
        println!("{}", line(widths.iter().map(|w| "-".repeat(*w)).collect()));
        for row in &self.rows {
            println!("{}", line(row.clone()));
        }
        println!("\n({} cells)", self.rows.len());
    }
}
