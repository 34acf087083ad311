use std::path::PathBuf;

use anyhow::Context;
use cellmap_db::CellmapConfig;
use clap::{Parser, Subcommand};

mod cells;
mod names;

#[allow(unused_imports)]
use tracing::{debug, error, info, trace, warn};

#[derive(Parser)]
#[clap(author, version, about = "Cellmap CLI utility")]
#[clap(propagate_version = true)]
struct Cli {
    /// TOML configuration file ([mapper] and [store] tables)
    #[clap(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read and write raw cells in a RocksDB cell store
    Cells(cells::Command),
    /// Show the stored column names attribute names translate to
    Names(names::Command),
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => CellmapConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => CellmapConfig::default(),
    };
    debug!(?config, "Loaded configuration");

    match &cli.command {
        Commands::Cells(args) => cells::run(args, &config),
        Commands::Names(args) => names::run(args, &config),
    }
}

/// Log to stderr, filtered by `CELLMAP_LOG` or `RUST_LOG` (default: warn).
fn init_tracing() {
    if let Err(e) = cellmap_core::telemetry::init_dev_subscriber_with_env_filter("warn") {
        eprintln!("Failed to initialize tracing: {}", e);
    }
}
