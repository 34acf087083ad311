//! Tracing subscriber initialization for cellmap binaries.
//!
//! Libraries in this workspace only emit `tracing` events; installing a
//! subscriber is the job of the binary that links them.
//!
//! # Usage
//!
//! ```no_run
//! use cellmap_core::telemetry;
//!
//! fn main() {
//!     telemetry::init_dev_subscriber_with_env_filter("info")
//!         .expect("subscriber already installed");
//!     tracing::info!("Application started");
//! }
//! ```

use tracing::subscriber::SetGlobalDefaultError;
use tracing::Level;
use tracing_subscriber::fmt;
use tracing_subscriber::EnvFilter;

/// Environment variable consulted before `RUST_LOG`.
pub const LOG_ENV_VAR: &str = "CELLMAP_LOG";

/// Install a stderr subscriber at DEBUG level.
///
/// Output includes the target (module path), file and line number, which is
/// what you want when chasing a decode that skipped a column.
pub fn init_dev_subscriber() -> Result<(), SetGlobalDefaultError> {
    let subscriber = fmt::Subscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
}

/// Install a stderr subscriber filtered by `CELLMAP_LOG`, then `RUST_LOG`.
///
/// When neither variable holds a valid filter, `default_directive` is used
/// (for example `"info"` or `"cellmap_db=debug,info"`).
pub fn init_dev_subscriber_with_env_filter(
    default_directive: &str,
) -> Result<(), SetGlobalDefaultError> {
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(env_filter(default_directive))
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
}

/// Resolve the filter the subscriber would use.
pub fn env_filter(default_directive: &str) -> EnvFilter {
    resolve_filter(
        std::env::var(LOG_ENV_VAR).ok().as_deref(),
        std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref(),
        default_directive,
    )
}

/// First directive that parses wins: `cellmap_log`, then `rust_log`, then
/// `default_directive`.
fn resolve_filter(
    cellmap_log: Option<&str>,
    rust_log: Option<&str>,
    default_directive: &str,
) -> EnvFilter {
    [cellmap_log, rust_log]
        .into_iter()
        .flatten()
        .find_map(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(default_directive))
}

#[cfg(test)]
mod tests {
    use super::*;

    // set_global_default can only succeed once per process, so only the
    // filter resolution is exercised here.

    #[test]
    fn test_filter_falls_back_to_default_directive() {
        assert_eq!(resolve_filter(None, None, "warn").to_string(), "warn");
    }

    #[test]
    fn test_cellmap_log_takes_precedence() {
        let filter = resolve_filter(Some("cellmap_db=trace"), Some("info"), "warn");
        assert_eq!(filter.to_string(), "cellmap_db=trace");
        assert_eq!(resolve_filter(None, Some("info"), "warn").to_string(), "info");
    }

    #[test]
    fn test_invalid_directive_is_skipped() {
        let filter = resolve_filter(Some("cellmap_db=loud"), None, "error");
        assert_eq!(filter.to_string(), "error");
    }
}
