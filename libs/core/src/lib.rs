//! Runtime support shared by cellmap binaries.

pub mod telemetry;
