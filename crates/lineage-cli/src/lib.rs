//! The `lineage` command line tool
//!
//! Appends provenance statements, rebuilds the index, walks version
//! histories and resolves the content they name.

pub mod commands;
pub mod config;

pub use commands::{AppendSummary, CopySummary, Lineage, scan_versions};
pub use config::{Cli, Command, LineageConfig};
