//! Append-only statement log
//!
//! The log is the durable source of truth: one statement per line in the
//! quad line format. Statements are only ever appended. Any index can be
//! rebuilt by replaying the log from the start.
//!
//! ## Storage Format
//!
//! ```text
//! <subject> <predicate> <object> [<graph>] .\n
//! ```
//!
//! Lines that do not parse are skipped on replay and counted.

pub mod statement_log;

pub use statement_log::{ReplaySummary, StatementLog, StatementLogConfig};
