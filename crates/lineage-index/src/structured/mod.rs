//! Durable statement index using redb
//!
//! Two tables hold the point-lookup directions of the index:
//! - `forward`: (subject, predicate) -> object
//! - `backward`: (predicate, object) -> subject
//!
//! Keys and values are postcard-encoded. Entries are inserted only when
//! absent, so the first statement recorded for a key wins.

mod tables;

pub use tables::{IndexConfig, RedbStatementIndex};
