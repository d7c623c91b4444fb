//! # Lineage Index
//!
//! Statement storage and version resolution for lineage.
//!
//! ## Features
//!
//! - **StatementIndex trait**: point lookups over appended statements
//! - **InMemoryStatementIndex**: DashMap-backed index for tests and one-shot scans
//! - **RedbStatementIndex**: durable redb-backed index
//! - **StatementLog**: append-only text log of statements, replayable into an index
//! - **StatementStore**: log and index kept in step
//! - **VersionResolver**: walks version edges from an anchor to its latest content
//!
//! ## Example
//!
//! ```rust,ignore
//! use lineage_core::{Node, Statement, VersionPredicate, HashKey};
//! use lineage_index::{InMemoryStatementIndex, StatementIndex, VersionResolver};
//!
//! let index = InMemoryStatementIndex::new();
//! let anchor = Node::iri("urn:dataset:1");
//! let v1 = HashKey::sha256(b"v1");
//!
//! index.put_statement(&Statement::version_edge(
//!     anchor.clone(),
//!     VersionPredicate::HasVersion,
//!     Node::Hash(v1.clone()),
//! ))?;
//!
//! let latest = VersionResolver::new(&index).find_most_recent_version(&anchor, &mut |_: &Statement| {})?;
//! assert_eq!(latest.version, v1);
//! ```

pub mod append_log;
pub mod composite;
pub mod error;
pub mod import;
pub mod memory;
pub mod structured;
pub mod version;

// Re-exports
pub use append_log::{ReplaySummary, StatementLog, StatementLogConfig};
pub use composite::{StatementStore, StatementStoreConfig};
pub use error::IndexError;
pub use import::HashListImporter;
pub use memory::InMemoryStatementIndex;
pub use structured::{IndexConfig, RedbStatementIndex};
pub use version::{
    LineClassifier, LineClassifiers, MostRecentVersion, ProvenanceTracer, TraceSummary,
    VersionError, VersionResolver, maybe_not_quad, most_recent_content_id,
    most_recent_used_by_from_line, most_recent_version_from_line,
    most_recent_version_from_statement, parse_as_version_statement,
};

use lineage_core::{Node, Statement};

/// Append-only mapping of statements, queryable by point lookups
///
/// The first recorded object for a (subject, predicate) pair and the first
/// recorded subject for a (predicate, object) pair are never replaced.
pub trait StatementIndex: Send + Sync {
    /// Record a statement
    fn put_statement(&self, statement: &Statement) -> Result<(), IndexError>;

    /// First object recorded for `(subject, predicate)`
    fn lookup_forward(&self, subject: &Node, predicate: &str) -> Result<Option<Node>, IndexError>;

    /// First subject recorded for `(predicate, object)`
    fn lookup_backward(&self, predicate: &str, object: &Node) -> Result<Option<Node>, IndexError>;

    /// Number of statements recorded so far
    fn statement_count(&self) -> Result<u64, IndexError>;
}

impl<T: StatementIndex + ?Sized> StatementIndex for std::sync::Arc<T> {
    fn put_statement(&self, statement: &Statement) -> Result<(), IndexError> {
        (**self).put_statement(statement)
    }

    fn lookup_forward(&self, subject: &Node, predicate: &str) -> Result<Option<Node>, IndexError> {
        (**self).lookup_forward(subject, predicate)
    }

    fn lookup_backward(&self, predicate: &str, object: &Node) -> Result<Option<Node>, IndexError> {
        (**self).lookup_backward(predicate, object)
    }

    fn statement_count(&self) -> Result<u64, IndexError> {
        (**self).statement_count()
    }
}
