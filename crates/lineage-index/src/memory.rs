//! In-memory statement index
//!
//! Suitable for tests and for one-shot scans over a log that is not worth
//! persisting.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use lineage_core::{Node, Statement};
use tracing::trace;

use crate::StatementIndex;
use crate::error::IndexError;

/// In-memory implementation of [`StatementIndex`]
///
/// Uses `DashMap` so that concurrent appends and lookups need no outer lock.
#[derive(Debug, Default)]
pub struct InMemoryStatementIndex {
    /// (subject, predicate) -> first recorded object
    forward: DashMap<(Node, String), Node>,
    /// (predicate, object) -> first recorded subject
    backward: DashMap<(String, Node), Node>,
    /// Number of appended statements
    count: AtomicU64,
}

impl InMemoryStatementIndex {
    /// Create a new empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from statements, in order
    pub fn from_statements<'a>(statements: impl IntoIterator<Item = &'a Statement>) -> Self {
        let index = Self::new();
        for statement in statements {
            index.insert(statement);
        }
        index
    }

    fn insert(&self, statement: &Statement) {
        self.forward
            .entry((statement.subject.clone(), statement.predicate.clone()))
            .or_insert_with(|| statement.object.clone());
        self.backward
            .entry((statement.predicate.clone(), statement.object.clone()))
            .or_insert_with(|| statement.subject.clone());
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

impl StatementIndex for InMemoryStatementIndex {
    fn put_statement(&self, statement: &Statement) -> Result<(), IndexError> {
        trace!(statement = %statement, "Indexing statement");
        self.insert(statement);
        Ok(())
    }

    fn lookup_forward(&self, subject: &Node, predicate: &str) -> Result<Option<Node>, IndexError> {
        Ok(self
            .forward
            .get(&(subject.clone(), predicate.to_string()))
            .map(|entry| entry.value().clone()))
    }

    fn lookup_backward(&self, predicate: &str, object: &Node) -> Result<Option<Node>, IndexError> {
        Ok(self
            .backward
            .get(&(predicate.to_string(), object.clone()))
            .map(|entry| entry.value().clone()))
    }

    fn statement_count(&self) -> Result<u64, IndexError> {
        Ok(self.count.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineage_core::vocab::HAS_VERSION;

    #[test]
    fn test_first_match_wins() {
        let index = InMemoryStatementIndex::new();
        let anchor = Node::iri("urn:dataset:1");
        let first = Node::iri("urn:first");
        let second = Node::iri("urn:second");

        index
            .put_statement(&Statement::new(anchor.clone(), HAS_VERSION, first.clone()))
            .unwrap();
        index
            .put_statement(&Statement::new(anchor.clone(), HAS_VERSION, second.clone()))
            .unwrap();

        assert_eq!(
            index.lookup_forward(&anchor, HAS_VERSION).unwrap(),
            Some(first.clone())
        );
        assert_eq!(
            index.lookup_backward(HAS_VERSION, &second).unwrap(),
            Some(anchor)
        );
        assert_eq!(index.statement_count().unwrap(), 2);
    }

    #[test]
    fn test_absent_is_none() {
        let index = InMemoryStatementIndex::new();
        let node = Node::iri("urn:nothing");
        assert_eq!(index.lookup_forward(&node, HAS_VERSION).unwrap(), None);
        assert_eq!(index.lookup_backward(HAS_VERSION, &node).unwrap(), None);
    }
}
