//! Provenance tracing
//!
//! Replays the history of an anchor: its version chain first, then the
//! derivation and usage edges recorded against each version.

use lineage_core::vocab::{USED_BY, WAS_DERIVED_FROM};
use lineage_core::{HashKey, Node, Statement, StatementListener};
use tracing::{debug, instrument};

use super::resolver::{MostRecentVersion, VersionError, VersionResolver};
use crate::StatementIndex;

/// What a trace reported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceSummary {
    /// Result of the version walk
    pub latest: MostRecentVersion,
    /// Content versions in the chain, oldest first
    pub versions: Vec<HashKey>,
    /// Statements delivered to the listener
    pub statements: usize,
}

/// Reports the provenance statements of an anchor
pub struct ProvenanceTracer<'a, I: StatementIndex + ?Sized> {
    index: &'a I,
}

impl<'a, I: StatementIndex + ?Sized> ProvenanceTracer<'a, I> {
    pub fn new(index: &'a I) -> Self {
        Self { index }
    }

    /// Trace `anchor`, delivering every statement found to `listener`
    #[instrument(skip(self, anchor, listener), fields(anchor = %anchor))]
    pub fn trace(
        &self,
        anchor: &Node,
        listener: &mut dyn StatementListener,
    ) -> Result<TraceSummary, VersionError> {
        let mut versions: Vec<HashKey> = Vec::new();
        let mut statements = 0;

        let latest = {
            let mut collect = |statement: &Statement| {
                statements += 1;
                if let Some(key) = statement.newer_node().and_then(Node::as_hash_key) {
                    if !versions.contains(key) {
                        versions.push(key.clone());
                    }
                }
                listener.on_statement(statement);
            };
            VersionResolver::new(self.index).find_most_recent_version(anchor, &mut collect)?
        };

        for version in &versions {
            let node = Node::Hash(version.clone());
            for predicate in [WAS_DERIVED_FROM, USED_BY] {
                if let Some(subject) = self.index.lookup_backward(predicate, &node)? {
                    listener.on_statement(&Statement::new(subject, predicate, node.clone()));
                    statements += 1;
                }
            }
        }

        debug!(versions = versions.len(), statements, "Traced provenance");
        Ok(TraceSummary {
            latest,
            versions,
            statements,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStatementIndex;
    use lineage_core::VersionPredicate;

    #[test]
    fn test_trace_reports_chain_and_derivations() {
        let anchor = Node::iri("urn:dataset:1");
        let v1 = HashKey::sha256(b"v1");
        let v2 = HashKey::sha256(b"v2");
        let derived = Node::Hash(HashKey::sha256(b"derived"));

        let index = InMemoryStatementIndex::from_statements(&[
            Statement::version_edge(
                anchor.clone(),
                VersionPredicate::HasVersion,
                Node::Hash(v1.clone()),
            ),
            Statement::version_edge(
                Node::Hash(v2.clone()),
                VersionPredicate::HasPreviousVersion,
                Node::Hash(v1.clone()),
            ),
            Statement::version_edge(
                derived.clone(),
                VersionPredicate::WasDerivedFrom,
                Node::Hash(v2.clone()),
            ),
        ]);

        let mut seen: Vec<Statement> = Vec::new();
        let summary = ProvenanceTracer::new(&index).trace(&anchor, &mut seen).unwrap();

        assert_eq!(summary.latest.version, v2);
        assert_eq!(summary.versions, vec![v1, v2.clone()]);
        assert_eq!(summary.statements, 3);
        assert_eq!(
            seen.last(),
            Some(&Statement::new(derived, WAS_DERIVED_FROM, Node::Hash(v2)))
        );
    }

    #[test]
    fn test_trace_without_history() {
        let index = InMemoryStatementIndex::new();
        let result = ProvenanceTracer::new(&index)
            .trace(&Node::iri("urn:dataset:none"), &mut Vec::<Statement>::new());
        assert!(matches!(result, Err(VersionError::NoHistoryFound { .. })));
    }
}
