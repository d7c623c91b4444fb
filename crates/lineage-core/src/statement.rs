//! Statements (quads)

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::node::Node;
use crate::vocab::{NewerSide, VersionPredicate};

/// An immutable subject–predicate–object statement with optional graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Statement {
    pub subject: Node,
    /// Predicate IRI
    pub predicate: String,
    pub object: Node,
    pub graph: Option<Node>,
}

impl Statement {
    /// Create a statement in the default graph
    pub fn new(subject: Node, predicate: impl Into<String>, object: Node) -> Self {
        Self {
            subject,
            predicate: predicate.into(),
            object,
            graph: None,
        }
    }

    /// Create a version-edge statement
    pub fn version_edge(subject: Node, predicate: VersionPredicate, object: Node) -> Self {
        Self::new(subject, predicate.iri(), object)
    }

    /// Set the graph
    pub fn with_graph(mut self, graph: Node) -> Self {
        self.graph = Some(graph);
        self
    }

    /// The version predicate of this statement, if any
    pub fn version_predicate(&self) -> Option<VersionPredicate> {
        VersionPredicate::from_iri(&self.predicate)
    }

    /// The node on the newer side of a version edge
    pub fn newer_node(&self) -> Option<&Node> {
        self.version_predicate().map(|p| match p.newer_side() {
            NewerSide::Subject => &self.subject,
            NewerSide::Object => &self.object,
        })
    }
}

impl fmt::Display for Statement {
    /// Formats the statement as one quad line, without a newline
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}> {}", self.subject, self.predicate, self.object)?;
        if let Some(graph) = &self.graph {
            write!(f, " {}", graph)?;
        }
        f.write_str(" .")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::HashKey;

    #[test]
    fn test_display_line() {
        let key = HashKey::sha256(b"v1");
        let statement = Statement::version_edge(
            Node::iri("urn:dataset:1"),
            VersionPredicate::HasVersion,
            Node::Hash(key.clone()),
        );
        assert_eq!(
            statement.to_string(),
            format!("<urn:dataset:1> <http://purl.org/pav/hasVersion> <{}> .", key)
        );
    }

    #[test]
    fn test_newer_node() {
        let older = Node::Hash(HashKey::sha256(b"old"));
        let newer = Node::Hash(HashKey::sha256(b"new"));
        let edge = Statement::version_edge(
            newer.clone(),
            VersionPredicate::HasPreviousVersion,
            older.clone(),
        );
        assert_eq!(edge.newer_node(), Some(&newer));

        let other = Statement::new(newer, "http://example.org/p", older);
        assert_eq!(other.newer_node(), None);
    }
}
