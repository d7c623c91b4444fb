//! Hash-list importer
//!
//! Reads content that lists content ids, one per line, either bare
//! (`hash://sha256/...`) or inside version statements, and derives one
//! `hasVersion` statement per recognized line. The derived statements are
//! placed in a graph named after the imported version.

use lineage_core::{ContentImporter, CoreError, HashKey, ImportOutcome, Node};
use tracing::debug;

use crate::version::parse_as_version_statement;

/// Derives version statements from hash lists and version logs
#[derive(Debug, Clone, Copy, Default)]
pub struct HashListImporter;

impl HashListImporter {
    pub fn new() -> Self {
        Self
    }
}

impl ContentImporter for HashListImporter {
    fn import(&self, version: &HashKey, content: &[u8]) -> Result<ImportOutcome, CoreError> {
        let text = std::str::from_utf8(content)
            .map_err(|e| CoreError::Import(format!("{} is not UTF-8 text: {}", version, e)))?;

        let graph = Node::Hash(version.clone());
        let statements: Vec<_> = text
            .lines()
            .filter_map(parse_as_version_statement)
            .map(|statement| statement.with_graph(graph.clone()))
            .collect();

        debug!(
            version = %version,
            statements = statements.len(),
            "Imported hash list"
        );
        Ok(ImportOutcome {
            extracted: !statements.is_empty(),
            statements,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineage_core::vocab::HAS_VERSION;

    #[test]
    fn test_import_hash_list() {
        let list_key = HashKey::sha256(b"list");
        let v1 = HashKey::sha256(b"v1");
        let v2 = HashKey::sha256(b"v2");
        let content = format!(
            "{}\n<urn:dataset:1> <{}> <{}> .\nnot a key\n",
            v1, HAS_VERSION, v2
        );

        let outcome = HashListImporter::new()
            .import(&list_key, content.as_bytes())
            .unwrap();

        assert!(outcome.extracted);
        assert_eq!(outcome.statements.len(), 2);
        assert_eq!(outcome.statements[0].object, Node::Hash(v1));
        assert_eq!(outcome.statements[1].subject, Node::iri("urn:dataset:1"));
        assert_eq!(outcome.statements[1].object, Node::Hash(v2));
        assert_eq!(outcome.statements[1].graph, Some(Node::Hash(list_key)));
    }

    #[test]
    fn test_import_nothing() {
        let outcome = HashListImporter::new()
            .import(&HashKey::sha256(b"empty"), b"hello\nworld\n")
            .unwrap();
        assert!(!outcome.extracted);
        assert!(outcome.statements.is_empty());
    }

    #[test]
    fn test_import_binary_fails() {
        let result = HashListImporter::new().import(&HashKey::sha256(b"bin"), &[0xff, 0xfe]);
        assert!(matches!(result, Err(CoreError::Import(_))));
    }
}
