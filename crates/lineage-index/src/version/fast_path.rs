//! Version extraction from single statements and raw lines
//!
//! These functions never fail: anything unrecognized yields `None`.

use std::sync::LazyLock;

use lineage_core::vocab::HAS_VERSION;
use lineage_core::{HashKey, Node, Statement, VersionPredicate};
use regex::Regex;

use super::classifier::LineClassifiers;

/// Newer node of a version edge, if it is a named IRI
///
/// Blank nodes, skolemized IRIs and literals are never versions.
pub fn most_recent_version_from_statement(statement: &Statement) -> Option<Node> {
    statement
        .newer_node()
        .filter(|node| node.is_named())
        .cloned()
}

/// IRI text of the newer node of a raw quad line
pub fn most_recent_version_from_line(line: &str) -> Option<String> {
    newer_text(LineClassifiers::standard(), line)
}

/// IRI text of the subject of a raw `usedBy` line
pub fn most_recent_used_by_from_line(line: &str) -> Option<String> {
    newer_text(LineClassifiers::used_by_only(), line)
}

fn newer_text(classifiers: &LineClassifiers, line: &str) -> Option<String> {
    classifiers
        .newer_version(line)
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string)
}

/// True when a line cannot be a quad line
pub fn maybe_not_quad(line: &str) -> bool {
    !line.ends_with(" .")
}

/// Content id carried by a line
///
/// For a version-edge line this is its newer node. A line that is not a quad
/// is taken to be a bare identifier. Only valid hash keys are returned.
pub fn most_recent_content_id(line: &str) -> Option<HashKey> {
    let candidate = match most_recent_version_from_line(line) {
        Some(text) => text,
        None if maybe_not_quad(line) => line.trim().to_string(),
        None => return None,
    };
    HashKey::parse(&candidate).ok()
}

/// Canonical `hasVersion` statement for a line
///
/// A line `<s> <hasVersion> <key> .` whose object is a hash key yields that
/// statement. Otherwise, if the line carries a content id, the result is
/// `_:fresh <hasVersion> <key>`.
pub fn parse_as_version_statement(line: &str) -> Option<Statement> {
    if let Some((subject, object)) = exact_version_statement(line) {
        if let Ok(key) = HashKey::parse(object) {
            return Some(Statement::version_edge(
                Node::iri(subject),
                VersionPredicate::HasVersion,
                Node::Hash(key),
            ));
        }
    }

    most_recent_content_id(line).map(|key| {
        Statement::version_edge(
            Node::fresh_blank(),
            VersionPredicate::HasVersion,
            Node::Hash(key),
        )
    })
}

/// `(subject, object)` text of a line shaped `<s> <hasVersion> <o>... .`
fn exact_version_statement(line: &str) -> Option<(&str, &str)> {
    static PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
        Regex::new(&format!(
            r"^<(?P<subj>[^<>]*)> (<{}>) <(?P<obj>[^<>]*)>(.*) [.]$",
            regex::escape(HAS_VERSION)
        ))
        .ok()
    });

    let captures = PATTERN.as_ref()?.captures(line)?;
    Some((captures.name("subj")?.as_str(), captures.name("obj")?.as_str()))
}
