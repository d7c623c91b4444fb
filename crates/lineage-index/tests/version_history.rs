//! Version history tests for lineage-index
//!
//! These tests drive the durable statement store end to end: lines are
//! appended to the log, indexed in redb, and walked by the version resolver.

use lineage_core::vocab::{HAS_PREVIOUS_VERSION, HAS_VERSION};
use lineage_core::{HashKey, Node, Statement};
use lineage_index::{
    ProvenanceTracer, StatementIndex, StatementStore, StatementStoreConfig, VersionError,
    VersionResolver, parse_as_version_statement,
};
use tempfile::TempDir;

async fn open_store(temp: &TempDir) -> StatementStore {
    StatementStore::open(StatementStoreConfig::with_base_dir(temp.path()))
        .await
        .expect("Failed to open statement store")
}

fn key(seed: &str) -> HashKey {
    HashKey::sha256(seed.as_bytes())
}

// ============================================================================
// End-to-end Scenarios
// ============================================================================

/// Anchor with two versions, resolved through the redb index
#[tokio::test]
async fn test_dataset_history_end_to_end() {
    let temp = TempDir::new().unwrap();
    let store = open_store(&temp).await;
    let (v1, v2) = (key("v1"), key("v2"));

    let lines = [
        format!("<urn:dataset:1> <{}> <{}> .", HAS_VERSION, v1),
        format!("<{}> <{}> <{}> .", v2, HAS_PREVIOUS_VERSION, v1),
    ];
    for line in &lines {
        assert!(store.append_line(line).await.unwrap());
    }

    let index = store.index();
    let mut seen: Vec<Statement> = Vec::new();
    let latest = VersionResolver::new(index.as_ref())
        .find_most_recent_version(&Node::iri("urn:dataset:1"), &mut seen)
        .unwrap();

    assert_eq!(latest.version, v2);
    assert_eq!(latest.steps, 2);
    let seen_lines: Vec<String> = seen.iter().map(ToString::to_string).collect();
    assert_eq!(seen_lines, lines);
}

/// History survives a reopen and a rebuild from the log
#[tokio::test]
async fn test_history_survives_rebuild() {
    let temp = TempDir::new().unwrap();
    let (v1, v2, v3) = (key("v1"), key("v2"), key("v3"));
    let anchor = Node::iri("urn:dataset:1");

    {
        let store = open_store(&temp).await;
        store
            .append_line(&format!("<urn:dataset:1> <{}> <{}> .", HAS_VERSION, v1))
            .await
            .unwrap();
        store
            .append_line(&format!("<{}> <{}> <{}> .", v2, HAS_PREVIOUS_VERSION, v1))
            .await
            .unwrap();
    }

    let store = open_store(&temp).await;
    store
        .append_line(&format!("<{}> <{}> <{}> .", v3, HAS_PREVIOUS_VERSION, v2))
        .await
        .unwrap();

    let summary = store.rebuild().await.unwrap();
    assert_eq!(summary.statements, 3);
    assert_eq!(summary.skipped, 0);

    let index = store.index();
    assert_eq!(index.statement_count().unwrap(), 3);
    let latest = VersionResolver::new(index.as_ref())
        .find_most_recent_version(&anchor, &mut Vec::<Statement>::new())
        .unwrap();
    assert_eq!(latest.version, v3);
}

/// Cyclic history terminates and reports the cycle
#[tokio::test]
async fn test_cycle_through_durable_index() {
    let temp = TempDir::new().unwrap();
    let store = open_store(&temp).await;
    let (v1, v2) = (key("v1"), key("v2"));

    for line in [
        format!("<urn:dataset:1> <{}> <{}> .", HAS_VERSION, v1),
        format!("<{}> <{}> <{}> .", v2, HAS_PREVIOUS_VERSION, v1),
        format!("<{}> <{}> <{}> .", v1, HAS_PREVIOUS_VERSION, v2),
    ] {
        store.append_line(&line).await.unwrap();
    }

    let index = store.index();
    let latest = VersionResolver::new(index.as_ref())
        .find_most_recent_version(&Node::iri("urn:dataset:1"), &mut Vec::<Statement>::new())
        .unwrap();
    assert_eq!(latest.version, v2);
    assert_eq!(latest.cycle_detected, Some(Node::Hash(v1)));
}

/// Unknown anchors are a negative result, not a failure
#[tokio::test]
async fn test_unknown_anchor() {
    let temp = TempDir::new().unwrap();
    let store = open_store(&temp).await;
    let index = store.index();

    let result = ProvenanceTracer::new(index.as_ref())
        .trace(&Node::iri("urn:dataset:missing"), &mut Vec::<Statement>::new());
    assert!(matches!(result, Err(VersionError::NoHistoryFound { .. })));
}

// ============================================================================
// Fast Paths
// ============================================================================

/// Fast-path statements can be appended and resolved like any other
#[tokio::test]
async fn test_fast_path_statement_is_indexable() {
    let temp = TempDir::new().unwrap();
    let store = open_store(&temp).await;
    let v1 = key("v1");

    let statement = parse_as_version_statement(&v1.to_string()).unwrap();
    store.append(&statement).await.unwrap();

    let index = store.index();
    let latest = VersionResolver::new(index.as_ref())
        .find_most_recent_version(&statement.subject, &mut Vec::<Statement>::new())
        .unwrap();
    assert_eq!(latest.version, v1);
}
