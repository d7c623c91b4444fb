//! redb table definitions and the durable statement index

use std::path::PathBuf;
use std::sync::Arc;

use lineage_core::{Node, Statement};
use redb::{Database, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};

use crate::StatementIndex;
use crate::error::IndexError;

// Key: postcard (subject, predicate), Value: postcard object
const FORWARD: TableDefinition<&[u8], &[u8]> = TableDefinition::new("forward");

// Key: postcard (predicate, object), Value: postcard subject
const BACKWARD: TableDefinition<&[u8], &[u8]> = TableDefinition::new("backward");

// Key: counter name, Value: counter
const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

const STATEMENT_COUNT: &str = "statement_count";

/// Configuration for the durable index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Path to the database file
    pub db_path: PathBuf,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/index.redb"),
        }
    }
}

impl IndexConfig {
    /// Index stored at the given path
    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = path.into();
        self
    }
}

/// redb-backed implementation of [`StatementIndex`]
pub struct RedbStatementIndex {
    db: Arc<Database>,
    config: IndexConfig,
}

impl RedbStatementIndex {
    /// Open or create the index database
    #[instrument(skip(config), fields(path = %config.db_path.display()))]
    pub fn open(config: IndexConfig) -> Result<Self, IndexError> {
        if let Some(parent) = config.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::create(&config.db_path)?;
        info!("Opened statement index");

        let index = Self {
            db: Arc::new(db),
            config,
        };
        index.init_tables()?;
        Ok(index)
    }

    fn init_tables(&self) -> Result<(), IndexError> {
        let write_txn = self.db.begin_write()?;
        write_txn.open_table(FORWARD)?;
        write_txn.open_table(BACKWARD)?;
        write_txn.open_table(META)?;
        write_txn.commit()?;

        debug!("Initialized index tables");
        Ok(())
    }

    /// Get the configuration
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Remove every recorded statement
    ///
    /// Used before rebuilding the index from the statement log.
    #[instrument(skip(self))]
    pub fn clear(&self) -> Result<(), IndexError> {
        let write_txn = self.db.begin_write()?;
        write_txn.delete_table(FORWARD)?;
        write_txn.delete_table(BACKWARD)?;
        write_txn.delete_table(META)?;
        write_txn.open_table(FORWARD)?;
        write_txn.open_table(BACKWARD)?;
        write_txn.open_table(META)?;
        write_txn.commit()?;

        info!("Cleared statement index");
        Ok(())
    }

    fn lookup(
        &self,
        table: TableDefinition<&[u8], &[u8]>,
        key: &[u8],
    ) -> Result<Option<Node>, IndexError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(table)?;
        match table.get(key)? {
            Some(value) => Ok(Some(postcard::from_bytes(value.value())?)),
            None => Ok(None),
        }
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, IndexError> {
    postcard::to_allocvec(value).map_err(|e| IndexError::Serialization(e.to_string()))
}

impl StatementIndex for RedbStatementIndex {
    fn put_statement(&self, statement: &Statement) -> Result<(), IndexError> {
        let forward_key = encode(&(&statement.subject, &statement.predicate))?;
        let backward_key = encode(&(&statement.predicate, &statement.object))?;

        let write_txn = self.db.begin_write()?;
        {
            let mut forward = write_txn.open_table(FORWARD)?;
            if forward.get(forward_key.as_slice())?.is_none() {
                let object = encode(&statement.object)?;
                forward.insert(forward_key.as_slice(), object.as_slice())?;
            }

            let mut backward = write_txn.open_table(BACKWARD)?;
            if backward.get(backward_key.as_slice())?.is_none() {
                let subject = encode(&statement.subject)?;
                backward.insert(backward_key.as_slice(), subject.as_slice())?;
            }

            let mut meta = write_txn.open_table(META)?;
            let count = meta
                .get(STATEMENT_COUNT)?
                .map(|value| value.value())
                .unwrap_or(0);
            meta.insert(STATEMENT_COUNT, count + 1)?;
        }
        write_txn.commit()?;

        trace!(statement = %statement, "Indexed statement");
        Ok(())
    }

    fn lookup_forward(&self, subject: &Node, predicate: &str) -> Result<Option<Node>, IndexError> {
        let key = encode(&(subject, predicate))?;
        self.lookup(FORWARD, &key)
    }

    fn lookup_backward(&self, predicate: &str, object: &Node) -> Result<Option<Node>, IndexError> {
        let key = encode(&(predicate, object))?;
        self.lookup(BACKWARD, &key)
    }

    fn statement_count(&self) -> Result<u64, IndexError> {
        let read_txn = self.db.begin_read()?;
        let meta = read_txn.open_table(META)?;
        Ok(meta
            .get(STATEMENT_COUNT)?
            .map(|value| value.value())
            .unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineage_core::HashKey;
    use lineage_core::vocab::{HAS_PREVIOUS_VERSION, HAS_VERSION};
    use tempfile::TempDir;

    fn open(dir: &TempDir) -> RedbStatementIndex {
        let config = IndexConfig::default().with_db_path(dir.path().join("index.redb"));
        RedbStatementIndex::open(config).unwrap()
    }

    #[test]
    fn test_put_and_lookup() {
        let temp = TempDir::new().unwrap();
        let index = open(&temp);

        let anchor = Node::iri("urn:dataset:1");
        let version = Node::Hash(HashKey::sha256(b"v1"));
        index
            .put_statement(&Statement::new(anchor.clone(), HAS_VERSION, version.clone()))
            .unwrap();

        assert_eq!(
            index.lookup_forward(&anchor, HAS_VERSION).unwrap(),
            Some(version.clone())
        );
        assert_eq!(
            index.lookup_backward(HAS_VERSION, &version).unwrap(),
            Some(anchor.clone())
        );
        assert_eq!(index.lookup_forward(&anchor, HAS_PREVIOUS_VERSION).unwrap(), None);
        assert_eq!(index.statement_count().unwrap(), 1);
    }

    #[test]
    fn test_first_writer_wins() {
        let temp = TempDir::new().unwrap();
        let index = open(&temp);

        let anchor = Node::iri("urn:dataset:1");
        let first = Node::Hash(HashKey::sha256(b"first"));
        let second = Node::Hash(HashKey::sha256(b"second"));
        index
            .put_statement(&Statement::new(anchor.clone(), HAS_VERSION, first.clone()))
            .unwrap();
        index
            .put_statement(&Statement::new(anchor.clone(), HAS_VERSION, second))
            .unwrap();

        assert_eq!(index.lookup_forward(&anchor, HAS_VERSION).unwrap(), Some(first));
        assert_eq!(index.statement_count().unwrap(), 2);
    }

    #[test]
    fn test_reopen_keeps_entries() {
        let temp = TempDir::new().unwrap();
        let anchor = Node::iri("urn:dataset:1");
        let version = Node::Hash(HashKey::sha256(b"v1"));

        {
            let index = open(&temp);
            index
                .put_statement(&Statement::new(anchor.clone(), HAS_VERSION, version.clone()))
                .unwrap();
        }

        let index = open(&temp);
        assert_eq!(index.lookup_forward(&anchor, HAS_VERSION).unwrap(), Some(version));
    }

    #[test]
    fn test_clear() {
        let temp = TempDir::new().unwrap();
        let index = open(&temp);
        let anchor = Node::blank("b0");
        index
            .put_statement(&Statement::new(anchor.clone(), HAS_VERSION, Node::literal("x")))
            .unwrap();

        index.clear().unwrap();
        assert_eq!(index.lookup_forward(&anchor, HAS_VERSION).unwrap(), None);
        assert_eq!(index.statement_count().unwrap(), 0);
    }
}
