//! Statement log and durable index kept in step
//!
//! ```text
//! Line arrives → StatementStore.append_line()
//!   ├─ Parse; unparseable lines are skipped
//!   ├─ Append to StatementLog
//!   └─ Record in RedbStatementIndex
//!
//! Index lost or stale → StatementStore.rebuild()
//!   ├─ Clear the redb tables
//!   └─ Replay the StatementLog from the start
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use lineage_core::{Statement, nquads};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::StatementIndex;
use crate::append_log::{ReplaySummary, StatementLog, StatementLogConfig};
use crate::error::IndexError;
use crate::structured::{IndexConfig, RedbStatementIndex};

/// Configuration for the statement store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementStoreConfig {
    /// Statement log configuration
    pub log: StatementLogConfig,
    /// Index configuration
    pub index: IndexConfig,
}

impl Default for StatementStoreConfig {
    fn default() -> Self {
        Self::with_base_dir("./data")
    }
}

impl StatementStoreConfig {
    /// Create a configuration with a custom base directory
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        Self {
            log: StatementLogConfig::default().with_path(base_dir.join("statements.nq")),
            index: IndexConfig::default().with_db_path(base_dir.join("index.redb")),
        }
    }
}

/// Append-only statement log plus the redb index built from it
pub struct StatementStore {
    log: StatementLog,
    index: Arc<RedbStatementIndex>,
}

impl StatementStore {
    /// Open the log and index
    #[instrument(skip(config), fields(log = %config.log.path.display()))]
    pub async fn open(config: StatementStoreConfig) -> Result<Self, IndexError> {
        let log = StatementLog::open(config.log).await?;
        let index = Arc::new(RedbStatementIndex::open(config.index)?);

        info!(
            statements = index.statement_count()?,
            "Opened statement store"
        );
        Ok(Self { log, index })
    }

    /// Shared handle to the index
    pub fn index(&self) -> Arc<RedbStatementIndex> {
        self.index.clone()
    }

    /// The statement log
    pub fn log(&self) -> &StatementLog {
        &self.log
    }

    /// Append a statement to the log, then the index
    pub async fn append(&self, statement: &Statement) -> Result<(), IndexError> {
        self.log.append(statement).await?;
        self.index.put_statement(statement)
    }

    /// Parse and append one line; returns false if the line was skipped
    pub async fn append_line(&self, line: &str) -> Result<bool, IndexError> {
        match nquads::parse_line(line) {
            Ok(statement) => {
                self.append(&statement).await?;
                Ok(true)
            }
            Err(e) => {
                debug!(error = %e, "Skipping line");
                Ok(false)
            }
        }
    }

    /// Drop the index and rebuild it from the log
    #[instrument(skip(self))]
    pub async fn rebuild(&self) -> Result<ReplaySummary, IndexError> {
        self.index.clear()?;
        let summary = self.log.replay(self.index.as_ref()).await?;
        info!(statements = summary.statements, "Rebuilt index");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineage_core::vocab::HAS_VERSION;
    use lineage_core::{HashKey, Node};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_append_line_and_rebuild() {
        let temp = TempDir::new().unwrap();
        let store = StatementStore::open(StatementStoreConfig::with_base_dir(temp.path()))
            .await
            .unwrap();

        let key = HashKey::sha256(b"v1");
        let line = format!("<urn:dataset:1> <{}> <{}> .", HAS_VERSION, key);
        assert!(store.append_line(&line).await.unwrap());
        assert!(!store.append_line("garbage").await.unwrap());

        let anchor = Node::iri("urn:dataset:1");
        assert_eq!(
            store.index().lookup_forward(&anchor, HAS_VERSION).unwrap(),
            Some(Node::Hash(key.clone()))
        );

        let summary = store.rebuild().await.unwrap();
        assert_eq!(summary.statements, 1);
        assert_eq!(store.index().statement_count().unwrap(), 1);
        assert_eq!(
            store.index().lookup_forward(&anchor, HAS_VERSION).unwrap(),
            Some(Node::Hash(key))
        );
    }
}
