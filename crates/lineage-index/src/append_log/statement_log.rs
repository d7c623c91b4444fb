//! Statement log implementation

use std::path::PathBuf;

use lineage_core::{Statement, nquads};
use serde::{Deserialize, Serialize};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::StatementIndex;
use crate::error::IndexError;

/// Configuration for the statement log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementLogConfig {
    /// Path to the log file
    pub path: PathBuf,
    /// Whether to sync writes to disk immediately
    pub sync_on_write: bool,
}

impl Default for StatementLogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/statements.nq"),
            sync_on_write: true,
        }
    }
}

impl StatementLogConfig {
    /// Log stored at the given path
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    /// Set whether each append is synced to disk
    pub fn with_sync_on_write(mut self, sync: bool) -> Self {
        self.sync_on_write = sync;
        self
    }
}

/// Outcome of replaying the log
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Statements delivered to the index
    pub statements: u64,
    /// Non-empty lines that did not parse
    pub skipped: u64,
}

/// Append-only log of statements
pub struct StatementLog {
    config: StatementLogConfig,
    /// Open handle for appends
    file: Mutex<File>,
}

impl StatementLog {
    /// Open the log, creating it if needed
    #[instrument(skip(config), fields(path = %config.path.display()))]
    pub async fn open(config: StatementLogConfig) -> Result<Self, IndexError> {
        if let Some(parent) = config.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.path)
            .await?;

        let size = file.metadata().await?.len();
        info!(bytes = size, "Opened statement log");

        Ok(Self {
            config,
            file: Mutex::new(file),
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &StatementLogConfig {
        &self.config
    }

    /// Append one statement as a line
    #[instrument(skip(self, statement), fields(statement = %statement))]
    pub async fn append(&self, statement: &Statement) -> Result<(), IndexError> {
        let line = format!("{}\n", statement);

        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes()).await?;
        if self.config.sync_on_write {
            file.sync_data().await?;
        } else {
            file.flush().await?;
        }

        debug!("Appended statement");
        Ok(())
    }

    /// Replay every statement in the log into `index`, in order
    #[instrument(skip(self, index))]
    pub async fn replay(&self, index: &dyn StatementIndex) -> Result<ReplaySummary, IndexError> {
        let mut statements = 0;
        let skipped = self
            .for_each(|statement| {
                index.put_statement(&statement)?;
                statements += 1;
                Ok(())
            })
            .await?;
        let summary = ReplaySummary {
            statements,
            skipped,
        };

        info!(
            statements = summary.statements,
            skipped = summary.skipped,
            "Replayed statement log"
        );
        Ok(summary)
    }

    /// Read every statement in the log, in order
    pub async fn read_all(&self) -> Result<Vec<Statement>, IndexError> {
        let mut statements = Vec::new();
        self.for_each(|statement| {
            statements.push(statement);
            Ok(())
        })
        .await?;
        Ok(statements)
    }

    /// Feed each parsed line to `f`, returning the number of skipped lines
    async fn for_each<F>(&self, mut f: F) -> Result<u64, IndexError>
    where
        F: FnMut(Statement) -> Result<(), IndexError>,
    {
        let file = File::open(&self.config.path).await?;
        let mut lines = BufReader::new(file).lines();
        let mut line_number = 0u64;
        let mut skipped = 0u64;

        while let Some(line) = lines.next_line().await? {
            line_number += 1;
            if line.trim().is_empty() {
                continue;
            }
            match nquads::parse_line(&line) {
                Ok(statement) => f(statement)?,
                Err(e) => {
                    warn!(line = line_number, error = %e, "Skipping unparseable log line");
                    skipped += 1;
                }
            }
        }
        Ok(skipped)
    }
}
