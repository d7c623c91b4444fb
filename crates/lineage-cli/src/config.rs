//! Command line and file configuration

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use lineage_core::{HashKey, OutputFormat};
use lineage_index::StatementStoreConfig;
use lineage_logging::LogConfig;
use lineage_remote::{RemoteConfig, RemoteEndpoint};
use lineage_store::StoreConfig;
use serde::{Deserialize, Serialize};
use url::Url;

/// Configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "lineage.toml";

#[derive(Parser)]
#[command(name = "lineage", version, about = "Track, trace and resolve versioned content")]
pub struct Cli {
    /// Configuration file (TOML); defaults to ./lineage.toml when present
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Data directory for the statement log, index and content
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
    /// Remote endpoint, tried after the configured ones (repeatable)
    #[arg(long = "remote", global = true)]
    pub remotes: Vec<Url>,
    /// Do not write fetched content to the local store
    #[arg(long, global = true)]
    pub no_cache: bool,
    /// Look for missing content inside tar+gzip containers
    #[arg(long, global = true)]
    pub tar_gz: bool,
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Append statement lines to the log and index
    Append {
        /// Input file; stdin when absent
        file: Option<PathBuf>,
    },
    /// Rebuild the index from the statement log
    Rebuild,
    /// Print the most recent version of an anchor
    Head {
        /// Anchor IRI or hash key
        anchor: String,
    },
    /// Trace an anchor and print the content of every version
    Ls {
        /// Anchor IRI or hash key
        anchor: String,
        /// Output format (nquads, tsv)
        #[arg(long, default_value = "nquads")]
        format: OutputFormat,
    },
    /// Resolve content by hash key and write it to stdout
    Get {
        /// Hash keys
        #[arg(required = true)]
        keys: Vec<HashKey>,
    },
    /// Print one version statement per input line that yields one
    Versions {
        /// Input file; stdin when absent
        file: Option<PathBuf>,
    },
    /// Resolve a hash list and append the version statements it implies
    Import {
        /// Hash key of the hash list
        key: HashKey,
    },
}

/// Settings read from the configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineageConfig {
    /// Root of all local state
    pub data_dir: PathBuf,
    /// Shard levels of the content store
    pub directory_depth: u8,
    /// Remote resolution
    pub remote: RemoteConfig,
    /// Logging
    pub logging: LogConfig,
}

impl Default for LineageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            directory_depth: 2,
            remote: RemoteConfig::default(),
            logging: LogConfig::default(),
        }
    }
}

impl LineageConfig {
    /// Load configuration from `path`, or from ./lineage.toml when present
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !default.exists() {
                    return Ok(Self::default());
                }
                default
            }
        };

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Overlay command line flags
    pub fn apply(mut self, cli: &Cli) -> Self {
        if let Some(data_dir) = &cli.data_dir {
            self.data_dir = data_dir.clone();
        }
        for url in &cli.remotes {
            self.remote.endpoints.push(RemoteEndpoint::new(url.clone()));
        }
        if cli.no_cache {
            self.remote.cache_enabled = false;
        }
        if cli.tar_gz {
            self.remote.support_tar_gz_discovery = true;
        }
        if let Some(level) = &cli.log_level {
            self.logging.default_level = level.clone();
        }
        self
    }

    /// Content store under `<data_dir>/content`
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::with_data_dir(self.data_dir.join("content"))
            .with_directory_depth(self.directory_depth)
    }

    /// Statement log and index under `<data_dir>`
    pub fn statement_store_config(&self) -> StatementStoreConfig {
        StatementStoreConfig::with_base_dir(&self.data_dir)
    }
}
