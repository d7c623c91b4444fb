//! Most-recent-version walk

use std::collections::BTreeSet;

use lineage_core::vocab::{HAS_PREVIOUS_VERSION, HAS_VERSION};
use lineage_core::{HashKey, Node, Statement, StatementListener, VersionPredicate};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::StatementIndex;
use crate::error::IndexError;

/// Errors from version resolution
#[derive(Debug, Error)]
pub enum VersionError {
    /// The anchor has no content version in the index
    #[error("No provenance history found for {anchor}")]
    NoHistoryFound { anchor: Node },

    /// Index lookup failed
    #[error(transparent)]
    Index(#[from] IndexError),
}

/// Result of a successful walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MostRecentVersion {
    /// Newest content version reached
    pub version: HashKey,
    /// Number of version edges traversed
    pub steps: usize,
    /// Node that closed a cycle, if the walk stopped on one
    pub cycle_detected: Option<Node>,
}

/// Walks version edges from an anchor to its newest content version
pub struct VersionResolver<'a, I: StatementIndex + ?Sized> {
    index: &'a I,
}

impl<'a, I: StatementIndex + ?Sized> VersionResolver<'a, I> {
    pub fn new(index: &'a I) -> Self {
        Self { index }
    }

    /// Find the most recent content version of `anchor`
    ///
    /// Every traversed edge is reported to `listener` in root-to-tip order.
    #[instrument(skip(self, anchor, listener), fields(anchor = %anchor))]
    pub fn find_most_recent_version(
        &self,
        anchor: &Node,
        listener: &mut dyn StatementListener,
    ) -> Result<MostRecentVersion, VersionError> {
        let no_history = || VersionError::NoHistoryFound {
            anchor: anchor.clone(),
        };

        let candidate = match self.index.lookup_forward(anchor, HAS_VERSION)? {
            Some(version) => {
                listener.on_statement(&Statement::version_edge(
                    anchor.clone(),
                    VersionPredicate::HasVersion,
                    version.clone(),
                ));
                version
            }
            None => self.newer_than(anchor, listener)?.ok_or_else(no_history)?,
        };

        let mut latest_key = candidate.as_hash_key().cloned();
        let mut visited = BTreeSet::from([candidate.clone()]);
        let mut current = candidate;
        let mut steps = 1;
        let mut cycle_detected = None;

        while let Some(newer) = self.newer_than(&current, listener)? {
            if !visited.insert(newer.clone()) {
                warn!(
                    at = %current,
                    repeated = %newer,
                    "Version cycle detected, stopping walk"
                );
                cycle_detected = Some(newer);
                break;
            }
            steps += 1;
            if let Some(key) = newer.as_hash_key() {
                latest_key = Some(key.clone());
            }
            current = newer;
        }

        let version = latest_key.ok_or_else(no_history)?;
        debug!(version = %version, steps, "Resolved most recent version");
        Ok(MostRecentVersion {
            version,
            steps,
            cycle_detected,
        })
    }

    /// Node recorded as `newer previousVersion older`, reported to `listener`
    fn newer_than(
        &self,
        older: &Node,
        listener: &mut dyn StatementListener,
    ) -> Result<Option<Node>, IndexError> {
        let newer = self.index.lookup_backward(HAS_PREVIOUS_VERSION, older)?;
        if let Some(newer) = &newer {
            listener.on_statement(&Statement::version_edge(
                newer.clone(),
                VersionPredicate::HasPreviousVersion,
                older.clone(),
            ));
        }
        Ok(newer)
    }
}
