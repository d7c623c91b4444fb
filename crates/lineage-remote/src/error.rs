//! Remote resolution error types

use std::fmt;

use lineage_core::HashKey;
use lineage_store::StoreError;
use thiserror::Error;
use url::Url;

/// Why one endpoint could not supply content
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP transport error
    #[error("HTTP error calling {url}: {source}")]
    Http { url: Url, source: reqwest::Error },

    /// Endpoint returned a non-2xx status
    #[error("{url} returned {status}")]
    Status { url: Url, status: u16 },

    /// Endpoint kept answering 429 after the retry policy gave up
    #[error("{url} is rate limited after {retries} retries")]
    RateLimited { url: Url, retries: u32 },

    /// Body does not reproduce the requested key
    #[error("content from {url} does not match its hash")]
    DigestMismatch { url: Url },

    /// Container was fetched but holds no matching entry
    #[error("no matching entry in container {url}")]
    NotInContainer { url: Url },

    /// Endpoint URL could not be built
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Local store failed while handling fetched content
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl FetchError {
    /// HTTP status, if the endpoint answered with one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::RateLimited { .. } => Some(429),
            _ => None,
        }
    }
}

/// Last failure recorded for one endpoint
#[derive(Debug)]
pub struct EndpointFailure {
    pub endpoint: Url,
    pub error: FetchError,
}

impl fmt::Display for EndpointFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.endpoint, self.error)
    }
}

fn describe(failures: &[EndpointFailure]) -> String {
    if failures.is_empty() {
        return "no remote endpoints configured".to_string();
    }
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors from content resolution
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Neither the local store nor any endpoint could supply the content
    #[error("content {key} unavailable: {}", describe(.failures))]
    ContentUnavailable {
        key: HashKey,
        failures: Vec<EndpointFailure>,
    },

    /// Local store failed
    #[error(transparent)]
    Store(#[from] StoreError),

    /// HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Client(String),

    /// Resolution task failed to complete
    #[error("Task error: {0}")]
    Task(String),
}
