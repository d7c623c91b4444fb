//! Remote endpoints and their path layouts

use lineage_core::HashKey;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::FetchError;
use crate::retry::RetryConfig;

/// How an endpoint lays out content under its base URL
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointLayout {
    /// `<base>/<d[0..2]>/<d[2..4]>/.../<digest>`, mirroring the local store
    #[default]
    Sharded,
    /// `<base>/hash://<algorithm>/<digest>`
    Flat,
}

fn default_depth() -> u8 {
    2
}

/// A remote source of content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEndpoint {
    /// Base URL
    pub url: Url,
    /// Path layout
    #[serde(default)]
    pub layout: EndpointLayout,
    /// Shard levels for the sharded layout
    #[serde(default = "default_depth")]
    pub depth: u8,
    /// Retry policy for this endpoint; the resolver default when absent
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl RemoteEndpoint {
    /// Sharded endpoint at `url`
    pub fn new(url: Url) -> Self {
        Self {
            url,
            layout: EndpointLayout::Sharded,
            depth: default_depth(),
            retry: None,
        }
    }

    /// Set the layout
    pub fn with_layout(mut self, layout: EndpointLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Set the shard depth
    pub fn with_depth(mut self, depth: u8) -> Self {
        self.depth = depth;
        self
    }

    /// Set the retry policy
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    /// URL of `key` on this endpoint
    pub fn content_url(&self, key: &HashKey) -> Result<Url, FetchError> {
        let path = match self.layout {
            EndpointLayout::Sharded => {
                let digest = key.digest();
                let mut segments: Vec<&str> = (0..self.depth as usize)
                    .map(|i| i * 2)
                    .filter(|start| start + 2 <= digest.len())
                    .map(|start| &digest[start..start + 2])
                    .collect();
                segments.push(digest);
                segments.join("/")
            }
            EndpointLayout::Flat => key.to_string(),
        };
        self.join(&path)
    }

    /// URL of the tar+gzip container that may hold `key`
    pub fn container_url(&self, key: &HashKey) -> Result<Url, FetchError> {
        let digest = key.digest();
        self.join(&format!("{}.tar.gz", &digest[..2.min(digest.len())]))
    }

    fn join(&self, path: &str) -> Result<Url, FetchError> {
        let base = self.url.as_str().trim_end_matches('/');
        let raw = format!("{}/{}", base, path);
        Url::parse(&raw).map_err(|e| FetchError::InvalidUrl {
            url: raw,
            reason: e.to_string(),
        })
    }
}
