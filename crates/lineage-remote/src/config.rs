//! Resolver configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::endpoint::RemoteEndpoint;
use crate::retry::RetryConfig;

/// Configuration for [`RemoteResolver`](crate::RemoteResolver)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Endpoints in priority order
    pub endpoints: Vec<RemoteEndpoint>,
    /// Write fetched content through to the local store
    pub cache_enabled: bool,
    /// Look for content inside tar+gzip containers
    pub support_tar_gz_discovery: bool,
    /// Per-request timeout (seconds)
    pub timeout_secs: u64,
    /// Retry policy for endpoints without their own
    pub retry: RetryConfig,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoints: Vec::new(),
            cache_enabled: true,
            support_tar_gz_discovery: false,
            timeout_secs: 30,
            retry: RetryConfig::default(),
        }
    }
}

impl RemoteConfig {
    /// Append an endpoint after the existing ones
    pub fn with_endpoint(mut self, endpoint: RemoteEndpoint) -> Self {
        self.endpoints.push(endpoint);
        self
    }

    /// Enable or disable write-through caching
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    /// Enable or disable container discovery
    pub fn with_tar_gz_discovery(mut self, enabled: bool) -> Self {
        self.support_tar_gz_discovery = enabled;
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs();
        self
    }

    /// Set the default retry policy
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::EndpointLayout;

    #[test]
    fn test_defaults() {
        let config = RemoteConfig::default();
        assert!(config.endpoints.is_empty());
        assert!(config.cache_enabled);
        assert!(!config.support_tar_gz_discovery);
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_partial_toml() {
        let config: RemoteConfig = toml::from_str(
            r#"
            support_tar_gz_discovery = true

            [[endpoints]]
            url = "https://deeplinker.example/"
            layout = "flat"

            [[endpoints]]
            url = "https://mirror.example/content/"
            depth = 3
            "#,
        )
        .unwrap();

        assert!(config.cache_enabled);
        assert!(config.support_tar_gz_discovery);
        assert_eq!(config.endpoints.len(), 2);
        assert_eq!(config.endpoints[0].layout, EndpointLayout::Flat);
        assert_eq!(config.endpoints[1].layout, EndpointLayout::Sharded);
        assert_eq!(config.endpoints[1].depth, 3);
        assert_eq!(config.retry, RetryConfig::default());
    }
}
