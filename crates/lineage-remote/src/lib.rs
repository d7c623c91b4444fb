//! # Lineage Remote
//!
//! Resolves content by [`HashKey`](lineage_core::HashKey), first from the
//! local [`ContentStore`](lineage_store::ContentStore) and then from an
//! ordered list of HTTP endpoints.
//!
//! - Each endpoint gets one logical fetch with its own [`RetryContext`].
//!   Only `429` is retried; server hints are honored.
//! - Bodies are verified against the requested digest before use.
//! - Fetched content is written through to the local store unless caching
//!   is disabled.
//! - Optionally, content missing from an endpoint is looked up inside
//!   tar+gzip containers.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use lineage_remote::{RemoteConfig, RemoteEndpoint, RemoteResolver};
//!
//! let config = RemoteConfig::default()
//!     .with_endpoint(RemoteEndpoint::new("https://mirror.example/content/".parse()?));
//! let resolver = RemoteResolver::new(config, store)?;
//! let bytes = resolver.resolve(&key).await?;
//! ```

pub mod config;
pub mod endpoint;
pub mod error;
pub mod progress;
pub mod resolver;
pub mod retry;

// Re-exports
pub use config::RemoteConfig;
pub use endpoint::{EndpointLayout, RemoteEndpoint};
pub use error::{EndpointFailure, FetchError, ResolveError};
pub use progress::ProgressListener;
pub use resolver::{Dereferencer, RemoteResolver};
pub use retry::{RateLimitHints, RetryConfig, RetryContext};
