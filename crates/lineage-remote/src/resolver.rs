//! Local-or-remote content resolution

use std::sync::Arc;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use lineage_core::HashKey;
use lineage_store::{ContentStore, StoreError, find_in_container, is_gzip};
use reqwest::{Client, Response, StatusCode};
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::config::RemoteConfig;
use crate::endpoint::RemoteEndpoint;
use crate::error::{EndpointFailure, FetchError, ResolveError};
use crate::progress::ProgressListener;
use crate::retry::{RetryConfig, RetryContext};

/// Upper bound on the buffer reserved from `Content-Length`
const MAX_PREALLOC: u64 = 16 * 1024 * 1024;

/// Turns a [`HashKey`] into the bytes it names
#[async_trait]
pub trait Dereferencer: Send + Sync {
    async fn dereference(&self, key: &HashKey) -> Result<Bytes, ResolveError>;
}

/// Content obtained from one endpoint
struct Fetched {
    bytes: Bytes,
    /// Already written to the local store
    cached: bool,
}

/// Resolves content from the local store, falling back to remote endpoints
pub struct RemoteResolver {
    config: RemoteConfig,
    store: Arc<ContentStore>,
    client: Client,
    progress: Option<Arc<dyn ProgressListener>>,
}

impl RemoteResolver {
    /// Create a resolver over `store`
    pub fn new(config: RemoteConfig, store: Arc<ContentStore>) -> Result<Self, ResolveError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ResolveError::Client(e.to_string()))?;

        Ok(Self {
            config,
            store,
            client,
            progress: None,
        })
    }

    /// Report download progress to `listener`
    pub fn with_progress(mut self, listener: Arc<dyn ProgressListener>) -> Self {
        self.progress = Some(listener);
        self
    }

    /// Resolver configuration
    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    /// Local store
    pub fn store(&self) -> &Arc<ContentStore> {
        &self.store
    }

    /// Resolve `key` to its bytes
    ///
    /// A local hit never touches the network. Otherwise endpoints are tried
    /// in order and the first verified body wins; with caching enabled it is
    /// written to the local store before returning.
    #[instrument(skip(self), fields(key = %key.short_digest()))]
    pub async fn resolve(&self, key: &HashKey) -> Result<Bytes, ResolveError> {
        match self.store.get(key).await {
            Ok(Some(bytes)) => {
                debug!(size = bytes.len(), "Resolved from local store");
                return Ok(bytes);
            }
            Ok(None) => {}
            // A corrupt entry is a miss; the write-through below replaces it
            Err(StoreError::HashMismatch { actual, .. }) => {
                warn!(actual = %actual, "Local copy is corrupt, fetching from remote");
            }
            Err(e) => return Err(e.into()),
        }

        let mut failures = Vec::new();
        for endpoint in &self.config.endpoints {
            match self.fetch_from(endpoint, key).await {
                Ok(fetched) => {
                    if self.config.cache_enabled
                        && !fetched.cached
                        && let Err(e) = self.store.put(key, &fetched.bytes).await
                    {
                        warn!(error = %e, "Failed to cache fetched content");
                    }
                    info!(
                        endpoint = %endpoint.url,
                        size = fetched.bytes.len(),
                        "Resolved from remote"
                    );
                    return Ok(fetched.bytes);
                }
                Err(error) => {
                    warn!(endpoint = %endpoint.url, error = %error, "Endpoint failed");
                    failures.push(EndpointFailure {
                        endpoint: endpoint.url.clone(),
                        error,
                    });
                }
            }
        }

        Err(ResolveError::ContentUnavailable {
            key: key.clone(),
            failures,
        })
    }

    /// Resolve many keys on separate tasks
    ///
    /// Results come back in input order; one failure does not affect the
    /// others.
    pub async fn resolve_many(
        self: &Arc<Self>,
        keys: Vec<HashKey>,
    ) -> Vec<(HashKey, Result<Bytes, ResolveError>)> {
        let mut tasks = JoinSet::new();
        for (index, key) in keys.iter().cloned().enumerate() {
            let resolver = Arc::clone(self);
            tasks.spawn(async move { (index, resolver.resolve(&key).await) });
        }

        let mut results: Vec<Option<Result<Bytes, ResolveError>>> =
            keys.iter().map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => results[index] = Some(result),
                Err(e) => warn!(error = %e, "Resolution task failed"),
            }
        }

        keys.into_iter()
            .zip(results)
            .map(|(key, result)| {
                let result = result
                    .unwrap_or_else(|| Err(ResolveError::Task("task did not complete".into())));
                (key, result)
            })
            .collect()
    }

    /// One logical fetch against one endpoint
    async fn fetch_from(
        &self,
        endpoint: &RemoteEndpoint,
        key: &HashKey,
    ) -> Result<Fetched, FetchError> {
        let retry = endpoint.retry.unwrap_or(self.config.retry);
        let url = endpoint.content_url(key)?;

        match self.fetch_url(key, &url, retry).await {
            Ok(body) => self.accept(key, &url, body).await,
            Err(FetchError::Status { status: 404, .. }) if self.config.support_tar_gz_discovery => {
                let container_url = endpoint.container_url(key)?;
                debug!(url = %container_url, "Not found directly, trying container");
                let body = self.fetch_url(key, &container_url, retry).await?;
                self.scan(key, &container_url, body).await
            }
            Err(e) => Err(e),
        }
    }

    /// Accept a direct body if it verifies, or scan it as a container
    async fn accept(&self, key: &HashKey, url: &Url, body: Bytes) -> Result<Fetched, FetchError> {
        if key.verifies(&body) != Some(false) {
            return Ok(Fetched {
                bytes: body,
                cached: false,
            });
        }
        if self.config.support_tar_gz_discovery && is_gzip(&body) {
            debug!(url = %url, "Body is a gzip stream, scanning as container");
            return self.scan(key, url, body).await;
        }
        Err(FetchError::DigestMismatch { url: url.clone() })
    }

    /// Look for `key` inside a tar+gzip container body
    async fn scan(&self, key: &HashKey, url: &Url, body: Bytes) -> Result<Fetched, FetchError> {
        if self.config.cache_enabled {
            return match self.store.put_from_container(key, body).await? {
                Some(bytes) => Ok(Fetched {
                    bytes,
                    cached: true,
                }),
                None => Err(FetchError::NotInContainer { url: url.clone() }),
            };
        }

        let wanted = key.clone();
        let max_size = self.store.config().max_content_size;
        let found = tokio::task::spawn_blocking(move || find_in_container(&wanted, &body, max_size))
            .await
            .map_err(StoreError::from)??;

        match found {
            Some(data) => Ok(Fetched {
                bytes: Bytes::from(data),
                cached: false,
            }),
            None => Err(FetchError::NotInContainer { url: url.clone() }),
        }
    }

    /// GET `url`, retrying 429s as the policy allows
    async fn fetch_url(
        &self,
        key: &HashKey,
        url: &Url,
        retry: RetryConfig,
    ) -> Result<Bytes, FetchError> {
        let mut ctx = RetryContext::new(retry);
        loop {
            debug!(url = %url, attempt = ctx.retries() + 1, "GET");
            let response = self
                .client
                .get(url.clone())
                .send()
                .await
                .map_err(|source| FetchError::Http {
                    url: url.clone(),
                    source,
                })?;

            let status = response.status();
            if status.is_success() {
                return self.read_body(key, url, response).await;
            }

            if ctx.should_retry(status, response.headers()) {
                tokio::time::sleep(ctx.retry_interval()).await;
                continue;
            }

            return Err(if status == StatusCode::TOO_MANY_REQUESTS {
                FetchError::RateLimited {
                    url: url.clone(),
                    retries: ctx.retries(),
                }
            } else {
                FetchError::Status {
                    url: url.clone(),
                    status: status.as_u16(),
                }
            });
        }
    }

    async fn read_body(
        &self,
        key: &HashKey,
        url: &Url,
        mut response: Response,
    ) -> Result<Bytes, FetchError> {
        let total = response.content_length();
        let mut body = BytesMut::with_capacity(total.unwrap_or(0).min(MAX_PREALLOC) as usize);

        while let Some(chunk) = response.chunk().await.map_err(|source| FetchError::Http {
            url: url.clone(),
            source,
        })? {
            body.extend_from_slice(&chunk);
            if let Some(listener) = &self.progress {
                listener.on_progress(key, body.len() as u64, total);
            }
        }

        Ok(body.freeze())
    }
}

#[async_trait]
impl Dereferencer for RemoteResolver {
    async fn dereference(&self, key: &HashKey) -> Result<Bytes, ResolveError> {
        self.resolve(key).await
    }
}
