//! Upstream targets and the HTTP client used to reach them.
//!
//! # Responsibilities
//! - Derive the upstream URL for each proxy flavour
//! - Issue the single upstream GET a request is allowed
//! - Relay upstream bodies as streams, or buffer them under a ceiling
//!
//! # Design Decisions
//! - No overall request timeout on the client: live streams never end
//! - `request_secs` bounds the wait for response headers and the buffering of
//!   a whole document, never a relayed stream
//! - Relayed bodies are pulled only as fast as the client consumes them
//! - Dropping a relayed body drops the upstream response and its connection

use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{HeaderMap, StatusCode, Uri};
use futures_util::TryStreamExt;
use url::Url;

use crate::config::TimeoutConfig;
use crate::observability::metrics;
use crate::proxy::error::FetchError;

/// A fully-qualified upstream URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTarget(Url);

impl UpstreamTarget {
    /// Use a caller-supplied absolute URL as-is.
    pub fn passthrough(raw: &str) -> Result<Self, FetchError> {
        Url::parse(raw)
            .map(Self)
            .map_err(|source| FetchError::InvalidUrl {
                url: raw.to_string(),
                source,
            })
    }

    /// Rebase an inbound request onto `base`, dropping the `mount` prefix.
    ///
    /// `/radio/news?lang=en` under mount `/radio` and base
    /// `https://host/radio` becomes `https://host/radio/news?lang=en`.
    pub fn rebase(base: &str, mount: &str, uri: &Uri) -> Result<Self, FetchError> {
        let path = uri.path();
        let suffix = path.strip_prefix(mount).unwrap_or(path);
        let suffix = suffix.strip_prefix('/').unwrap_or(suffix);

        let mut raw = format!("{}/{}", base.trim_end_matches('/'), suffix);
        if let Some(query) = uri.query().filter(|q| !q.is_empty()) {
            raw.push('?');
            raw.push_str(query);
        }
        Self::passthrough(&raw)
    }

    pub fn url(&self) -> &Url {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for UpstreamTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// Shared upstream HTTP client.
///
/// Cloning is cheap; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    inner: reqwest::Client,
    request_timeout: Duration,
}

impl UpstreamClient {
    /// Build a client with the configured connect and request timeouts.
    pub fn new(timeouts: &TimeoutConfig) -> Result<Self, reqwest::Error> {
        let inner = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(timeouts.connect_secs))
            .no_proxy()
            .build()?;
        Ok(Self {
            inner,
            request_timeout: Duration::from_secs(timeouts.request_secs),
        })
    }

    /// Issue a GET to `target` with extra request headers.
    ///
    /// Resolves once the upstream has sent its status line and headers.
    pub async fn get(
        &self,
        target: &UpstreamTarget,
        headers: HeaderMap,
    ) -> Result<reqwest::Response, FetchError> {
        let send = self.inner.get(target.url().clone()).headers(headers).send();
        tokio::time::timeout(self.request_timeout, send)
            .await
            .map_err(|_| self.timed_out())?
            .map_err(FetchError::Request)
    }

    /// Buffer a whole upstream body within the request timeout.
    pub async fn read_limited(
        &self,
        response: reqwest::Response,
        limit: usize,
    ) -> Result<Vec<u8>, FetchError> {
        tokio::time::timeout(self.request_timeout, buffer_body(response, limit))
            .await
            .map_err(|_| self.timed_out())?
    }

    fn timed_out(&self) -> FetchError {
        FetchError::Timeout {
            secs: self.request_timeout.as_secs(),
        }
    }
}

/// Whether a response with this status can carry a body at all.
pub fn has_body(status: StatusCode) -> bool {
    !(status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::RESET_CONTENT
        || status == StatusCode::NOT_MODIFIED)
}

/// Buffer a whole upstream body, failing once it grows past `limit` bytes.
async fn buffer_body(
    mut response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    if response.content_length().is_some_and(|len| len > limit as u64) {
        return Err(FetchError::TooLarge { limit });
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(FetchError::Body)? {
        if body.len() + chunk.len() > limit {
            return Err(FetchError::TooLarge { limit });
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// Turn an upstream response body into an unbuffered outbound body.
pub fn relay_body(response: reqwest::Response, proxy: &'static str) -> Body {
    let mut tally = RelayTally::new(proxy, response.url().as_str());
    let stream = response.bytes_stream().map_ok(move |chunk| {
        tally.record(chunk.len());
        chunk
    });
    Body::from_stream(stream)
}

/// Accounts for bytes relayed on one body; reports when the relay ends.
struct RelayTally {
    proxy: &'static str,
    target: String,
    bytes: u64,
    started: Instant,
}

impl RelayTally {
    fn new(proxy: &'static str, target: &str) -> Self {
        Self {
            proxy,
            target: target.to_string(),
            bytes: 0,
            started: Instant::now(),
        }
    }

    fn record(&mut self, len: usize) {
        self.bytes += len as u64;
        metrics::record_relayed(self.proxy, len as u64);
    }
}

impl Drop for RelayTally {
    fn drop(&mut self) {
        tracing::debug!(
            proxy = self.proxy,
            upstream = %self.target,
            bytes = self.bytes,
            elapsed = ?self.started.elapsed(),
            "Upstream relay closed"
        );
    }
}
