//! Audio stream pass-through.
//!
//! Fetches an arbitrary caller-supplied URL and relays its bytes from this
//! origin, so an HTTPS player can consume plain-HTTP radio streams.

use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::Response;

use crate::config::StreamProxyConfig;
use crate::http::response::relayed;
use crate::proxy::error::ProxyError;
use crate::proxy::headers::HeaderPolicy;
use crate::proxy::upstream::{has_body, relay_body, UpstreamClient, UpstreamTarget};

/// Name of the query parameter carrying the stream URL.
pub const TARGET_PARAM: &str = "target";

/// Relays an upstream audio stream with relaxed CORS.
#[derive(Debug, Clone)]
pub struct StreamProxy {
    client: UpstreamClient,
    user_agent: String,
    policy: HeaderPolicy,
}

impl StreamProxy {
    pub fn new(config: &StreamProxyConfig, client: UpstreamClient) -> Self {
        Self {
            client,
            user_agent: config.user_agent.clone(),
            policy: HeaderPolicy::cors_only(),
        }
    }

    /// Extract the `target` parameter from a raw query string.
    ///
    /// An empty value counts as absent.
    pub fn target_param(query: Option<&str>) -> Option<String> {
        let query = query?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == TARGET_PARAM)
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
    }

    /// Handle one stream request given its raw query string.
    ///
    /// Nothing is sent upstream when `target` is missing.
    pub async fn handle(&self, query: Option<&str>) -> Result<Response, ProxyError> {
        let target = Self::target_param(query).ok_or(ProxyError::MissingParameter(TARGET_PARAM))?;
        let target = UpstreamTarget::passthrough(&target).map_err(ProxyError::UpstreamFetch)?;

        let mut headers = HeaderMap::new();
        match HeaderValue::from_str(&self.user_agent) {
            Ok(value) => {
                headers.insert(header::USER_AGENT, value);
            }
            Err(_) => tracing::warn!(user_agent = %self.user_agent, "Ignoring invalid user agent"),
        }

        tracing::debug!(upstream = %target, "Fetching stream");
        let upstream = self
            .client
            .get(&target, headers)
            .await
            .map_err(ProxyError::UpstreamFetch)?;

        let status = upstream.status();
        if !has_body(status) {
            tracing::warn!(upstream = %target, status = %status, "Upstream stream has no body");
            return Err(ProxyError::EmptyUpstreamBody);
        }

        let headers = self.policy.apply(upstream.headers());
        tracing::debug!(upstream = %target, status = %status, "Relaying stream");
        Ok(relayed(status, headers, relay_body(upstream, "stream")))
    }
}
