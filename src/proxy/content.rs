//! Broadcaster page proxy.
//!
//! # Responsibilities
//! - Map `<mount>/<suffix>?query` onto the fixed upstream base
//! - Request identity encoding so HTML can be rewritten as-is
//! - Strip frame-blocking headers from every response
//! - Buffer and inject the resizing script into HTML; stream everything else
//!
//! # Design Decisions
//! - The stream-or-buffer decision is made once, from the declared content
//!   type; a missing content type is streamed untouched
//! - HTML the upstream compressed anyway is streamed untouched too
//! - Only HTML is ever held in memory, and only up to `max_html_bytes`

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Uri};
use axum::response::Response;
use url::Url;

use crate::config::ContentProxyConfig;
use crate::http::response::relayed;
use crate::observability::metrics;
use crate::proxy::error::{FetchError, ProxyError};
use crate::proxy::headers::{is_content_encoded, is_html, strip_body_framing, HeaderPolicy};
use crate::proxy::inject::HtmlInjector;
use crate::proxy::upstream::{has_body, relay_body, UpstreamClient, UpstreamTarget};

/// Re-serves the upstream site from this origin so it can be framed.
#[derive(Debug, Clone)]
pub struct ContentProxy {
    client: UpstreamClient,
    mount: String,
    upstream_base: String,
    upstream_host: String,
    max_html_bytes: usize,
    policy: HeaderPolicy,
    injector: HtmlInjector,
}

impl ContentProxy {
    pub fn new(config: &ContentProxyConfig, client: UpstreamClient) -> Self {
        let upstream_host = Url::parse(&config.upstream_base)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
            .unwrap_or_else(|| config.upstream_base.clone());

        Self {
            client,
            mount: config.mount.clone(),
            upstream_base: config.upstream_base.clone(),
            upstream_host,
            max_html_bytes: config.max_html_bytes,
            policy: HeaderPolicy::frame_unblocking(),
            injector: HtmlInjector::new(config.script_tag()),
        }
    }

    /// Upstream URL for an inbound request URI.
    pub fn target_for(&self, uri: &Uri) -> Result<UpstreamTarget, FetchError> {
        UpstreamTarget::rebase(&self.upstream_base, &self.mount, uri)
    }

    pub async fn handle(&self, uri: &Uri) -> Result<Response, ProxyError> {
        let target = self.target_for(uri).map_err(|e| self.fetch_error(e))?;

        let mut request_headers = HeaderMap::new();
        request_headers.insert(header::ACCEPT_ENCODING, HeaderValue::from_static("identity"));

        tracing::debug!(upstream = %target, "Fetching content");
        let upstream = self
            .client
            .get(&target, request_headers)
            .await
            .map_err(|e| self.fetch_error(e))?;

        let status = upstream.status();
        let mut headers = self.policy.apply(upstream.headers());

        let rewritable = is_html(upstream.headers())
            && !is_content_encoded(upstream.headers())
            && has_body(status);
        if rewritable {
            let document = self
                .client
                .read_limited(upstream, self.max_html_bytes)
                .await
                .map_err(|e| self.fetch_error(e))?;
            let rewritten = self.injector.inject(&document);
            strip_body_framing(&mut headers);
            metrics::record_injection();

            tracing::debug!(
                upstream = %target,
                status = %status,
                original_bytes = document.len(),
                "Injected resizer script"
            );
            return Ok(relayed(status, headers, Body::from(rewritten)));
        }

        tracing::debug!(upstream = %target, status = %status, "Streaming content");
        Ok(relayed(status, headers, relay_body(upstream, "content")))
    }

    fn fetch_error(&self, source: FetchError) -> ProxyError {
        ProxyError::ContentFetch {
            host: self.upstream_host.clone(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimeoutConfig;

    fn proxy(config: &ContentProxyConfig) -> ContentProxy {
        let client = UpstreamClient::new(&TimeoutConfig::default()).unwrap();
        ContentProxy::new(config, client)
    }

    #[test]
    fn target_uses_configured_base() {
        let config = ContentProxyConfig {
            mount: "/news".into(),
            upstream_base: "http://127.0.0.1:9000/live/".into(),
            ..ContentProxyConfig::default()
        };
        let uri: Uri = "/news/today?x=1".parse().unwrap();
        assert_eq!(
            proxy(&config).target_for(&uri).unwrap().as_str(),
            "http://127.0.0.1:9000/live/today?x=1"
        );
    }

    #[test]
    fn errors_name_upstream_host() {
        let proxy = proxy(&ContentProxyConfig::default());
        let err = proxy.fetch_error(FetchError::TooLarge { limit: 1 });
        assert!(err.to_string().starts_with("Error fetching akashvani.gov.in content"));
    }
}
