//! Error types for the proxy handlers.
//!
//! Every failure is terminal for its request. Errors are caught at the handler
//! boundary and converted into a plain-text response that still carries the
//! CORS header, so the browser can read the explanation.

use std::error::Error as StdError;

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Failure while contacting an upstream or reading its body.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Target is not an absolute URL.
    #[error("invalid target URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Connection, DNS or TLS failure before a response arrived.
    #[error("{}", with_causes(.0))]
    Request(#[source] reqwest::Error),

    /// The body broke off while it was being buffered.
    #[error("failed to read upstream body: {}", with_causes(.0))]
    Body(#[source] reqwest::Error),

    /// No headers, or no complete document, within the request timeout.
    #[error("upstream timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Buffered document exceeded the configured ceiling.
    #[error("upstream document exceeds {limit} bytes")]
    TooLarge { limit: usize },
}

/// Render an error followed by its chain of causes, `": "`-separated.
///
/// reqwest's own message only names the URL; the cause says what went wrong.
fn with_causes(error: &dyn StdError) -> String {
    let mut out = error.to_string();
    let mut cause = error.source();
    while let Some(inner) = cause {
        let text = inner.to_string();
        if !out.ends_with(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
        cause = inner.source();
    }
    out
}

/// Errors surfaced to the client by the proxy handlers.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// A required query parameter is absent or empty.
    #[error("Missing {0} param")]
    MissingParameter(&'static str),

    /// Stream proxy could not reach its target.
    #[error("Proxy error: {0}")]
    UpstreamFetch(#[source] FetchError),

    /// Content proxy could not reach or read the upstream page.
    #[error("Error fetching {host} content: {source}")]
    ContentFetch {
        host: String,
        #[source]
        source: FetchError,
    },

    /// Upstream answered with a status that carries no body.
    #[error("No content")]
    EmptyUpstreamBody,
}

impl ProxyError {
    /// HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingParameter(_) => StatusCode::BAD_REQUEST,
            ProxyError::UpstreamFetch(_)
            | ProxyError::ContentFetch { .. }
            | ProxyError::EmptyUpstreamBody => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::MissingParameter(_) => "missing_parameter",
            ProxyError::UpstreamFetch(_) | ProxyError::ContentFetch { .. } => "upstream_fetch",
            ProxyError::EmptyUpstreamBody => "empty_upstream_body",
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let mut response = (self.status(), self.to_string()).into_response();
        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        );
        response
    }
}
