//! Header policy for proxied responses.
//!
//! # Responsibilities
//! - Drop frame-blocking headers so the page can be embedded cross-origin
//! - Force a single `Access-Control-Allow-Origin: *`
//! - Strip headers the outbound transport owns (hop-by-hop, stale framing)
//!
//! # Design Decisions
//! - `HeaderMap` keys are case-insensitive, so removal covers every casing
//! - The CORS header is set last, replacing any upstream value(s)

use axum::http::header::{self, HeaderMap, HeaderName, HeaderValue};

/// Hop-by-hop headers that are never copied onto the outbound response.
pub const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "trailers",
    "transfer-encoding",
    "upgrade",
];

/// Headers that prevent a document from being framed or re-typed.
pub const FRAME_BLOCKING_HEADERS: &[&str] = &[
    "x-frame-options",
    "content-security-policy",
    "x-content-type-options",
];

/// Decides which upstream headers reach the client.
#[derive(Debug, Clone)]
pub struct HeaderPolicy {
    removed: Vec<HeaderName>,
}

impl HeaderPolicy {
    /// Policy for framed content: strip frame-blocking headers and CORS.
    pub fn frame_unblocking() -> Self {
        let mut removed: Vec<HeaderName> = FRAME_BLOCKING_HEADERS
            .iter()
            .copied()
            .map(HeaderName::from_static)
            .collect();
        removed.push(header::ACCESS_CONTROL_ALLOW_ORIGIN);
        Self { removed }
    }

    /// Policy for raw streams: only the CORS header is replaced.
    pub fn cors_only() -> Self {
        Self {
            removed: vec![header::ACCESS_CONTROL_ALLOW_ORIGIN],
        }
    }

    /// Apply the policy to an upstream header map, producing the client map.
    pub fn apply(&self, upstream: &HeaderMap) -> HeaderMap {
        let mut headers = upstream.clone();
        for name in &self.removed {
            headers.remove(name);
        }
        strip_hop_by_hop(&mut headers);
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        );
        headers
    }
}

/// Remove headers that describe a single transport hop.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP_HEADERS {
        headers.remove(*name);
    }
}

/// Remove framing headers that go stale once the body is rewritten.
pub fn strip_body_framing(headers: &mut HeaderMap) {
    headers.remove(header::CONTENT_LENGTH);
    headers.remove(header::CONTENT_ENCODING);
}

/// Whether a `Content-Type` value declares an HTML document.
///
/// Missing content types are not HTML; nothing is sniffed from the body.
pub fn is_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.to_ascii_lowercase().contains("text/html"))
        .unwrap_or(false)
}

/// Whether the body carries a content coding other than `identity`.
pub fn is_content_encoded(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::CONTENT_ENCODING)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .any(|coding| !coding.is_empty() && !coding.eq_ignore_ascii_case("identity"))
}
