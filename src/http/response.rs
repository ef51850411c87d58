//! Response construction for proxied content.
//!
//! # Responsibilities
//! - Assemble the outbound response from upstream status and filtered headers
//! - Keep the upstream status code; the reason phrase is the canonical one
//!
//! # Design Decisions
//! - Headers are already policy-filtered by the caller
//! - Streaming bodies carry no framing of their own; hyper picks chunked or
//!   content-length from what remains in the header map

use axum::body::Body;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;

/// Build a response from an upstream status, filtered headers and a body.
pub fn relayed(status: StatusCode, headers: HeaderMap, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderValue};

    #[test]
    fn keeps_status_and_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("audio/mpeg"));

        let response = relayed(StatusCode::PARTIAL_CONTENT, headers, Body::empty());
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(response.headers().get(header::CONTENT_TYPE).unwrap(), "audio/mpeg");
    }
}
