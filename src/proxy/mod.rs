//! Proxy core.
//!
//! # Data Flow
//! ```text
//! GET <stream mount>?target=<url>
//!     → stream.rs (validate target, fetch with fixed User-Agent)
//!     → headers.rs (replace CORS header)
//!     → upstream.rs (relay body unbuffered)
//!
//! GET <content mount>/<suffix>?query
//!     → content.rs (rebase onto upstream, fetch with identity encoding)
//!     → headers.rs (strip frame-blocking headers, set CORS)
//!     → text/html?  inject.rs (buffer, splice resizer script)
//!       otherwise   upstream.rs (relay body unbuffered)
//! ```
//!
//! # Design Decisions
//! - Handlers are stateless; each request makes at most one upstream call
//! - Failures are never retried and always produce a non-2xx explanation

pub mod content;
pub mod error;
pub mod headers;
pub mod inject;
pub mod stream;
pub mod upstream;

pub use content::ContentProxy;
pub use error::{FetchError, ProxyError};
pub use headers::HeaderPolicy;
pub use inject::HtmlInjector;
pub use stream::StreamProxy;
pub use upstream::{UpstreamClient, UpstreamTarget};
