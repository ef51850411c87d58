//! Radio proxy library.
//!
//! Re-serves third-party radio content from this origin: raw audio streams
//! (to avoid mixed-content blocking) and a broadcaster's live page (stripped
//! of frame-blocking headers, with an iframe-resizing script injected).

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod proxy;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
