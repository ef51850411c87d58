//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Version of the iframe-resizer content script injected into proxied HTML.
pub const DEFAULT_RESIZER_VERSION: &str = "5.5.7";

/// Liveness route; reserved, so neither mount may use it.
pub const HEALTH_PATH: &str = "/healthz";

/// Root configuration for the radio proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Stream proxy (audio pass-through) settings.
    pub stream: StreamProxyConfig,

    /// Content proxy (framed broadcaster page) settings.
    pub content: ContentProxyConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Timeout configuration for upstream operations.
///
/// Neither timeout bounds how long a response body may stream; live audio
/// never terminates on its own.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Time allowed until response headers are produced, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 10,
            request_secs: 30,
        }
    }
}

/// Stream proxy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StreamProxyConfig {
    /// Path the stream proxy is mounted on.
    pub mount: String,

    /// User-Agent sent upstream. Some stream hosts reject empty agents as bots.
    pub user_agent: String,
}

impl Default for StreamProxyConfig {
    fn default() -> Self {
        Self {
            mount: "/proxy-stream".to_string(),
            user_agent: "RadioProxy/1.0".to_string(),
        }
    }
}

/// Content proxy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContentProxyConfig {
    /// Path prefix stripped from inbound requests.
    pub mount: String,

    /// Upstream URL the remaining path is appended to.
    pub upstream_base: String,

    /// `src` of the resizing script spliced into HTML documents.
    pub resizer_script_src: String,

    /// Largest HTML document buffered for rewriting, in bytes.
    pub max_html_bytes: usize,
}

impl ContentProxyConfig {
    /// The complete script element injected before `</body>`.
    pub fn script_tag(&self) -> String {
        format!(r#"<script src="{}"></script>"#, self.resizer_script_src)
    }
}

impl Default for ContentProxyConfig {
    fn default() -> Self {
        Self {
            mount: "/radio".to_string(),
            upstream_base: "https://akashvani.gov.in/radio".to_string(),
            resizer_script_src: format!(
                "https://cdn.jsdelivr.net/npm/iframe-resizer@{}/js/iframeResizer.contentWindow.min.js",
                DEFAULT_RESIZER_VERSION
            ),
            max_html_bytes: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
