//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check mount paths are well-formed and do not overlap
//! - Validate the upstream base URL and header-bound strings
//! - Validate value ranges (timeouts > 0, size limits > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderValue;
use url::Url;

use crate::config::schema::{ProxyConfig, HEALTH_PATH};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    /// Human-readable description.
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    check_mount("stream.mount", &config.stream.mount, &mut errors);
    check_mount("content.mount", &config.content.mount, &mut errors);
    if config.stream.mount == config.content.mount {
        errors.push(ValidationError::new(
            "content.mount",
            "must differ from stream.mount",
        ));
    }
    if config.stream.mount == HEALTH_PATH {
        errors.push(ValidationError::new("stream.mount", "reserved for the health check"));
    }
    if config.content.mount == HEALTH_PATH {
        errors.push(ValidationError::new("content.mount", "reserved for the health check"));
    }

    if HeaderValue::from_str(&config.stream.user_agent).is_err() {
        errors.push(ValidationError::new(
            "stream.user_agent",
            "not a valid header value",
        ));
    }

    match Url::parse(&config.content.upstream_base) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
        Ok(url) => errors.push(ValidationError::new(
            "content.upstream_base",
            format!("unsupported upstream '{}'", url),
        )),
        Err(e) => errors.push(ValidationError::new(
            "content.upstream_base",
            format!("invalid URL: {}", e),
        )),
    }

    let src = &config.content.resizer_script_src;
    if src.is_empty() || src.contains('"') {
        errors.push(ValidationError::new(
            "content.resizer_script_src",
            "must be a non-empty URL without quotes",
        ));
    }

    if config.content.max_html_bytes == 0 {
        errors.push(ValidationError::new("content.max_html_bytes", "must be greater than 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_mount(field: &'static str, mount: &str, errors: &mut Vec<ValidationError>) {
    if !mount.starts_with('/') || mount.len() < 2 {
        errors.push(ValidationError::new(field, "must start with '/' and name a path"));
    } else if mount.ends_with('/') {
        errors.push(ValidationError::new(field, "must not end with '/'"));
    } else if mount.contains(['{', '}', '?', '#']) {
        errors.push(ValidationError::new(field, "contains reserved characters"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&ProxyConfig::default()).is_ok());
    }

    #[test]
    fn collects_every_error() {
        let mut config = ProxyConfig::default();
        config.stream.mount = "proxy-stream".into();
        config.content.upstream_base = "ftp://example.com/radio".into();
        config.content.max_html_bytes = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["stream.mount", "content.upstream_base", "content.max_html_bytes"]
        );
    }

    #[test]
    fn rejects_overlapping_mounts() {
        let mut config = ProxyConfig::default();
        config.content.mount = "/proxy-stream".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "content.mount");
    }

    #[test]
    fn rejects_health_check_mount() {
        let mut config = ProxyConfig::default();
        config.stream.mount = "/healthz".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "stream.mount");

        let mut config = ProxyConfig::default();
        config.content.mount = "/healthz".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "content.mount");
    }

    #[test]
    fn rejects_trailing_slash_mount() {
        let mut config = ProxyConfig::default();
        config.content.mount = "/radio/".into();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn rejects_quote_in_script_src() {
        let mut config = ProxyConfig::default();
        config.content.resizer_script_src = r#"x.js" onload="alert(1)"#.into();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn metrics_address_checked_only_when_enabled() {
        let mut config = ProxyConfig::default();
        config.observability.metrics_address = "nowhere".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
