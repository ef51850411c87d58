//! Radio proxy (v1)
//!
//! A small reverse proxy built with Tokio and Axum that fronts upstream radio
//! content for a browser-based player.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────────┐
//!                       │                   RADIO PROXY                    │
//!   Client Request      │  ┌─────────┐    ┌───────────────┐                │
//!   ────────────────────┼─▶│  http   │───▶│ StreamProxy   │──── GET ───────┼──▶ Any stream URL
//!                       │  │ server  │    │ (?target=...) │                │
//!                       │  │         │    └───────────────┘                │
//!                       │  │         │    ┌───────────────┐                │
//!                       │  │         │───▶│ ContentProxy  │──── GET ───────┼──▶ Broadcaster site
//!                       │  └─────────┘    └──────┬────────┘                │
//!                       │                        ▼                         │
//!   Client Response     │  ┌──────────────┐  ┌──────────────┐              │
//!   ◀───────────────────┼──│ HeaderPolicy │◀─│ HtmlInjector │ (HTML only)  │
//!                       │  └──────────────┘  └──────────────┘              │
//!                       └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use radio_proxy::config::{load_config, ProxyConfig};
use radio_proxy::lifecycle::{signals, startup, Shutdown};
use radio_proxy::observability::logging;

#[derive(Parser)]
#[command(name = "radio-proxy")]
#[command(about = "CORS and framing proxy for browser radio players", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability.log_level);

    tracing::info!("radio-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        stream_mount = %config.stream.mount,
        content_mount = %config.content.mount,
        upstream = %config.content.upstream_base,
        tls = config.listener.tls.is_some(),
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(&shutdown);

    startup::run(config, &shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
