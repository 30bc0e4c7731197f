//! Rewriting forward proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!                          ┌──────────────────────────────────────────────────────┐
//!                          │                   REWRITE PROXY                      │
//!                          │                                                      │
//!   GET /proxy?url=…       │  ┌─────────┐    ┌──────────┐    ┌────────────────┐   │
//!   ───────────────────────┼─▶│  http   │───▶│ upstream │───▶│ origin server  │───┼──▶
//!                          │  │ request │    │  client  │◀───│                │◀──┼───
//!                          │  └─────────┘    └────┬─────┘    └────────────────┘   │
//!                          │                      │                               │
//!                          │                      ▼                               │
//!                          │               ┌─────────────┐                        │
//!                          │               │   rewrite   │ html / css / passthru  │
//!                          │               │  + runtime  │                        │
//!                          │               └──────┬──────┘                        │
//!   Client Response        │  ┌─────────┐         │                               │
//!   ◀──────────────────────┼──│response │◀────────┘                               │
//!                          │  │ + policy│                                         │
//!                          │  └─────────┘                                         │
//!                          │                                                      │
//!                          │  config · observability · lifecycle · resilience     │
//!                          └──────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use rewrite_proxy::config::validation::validate_config;
use rewrite_proxy::config::{load_config, ConfigError, ProxyConfig};
use rewrite_proxy::lifecycle::signals::spawn_signal_handler;
use rewrite_proxy::observability::{logging, metrics};
use rewrite_proxy::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "rewrite-proxy")]
#[command(about = "Forward proxy that rewrites pages to load through itself", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long, env = "REWRITE_PROXY_CONFIG")]
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
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    logging::init(&config.observability)?;

    tracing::info!("rewrite-proxy v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        endpoint = %config.endpoint.reference_prefix(),
        upstream_timeout_secs = config.upstream.timeout_secs,
        inject_runtime = config.rewrite.inject_runtime,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!(address = %local_addr, "Listening for connections");

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let shutdown = Arc::new(Shutdown::new());
    let server_shutdown = shutdown.subscribe();
    spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(config)?;
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
