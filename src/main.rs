//! Proxy guard service.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ─────────────▶ http::server ─▶ http::middleware ─▶ headers::aggregate
//!                          │              (400/401)          │
//!                          ▼                                 ▼
//!                   http::handlers ─▶ dns::resolver ─▶ dns::cache
//!                                           │
//!                                           ▼
//!                                   live lookup (timeout)
//!
//!     Cross-cutting: config, observability (tracing + metrics), lifecycle
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use proxy_guard::lifecycle::{shutdown, signals, startup, Shutdown};
use proxy_guard::observability::{logging, metrics};
use proxy_guard::{HttpServer, ProxyGuard};

#[derive(Debug, Parser)]
#[command(name = "proxy-guard", version, about = "Header validation and DNS guard for package proxies")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = startup::load_or_default(cli.config.as_deref())?;
    logging::init_tracing(&config.observability.log_level);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "proxy-guard starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        required_headers = config.headers.required.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let guard = Arc::new(ProxyGuard::new(config));
    startup::warm_cache(&guard).await;

    let coordinator = Arc::new(Shutdown::new());
    let shutdown_rx = coordinator.subscribe();
    signals::spawn_signal_listener(coordinator.clone());

    HttpServer::new(guard.clone()).run(listener, shutdown_rx).await?;

    shutdown::finish(&guard);
    tracing::info!("Shutdown complete");
    Ok(())
}
