//! ==============================================================================
//! main.rs - meetjestad proxy entry point
//! ==============================================================================
//!
//! purpose:
//!     a small http service in front of the Meet je Stad sensor feed.
//!     it fetches the most recent readings of one sensor and answers with a
//!     normalized json document.
//!
//! responsibilities:
//!     - parse command line flags (port, bind, config path, version)
//!     - load configuration (config/proxy.toml or defaults)
//!     - initialize logging
//!     - serve the proxy endpoint until SIGINT/SIGTERM
//!
//! relationships:
//!     - uses: config.rs (runtime configuration)
//!     - uses: upstream.rs (HttpFeed, the real feed source)
//!     - uses: server.rs (router, request validation, error bodies)
//!
//! architecture:
//!
//!     ┌──────────────────────────────────────────────────────────┐
//!     │                   rust proxy (this file)                  │
//!     │  ┌─────────────┐   ┌──────────────┐   ┌──────────────┐   │
//!     │  │ web server  │──>│  FeedSource  │──>│   decoders   │   │
//!     │  │ (port 8080) │   │  (HttpFeed)  │   │ (json, html) │   │
//!     │  └─────────────┘   └──────┬───────┘   └──────────────┘   │
//!     └───────────────────────────┼──────────────────────────────┘
//!                                 │ https, 2s timeout
//!                                 ▼
//!                     ┌───────────────────────┐
//!                     │  meetjestad.net feed  │
//!                     └───────────────────────┘
//!
//! ==============================================================================

use meetjestad_proxy::config::ProxyConfig;
use meetjestad_proxy::server::{router, AppState};
use meetjestad_proxy::upstream::HttpFeed;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Meet je Stad sensor feed proxy
#[derive(Parser, Debug)]
#[command(name = "meetjestad-proxy")]
#[command(about = "Proxies Meet je Stad sensor readings as normalized JSON")]
#[command(version)]
struct Args {
    /// HTTP server port (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Bind address (overrides the config file)
    #[arg(short, long)]
    bind: Option<String>,

    /// Path to proxy.toml (default: config/proxy.toml, then ../config/proxy.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the version and exit
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(Command::Version) = args.command {
        println!("meetjestad-proxy version {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // startup banner
    println!("===========================================================");
    println!("  meetjestad-proxy {}", env!("CARGO_PKG_VERSION"));
    println!("  \"One feed in, normalized readings out\"");
    println!("===========================================================");

    // step 1: load configuration, flags win over the file
    let mut config = match &args.config {
        Some(path) => ProxyConfig::load(path)?,
        None => ProxyConfig::load_or_default(),
    };
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    config.print_summary();

    // step 2: logging, RUST_LOG takes precedence over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // step 3: feed source and shared request state
    let feed = HttpFeed::new(config.upstream.clone())?;
    let state = AppState::new(&config.query, Arc::new(feed))?;
    let app = router(Arc::new(state));

    // step 4: serve until a shutdown signal arrives
    let addr = format!("{}:{}", config.server.bind, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("[STARTUP] listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("[SHUTDOWN] exit");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("[SHUTDOWN] failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("[SHUTDOWN] failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("[SHUTDOWN] received SIGINT, shutting down"),
        _ = terminate => info!("[SHUTDOWN] received SIGTERM, shutting down"),
    }
}
