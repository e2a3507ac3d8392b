//! CRM gateway for a law-firm marketing site.
//!
//! # Architecture Overview
//!
//! ```text
//!                         ┌──────────────────────────────────────────────────┐
//!                         │                   CRM GATEWAY                    │
//!                         │                                                  │
//!     Browser request     │  ┌──────────┐   ┌──────────┐   ┌─────────────┐   │
//!     ────────────────────┼─▶│ security │──▶│ handlers │──▶│ rate limit  │   │
//!                         │  │ per-IP   │   │ validate │   │ per target  │   │
//!                         │  └──────────┘   │ sanitize │   └──────┬──────┘   │
//!                         │                 └──────────┘          ▼          │
//!                         │                               ┌─────────────┐    │
//!                         │                               │   retries   │    │
//!                         │                               └──────┬──────┘    │
//!                         │                                      ▼           │
//!     JSON response       │  ┌──────────┐   ┌──────────┐   ┌─────────────┐   │
//!     ◀───────────────────┼──│ response │◀──│ classify │◀──│  upstream   │◀──┼── CRM / content API
//!                         │  │ envelope │   │  errors  │   │  clients    │   │
//!                         │  └──────────┘   └──────────┘   └─────────────┘   │
//!                         │                                                  │
//!                         │   config · observability · lifecycle             │
//!                         └──────────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use crm_gateway::config::load_config;
use crm_gateway::http::HttpServer;
use crm_gateway::lifecycle::{signals, Shutdown};
use crm_gateway::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "crm-gateway", version, about = "Server-side gateway to the CRM and content APIs")]
struct Args {
    /// Optional TOML configuration file. Environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    dotenvy::dotenv().ok();

    let config = load_config(args.config.as_deref())?;
    logging::init(&config.observability)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "crm-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        environment = config.environment.as_str(),
        upstream = %config.upstream.url,
        content_enabled = config.content.api_key.is_some(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_listener(&shutdown);

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
