//! waitlist-gateway
//!
//! A credential-protecting proxy for waitlist form traffic, built with
//! Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────────┐
//!                    │                 PROXY GATEWAY                     │
//!                    │                                                   │
//!  Browser Request   │  ┌────────┐   ┌──────────┐   ┌───────────────┐   │
//!  ──────────────────┼─▶│ origin │──▶│   rate   │──▶│   security    │   │
//!                    │  │ check  │   │ limiter  │   │  validator    │   │
//!                    │  └────────┘   └──────────┘   └──────┬────────┘   │
//!                    │                                      │            │
//!                    │                              ┌───────▼────────┐   │
//!                    │                              │ secret vault   │   │
//!                    │                              │  (injection)   │   │
//!                    │                              └───────┬────────┘   │
//!                    │                                      │            │
//!  Browser Response  │  ┌──────────┐   ┌──────────┐  ┌──────▼────────┐   │      Third-party
//!  ◀─────────────────┼──│  audit   │◀──│ response │◀─│  downstream   │◀──┼────▶ API
//!                    │  │  sink    │   │intercept │  │    client     │   │
//!                    │  └──────────┘   └──────────┘  └───────────────┘   │
//!                    └──────────────────────────────────────────────────┘
//! ```
//!
//! Startup order: config → validation → secret vault (fail fast) →
//! metrics → bind → serve.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use waitlist_gateway::config::{load_config, GatewayConfig};
use waitlist_gateway::gateway::GatewayServer;
use waitlist_gateway::lifecycle::Shutdown;
use waitlist_gateway::observability;
use waitlist_gateway::secrets::SecretVault;

#[derive(Parser, Debug)]
#[command(
    name = "waitlist-gateway",
    about = "Credential-protecting outbound proxy gateway"
)]
struct Args {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    observability::logging::init("waitlist_gateway=debug,tower_http=debug");

    let args = Args::parse();
    tracing::info!("waitlist-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        captcha = config.captcha.enabled,
        subscribe = config.subscribe.enabled,
        webhook = config.webhook.enabled,
        downstream_timeout_secs = config.timeouts.downstream_secs,
        "Configuration loaded"
    );

    // Resolve every required secret up front. The process must not serve
    // traffic with an unresolved credential.
    let vault = SecretVault::from_env(&config)?;

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            observability::metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let (shutdown, server_shutdown) = Shutdown::new();
    shutdown.trigger_on_ctrl_c();

    let server = GatewayServer::new(config, vault)?;
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
