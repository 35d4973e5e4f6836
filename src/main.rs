//! LINE Echo Bot - Main Entry Point
//!
//! Receives LINE webhook callbacks and replies to every message with its own
//! text.
//!
//! ```text
//! LINE Platform ──HTTPS──▶ Echo Bot (this) ──HTTPS──▶ LINE Bot API
//!                            │
//!                            └── Webhook Server (POST /callback)
//! ```

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use line_bot_api::{BotConfig, webhook};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,line_bot_api=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("LINE echo bot starting...");

    // Load configuration
    let config = BotConfig::from_env()?;
    let client = Arc::new(config.build_client()?);
    info!(
        "Configuration loaded (endpoint: {}, proxy: {})",
        config.api_endpoint,
        config.proxy_url.as_deref().unwrap_or("none")
    );

    let addr: SocketAddr = config.webhook_addr.parse()?;
    let server = tokio::spawn(async move {
        if let Err(e) = webhook::run_server(addr, client).await {
            tracing::error!("Webhook server error: {}", e);
        }
    });

    info!("Webhook server listening on {}", config.webhook_addr);

    // Wait for shutdown signal
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(err) => tracing::error!("Unable to listen for shutdown signal: {}", err),
    }

    server.abort();

    info!("LINE echo bot stopped");
    Ok(())
}
