//! Configuration management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::client::{BASE_ENDPOINT, LineClient, TransportConfig};

/// Echo bot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    // =========================================================================
    // LINE Channel Credentials
    // =========================================================================
    /// Channel ID (`X-Line-ChannelID`)
    pub channel_id: String,

    /// Channel secret (`X-Line-ChannelSecret`)
    pub channel_secret: String,

    /// MID of the bot (`X-Line-Trusted-User-With-ACL`)
    pub mid: String,

    // =========================================================================
    // Transport
    // =========================================================================
    /// Optional proxy for outbound API calls
    pub proxy_url: Option<String>,

    /// API host
    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    // =========================================================================
    // Webhook Server
    // =========================================================================
    /// Webhook server bind address (receives callbacks from LINE)
    #[serde(default = "default_webhook_addr")]
    pub webhook_addr: String,

    /// Enable debug mode (log raw callback bodies)
    #[serde(default)]
    pub debug_mode: bool,
}

fn default_api_endpoint() -> String {
    BASE_ENDPOINT.to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_webhook_addr() -> String {
    "0.0.0.0:8080".to_string()
}

/// Zero or unparseable values fall back to the default.
fn parse_timeout_secs(value: Option<String>) -> u64 {
    value
        .and_then(|s| s.trim().parse().ok())
        .filter(|&secs| secs > 0)
        .unwrap_or_else(default_request_timeout)
}

impl BotConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let channel_id =
            std::env::var("LINE_CHANNEL_ID").context("LINE_CHANNEL_ID is required")?;
        let channel_secret =
            std::env::var("LINE_CHANNEL_SECRET").context("LINE_CHANNEL_SECRET is required")?;
        let mid = std::env::var("LINE_MID").context("LINE_MID is required")?;

        let webhook_addr = match (std::env::var("WEBHOOK_ADDR"), std::env::var("PORT")) {
            (Ok(addr), _) => addr,
            (Err(_), Ok(port)) => format!("0.0.0.0:{}", port),
            _ => default_webhook_addr(),
        };

        Ok(Self {
            channel_id,
            channel_secret,
            mid,
            proxy_url: std::env::var("PROXY_URL")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            api_endpoint: std::env::var("LINE_API_ENDPOINT")
                .unwrap_or_else(|_| default_api_endpoint()),
            request_timeout_secs: parse_timeout_secs(std::env::var("REQUEST_TIMEOUT_SECS").ok()),
            webhook_addr,
            debug_mode: std::env::var("DEBUG_MODE").is_ok(),
        })
    }

    /// Transport settings derived from this configuration
    pub fn transport(&self) -> Result<TransportConfig> {
        let mut transport = TransportConfig::new()
            .endpoint(&self.api_endpoint)
            .timeout(Duration::from_secs(self.request_timeout_secs));

        if let Some(proxy_url) = &self.proxy_url {
            transport = transport
                .proxy(proxy_url)
                .with_context(|| format!("PROXY_URL is not a valid URL: {}", proxy_url))?;
        }

        Ok(transport)
    }

    /// Build a client from this configuration
    pub fn build_client(&self) -> Result<LineClient> {
        let client = LineClient::with_transport(
            &self.channel_id,
            &self.channel_secret,
            &self.mid,
            self.transport()?,
        )
        .context("Failed to create LINE client")?;
        client.set_debug(self.debug_mode);
        Ok(client)
    }
}
