//! LINE Bot API Library
//!
//! Decodes LINE webhook callbacks and sends text messages through the bot API.
//!
//! # Usage
//!
//! ```no_run
//! use line_bot_api::LineClient;
//!
//! # async fn run(body: &[u8]) -> line_bot_api::Result<()> {
//! let client = LineClient::new("channel_id", "channel_secret", "bot_mid")?;
//! client.set_proxy("http://proxy.local:3128")?;
//!
//! let message = client.decode_message(body)?;
//! for event in message.events() {
//!     let response = client.send_text([event.sender()], &event.content.text).await?;
//!     if response.has_failures() {
//!         eprintln!("undelivered: {:?}", response.failed);
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Echo bot
//!
//! The `line-echo-bot` binary wires the client to an axum webhook server:
//!
//! ```bash
//! export LINE_CHANNEL_ID=1234567890
//! export LINE_CHANNEL_SECRET=your_secret
//! export LINE_MID=u0123456789abcdef
//! export PROXY_URL=http://proxy.local:3128  # optional
//!
//! line-echo-bot
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod logger;
pub mod types;
pub mod webhook;

pub use client::{LineClient, TransportConfig};
pub use config::BotConfig;
pub use error::{LineError, Result};
pub use logger::{Logger, MemoryLogger, TracingLogger};
pub use types::*;

/// Prelude for common imports
pub mod prelude {
    pub use crate::client::{LineClient, TransportConfig};
    pub use crate::error::{LineError, Result};
    pub use crate::logger::Logger;
    pub use crate::types::*;
}
