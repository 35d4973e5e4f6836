//! LINE bot API client
//!
//! Handles:
//! - Decoding webhook callback bodies
//! - Sending text messages through the events endpoint
//! - Optional HTTP proxy, swappable while the client is shared

use parking_lot::RwLock;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Proxy};
use std::io::Read;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::error::{LineError, Result};
use crate::logger::{Logger, TracingLogger};
use crate::types::{MAX_REQUEST_SIZE, ReceivedMessage, Response, SendingMessage};

// =============================================================================
// API Endpoints
// =============================================================================

/// Default API host
pub const BASE_ENDPOINT: &str = "https://trialbot-api.line.me";

const EVENTS_PATH: &str = "/v1/events";

// Header names are matched case-insensitively; `HeaderName` wants lowercase.
const HEADER_CHANNEL_ID: &str = "x-line-channelid";
const HEADER_CHANNEL_SECRET: &str = "x-line-channelsecret";
const HEADER_TRUSTED_USER: &str = "x-line-trusted-user-with-acl";
const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// Default timeout for a whole request/response cycle
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// =============================================================================
// Transport
// =============================================================================

/// How the client reaches the API
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Scheme and host of the API, without trailing path
    pub endpoint: String,
    /// Wall-clock limit for one request/response cycle
    pub timeout: Duration,
    /// Proxy every request goes through, if any
    pub proxy: Option<Url>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            endpoint: BASE_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            proxy: None,
        }
    }
}

impl TransportConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Parse and set the proxy URL.
    pub fn proxy(mut self, proxy_url: &str) -> Result<Self> {
        self.proxy = Some(parse_proxy_url(proxy_url)?);
        Ok(self)
    }

    fn events_url(&self) -> String {
        format!("{}{}", self.endpoint.trim_end_matches('/'), EVENTS_PATH)
    }
}

/// A transport config together with the HTTP client built from it
struct Transport {
    config: TransportConfig,
    http_client: Client,
}

impl Transport {
    fn build(config: TransportConfig) -> Result<Self> {
        let mut builder = Client::builder().timeout(config.timeout);

        // Only the configured proxy applies, never HTTP(S)_PROXY from the environment.
        builder = match &config.proxy {
            Some(url) => builder.proxy(
                Proxy::all(url.as_str())
                    .map_err(|e| LineError::Config(format!("Invalid proxy URL: {}", e)))?,
            ),
            None => builder.no_proxy(),
        };

        let http_client = builder
            .build()
            .map_err(|e| LineError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }
}

fn parse_proxy_url(proxy_url: &str) -> Result<Url> {
    Url::parse(proxy_url)
        .map_err(|e| LineError::Config(format!("Invalid proxy URL '{}': {}", proxy_url, e)))
}

// =============================================================================
// LINE API Client
// =============================================================================

/// LINE bot API client
///
/// Cheap to share behind an `Arc`: credentials are immutable and the transport
/// is swapped atomically by [`set_proxy`](Self::set_proxy).
pub struct LineClient {
    channel_id: String,
    channel_secret: String,
    mid: String,
    transport: RwLock<Arc<Transport>>,
    debug: AtomicBool,
    logger: Arc<dyn Logger>,
}

impl LineClient {
    /// Create a client for the default endpoint.
    pub fn new(
        channel_id: impl Into<String>,
        channel_secret: impl Into<String>,
        mid: impl Into<String>,
    ) -> Result<Self> {
        Self::with_transport(channel_id, channel_secret, mid, TransportConfig::default())
    }

    /// Create a client with an explicit transport configuration.
    pub fn with_transport(
        channel_id: impl Into<String>,
        channel_secret: impl Into<String>,
        mid: impl Into<String>,
        transport: TransportConfig,
    ) -> Result<Self> {
        Ok(Self {
            channel_id: channel_id.into(),
            channel_secret: channel_secret.into(),
            mid: mid.into(),
            transport: RwLock::new(Arc::new(Transport::build(transport)?)),
            debug: AtomicBool::new(false),
            logger: Arc::new(TracingLogger),
        })
    }

    /// Replace the log sink.
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Log raw webhook bodies when enabled.
    pub fn set_debug(&self, enabled: bool) {
        self.debug.store(enabled, Ordering::Relaxed);
    }

    pub fn is_debug(&self) -> bool {
        self.debug.load(Ordering::Relaxed)
    }

    /// Route all following requests through `proxy_url`.
    ///
    /// On error the current transport is left untouched.
    pub fn set_proxy(&self, proxy_url: &str) -> Result<()> {
        let url = parse_proxy_url(proxy_url)?;
        self.replace_proxy(Some(url))
    }

    /// Go back to direct connections.
    pub fn clear_proxy(&self) -> Result<()> {
        self.replace_proxy(None)
    }

    /// Proxy currently in use
    pub fn proxy(&self) -> Option<Url> {
        self.transport.read().config.proxy.clone()
    }

    fn replace_proxy(&self, proxy: Option<Url>) -> Result<()> {
        let config = TransportConfig {
            proxy,
            ..self.transport.read().config.clone()
        };
        let transport = Transport::build(config)?;

        debug!("Proxy updated: {:?}", transport.config.proxy.as_ref().map(Url::as_str));
        *self.transport.write() = Arc::new(transport);
        Ok(())
    }

    /// Decode a webhook callback body.
    pub fn decode_message<R: Read>(&self, mut body: R) -> Result<ReceivedMessage> {
        let mut buf = Vec::new();
        body.read_to_end(&mut buf)?;
        self.decode_bytes(&buf)
    }

    /// Decode a webhook callback body already held in memory.
    pub fn decode_bytes(&self, body: &[u8]) -> Result<ReceivedMessage> {
        if self.is_debug() {
            self.logger.log_line(&format!(
                "ReceivedMessage Body: {}",
                String::from_utf8_lossy(body)
            ));
        }

        let message: ReceivedMessage = serde_json::from_slice(body).map_err(LineError::Decode)?;
        debug!("Decoded webhook batch with {} events", message.len());
        Ok(message)
    }

    /// Send a text message to the given recipients.
    ///
    /// Success means the API accepted the request. Recipients it rejected are
    /// listed in [`Response::failed`].
    pub async fn send_text<I, S>(&self, to: I, text: &str) -> Result<Response>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let message = SendingMessage::text(to.into_iter().map(Into::into).collect(), text);
        let body = serde_json::to_vec(&message).map_err(LineError::Encode)?;

        if body.len() > MAX_REQUEST_SIZE {
            warn!(
                "Refusing to send {} byte request (limit {})",
                body.len(),
                MAX_REQUEST_SIZE
            );
            return Err(LineError::PayloadTooLarge {
                size: body.len(),
                limit: MAX_REQUEST_SIZE,
            });
        }

        // Take the transport out of the lock before awaiting.
        let transport = self.transport.read().clone();
        let timeout = transport.config.timeout;
        let url = transport.config.events_url();

        debug!(
            "Sending text message to {} recipients: {} bytes",
            message.to.len(),
            body.len()
        );

        let response = transport
            .http_client
            .post(&url)
            .headers(self.auth_headers()?)
            .body(body)
            .send()
            .await
            .map_err(|e| LineError::from_transport(e, timeout))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| LineError::from_transport(e, timeout))?;

        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes).into_owned();
            warn!("LINE API returned {}: {}", status, body);
            return Err(LineError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let result: Response = serde_json::from_slice(&bytes).map_err(LineError::Decode)?;
        self.logger.log_line(&format!("Response: {:?}", result));

        if result.has_failures() {
            warn!(
                "Message {} not delivered to {} recipients",
                result.message_id,
                result.failed.len()
            );
        }

        Ok(result)
    }

    fn auth_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        headers.insert(HEADER_CHANNEL_ID, header_value(&self.channel_id)?);
        headers.insert(HEADER_CHANNEL_SECRET, header_value(&self.channel_secret)?);
        headers.insert(HEADER_TRUSTED_USER, header_value(&self.mid)?);
        Ok(headers)
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| LineError::Config(format!("Invalid credential header value: {}", e)))
}

impl std::fmt::Debug for LineClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineClient")
            .field("channel_id", &self.channel_id)
            .field("mid", &self.mid)
            .field("transport", &self.transport.read().config)
            .field("debug", &self.is_debug())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================
