//! Echo bot webhook HTTP handlers
//!
//! Decodes each LINE callback and sends every event's text back to its sender.

use axum::{
    Router,
    body::{Body, Bytes},
    extract::State,
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::client::LineClient;

/// Webhook server state
#[derive(Clone)]
pub struct WebhookState {
    pub client: Arc<LineClient>,
}

/// Build the webhook router
pub fn router(client: Arc<LineClient>) -> Router {
    Router::new()
        .route("/callback", post(handle_callback))
        .route("/health", get(health_check))
        .layer(middleware::from_fn(log_request))
        .with_state(WebhookState { client })
}

/// Run the webhook HTTP server
pub async fn run_server(addr: SocketAddr, client: Arc<LineClient>) -> anyhow::Result<()> {
    let app = router(client);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Middleware to log all incoming HTTP requests
async fn log_request(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();

    info!("HTTP {} {}", method, uri.path());

    let response = next.run(req).await;

    debug!("Response status: {}", response.status());

    response
}

/// Handle a callback (POST request from LINE)
async fn handle_callback(
    State(state): State<WebhookState>,
    body: Bytes,
) -> Result<&'static str, StatusCode> {
    debug!("Request body length: {} bytes", body.len());

    let message = match state.client.decode_bytes(&body) {
        Ok(message) => message,
        Err(e) => {
            error!("Failed to decode callback body: {}", e);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    info!("Received {} events", message.len());

    for event in message {
        let sender = event.sender();
        if sender.is_empty() {
            warn!("Skipping event {} without sender", event.id);
            continue;
        }

        // Send errors are logged and the remaining events still get a reply.
        match state.client.send_text([sender], &event.content.text).await {
            Ok(response) => {
                debug!("Echoed event {} as message {}", event.id, response.message_id);
            }
            Err(e) => {
                error!("Failed to echo event {} to {}: {}", event.id, sender, e);
            }
        }
    }

    Ok("OK")
}
