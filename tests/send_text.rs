use line_bot_api::{LineClient, LineError, MemoryLogger, TransportConfig};
use serde_json::json;
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> LineClient {
    LineClient::with_transport(
        "1441301333",
        "testsecret",
        "u0a556cffd4da0dd89c94fb36e36e1cdc",
        TransportConfig::new().endpoint(server.uri()),
    )
    .expect("client build")
}

fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind temp port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);
    port
}

#[tokio::test]
async fn test_send_text_posts_envelope_with_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/events"))
        .and(header("content-type", "application/json; charset=UTF-8"))
        .and(header("X-Line-ChannelID", "1441301333"))
        .and(header("X-Line-ChannelSecret", "testsecret"))
        .and(header(
            "X-Line-Trusted-User-With-ACL",
            "u0a556cffd4da0dd89c94fb36e36e1cdc",
        ))
        .and(body_json(json!({
            "to": ["U1", "U2"],
            "toChannel": 1383378250,
            "eventType": "138311608800106203",
            "content": {"contentType": 1, "toType": 1, "text": "hello there"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "failed": [],
            "messageId": "1347940533207",
            "timestamp": 1347940533207i64,
            "version": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let response = client
        .send_text(["U1", "U2"], "hello there")
        .await
        .expect("send succeeds");

    assert_eq!(response.message_id, "1347940533207");
    assert_eq!(response.version, 1);
    assert!(!response.has_failures());
}

#[tokio::test]
async fn test_oversized_payload_makes_no_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"messageId": "m1"})))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client
        .send_text(["U1"], &"x".repeat(8192))
        .await
        .unwrap_err();

    match err {
        LineError::PayloadTooLarge { size, limit } => {
            assert!(size > 8192);
            assert_eq!(limit, 8192);
        }
        other => panic!("expected PayloadTooLarge, got {other:?}"),
    }
}

#[tokio::test]
async fn test_payload_at_limit_is_sent() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"messageId": "m1"})))
        .expect(1)
        .mount(&server)
        .await;

    // Envelope overhead for one recipient "U1" and an ASCII text.
    let overhead = serde_json::to_vec(&line_bot_api::SendingMessage::text(
        vec!["U1".to_string()],
        "",
    ))
    .unwrap()
    .len();
    let text = "y".repeat(8192 - overhead);

    let client = client_for(&server);
    client.send_text(["U1"], &text).await.expect("send succeeds");
}

#[tokio::test]
async fn test_empty_recipients_are_forwarded() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_json(json!({
            "to": [],
            "toChannel": 1383378250,
            "eventType": "138311608800106203",
            "content": {"contentType": 1, "toType": 1, "text": "nobody"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"messageId": "m2"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let recipients: Vec<String> = Vec::new();
    let response = client.send_text(recipients, "nobody").await.unwrap();
    assert_eq!(response.message_id, "m2");
}

#[tokio::test]
async fn test_reported_failures_still_succeed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "failed": ["U2"],
            "messageId": "m3",
            "timestamp": 1.5,
            "version": 1,
            "unexpected": {"extra": true}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let response = client.send_text(["U1", "U2"], "hi").await.unwrap();

    assert!(response.has_failures());
    assert_eq!(response.failed, vec![json!("U2")]);
    assert_eq!(response.timestamp, 1.5);
}

#[tokio::test]
async fn test_response_is_logged_through_client_logger() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"messageId": "m4"})))
        .mount(&server)
        .await;

    let logger = Arc::new(MemoryLogger::new());
    let client = client_for(&server).with_logger(logger.clone());
    client.send_text(["U1"], "hi").await.unwrap();

    assert!(logger.contains("Response:"));
    assert!(logger.contains("m4"));
}

#[tokio::test]
async fn test_unparseable_response_is_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.send_text(["U1"], "hi").await.unwrap_err();
    assert!(matches!(err, LineError::Decode(_)));
}

#[tokio::test]
async fn test_error_status_is_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "statusCode": "401",
            "statusMessage": "Authentication failed."
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    match client.send_text(["U1"], "hi").await.unwrap_err() {
        LineError::Api { status, body } => {
            assert_eq!(status, 401);
            assert!(body.contains("Authentication failed."));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"messageId": "late"}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = LineClient::with_transport(
        "id",
        "secret",
        "mid",
        TransportConfig::new()
            .endpoint(server.uri())
            .timeout(Duration::from_millis(200)),
    )
    .unwrap();

    let err = client.send_text(["U1"], "hi").await.unwrap_err();
    match err {
        LineError::Timeout(limit) => assert_eq!(limit, Duration::from_millis(200)),
        other => panic!("expected Timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let port = free_port();
    let client = LineClient::with_transport(
        "id",
        "secret",
        "mid",
        TransportConfig::new().endpoint(format!("http://127.0.0.1:{}", port)),
    )
    .unwrap();

    let err = client.send_text(["U1"], "hi").await.unwrap_err();
    assert!(matches!(err, LineError::Network(_)), "got {err:?}");
}

#[tokio::test]
async fn test_proxy_is_applied_to_next_send() {
    let proxy = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("X-Line-ChannelID", "id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"messageId": "via-proxy"})))
        .expect(1)
        .mount(&proxy)
        .await;

    // The endpoint host does not resolve; only the proxy can answer.
    let client = LineClient::with_transport(
        "id",
        "secret",
        "mid",
        TransportConfig::new().endpoint("http://line-api.invalid"),
    )
    .unwrap();
    client.set_proxy(&proxy.uri()).expect("valid proxy URL");

    let response = client.send_text(["U1"], "hi").await.unwrap();
    assert_eq!(response.message_id, "via-proxy");
}

#[tokio::test]
async fn test_proxy_settings_do_not_leak_between_clients() {
    let proxy = MockServer::start().await;
    let direct = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"messageId": "proxied"})))
        .expect(1)
        .mount(&proxy)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"messageId": "direct"})))
        .expect(1)
        .mount(&direct)
        .await;

    let proxied = LineClient::with_transport(
        "id",
        "secret",
        "mid",
        TransportConfig::new().endpoint("http://line-api.invalid"),
    )
    .unwrap();
    proxied.set_proxy(&proxy.uri()).unwrap();

    let plain = client_for(&direct);

    assert_eq!(
        proxied.send_text(["U1"], "a").await.unwrap().message_id,
        "proxied"
    );
    assert_eq!(plain.send_text(["U1"], "b").await.unwrap().message_id, "direct");
}

#[tokio::test]
async fn test_invalid_proxy_keeps_previous_transport() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"messageId": "m5"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.set_proxy("not a url\x00").unwrap_err();
    assert!(matches!(err, LineError::Config(_)));
    assert!(client.proxy().is_none());

    client.send_text(["U1"], "still direct").await.unwrap();
}
