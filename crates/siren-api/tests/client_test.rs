#![allow(clippy::unwrap_used)]
// Integration tests for `AlarmClient` and the SSE stream using wiremock.

use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use siren_api::stream::{EventStreamHandle, ReconnectConfig};
use siren_api::{AlarmClient, Error, Severity, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, AlarmClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = AlarmClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

fn alarm_body(id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "originator": "dev-1",
        "originatorName": "GPU Server 0",
        "type": "overheat",
        "severity": "CRITICAL",
        "status": "ACTIVE_UNACK",
        "startTs": 1_756_500_000_000_i64,
        "endTs": 0,
        "details": { "temperature": 97.5 }
    })
}

// ── Terminal action tests ───────────────────────────────────────────

#[tokio::test]
async fn test_acknowledge_success() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/alarms/a1/ack"))
        .respond_with(ResponseTemplate::new(200).set_body_json(alarm_body("a1")))
        .expect(1)
        .mount(&server)
        .await;

    let alarm = client.acknowledge("a1").await.unwrap();
    assert_eq!(alarm.id, "a1");
    assert_eq!(alarm.severity, Severity::Critical);
}

#[tokio::test]
async fn test_acknowledge_server_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/alarms/a1/ack"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let result = client.acknowledge("a1").await;
    assert!(
        matches!(result, Err(Error::Api { status: 500, .. })),
        "expected Api error, got: {result:?}"
    );
    assert!(result.unwrap_err().is_transient());
}

#[tokio::test]
async fn test_clear_alarm_success() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/alarms/a2/clear"))
        .respond_with(ResponseTemplate::new(200).set_body_json(alarm_body("a2")))
        .mount(&server)
        .await;

    let alarm = client.clear_alarm("a2").await.unwrap();
    assert_eq!(alarm.id, "a2");
}

#[tokio::test]
async fn test_clear_alarm_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/alarms/missing/clear"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client.clear_alarm("missing").await.unwrap_err();
    assert!(err.is_not_found());
}

// ── Read endpoint tests ─────────────────────────────────────────────

#[tokio::test]
async fn test_list_active() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/alarms/active"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([alarm_body("a1"), alarm_body("a2")])),
        )
        .mount(&server)
        .await;

    let alarms = client.list_active().await.unwrap();
    assert_eq!(alarms.len(), 2);
    assert_eq!(alarms[0].alarm_type, "overheat");
    assert_eq!(alarms[0].originator_name.as_deref(), Some("GPU Server 0"));
}

#[tokio::test]
async fn test_list_unacknowledged() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/alarms/unacknowledged"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([alarm_body("a1")])))
        .mount(&server)
        .await;

    let alarms = client.list_unacknowledged().await.unwrap();
    assert_eq!(alarms.len(), 1);
}

#[tokio::test]
async fn test_get_alarm() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/alarms/a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(alarm_body("a1")))
        .mount(&server)
        .await;

    let alarm = client.get_alarm("a1").await.unwrap();
    assert_eq!(alarm.details["temperature"], 97.5);
}

#[tokio::test]
async fn test_list_for_device() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/alarms/device/dev-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([alarm_body("a1"), alarm_body("a2")])),
        )
        .mount(&server)
        .await;

    let alarms = client.list_for_device("dev-1", None).await.unwrap();
    assert_eq!(alarms.len(), 2);
}

#[tokio::test]
async fn test_list_for_device_with_status_filter() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/alarms/device/dev-1"))
        .and(query_param("status", "ACTIVE_UNACK"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([alarm_body("a1")])))
        .expect(1)
        .mount(&server)
        .await;

    let alarms = client
        .list_for_device("dev-1", Some("ACTIVE_UNACK"))
        .await
        .unwrap();
    assert_eq!(alarms.len(), 1);
}

#[tokio::test]
async fn test_delete_alarm() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/alarms/a1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client.delete_alarm("a1").await.unwrap();
}

#[tokio::test]
async fn test_delete_alarm_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/api/alarms/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = client.delete_alarm("missing").await;
    assert!(result.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_stats() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/alarms/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total": 10,
            "active": 4,
            "unacknowledged": 3,
            "cleared": 6,
            "bySeverity": { "CRITICAL": 2, "WARNING": 8 }
        })))
        .mount(&server)
        .await;

    let stats = client.stats().await.unwrap();
    assert_eq!(stats.total, 10);
    assert_eq!(stats.unacknowledged, 3);
    assert_eq!(stats.by_severity.get("CRITICAL"), Some(&2));
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/alarms/active"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let result = client.list_active().await;
    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}

// ── SSE stream tests ────────────────────────────────────────────────

fn sse_body(events: &[serde_json::Value]) -> String {
    let mut body = String::from(": connected\n\n");
    for event in events {
        body.push_str(&format!("event: alarm\ndata: {event}\n\n"));
    }
    body
}

#[tokio::test]
async fn test_stream_delivers_alarm_events() {
    let server = MockServer::start().await;

    let event = json!({
        "id": "a1",
        "deviceId": "gpu0",
        "deviceName": "GPU Server 0",
        "type": "overheat",
        "severity": "CRITICAL",
        "action": "created",
        "notificationCount": 1
    });

    Mock::given(method("GET"))
        .and(path("/api/alarms/notifications/stream"))
        .and(header("accept", "text/event-stream"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(sse_body(std::slice::from_ref(&event))),
        )
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/api/alarms/notifications/stream", server.uri())).unwrap();
    let cancel = CancellationToken::new();
    let handle = EventStreamHandle::connect(
        url,
        ReconnectConfig {
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(50),
            max_retries: Some(3),
        },
        cancel.clone(),
        &TransportConfig::default(),
    )
    .unwrap();

    let mut rx = handle.subscribe();
    let received = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for alarm event")
        .unwrap();

    assert_eq!(received.id, "a1");
    assert_eq!(received.device_id.as_deref(), Some("gpu0"));
    handle.shutdown();
}

#[tokio::test]
async fn test_stream_skips_malformed_events_and_continues() {
    let server = MockServer::start().await;

    // First frame is missing severity (malformed), second is valid.
    let body = format!(
        "event: alarm\ndata: {}\n\nevent: alarm\ndata: {}\n\n",
        json!({ "id": "bad", "deviceName": "d", "type": "t", "action": "created" }),
        json!({
            "id": "good",
            "deviceName": "d",
            "type": "t",
            "severity": "MINOR",
            "action": "created"
        }),
    );

    Mock::given(method("GET"))
        .and(path("/stream"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(body),
        )
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/stream", server.uri())).unwrap();
    let cancel = CancellationToken::new();
    let handle = EventStreamHandle::connect(
        url,
        ReconnectConfig {
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(50),
            max_retries: Some(3),
        },
        cancel,
        &TransportConfig::default(),
    )
    .unwrap();

    let mut rx = handle.subscribe();
    let received = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for alarm event")
        .unwrap();

    // The malformed event was dropped; the valid one still arrived.
    assert_eq!(received.id, "good");
    handle.shutdown();
}
