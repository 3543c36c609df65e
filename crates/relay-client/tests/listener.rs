//! Event listener behaviour against a mock SSE endpoint.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use relay_client::{
    Event, EventCallback, HandshakeFailurePolicy, ListenerConfig, ListenerState, McpHttp, Toolkit,
};
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SESSION: &str = "s-1";

async fn mount_session(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sessionId": SESSION })))
        .mount(server)
        .await;
}

async fn mount_stream(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/api/sse/{}", SESSION)))
        .respond_with(response)
        .mount(server)
        .await;
}

async fn toolkit_with(server: &MockServer, config: ListenerConfig) -> Toolkit {
    let transport = McpHttp::builder().base_url(server.uri()).build().unwrap();
    let toolkit = Toolkit::new(transport, config);
    toolkit.initialize_session().await.unwrap();
    toolkit
}

async fn stream_requests(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path().starts_with("/api/sse/"))
        .count()
}

async fn wait_for_requests(server: &MockServer, count: usize) -> bool {
    for _ in 0..300 {
        if stream_requests(server).await >= count {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

async fn wait_until(mut cond: impl FnMut() -> bool) -> bool {
    for _ in 0..300 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}

fn slow_reconnect() -> ListenerConfig {
    ListenerConfig::default()
        .with_initial_backoff(Duration::from_secs(30))
        .with_max_backoff(Duration::from_secs(30))
}

#[tokio::test]
async fn test_typed_callback_receives_event_and_malformed_is_skipped() {
    let server = MockServer::start().await;
    mount_session(&server).await;
    let body = concat!(
        "data: {\"type\":\"progress\",\"payload\":{\"pct\":50}}\n\n",
        "data: {not json\n\n",
    );
    mount_stream(
        &server,
        ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"),
    )
    .await;

    let toolkit = toolkit_with(&server, slow_reconnect()).await;

    let received: Arc<Mutex<Vec<Value>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = received.clone();
    toolkit.register_event_callback("progress", move |event: &Event| {
        sink.lock().push(event.payload.clone());
    });

    let general_hits = Arc::new(Mutex::new(0usize));
    let hits = general_hits.clone();
    let general: EventCallback = Arc::new(move |_: &Event| {
        *hits.lock() += 1;
    });
    assert!(toolkit.start_listener(Some(general)).await);

    assert!(wait_until(|| received.lock().len() == 1).await);
    // The malformed event never reaches any callback.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(received.lock().as_slice(), &[json!({ "pct": 50 })]);
    assert_eq!(*general_hits.lock(), 1);

    // The stream ended server-side, so the listener is waiting to reconnect.
    assert!(wait_until(|| toolkit.listener_status().state == ListenerState::Reconnecting).await);
    assert!(toolkit.listener_status().last_event_at.is_some());

    toolkit.stop_listener().await;
    assert_eq!(toolkit.listener_status().state, ListenerState::Stopped);
}

#[tokio::test]
async fn test_reconnects_after_stream_closes() {
    let server = MockServer::start().await;
    mount_session(&server).await;
    mount_stream(
        &server,
        ResponseTemplate::new(200).set_body_raw("", "text/event-stream"),
    )
    .await;

    let config = ListenerConfig::default().with_initial_backoff(Duration::from_millis(20));
    let toolkit = toolkit_with(&server, config).await;

    assert!(toolkit.start_listener(None).await);
    assert!(wait_for_requests(&server, 3).await);

    toolkit.stop_listener().await;
    assert_eq!(toolkit.listener_status().state, ListenerState::Stopped);
}

#[tokio::test]
async fn test_stop_during_backoff_prevents_reconnect() {
    let server = MockServer::start().await;
    mount_session(&server).await;
    mount_stream(
        &server,
        ResponseTemplate::new(200).set_body_raw("", "text/event-stream"),
    )
    .await;

    let toolkit = toolkit_with(&server, slow_reconnect()).await;
    assert!(toolkit.start_listener(None).await);

    assert!(wait_until(|| toolkit.listener_status().state == ListenerState::Reconnecting).await);
    assert_eq!(stream_requests(&server).await, 1);

    toolkit.stop_listener().await;
    assert_eq!(toolkit.listener_status().state, ListenerState::Stopped);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(stream_requests(&server).await, 1);
}

#[tokio::test]
async fn test_rejected_handshake_fails_without_retry() {
    let server = MockServer::start().await;
    mount_session(&server).await;
    mount_stream(&server, ResponseTemplate::new(503)).await;

    let config = ListenerConfig::default().with_initial_backoff(Duration::from_millis(10));
    let toolkit = toolkit_with(&server, config).await;
    assert!(toolkit.start_listener(None).await);

    assert!(wait_until(|| toolkit.listener_status().state == ListenerState::Failed).await);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(stream_requests(&server).await, 1);
}

#[tokio::test]
async fn test_retry_policy_gives_up_after_cap() {
    let server = MockServer::start().await;
    mount_session(&server).await;
    mount_stream(&server, ResponseTemplate::new(503)).await;

    let config = ListenerConfig::default()
        .with_initial_backoff(Duration::from_millis(10))
        .with_max_backoff(Duration::from_millis(20))
        .with_max_consecutive_failures(Some(3))
        .with_handshake_failure(HandshakeFailurePolicy::Retry);
    let toolkit = toolkit_with(&server, config).await;
    assert!(toolkit.start_listener(None).await);

    assert!(wait_until(|| toolkit.listener_status().state == ListenerState::Failed).await);
    assert_eq!(stream_requests(&server).await, 3);
    assert_eq!(toolkit.listener_status().consecutive_failures, 3);
}

#[tokio::test]
async fn test_stop_is_idempotent() {
    let server = MockServer::start().await;
    mount_session(&server).await;
    mount_stream(
        &server,
        ResponseTemplate::new(200).set_body_raw("", "text/event-stream"),
    )
    .await;

    let toolkit = toolkit_with(&server, slow_reconnect()).await;

    toolkit.stop_listener().await;
    assert_eq!(toolkit.listener_status().state, ListenerState::Stopped);

    assert!(toolkit.start_listener(None).await);
    toolkit.stop_listener().await;
    toolkit.stop_listener().await;
    assert_eq!(toolkit.listener_status().state, ListenerState::Stopped);
}

#[tokio::test]
async fn test_restart_replaces_previous_task() {
    let server = MockServer::start().await;
    mount_session(&server).await;
    mount_stream(
        &server,
        ResponseTemplate::new(200).set_body_raw("", "text/event-stream"),
    )
    .await;

    let toolkit = toolkit_with(&server, slow_reconnect()).await;
    assert!(toolkit.start_listener(None).await);
    assert!(wait_for_requests(&server, 1).await);
    assert!(toolkit.start_listener(None).await);
    assert!(wait_for_requests(&server, 2).await);

    // Each start opened exactly one stream; the first task is gone.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(stream_requests(&server).await, 2);

    toolkit.stop_listener().await;
}

#[tokio::test]
async fn test_listener_needs_session() {
    let server = MockServer::start().await;
    let transport = McpHttp::builder().base_url(server.uri()).build().unwrap();
    let toolkit = Toolkit::new(transport, ListenerConfig::default());

    assert!(!toolkit.start_listener(None).await);
    assert_eq!(toolkit.listener_status().state, ListenerState::Stopped);
    assert_eq!(stream_requests(&server).await, 0);
}
