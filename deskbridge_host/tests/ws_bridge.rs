//! End-to-end bridge test: a real axum server on an ephemeral port and a
//! tungstenite client exercising the channel set over the wire.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use deskbridge_host::logger::Logger;
use deskbridge_host::sampler::MetricsSampler;
use deskbridge_host::state::AppState;
use deskbridge_host::ws::ws_handler;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio_tungstenite::tungstenite::Message;

async fn spawn_host(logs_dir: &std::path::Path, auth_token: Option<String>) -> (SocketAddr, AppState) {
    let logger = Logger::open(logs_dir).expect("open logger");
    let sampler = Arc::new(MetricsSampler::new(logger.clone(), Duration::from_millis(50)));
    let state = AppState {
        logger,
        sampler,
        auth_token,
    };

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .with_state(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, state)
}

async fn recv_frame(
    ws: &mut (impl StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin),
) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("frame within timeout")
            .expect("stream open")
            .expect("frame");
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).expect("valid frame JSON");
        }
    }
}

#[tokio::test]
async fn request_response_and_metrics_push_over_the_wire() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, state) = spawn_host(dir.path(), None).await;

    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("connect");

    // app:get-info round trip
    ws.send(Message::Text(
        json!({ "id": 1, "channel": "app:get-info" }).to_string(),
    ))
    .await
    .unwrap();
    let frame = recv_frame(&mut ws).await;
    assert_eq!(frame["kind"], "response");
    assert_eq!(frame["id"], 1);
    assert_eq!(frame["payload"]["platform"], std::env::consts::OS);
    assert_eq!(frame["payload"]["arch"], std::env::consts::ARCH);

    // metrics:on acks, then pushes arrive
    ws.send(Message::Text(
        json!({ "id": 2, "channel": "metrics:on" }).to_string(),
    ))
    .await
    .unwrap();
    let ack = recv_frame(&mut ws).await;
    assert_eq!(ack["kind"], "response");
    assert_eq!(ack["id"], 2);

    let push = recv_frame(&mut ws).await;
    assert_eq!(push["kind"], "push");
    assert_eq!(push["event"], "metrics-update");
    assert!(push["payload"]["memory"]["residentBytes"].as_u64().unwrap() > 0);
    assert!(push["payload"]["cpu"]["percent"].as_f64().is_some());

    // metrics:off stops the stream; drain in-flight pushes until the ack
    ws.send(Message::Text(
        json!({ "id": 3, "channel": "metrics:off" }).to_string(),
    ))
    .await
    .unwrap();
    loop {
        let frame = recv_frame(&mut ws).await;
        if frame["kind"] == "response" {
            assert_eq!(frame["id"], 3);
            break;
        }
    }
    assert!(!state.sampler.is_running());

    // one-way traffic: a UI log line and a command, then verify the file
    ws.send(Message::Text(
        json!({
            "channel": "log:write",
            "payload": { "level": "info", "event": "e2e-check", "payload": { "n": 1 } }
        })
        .to_string(),
    ))
    .await
    .unwrap();
    ws.send(Message::Text(
        json!({ "channel": "command:trigger-error" }).to_string(),
    ))
    .await
    .unwrap();

    // A malformed frame is dropped without closing the connection.
    ws.send(Message::Text("not json".into())).await.unwrap();
    ws.send(Message::Text(
        json!({ "id": 4, "channel": "app:get-info" }).to_string(),
    ))
    .await
    .unwrap();
    let frame = recv_frame(&mut ws).await;
    assert_eq!(frame["id"], 4, "connection survived the malformed frame");

    ws.close(None).await.unwrap();

    // Flush and inspect the day file.
    tokio::time::sleep(Duration::from_millis(50)).await;
    state.logger.shutdown().await;
    let date = chrono::Utc::now().format("%Y-%m-%d");
    let text = std::fs::read_to_string(dir.path().join(format!("app-{date}.log"))).unwrap();
    assert!(text.contains("\"event\":\"e2e-check\""), "{text}");
    assert!(text.contains("\"scope\":\"ui\""), "{text}");
    assert!(text.contains("\"event\":\"command-trigger-error\""), "{text}");
    assert!(text.contains("\"event\":\"invalid-request\""), "{text}");
}

#[tokio::test]
async fn unclean_disconnect_releases_the_sampler() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, state) = spawn_host(dir.path(), None).await;

    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("connect");
    ws.send(Message::Text(
        json!({ "id": 1, "channel": "metrics:on" }).to_string(),
    ))
    .await
    .unwrap();
    let ack = recv_frame(&mut ws).await;
    assert_eq!(ack["id"], 1);
    assert!(state.sampler.is_running());

    // Drop the socket without metrics:off or a close handshake.
    drop(ws);

    // The host notices the dead connection and stops the shared sampler
    // rather than ticking forever with zero subscribers.
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while state.sampler.is_running() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "sampler still running with no active subscribers"
        );
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}

#[tokio::test]
async fn auth_token_gates_the_upgrade() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, _state) = spawn_host(dir.path(), Some("s3cret".into())).await;

    // No token: handshake rejected.
    let err = tokio_tungstenite::connect_async(format!("ws://{addr}/ws")).await;
    assert!(err.is_err(), "upgrade without token should fail");

    // Wrong token: rejected.
    let err = tokio_tungstenite::connect_async(format!("ws://{addr}/ws?token=nope")).await;
    assert!(err.is_err());

    // Right token: works end to end.
    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws?token=s3cret"))
        .await
        .expect("authorized connect");
    ws.send(Message::Text(
        json!({ "id": 1, "channel": "app:get-info" }).to_string(),
    ))
    .await
    .unwrap();
    let frame = recv_frame(&mut ws).await;
    assert_eq!(frame["id"], 1);
}
