//! BridgeClient against an in-process host: the typed helpers, every log
//! level of the forwarding facade, and push consumption.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use deskbridge::bridge::BridgeClient;
use deskbridge_host::logger::Logger;
use deskbridge_host::sampler::MetricsSampler;
use deskbridge_host::state::AppState;
use deskbridge_host::ws::ws_handler;
use serde_json::{json, Value};

async fn spawn_host(logs_dir: &std::path::Path) -> (SocketAddr, AppState) {
    let logger = Logger::open(logs_dir).expect("open logger");
    let sampler = Arc::new(MetricsSampler::new(logger.clone(), Duration::from_millis(50)));
    let state = AppState {
        logger,
        sampler,
        auth_token: None,
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

#[tokio::test]
async fn client_helpers_round_trip_through_a_real_host() {
    let dir = tempfile::tempdir().unwrap();
    let (addr, state) = spawn_host(dir.path()).await;

    let mut client = BridgeClient::connect(&format!("ws://{addr}/ws"))
        .await
        .expect("connect");

    let info = client.get_app_info().await.expect("app info");
    assert_eq!(info.platform, std::env::consts::OS);
    assert_eq!(info.arch, std::env::consts::ARCH);
    assert!(!info.version.is_empty());

    // All four facade levels forward over log:write.
    client.log_debug("view-mounted", None).await.unwrap();
    client
        .log_info("inbox-opened", Some(json!({ "count": 12 })))
        .await
        .unwrap();
    client.log_warn("slow-render", None).await.unwrap();
    client
        .log_error("recorder-failed", Some(json!({ "code": 7 })))
        .await
        .unwrap();

    // Subscribe, take one snapshot, unsubscribe.
    client.metrics_on().await.expect("metrics:on ack");
    let snapshot = tokio::time::timeout(Duration::from_secs(5), client.next_metrics())
        .await
        .expect("push within timeout")
        .expect("snapshot");
    assert!(snapshot.memory.resident_bytes > 0);
    client.metrics_off().await.expect("metrics:off ack");
    assert!(!state.sampler.is_running());

    // Everything the facade sent is in the day file, stamped ui-side.
    tokio::time::sleep(Duration::from_millis(50)).await;
    state.logger.shutdown().await;
    let date = chrono::Utc::now().format("%Y-%m-%d");
    let text = std::fs::read_to_string(dir.path().join(format!("app-{date}.log"))).unwrap();
    let entries: Vec<Value> = text
        .lines()
        .map(|l| serde_json::from_str(l).expect("valid JSON line"))
        .collect();

    let ui_levels: Vec<(&str, &str)> = entries
        .iter()
        .filter(|e| e["scope"] == "ui")
        .map(|e| (e["level"].as_str().unwrap(), e["event"].as_str().unwrap()))
        .collect();
    assert_eq!(
        ui_levels,
        vec![
            ("debug", "view-mounted"),
            ("info", "inbox-opened"),
            ("warn", "slow-render"),
            ("error", "recorder-failed"),
        ]
    );
}
