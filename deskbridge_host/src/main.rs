//! Entry point for the deskbridge host process: bind the bridge server,
//! construct the log writer and sampler once, and tear down cleanly.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{routing::get, Router};
use serde_json::json;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use deskbridge_host::config;
use deskbridge_host::logger::Logger;
use deskbridge_host::sampler::{MetricsSampler, SAMPLE_PERIOD};
use deskbridge_host::state::AppState;
use deskbridge_host::ws::ws_handler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Unexpected faults are recorded, not fatal; recoverable paths keep going.
    std::panic::set_hook(Box::new(|info| {
        error!("uncaught panic: {info}");
    }));

    let port = config::resolve_port(std::env::args());
    let logs_dir = config::logs_dir();
    let logger = Logger::open(&logs_dir)?;
    let sampler = Arc::new(MetricsSampler::new(logger.clone(), SAMPLE_PERIOD));

    let state = AppState {
        logger: logger.clone(),
        sampler: sampler.clone(),
        auth_token: config::auth_token(),
    };

    let app = Router::new().route("/ws", get(ws_handler)).with_state(state);
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, logs = %logs_dir.display(), "deskbridge host listening");
    logger.info("host-started", Some(json!({ "port": port })));

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    sampler.stop();
    logger.info("host-stopping", None);
    logger.shutdown().await;
    Ok(())
}
