//! WebSocket upgrade and per-connection loop: dispatch incoming frames and
//! forward metrics pushes while this connection is subscribed.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use deskbridge_proto::{channels, HostFrame, RequestFrame};
use futures_util::stream::StreamExt;
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::dispatch::handle_frame;
use crate::state::AppState;

use std::collections::HashMap;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(q): Query<HashMap<String, String>>,
) -> Response {
    if let Some(expected) = state.auth_token.as_ref() {
        match q.get("token") {
            Some(t) if t == expected => {}
            _ => return StatusCode::UNAUTHORIZED.into_response(),
        }
    }
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let mut metrics_rx = state.sampler.subscribe();
    let mut subscribed = false;

    loop {
        tokio::select! {
            msg = socket.next() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        let frame = match serde_json::from_str::<RequestFrame>(&text) {
                            Ok(frame) => frame,
                            Err(err) => {
                                warn!(%err, "dropping undecodable frame");
                                state.logger.warn(
                                    "invalid-request",
                                    Some(json!({ "error": err.to_string() })),
                                );
                                continue;
                            }
                        };
                        if let Some(reply) = handle_frame(&state, frame, &mut subscribed) {
                            if let Ok(text) = serde_json::to_string(&reply) {
                                let _ = socket.send(Message::Text(text)).await;
                            }
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            snapshot = metrics_rx.recv() => {
                match snapshot {
                    Ok(snapshot) if subscribed => {
                        let push = HostFrame::Push {
                            event: channels::METRICS_UPDATE.to_string(),
                            payload: serde_json::to_value(&snapshot).unwrap_or_default(),
                        };
                        if let Ok(text) = serde_json::to_string(&push) {
                            let _ = socket.send(Message::Text(text)).await;
                        }
                    }
                    // Not subscribed on this connection: drop the snapshot.
                    Ok(_) => {}
                    // Lag only skips stale snapshots; only the latest matters.
                    Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    // A connection that drops while subscribed (close frame, crash, network
    // loss) must not leave the shared sampler ticking for nobody; there is
    // one UI window, so its disconnect releases the subscription.
    if subscribed {
        state.sampler.stop();
    }
    debug!("ui connection closed");
}
