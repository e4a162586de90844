//! Channel dispatch: decode one request frame, perform the host-side effect,
//! and produce a response frame when the channel calls for one.

use deskbridge_proto::{
    channels, AppInfo, ChannelKind, HostFrame, LogScope, Request, RequestFrame,
};
use serde_json::{json, Value};
use tracing::warn;

use crate::state::AppState;

pub fn app_info() -> AppInfo {
    AppInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        platform: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
    }
}

/// Handle one frame; returns the response to send back, if any.
///
/// Malformed frames are dropped after recording a single warning entry — no
/// error response, no closed connection. One-way channels never get a reply
/// even if the sender attached an id. `subscribed` is this connection's push
/// gate, flipped by metrics:on/off alongside the process-wide sampler.
pub fn handle_frame(
    state: &AppState,
    frame: RequestFrame,
    subscribed: &mut bool,
) -> Option<HostFrame> {
    let request = match Request::decode(&frame.channel, frame.payload.as_ref()) {
        Ok(request) => request,
        Err(err) => {
            warn!(channel = frame.channel.as_str(), %err, "dropping malformed request");
            state.logger.warn(
                "invalid-request",
                Some(json!({ "channel": frame.channel, "error": err.to_string() })),
            );
            return None;
        }
    };

    let payload: Value = match request {
        Request::GetAppInfo => serde_json::to_value(app_info()).unwrap_or(Value::Null),
        Request::MetricsOn => {
            state.sampler.start();
            *subscribed = true;
            Value::Null
        }
        Request::MetricsOff => {
            state.sampler.stop();
            *subscribed = false;
            Value::Null
        }
        Request::WriteLog {
            level,
            event,
            payload,
        } => {
            state.logger.write(level, LogScope::Ui, event, payload);
            Value::Null
        }
        Request::SimulateCpuWork => {
            // The spin itself runs in the UI process; just record the request.
            state.logger.info("command-simulate-cpu-work", None);
            Value::Null
        }
        Request::SimulateMemoryLeak { start } => {
            state
                .logger
                .info("command-simulate-memory-leak", Some(json!({ "start": start })));
            Value::Null
        }
        Request::TriggerError => {
            state.logger.info("command-trigger-error", None);
            Value::Null
        }
        Request::OpenLogsFolder => {
            open_logs_folder(state);
            Value::Null
        }
    };

    let wants_response = frame.id.is_some()
        && channels::descriptor(&frame.channel)
            .is_some_and(|d| d.kind == ChannelKind::RequestResponse);
    if !wants_response {
        return None;
    }
    frame.id.map(|id| HostFrame::Response { id, payload })
}

fn open_logs_folder(state: &AppState) {
    let logger = state.logger.clone();
    let path = state.logger.logs_directory().to_path_buf();
    // Launching the file manager blocks; keep it off the connection task.
    tokio::task::spawn_blocking(move || match opener::open(&path) {
        Ok(()) => logger.info(
            "logs-folder-opened",
            Some(json!({ "path": path.display().to_string() })),
        ),
        Err(err) => logger.error(
            "open-logs-folder-error",
            Some(json!({ "error": err.to_string() })),
        ),
    });
}
