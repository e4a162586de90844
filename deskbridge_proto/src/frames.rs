//! Frame envelopes and minimal-shape request decoding.
//!
//! A UI→host frame is `{id?, channel, payload?}`; a present `id` means the
//! caller awaits a response. Host→UI frames are tagged by `kind`: either a
//! `response` correlated by id, or a `push` event.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::channels;
use crate::types::LogLevel;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub channel: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum HostFrame {
    Response { id: u64, payload: Value },
    Push { event: String, payload: Value },
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unknown channel `{0}`")]
    UnknownChannel(String),
    #[error("channel `{channel}` requires field `{field}` ({expected})")]
    BadField {
        channel: &'static str,
        field: &'static str,
        expected: &'static str,
    },
}

/// A decoded, shape-checked request. Decoding enforces only the minimal
/// contract: required fields present with the right primitive type. The log
/// payload stays an opaque `Value` on purpose — it is genuinely free-form.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    GetAppInfo,
    MetricsOn,
    MetricsOff,
    WriteLog {
        level: LogLevel,
        event: String,
        payload: Option<Value>,
    },
    SimulateCpuWork,
    SimulateMemoryLeak {
        start: bool,
    },
    TriggerError,
    OpenLogsFolder,
}

impl Request {
    pub fn decode(channel: &str, payload: Option<&Value>) -> Result<Request, DecodeError> {
        match channel {
            channels::APP_GET_INFO => Ok(Request::GetAppInfo),
            channels::METRICS_ON => Ok(Request::MetricsOn),
            channels::METRICS_OFF => Ok(Request::MetricsOff),
            channels::LOG_WRITE => {
                let level = payload
                    .and_then(|v| v.get("level"))
                    .and_then(Value::as_str)
                    .and_then(LogLevel::parse)
                    .ok_or(DecodeError::BadField {
                        channel: channels::LOG_WRITE,
                        field: "level",
                        expected: "one of debug|info|warn|error",
                    })?;
                let event = payload
                    .and_then(|v| v.get("event"))
                    .and_then(Value::as_str)
                    .ok_or(DecodeError::BadField {
                        channel: channels::LOG_WRITE,
                        field: "event",
                        expected: "string",
                    })?
                    .to_string();
                let payload = payload.and_then(|v| v.get("payload")).cloned();
                Ok(Request::WriteLog {
                    level,
                    event,
                    payload,
                })
            }
            channels::COMMAND_SIMULATE_CPU_WORK => Ok(Request::SimulateCpuWork),
            channels::COMMAND_SIMULATE_MEMORY_LEAK => {
                let start = payload
                    .and_then(|v| v.get("start"))
                    .and_then(Value::as_bool)
                    .ok_or(DecodeError::BadField {
                        channel: channels::COMMAND_SIMULATE_MEMORY_LEAK,
                        field: "start",
                        expected: "boolean",
                    })?;
                Ok(Request::SimulateMemoryLeak { start })
            }
            channels::COMMAND_TRIGGER_ERROR => Ok(Request::TriggerError),
            channels::COMMAND_OPEN_LOGS_FOLDER => Ok(Request::OpenLogsFolder),
            other => Err(DecodeError::UnknownChannel(other.to_string())),
        }
    }
}
