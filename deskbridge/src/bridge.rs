//! Typed WebSocket client for the host bridge.
//!
//! One request is in flight at a time (the caller awaits); pushes that
//! arrive while a response is pending are buffered for `next_metrics`.

use std::collections::VecDeque;

use anyhow::{anyhow, Context, Result};
use deskbridge_proto::{channels, AppInfo, HostFrame, LogLevel, ProcessMetrics, RequestFrame};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct BridgeClient {
    ws: WsStream,
    next_id: u64,
    pushes: VecDeque<(String, Value)>,
}

impl BridgeClient {
    pub async fn connect(url: &str) -> Result<BridgeClient> {
        let (ws, _) = connect_async(url)
            .await
            .with_context(|| format!("connect to {url}"))?;
        Ok(BridgeClient {
            ws,
            next_id: 1,
            pushes: VecDeque::new(),
        })
    }

    /// Issue a request and await its response payload.
    pub async fn request(&mut self, channel: &str, payload: Option<Value>) -> Result<Value> {
        let id = self.next_id;
        self.next_id += 1;
        let frame = RequestFrame {
            id: Some(id),
            channel: channel.to_string(),
            payload,
        };
        self.ws
            .send(Message::Text(serde_json::to_string(&frame)?))
            .await?;

        loop {
            match self.next_frame().await? {
                HostFrame::Response { id: got, payload } if got == id => return Ok(payload),
                // Stale response to an abandoned request; ignore.
                HostFrame::Response { .. } => {}
                HostFrame::Push { event, payload } => self.pushes.push_back((event, payload)),
            }
        }
    }

    /// Fire-and-forget: no id, the host never replies.
    pub async fn send(&mut self, channel: &str, payload: Option<Value>) -> Result<()> {
        let frame = RequestFrame {
            id: None,
            channel: channel.to_string(),
            payload,
        };
        self.ws
            .send(Message::Text(serde_json::to_string(&frame)?))
            .await?;
        Ok(())
    }

    pub async fn get_app_info(&mut self) -> Result<AppInfo> {
        let payload = self.request(channels::APP_GET_INFO, None).await?;
        Ok(serde_json::from_value(payload)?)
    }

    pub async fn metrics_on(&mut self) -> Result<()> {
        self.request(channels::METRICS_ON, None).await.map(|_| ())
    }

    pub async fn metrics_off(&mut self) -> Result<()> {
        self.request(channels::METRICS_OFF, None).await.map(|_| ())
    }

    /// Await the next `metrics-update` push, serving buffered ones first.
    pub async fn next_metrics(&mut self) -> Result<ProcessMetrics> {
        loop {
            if let Some((event, payload)) = self.pushes.pop_front() {
                if event == channels::METRICS_UPDATE {
                    return Ok(serde_json::from_value(payload)?);
                }
                continue;
            }
            if let HostFrame::Push { event, payload } = self.next_frame().await? {
                if event == channels::METRICS_UPDATE {
                    return Ok(serde_json::from_value(payload)?);
                }
            }
        }
    }

    /// Forward a UI log entry over `log:write`. The host stamps the
    /// timestamp and the `ui` scope; this side only names the event.
    pub async fn write_log(
        &mut self,
        level: LogLevel,
        event: &str,
        payload: Option<Value>,
    ) -> Result<()> {
        let mut body = json!({ "level": level, "event": event });
        if let Some(p) = payload {
            body["payload"] = p;
        }
        self.send(channels::LOG_WRITE, Some(body)).await
    }

    pub async fn log_debug(&mut self, event: &str, payload: Option<Value>) -> Result<()> {
        self.write_log(LogLevel::Debug, event, payload).await
    }

    pub async fn log_info(&mut self, event: &str, payload: Option<Value>) -> Result<()> {
        self.write_log(LogLevel::Info, event, payload).await
    }

    pub async fn log_warn(&mut self, event: &str, payload: Option<Value>) -> Result<()> {
        self.write_log(LogLevel::Warn, event, payload).await
    }

    pub async fn log_error(&mut self, event: &str, payload: Option<Value>) -> Result<()> {
        self.write_log(LogLevel::Error, event, payload).await
    }

    async fn next_frame(&mut self) -> Result<HostFrame> {
        loop {
            match self.ws.next().await {
                Some(Ok(Message::Text(text))) => {
                    return serde_json::from_str(&text).context("decode host frame")
                }
                Some(Ok(Message::Close(_))) | None => {
                    return Err(anyhow!("bridge connection closed"))
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => return Err(err.into()),
            }
        }
    }
}
