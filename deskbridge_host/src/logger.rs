//! Batched application log writer.
//!
//! Entries accumulate in a queue owned by a single writer task and are
//! flushed to a per-day file when 10 entries are pending or 100ms after the
//! first unflushed entry, whichever fires first. A failed flush drops the
//! batch after echoing each line to stderr; logging never blocks or crashes
//! the host.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use deskbridge_proto::{LogEntry, LogLevel, LogScope};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Duration, Instant};
use tracing::error;

pub const FLUSH_THRESHOLD: usize = 10;
pub const FLUSH_DEBOUNCE: Duration = Duration::from_millis(100);

/// Destination for serialized batches. The production sink appends to the
/// day file; tests substitute recording or failing sinks.
pub trait LogSink: Send + 'static {
    /// Append one batch (newline-terminated JSON lines) in a single call.
    fn append(&mut self, batch: &str) -> io::Result<()>;
}

pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: PathBuf) -> FileSink {
        FileSink { path }
    }
}

impl LogSink for FileSink {
    fn append(&mut self, batch: &str) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(batch.as_bytes())
    }
}

enum WriterMsg {
    Entry(LogEntry),
    Shutdown(oneshot::Sender<()>),
}

/// Cheap clonable handle to the writer task. Enqueueing never blocks and
/// never fails the caller; entries sent after shutdown are discarded.
#[derive(Clone)]
pub struct Logger {
    tx: mpsc::UnboundedSender<WriterMsg>,
    logs_dir: PathBuf,
}

impl Logger {
    /// Open the writer against `<logs_dir>/app-<YYYY-MM-DD>.log`. The date is
    /// fixed here and not re-evaluated at midnight: a process running across
    /// a day boundary keeps writing to its original file.
    pub fn open(logs_dir: &Path) -> io::Result<Logger> {
        fs::create_dir_all(logs_dir)?;
        let date = Utc::now().format("%Y-%m-%d");
        let path = logs_dir.join(format!("app-{date}.log"));
        Ok(Logger::with_sink(FileSink::new(path), logs_dir.to_path_buf()))
    }

    /// Start the writer task against an arbitrary sink. Must be called from
    /// within a tokio runtime.
    pub fn with_sink<S: LogSink>(sink: S, logs_dir: PathBuf) -> Logger {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_writer(rx, Box::new(sink)));
        Logger { tx, logs_dir }
    }

    pub fn logs_directory(&self) -> &Path {
        &self.logs_dir
    }

    /// Enqueue a pre-built entry as-is (the timestamp is the caller's).
    pub fn write_entry(&self, entry: LogEntry) {
        let _ = self.tx.send(WriterMsg::Entry(entry));
    }

    /// Enqueue an entry stamped with the current time.
    pub fn write(
        &self,
        level: LogLevel,
        scope: LogScope,
        event: impl Into<String>,
        payload: Option<Value>,
    ) {
        self.write_entry(LogEntry {
            timestamp: Utc::now().timestamp_millis(),
            level,
            scope,
            event: event.into(),
            payload,
        });
    }

    pub fn debug(&self, event: impl Into<String>, payload: Option<Value>) {
        self.write(LogLevel::Debug, LogScope::Host, event, payload);
    }

    pub fn info(&self, event: impl Into<String>, payload: Option<Value>) {
        self.write(LogLevel::Info, LogScope::Host, event, payload);
    }

    pub fn warn(&self, event: impl Into<String>, payload: Option<Value>) {
        self.write(LogLevel::Warn, LogScope::Host, event, payload);
    }

    pub fn error(&self, event: impl Into<String>, payload: Option<Value>) {
        self.write(LogLevel::Error, LogScope::Host, event, payload);
    }

    /// Cancel any pending debounce and force a final flush, then wait for the
    /// writer to acknowledge. Meant for process teardown.
    pub async fn shutdown(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(WriterMsg::Shutdown(ack)).is_ok() {
            let _ = done.await;
        }
    }
}

async fn run_writer(mut rx: mpsc::UnboundedReceiver<WriterMsg>, mut sink: Box<dyn LogSink>) {
    let mut queue: Vec<LogEntry> = Vec::new();
    // Armed when the queue goes empty -> non-empty; disarmed by any flush.
    let mut deadline: Option<Instant> = None;

    loop {
        // Capture the deadline by value so the arm bodies can re-arm it.
        let debounce = async move {
            match deadline {
                Some(at) => sleep_until(at).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            msg = rx.recv() => match msg {
                Some(WriterMsg::Entry(entry)) => {
                    if queue.is_empty() {
                        deadline = Some(Instant::now() + FLUSH_DEBOUNCE);
                    }
                    queue.push(entry);
                    if queue.len() >= FLUSH_THRESHOLD {
                        flush(&mut queue, sink.as_mut());
                        deadline = None;
                    }
                }
                Some(WriterMsg::Shutdown(ack)) => {
                    flush(&mut queue, sink.as_mut());
                    let _ = ack.send(());
                    break;
                }
                None => {
                    // All handles dropped: final flush, same as shutdown.
                    flush(&mut queue, sink.as_mut());
                    break;
                }
            },
            _ = debounce => {
                flush(&mut queue, sink.as_mut());
                deadline = None;
            }
        }
    }
}

fn flush(queue: &mut Vec<LogEntry>, sink: &mut dyn LogSink) {
    if queue.is_empty() {
        return;
    }
    let entries = std::mem::take(queue);

    let mut batch = String::new();
    for entry in &entries {
        match serde_json::to_string(entry) {
            Ok(line) => {
                batch.push_str(&line);
                batch.push('\n');
            }
            Err(err) => error!(%err, event = entry.event.as_str(), "unserializable log entry"),
        }
    }
    if batch.is_empty() {
        return;
    }

    if let Err(err) = sink.append(&batch) {
        // The batch is not re-queued. Echo the lines to stderr so they stay
        // visible somewhere, then drop them; the writer keeps running.
        error!(%err, dropped = entries.len(), "log flush failed");
        for line in batch.lines() {
            eprintln!("{line}");
        }
    }
}
