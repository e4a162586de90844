//! Shared metrics sampler: one periodic task process-wide, started by
//! `metrics:on` and stopped by `metrics:off`. Both directions are idempotent.

use std::sync::Mutex;

use deskbridge_proto::ProcessMetrics;
use serde_json::json;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::warn;

use crate::logger::Logger;
use crate::metrics::MetricsCollector;

pub const SAMPLE_PERIOD: Duration = Duration::from_millis(2000);

pub struct MetricsSampler {
    period: Duration,
    tx: broadcast::Sender<ProcessMetrics>,
    task: Mutex<Option<JoinHandle<()>>>,
    logger: Logger,
}

impl MetricsSampler {
    pub fn new(logger: Logger, period: Duration) -> MetricsSampler {
        // Consumers only care about the latest value; a small buffer is fine.
        let (tx, _) = broadcast::channel(8);
        MetricsSampler {
            period,
            tx,
            task: Mutex::new(None),
            logger,
        }
    }

    /// Receiver for snapshot pushes. Valid whether or not the sampler runs;
    /// it simply stays silent while stopped.
    pub fn subscribe(&self) -> broadcast::Receiver<ProcessMetrics> {
        self.tx.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|t| !t.is_finished())
    }

    /// Start the periodic task. A second call while running is a no-op; only
    /// one sampler task ever exists process-wide.
    pub fn start(&self) {
        let mut task = self.task.lock().unwrap();
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            return;
        }

        let tx = self.tx.clone();
        let logger = self.logger.clone();
        let period = self.period;
        *task = Some(tokio::spawn(async move {
            let mut collector = match MetricsCollector::new() {
                Ok(c) => c,
                Err(err) => {
                    warn!(%err, "metrics collector unavailable");
                    logger.error(
                        "metrics-sampling-error",
                        Some(json!({ "error": err.to_string() })),
                    );
                    return;
                }
            };

            let mut ticks = interval(period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                match collector.collect() {
                    Ok(snapshot) => {
                        // No receivers is fine; the snapshot just evaporates.
                        let _ = tx.send(snapshot);
                    }
                    Err(err) => {
                        // Skip this tick; a failed read never stops the sampler.
                        logger.error(
                            "metrics-sampling-error",
                            Some(json!({ "error": err.to_string() })),
                        );
                    }
                }
            }
        }));
    }

    /// Stop the task if running. Idempotent.
    pub fn stop(&self) {
        if let Some(task) = self.task.lock().unwrap().take() {
            task.abort();
        }
    }
}
