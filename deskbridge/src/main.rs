//! Entry point for the deskbridge UI process: connect to the host bridge,
//! stream metrics snapshots, and optionally run a failure simulation.

use std::env;
use std::time::Duration;

use serde_json::json;
use tracing_subscriber::EnvFilter;

use deskbridge::bridge::BridgeClient;
use deskbridge::cli::{self, Simulation};
use deskbridge::simulate;
use deskbridge_proto::channels;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    // Reuse the same parsing logic for testability
    let parsed = match cli::parse_args(env::args()) {
        Ok(v) => v,
        Err(msg) => {
            eprintln!("{msg}");
            return Ok(());
        }
    };

    let url = parsed
        .url
        .or_else(|| env::var("DESKBRIDGE_URL").ok())
        .unwrap_or_else(|| cli::DEFAULT_URL.to_string());

    let mut client = BridgeClient::connect(&url).await?;
    let info = client.get_app_info().await?;
    println!("host {} ({} {})", info.version, info.platform, info.arch);
    client
        .log_info("ui-connected", Some(json!({ "url": url })))
        .await?;

    if parsed.open_logs {
        client.send(channels::COMMAND_OPEN_LOGS_FOLDER, None).await?;
    }

    match parsed.simulate {
        Some(Simulation::Cpu) => {
            client.send(channels::COMMAND_SIMULATE_CPU_WORK, None).await?;
            let iterations = simulate::cpu_spin(Duration::from_secs(2));
            client
                .log_info("cpu-work-finished", Some(json!({ "iterations": iterations })))
                .await?;
        }
        Some(Simulation::Leak) => {
            client
                .send(
                    channels::COMMAND_SIMULATE_MEMORY_LEAK,
                    Some(json!({ "start": true })),
                )
                .await?;
            client
                .log_warn("memory-leak-started", Some(json!({ "chunk_bytes": 1 << 20 })))
                .await?;
            let bytes = simulate::leak_growth(1 << 20, 64);
            client
                .send(
                    channels::COMMAND_SIMULATE_MEMORY_LEAK,
                    Some(json!({ "start": false })),
                )
                .await?;
            client
                .log_info("memory-leak-finished", Some(json!({ "bytes": bytes })))
                .await?;
        }
        Some(Simulation::Error) => {
            client.send(channels::COMMAND_TRIGGER_ERROR, None).await?;
            if let Err(err) = simulate::failing_operation() {
                // Caught at the boundary: logged, never fatal.
                client
                    .log_error("ui-error", Some(json!({ "error": err.to_string() })))
                    .await?;
                eprintln!("simulated error handled: {err}");
            }
        }
        None => {}
    }

    if parsed.samples > 0 {
        client.metrics_on().await?;
        for _ in 0..parsed.samples {
            let m = client.next_metrics().await?;
            println!(
                "cpu {:5.1}%  wakeups/s {:>4}  rss {:>9}  private {:>9}  shared {:>9}",
                m.cpu.percent,
                m.cpu.idle_wakeups_per_second,
                human(m.memory.resident_bytes),
                human(m.memory.private_bytes),
                human(m.memory.shared_bytes),
            );
        }
        client.metrics_off().await?;
    }

    client.log_debug("ui-disconnecting", None).await?;
    Ok(())
}

fn human(b: u64) -> String {
    const K: f64 = 1024.0;
    let b = b as f64;
    if b < K {
        return format!("{b:.0}B");
    }
    let kb = b / K;
    if kb < K {
        return format!("{kb:.1}KB");
    }
    let mb = kb / K;
    if mb < K {
        return format!("{mb:.1}MB");
    }
    let gb = mb / K;
    format!("{gb:.1}GB")
}
