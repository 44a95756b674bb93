//! lockprobe-fixture - long-lived locked log writer
//!
//! Keeps a log file open (and flock'ed by default) on the filesystem under
//! test so checkpoint/restore tooling can be exercised against it.
//!
//! # Environment Variables
//!
//! - `LOCKPROBE_FIXTURE_DIR`: output directory (default `output_dir`)
//! - `LOCKPROBE_FIXTURE_MODE`: `hold` (heartbeat) or `write` (default `hold`)
//! - `LOCKPROBE_FIXTURE_LOCK`: hold an exclusive lock (default `true`)
//! - `LOCKPROBE_FIXTURE_DURATION_SECS`: run time (default 86400)
//! - `LOCKPROBE_FIXTURE_INTERVAL_MS`: write interval (default 1000)

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{info, warn};

use lockprobe_cli::config::fixture_config_from_env;
use lockprobe_cli::logging::{init_logging, PROBE_LOG_FILTER};
use lockprobe_core::application::{shutdown_channel, LogFixture, ShutdownSender};
use lockprobe_core::port::time_provider::SystemTimeProvider;
use lockprobe_infra_system::NixLockBackend;

#[derive(Parser)]
#[command(name = "lockprobe-fixture")]
#[command(about = "Hold a locked log file open until SIGINT/SIGTERM", long_about = None)]
#[command(version)]
struct Args {}

/// Trigger shutdown on the first SIGINT or SIGTERM
fn spawn_signal_handler(shutdown_tx: ShutdownSender) -> Result<()> {
    let mut sigterm = signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to install SIGINT handler")?;

    tokio::spawn(async move {
        tokio::select! {
            _ = sigint.recv() => info!("Received SIGINT"),
            _ = sigterm.recv() => info!("Received SIGTERM"),
        }
        shutdown_tx.shutdown();
    });
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let _args = Args::parse();
    init_logging(PROBE_LOG_FILTER)?;

    let config = fixture_config_from_env()?;
    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    spawn_signal_handler(shutdown_tx)?;

    let fixture = LogFixture::new(
        Arc::new(NixLockBackend::new()),
        Arc::new(SystemTimeProvider),
        config,
    );
    println!("Log file: {}", fixture.log_path().display());
    println!("Send SIGINT (Ctrl+C) or SIGTERM to stop");

    let summary = fixture
        .run(shutdown_rx)
        .await
        .with_context(|| format!("Fixture failed on {}", fixture.log_path().display()))?;

    if summary.interrupted {
        warn!(lines = summary.lines_written, "Fixture interrupted");
    }
    println!(
        "Fixture finished: {} lines written, lock {}",
        summary.lines_written,
        if summary.lock_held { "released" } else { "not held" }
    );

    Ok(())
}
