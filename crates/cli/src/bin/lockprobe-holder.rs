//! lockprobe-holder - conflicting lock holder spawned by `lockprobe`
//!
//! Takes an exclusive flock on `<path>`, prints `LOCK_ACQUIRED`, and keeps the
//! lock until `--hold-ms` elapses or stdin reaches EOF.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncReadExt;

use lockprobe_cli::logging::{init_logging, QUIET_LOG_FILTER};
use lockprobe_core::application::constants::DEFAULT_HOLD_DURATION;
use lockprobe_infra_system::{hold_exclusive, NixLockBackend};

#[derive(Parser)]
#[command(name = "lockprobe-holder")]
#[command(about = "Hold an exclusive flock on a file for lockprobe's conflict test", long_about = None)]
#[command(version)]
struct Args {
    /// File to lock (created if absent)
    path: PathBuf,

    /// Release after this many milliseconds
    #[arg(long)]
    hold_ms: Option<u64>,
}

/// Resolves once stdin is closed by the parent
async fn stdin_closed() {
    let mut sink = Vec::new();
    let _ = tokio::io::stdin().read_to_end(&mut sink).await;
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(QUIET_LOG_FILTER)?;

    let hold = args
        .hold_ms
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_HOLD_DURATION);

    let mut stdout = std::io::stdout();
    let outcome = hold_exclusive(
        &NixLockBackend::new(),
        &args.path,
        hold,
        &mut stdout,
        stdin_closed(),
    )
    .await
    .context("Failed to report lock state")?;

    std::process::exit(outcome.exit_code());
}
