//! lockprobe - check whether a filesystem implements advisory file locking
//!
//! Runs a flock self-test, a cross-process conflict test and an fcntl record
//! lock test inside the target directory, then prints a composite verdict.

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use lockprobe_cli::config::default_holder_bin;
use lockprobe_cli::logging::{init_logging, PROBE_LOG_FILTER};
use lockprobe_cli::output::{render_json, render_text, OutputFormat};
use lockprobe_core::application::{LockProber, ProbeConfig};
use lockprobe_core::port::id_provider::UuidProvider;
use lockprobe_core::port::time_provider::SystemTimeProvider;
use lockprobe_infra_system::{MountTableInspector, NixLockBackend, ProcessConflictHolder};

#[derive(Parser)]
#[command(name = "lockprobe")]
#[command(about = "Probe a directory's filesystem for real advisory file locking", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory to probe (created if it does not exist)
    directory: PathBuf,

    /// Report format
    #[arg(long, env = "LOCKPROBE_FORMAT", value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// How long the conflicting process holds its lock at most (ms)
    #[arg(
        long,
        env = "LOCKPROBE_HOLD_MS",
        default_value = "3000",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    hold_ms: u64,

    /// Max wait for the conflicting process to report its lock (ms)
    #[arg(
        long,
        env = "LOCKPROBE_HANDSHAKE_TIMEOUT_MS",
        default_value = "10000",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    handshake_timeout_ms: u64,

    /// Path to the lockprobe-holder helper (default: next to this binary)
    #[arg(long, env = "LOCKPROBE_HOLDER_BIN")]
    holder_bin: Option<PathBuf>,
}

fn parse_args() -> Cli {
    match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            let _ = e.print();
            eprintln!("Example: lockprobe /mnt/s3-bucket/test-dir");
            std::process::exit(1);
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = parse_args();
    init_logging(PROBE_LOG_FILTER)?;

    // An unresolvable helper surfaces as a conflict-phase spawn error
    let holder_bin = cli.holder_bin.unwrap_or_else(default_holder_bin);
    info!(holder_bin = %holder_bin.display(), "Using holder helper");

    let prober = LockProber::new(
        Arc::new(NixLockBackend::new()),
        Arc::new(ProcessConflictHolder::new(
            holder_bin,
            Duration::from_millis(cli.handshake_timeout_ms),
        )),
        Arc::new(MountTableInspector::default()),
        Arc::new(SystemTimeProvider),
        Arc::new(UuidProvider),
        ProbeConfig {
            hold_duration: Duration::from_millis(cli.hold_ms),
        },
    );

    let report = prober
        .probe(&cli.directory)
        .await
        .with_context(|| format!("Failed to probe {}", cli.directory.display()))?;

    match cli.format {
        OutputFormat::Text => println!("{}", render_text(&report)),
        OutputFormat::Json => println!("{}", render_json(&report)?),
    }

    Ok(())
}
