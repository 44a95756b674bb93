// Log-writer / lock-holder fixture
// Keeps a log file open (optionally flock'ed) for a long time to reproduce
// checkpoint/restore failures on the probed filesystem.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::application::constants::{
    DEFAULT_FIXTURE_DIR, DEFAULT_FIXTURE_DURATION, DEFAULT_FIXTURE_HEARTBEAT, DEFAULT_FIXTURE_LOG,
};
use crate::application::ShutdownToken;
use crate::error::Result;
use crate::port::{LockBackend, LockGuard, TimeProvider, WaitMode};

/// What the fixture does while it runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixtureMode {
    /// Hold the file open, logging a heartbeat every `heartbeat`
    Hold { heartbeat: Duration },
    /// Append a log entry every `interval`
    Write { interval: Duration },
}

impl FixtureMode {
    fn period(&self) -> Duration {
        match self {
            FixtureMode::Hold { heartbeat } => *heartbeat,
            FixtureMode::Write { interval } => *interval,
        }
    }
}

/// Fixture configuration
#[derive(Debug, Clone)]
pub struct FixtureConfig {
    pub output_dir: PathBuf,
    pub log_file: String,
    pub mode: FixtureMode,
    /// Take an exclusive flock on the log file for the whole run
    pub hold_lock: bool,
    /// Run time before exiting on its own
    pub duration: Duration,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_FIXTURE_DIR),
            log_file: DEFAULT_FIXTURE_LOG.to_string(),
            mode: FixtureMode::Hold {
                heartbeat: DEFAULT_FIXTURE_HEARTBEAT,
            },
            hold_lock: true,
            duration: DEFAULT_FIXTURE_DURATION,
        }
    }
}

/// How a fixture run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureSummary {
    pub log_path: PathBuf,
    pub lines_written: u64,
    pub lock_held: bool,
    /// Stopped by a shutdown signal rather than by reaching its duration
    pub interrupted: bool,
}

/// Long-running log writer
pub struct LogFixture {
    backend: Arc<dyn LockBackend>,
    time_provider: Arc<dyn TimeProvider>,
    config: FixtureConfig,
}

impl LogFixture {
    pub fn new(
        backend: Arc<dyn LockBackend>,
        time_provider: Arc<dyn TimeProvider>,
        config: FixtureConfig,
    ) -> Self {
        Self {
            backend,
            time_provider,
            config,
        }
    }

    pub fn log_path(&self) -> PathBuf {
        self.config.output_dir.join(&self.config.log_file)
    }

    /// Run until the configured duration elapses or shutdown is requested
    ///
    /// The lock (if any) is released and the file closed before returning,
    /// on every path out of this function.
    pub async fn run(&self, mut shutdown: ShutdownToken) -> Result<FixtureSummary> {
        std::fs::create_dir_all(&self.config.output_dir)?;
        let log_path = self.log_path();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let guard = if self.config.hold_lock {
            Some(LockGuard::acquire(
                self.backend.as_ref(),
                &file,
                WaitMode::NonBlocking,
            )?)
        } else {
            None
        };

        info!(
            log_path = %log_path.display(),
            lock_held = guard.is_some(),
            mode = ?self.config.mode,
            duration_secs = self.config.duration.as_secs(),
            "Fixture started"
        );

        let mut log = FixtureLog {
            file: &file,
            time_provider: self.time_provider.as_ref(),
            lines_written: 0,
        };
        log.line("Starting lock fixture");
        if guard.is_some() {
            log.line("This process holds an exclusive lock on the log file");
        }

        let deadline = tokio::time::Instant::now() + self.config.duration;
        let mut interrupted = false;
        let mut tick: u64 = 0;

        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                break;
            }
            if shutdown
                .sleep_or_shutdown(self.config.mode.period().min(remaining))
                .await
            {
                interrupted = true;
                break;
            }
            if tokio::time::Instant::now() >= deadline {
                break;
            }

            tick += 1;
            match self.config.mode {
                FixtureMode::Hold { .. } => log.line(&format!("Heartbeat {}", tick)),
                FixtureMode::Write { .. } => log.line(&format!("Log entry {}", tick)),
            }
        }

        if interrupted {
            log.line("Shutdown requested");
        }
        log.line("Fixture ending, lock will be released");
        let lines_written = log.lines_written;

        let lock_held = guard.is_some();
        drop(guard);
        if let Err(e) = file.sync_all() {
            warn!(error = %e, "Failed to sync fixture log");
        }
        drop(file);

        info!(lines_written, interrupted, "Fixture stopped");

        Ok(FixtureSummary {
            log_path,
            lines_written,
            lock_held,
            interrupted,
        })
    }
}

/// Timestamped line writer over a borrowed file
struct FixtureLog<'a> {
    file: &'a File,
    time_provider: &'a dyn TimeProvider,
    lines_written: u64,
}

impl FixtureLog<'_> {
    fn line(&mut self, message: &str) {
        let now = chrono::DateTime::from_timestamp_millis(self.time_provider.now_millis())
            .unwrap_or_default();
        let entry = format!(
            "{} - INFO - {}\n",
            now.format("%Y-%m-%d %H:%M:%S%.3f"),
            message
        );
        // A full disk must not kill the fixture; it only has to keep the lock
        match self.file.write_all(entry.as_bytes()) {
            Ok(()) => self.lines_written += 1,
            Err(e) => warn!(error = %e, "Failed to write fixture log line"),
        }
    }
}
