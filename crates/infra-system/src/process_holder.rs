// Process conflict holder
// reason: tokio::process so the handshake read and reaping can be bounded by timeouts
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::time::timeout;
use tracing::{info, warn};

use lockprobe_core::application::constants::{
    DEFAULT_HANDSHAKE_TIMEOUT, HOLDER_FAILED_PREFIX, HOLDER_READY_LINE, HOLDER_RELEASE_TIMEOUT,
};
use lockprobe_core::port::{ConflictHolder, HeldLock, HolderError, HolderExit};

/// Spawns the `lockprobe-holder` helper as the conflicting process
///
/// Protocol (see `holder::hold_exclusive`):
/// - argv: `<path> --hold-ms <ms>`
/// - stdout: `LOCK_ACQUIRED` once the lock is held, or
///   `LOCK_FAILED <errno|-> <0|1> <message>` on failure
/// - stdin EOF: release now
pub struct ProcessConflictHolder {
    program: PathBuf,
    handshake_timeout: Duration,
}

impl ProcessConflictHolder {
    /// Create a holder spawner
    ///
    /// # Arguments
    /// * `program` - Path to the `lockprobe-holder` binary
    /// * `handshake_timeout` - Max wait for the readiness line
    pub fn new(program: impl Into<PathBuf>, handshake_timeout: Duration) -> Self {
        Self {
            program: program.into(),
            handshake_timeout,
        }
    }

    pub fn with_default_timeout(program: impl Into<PathBuf>) -> Self {
        Self::new(program, DEFAULT_HANDSHAKE_TIMEOUT)
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn spawn(&self, path: &Path, hold: Duration) -> Result<Child, HolderError> {
        Command::new(&self.program)
            .arg(path)
            .arg("--hold-ms")
            .arg(hold.as_millis().to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| HolderError::SpawnFailed(format!("{}: {}", self.program.display(), e)))
    }
}

/// Parse `LOCK_FAILED <errno|-> <0|1> <message>`
fn parse_failure(line: &str) -> HolderError {
    let mut parts = line.trim().splitn(4, ' ');
    if parts.next() != Some(HOLDER_FAILED_PREFIX) {
        return HolderError::Handshake(format!("unexpected holder output: {:?}", line));
    }
    let errno = parts.next().and_then(|s| s.parse::<i32>().ok());
    let not_supported = parts.next() == Some("1");
    let message = parts.next().unwrap_or("unknown error").to_string();
    HolderError::LockFailed {
        not_supported,
        errno,
        message,
    }
}

/// Kill (if asked) and wait for the child, returning its exit code
async fn reap(child: &mut Child, kill: bool) -> Option<i32> {
    if kill {
        // Already-exited children make this fail; wait() still reaps them
        let _ = child.start_kill();
    }
    match child.wait().await {
        Ok(status) => status.code(),
        Err(e) => {
            warn!(error = %e, "Failed to reap holder process");
            None
        }
    }
}

#[async_trait]
impl ConflictHolder for ProcessConflictHolder {
    async fn acquire(&self, path: &Path, hold: Duration) -> Result<Box<dyn HeldLock>, HolderError> {
        let mut child = self.spawn(path, hold)?;
        let pid = child.id();

        info!(
            program = %self.program.display(),
            path = %path.display(),
            pid = ?pid,
            hold_ms = hold.as_millis() as u64,
            "Holder process spawned"
        );

        let (stdin, stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                reap(&mut child, true).await;
                return Err(HolderError::IoError("holder pipes not captured".to_string()));
            }
        };
        let mut lines = BufReader::new(stdout).lines();

        match timeout(self.handshake_timeout, lines.next_line()).await {
            Ok(Ok(Some(line))) if line.trim() == HOLDER_READY_LINE => Ok(Box::new(ProcessHeldLock {
                child,
                stdin: Some(stdin),
                _stdout: lines,
                pid,
            })),
            Ok(Ok(Some(line))) => {
                let exit_code = reap(&mut child, false).await;
                warn!(pid = ?pid, exit_code = ?exit_code, line = %line, "Holder reported failure");
                Err(parse_failure(&line))
            }
            Ok(Ok(None)) => {
                let exit_code = reap(&mut child, false).await;
                Err(HolderError::Handshake(format!(
                    "holder exited (code {:?}) before reporting readiness",
                    exit_code
                )))
            }
            Ok(Err(e)) => {
                reap(&mut child, true).await;
                Err(HolderError::IoError(e.to_string()))
            }
            Err(_) => {
                warn!(pid = ?pid, "Holder handshake timed out, killing");
                reap(&mut child, true).await;
                Err(HolderError::Timeout(self.handshake_timeout.as_millis() as u64))
            }
        }
    }
}

/// Running holder process that reported its lock as held
struct ProcessHeldLock {
    child: Child,
    stdin: Option<ChildStdin>,
    // Kept open so late writes from the holder never hit a closed pipe
    _stdout: Lines<BufReader<ChildStdout>>,
    pid: Option<u32>,
}

#[async_trait]
impl HeldLock for ProcessHeldLock {
    fn pid(&self) -> Option<u32> {
        self.pid
    }

    fn is_holding(&mut self) -> bool {
        matches!(self.child.try_wait(), Ok(None))
    }

    async fn release(mut self: Box<Self>) -> Result<HolderExit, HolderError> {
        // EOF on stdin tells the holder to unlock and exit now
        drop(self.stdin.take());

        match timeout(HOLDER_RELEASE_TIMEOUT, self.child.wait()).await {
            Ok(Ok(status)) => Ok(HolderExit {
                pid: self.pid,
                exit_code: status.code(),
            }),
            Ok(Err(e)) => {
                reap(&mut self.child, true).await;
                Err(HolderError::IoError(e.to_string()))
            }
            Err(_) => {
                warn!(pid = ?self.pid, "Holder ignored release, killing");
                let exit_code = reap(&mut self.child, true).await;
                Ok(HolderExit {
                    pid: self.pid,
                    exit_code,
                })
            }
        }
    }
}
