// Holder side of the conflict handshake (runs inside `lockprobe-holder`)
use std::fs::OpenOptions;
use std::future::Future;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use lockprobe_core::application::constants::{HOLDER_FAILED_PREFIX, HOLDER_READY_LINE};
use lockprobe_core::port::{LockBackend, LockError, LockGuard, WaitMode};

/// How a hold ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HoldOutcome {
    /// Lock was held until the hold duration elapsed
    Expired,
    /// Parent asked for an early release
    Released,
    /// Lock could not be taken; the failure line was written
    Failed,
}

impl HoldOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            HoldOutcome::Expired | HoldOutcome::Released => 0,
            HoldOutcome::Failed => 1,
        }
    }
}

fn write_failure(
    out: &mut impl Write,
    errno: Option<i32>,
    not_supported: bool,
    message: &str,
) -> std::io::Result<()> {
    let errno = errno
        .map(|e| e.to_string())
        .unwrap_or_else(|| "-".to_string());
    writeln!(
        out,
        "{} {} {} {}",
        HOLDER_FAILED_PREFIX,
        errno,
        u8::from(not_supported),
        message.replace('\n', " ")
    )?;
    out.flush()
}

/// Take a blocking exclusive lock on `path`, report it on `out`, and hold it
///
/// The lock is held until `hold` elapses or `release` resolves, whichever
/// comes first. It is released by the guard before this returns.
pub async fn hold_exclusive<W, R>(
    backend: &dyn LockBackend,
    path: &Path,
    hold: Duration,
    out: &mut W,
    release: R,
) -> std::io::Result<HoldOutcome>
where
    W: Write,
    R: Future<Output = ()>,
{
    let file = match OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
    {
        Ok(file) => file,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Holder cannot open file");
            write_failure(out, e.raw_os_error(), false, &e.to_string())?;
            return Ok(HoldOutcome::Failed);
        }
    };

    let guard = match LockGuard::acquire(backend, &file, WaitMode::Blocking) {
        Ok(guard) => guard,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Holder cannot lock file");
            let not_supported = matches!(e, LockError::NotSupported { .. });
            write_failure(out, e.errno(), not_supported, &e.to_string())?;
            return Ok(HoldOutcome::Failed);
        }
    };

    writeln!(out, "{}", HOLDER_READY_LINE)?;
    out.flush()?;
    info!(path = %path.display(), hold_ms = hold.as_millis() as u64, "Holder acquired exclusive lock");

    let outcome = tokio::select! {
        _ = tokio::time::sleep(hold) => HoldOutcome::Expired,
        _ = release => HoldOutcome::Released,
    };

    drop(guard);
    info!(outcome = ?outcome, "Holder released lock");
    Ok(outcome)
}
