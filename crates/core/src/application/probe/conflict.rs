// Phase B: cross-process conflict detection

use std::time::Duration;
use tracing::{info, warn};

use super::scratch::ScratchFile;
use crate::domain::{Category, Phase, ProbeFailure, ProbeResult};
use crate::port::{ConflictHolder, LockBackend, LockError, TimeProvider, WaitMode};

/// Prove that a lock held by another process blocks this one
///
/// Algorithm:
/// 1. Start a holder process on the scratch path; it reports readiness
///    only once its blocking exclusive lock is held
/// 2. Try the same exclusive lock here in non-blocking mode
/// 3. Release and reap the holder, whatever the outcome
/// 4. Classify: blocked → Supported, acquired while the holder is alive →
///    Simulated, acquired after the holder died → Unknown
pub async fn execute(
    backend: &dyn LockBackend,
    holder: &dyn ConflictHolder,
    time_provider: &dyn TimeProvider,
    scratch: &ScratchFile,
    hold_duration: Duration,
) -> ProbeResult {
    let mut held = match holder.acquire(scratch.path(), hold_duration).await {
        Ok(held) => held,
        Err(e) => {
            warn!(error = %e, "Conflict holder unavailable");
            return ProbeFailure::from(e).into_result(Phase::Conflict);
        }
    };
    let holder_pid = held
        .pid()
        .map(|pid| format!("pid {}", pid))
        .unwrap_or_else(|| "in-process stub".to_string());
    info!(holder = %holder_pid, "Holder reports exclusive lock held");

    let start = time_provider.now_millis();
    let attempt = try_lock(backend, scratch);
    let elapsed = time_provider.elapsed_since(start) as f64 / 1000.0;
    let holder_alive = held.is_holding();

    match held.release().await {
        Ok(exit) if exit.success() => info!(exit_code = ?exit.exit_code, "Holder reaped"),
        Ok(exit) => warn!(exit_code = ?exit.exit_code, "Holder exited abnormally"),
        Err(e) => warn!(error = %e, "Holder release failed"),
    }

    match attempt {
        Err(LockError::WouldBlock { .. }) => {
            info!(elapsed_s = %elapsed, "Lock conflict detected");
            ProbeResult::new(
                Phase::Conflict,
                Category::Supported,
                format!(
                    "flock(LOCK_EX|LOCK_NB) blocked by holder ({}) as expected ({:.2}s)",
                    holder_pid, elapsed
                ),
            )
        }
        Ok(()) if holder_alive => {
            warn!(elapsed_s = %elapsed, "Lock acquired while holder held it");
            ProbeFailure::ConflictNotDetected(format!(
                "got lock immediately ({:.2}s) while holder ({}) held it",
                elapsed, holder_pid
            ))
            .into_result(Phase::Conflict)
        }
        Ok(()) => {
            warn!("Holder exited before the conflict attempt");
            ProbeResult::new(
                Phase::Conflict,
                Category::Unknown,
                format!(
                    "got lock ({:.2}s) but holder ({}) had already exited; no concurrent lock to test against",
                    elapsed, holder_pid
                ),
            )
        }
        Err(e) => {
            warn!(error = %e, "Conflict attempt failed");
            ProbeFailure::from(e).into_result(Phase::Conflict)
        }
    }
}

/// Non-blocking exclusive attempt on an independent descriptor
fn try_lock(backend: &dyn LockBackend, scratch: &ScratchFile) -> Result<(), LockError> {
    let file = scratch.open_again().map_err(|e| LockError::Os {
        op: "open",
        errno: e.raw_os_error().unwrap_or(0),
        message: e.to_string(),
    })?;

    backend.lock_exclusive(&file, WaitMode::NonBlocking)?;
    if let Err(e) = backend.unlock(&file) {
        warn!(error = %e, "Unlock after conflict attempt failed");
    }
    Ok(())
}
