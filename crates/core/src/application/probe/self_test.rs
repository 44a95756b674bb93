// Phase A: whole-file lock self-test

use tracing::{info, warn};

use super::scratch::ScratchFile;
use crate::domain::{Category, Phase, ProbeFailure, ProbeResult};
use crate::port::{LockBackend, TimeProvider, WaitMode};

/// Lock and unlock a fresh scratch file in-process
///
/// `Unsupported` here means the filesystem has no whole-file locking at all
/// and the conflict phase must be skipped.
pub fn execute(
    backend: &dyn LockBackend,
    time_provider: &dyn TimeProvider,
    scratch: &ScratchFile,
) -> ProbeResult {
    let start = time_provider.now_millis();

    let file = match scratch.create() {
        Ok(file) => file,
        Err(e) => {
            warn!(path = %scratch.path().display(), error = %e, "Cannot create scratch file");
            return ProbeFailure::io("create scratch file", &e).into_result(Phase::SelfTest);
        }
    };

    if let Err(e) = backend.lock_exclusive(&file, WaitMode::Blocking) {
        warn!(error = %e, "flock(LOCK_EX) failed");
        return ProbeFailure::from(e).into_result(Phase::SelfTest);
    }

    if let Err(e) = backend.unlock(&file) {
        warn!(error = %e, "flock(LOCK_UN) failed");
        return ProbeFailure::from(e).into_result(Phase::SelfTest);
    }

    let elapsed_ms = time_provider.elapsed_since(start);
    info!(elapsed_ms = %elapsed_ms, "Whole-file lock self-test passed");

    ProbeResult::new(
        Phase::SelfTest,
        Category::Supported,
        format!(
            "flock(LOCK_EX) and flock(LOCK_UN) succeeded ({:.2}s)",
            elapsed_ms as f64 / 1000.0
        ),
    )
}
