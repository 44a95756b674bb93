// Phase C: byte-range record lock test

use tracing::{info, warn};

use super::scratch::ScratchFile;
use crate::application::constants::{RECORD_LOCK_RANGE, RECORD_QUERY_RANGE};
use crate::domain::{Category, Phase, ProbeFailure, ProbeResult};
use crate::port::{LockBackend, LockError, RecordLockState, TimeProvider};

/// Set a non-blocking record lock, then query an overlapping range
///
/// | set            | query              | result      |
/// |----------------|--------------------|-------------|
/// | ok             | ok                 | Supported   |
/// | ok             | unavailable/ENOSYS | Partial     |
/// | not supported  | -                  | Unsupported |
/// | other error    | -                  | Error       |
/// | ok             | other error        | Error       |
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
            return ProbeFailure::io("create scratch file", &e).into_result(Phase::RecordLock);
        }
    };

    if let Err(e) = backend.set_record_lock(&file, RECORD_LOCK_RANGE) {
        warn!(error = %e, range = %RECORD_LOCK_RANGE, "fcntl(F_SETLK) failed");
        return ProbeFailure::from(e).into_result(Phase::RecordLock);
    }

    let result = match backend.query_record_lock(&file, RECORD_QUERY_RANGE) {
        Ok(state) => {
            let state = match state {
                RecordLockState::Unlocked => "no conflicting lock".to_string(),
                RecordLockState::HeldBy { pid } => format!("conflicting lock held by pid {}", pid),
            };
            ProbeResult::new(
                Phase::RecordLock,
                Category::Supported,
                format!(
                    "fcntl(F_SETLK) {} and fcntl(F_GETLK) {} succeeded ({}, {:.2}s)",
                    RECORD_LOCK_RANGE,
                    RECORD_QUERY_RANGE,
                    state,
                    time_provider.elapsed_since(start) as f64 / 1000.0
                ),
            )
        }
        Err(e @ LockError::QueryUnavailable { .. }) | Err(e @ LockError::NotSupported { .. }) => {
            warn!(error = %e, "Record lock set but query unavailable");
            ProbeResult::new(
                Phase::RecordLock,
                Category::Partial,
                format!(
                    "fcntl(F_SETLK) succeeded but lock state could not be queried: {}",
                    e
                ),
            )
            .with_errno(e.errno())
        }
        Err(e) => {
            warn!(error = %e, "fcntl(F_GETLK) failed");
            ProbeFailure::from(e).into_result(Phase::RecordLock)
        }
    };

    info!(category = %result.category, "Record lock test finished");
    result
}
