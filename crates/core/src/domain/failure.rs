// Probe failure taxonomy

use super::probe::{Category, Phase, ProbeResult};
use crate::port::{HolderError, LockError};
use thiserror::Error;

/// Why a phase did not report working locks
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    /// Filesystem rejects the locking syscall outright
    #[error("{op} not supported{}", errno_suffix(.errno))]
    NotSupported { op: String, errno: Option<i32> },

    /// Lock acquired while another process held it
    #[error("no lock conflict detected: {0}")]
    ConflictNotDetected(String),

    /// Any other syscall failure
    #[error("{op} failed: {message}")]
    OsError {
        op: String,
        errno: Option<i32>,
        message: String,
    },

    /// The holder process could not be created
    #[error("process spawn failed: {0}")]
    ProcessSpawnFailure(String),
}

impl ProbeFailure {
    pub fn category(&self) -> Category {
        match self {
            ProbeFailure::NotSupported { .. } => Category::Unsupported,
            ProbeFailure::ConflictNotDetected(_) => Category::Simulated,
            ProbeFailure::OsError { .. } | ProbeFailure::ProcessSpawnFailure(_) => Category::Error,
        }
    }

    pub fn errno(&self) -> Option<i32> {
        match self {
            ProbeFailure::NotSupported { errno, .. } | ProbeFailure::OsError { errno, .. } => {
                *errno
            }
            _ => None,
        }
    }

    /// Render into the phase's result
    pub fn into_result(self, phase: Phase) -> ProbeResult {
        ProbeResult::new(phase, self.category(), self.to_string()).with_errno(self.errno())
    }

    pub fn io(op: &str, err: &std::io::Error) -> Self {
        ProbeFailure::OsError {
            op: op.to_string(),
            errno: err.raw_os_error(),
            message: err.to_string(),
        }
    }
}

impl From<LockError> for ProbeFailure {
    fn from(err: LockError) -> Self {
        match err {
            LockError::NotSupported { op, errno } => ProbeFailure::NotSupported {
                op: op.to_string(),
                errno: Some(errno),
            },
            other => ProbeFailure::OsError {
                op: lock_op(&other).to_string(),
                errno: other.errno(),
                message: other.to_string(),
            },
        }
    }
}

impl From<HolderError> for ProbeFailure {
    fn from(err: HolderError) -> Self {
        match err {
            HolderError::SpawnFailed(msg) => ProbeFailure::ProcessSpawnFailure(msg),
            // The holder's flag wins even when it could not report an errno
            HolderError::LockFailed {
                not_supported: true,
                errno,
                ..
            } => ProbeFailure::NotSupported {
                op: "holder flock".to_string(),
                errno,
            },
            HolderError::LockFailed { errno, message, .. } => ProbeFailure::OsError {
                op: "holder flock".to_string(),
                errno,
                message,
            },
            other => ProbeFailure::OsError {
                op: "holder".to_string(),
                errno: None,
                message: other.to_string(),
            },
        }
    }
}

fn errno_suffix(errno: &Option<i32>) -> String {
    errno
        .map(|errno| format!(" (errno {})", errno))
        .unwrap_or_default()
}

fn lock_op(err: &LockError) -> &'static str {
    match err {
        LockError::NotSupported { op, .. }
        | LockError::WouldBlock { op, .. }
        | LockError::QueryUnavailable { op }
        | LockError::Os { op, .. } => op,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_error_mapping() {
        let failure = ProbeFailure::from(LockError::NotSupported {
            op: "flock",
            errno: 38,
        });
        assert_eq!(failure.category(), Category::Unsupported);
        assert_eq!(failure.errno(), Some(38));

        let failure = ProbeFailure::from(LockError::Os {
            op: "flock",
            errno: 9,
            message: "Bad file descriptor".to_string(),
        });
        assert_eq!(failure.category(), Category::Error);
        assert!(failure.to_string().contains("Bad file descriptor"));
    }

    #[test]
    fn test_holder_error_mapping() {
        let spawn = ProbeFailure::from(HolderError::SpawnFailed("no such file".to_string()));
        assert_eq!(spawn.category(), Category::Error);
        assert!(matches!(spawn, ProbeFailure::ProcessSpawnFailure(_)));

        let enosys = ProbeFailure::from(HolderError::LockFailed {
            not_supported: true,
            errno: Some(38),
            message: "Function not implemented".to_string(),
        });
        assert_eq!(enosys.category(), Category::Unsupported);

        let eio = ProbeFailure::from(HolderError::LockFailed {
            not_supported: false,
            errno: Some(5),
            message: "Input/output error".to_string(),
        });
        assert_eq!(eio.category(), Category::Error);
        assert_eq!(eio.errno(), Some(5));
    }

    #[test]
    fn test_holder_not_supported_without_errno_is_unsupported() {
        let failure = ProbeFailure::from(HolderError::LockFailed {
            not_supported: true,
            errno: None,
            message: "Operation not supported".to_string(),
        });

        assert_eq!(failure.category(), Category::Unsupported);
        assert_eq!(failure.errno(), None);
        assert_eq!(failure.to_string(), "holder flock not supported");

        let result = failure.into_result(Phase::Conflict);
        assert_eq!(result.category, Category::Unsupported);
        assert_eq!(result.errno, None);
    }

    #[test]
    fn test_into_result_keeps_errno() {
        let result = ProbeFailure::NotSupported {
            op: "fcntl(F_SETLK)".to_string(),
            errno: Some(95),
        }
        .into_result(Phase::RecordLock);

        assert_eq!(result.phase, Phase::RecordLock);
        assert_eq!(result.category, Category::Unsupported);
        assert_eq!(result.errno, Some(95));
        assert!(result.detail.contains("errno 95"));
    }
}
