// Lock Backend Port
// Abstraction over flock/fcntl so the probe logic can run against stubs

use std::fs::File;
use thiserror::Error;

/// Whether a whole-file lock request may wait for a conflicting holder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitMode {
    Blocking,
    NonBlocking,
}

/// Byte range for record locks (`len == 0` means "to end of file")
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub len: u64,
}

impl ByteRange {
    pub fn new(start: u64, len: u64) -> Self {
        Self { start, len }
    }
}

impl std::fmt::Display for ByteRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, +{})", self.start, self.len)
    }
}

/// State of a record-lock range as seen by a query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordLockState {
    /// No conflicting lock (own locks never conflict)
    Unlocked,
    /// A conflicting write/read lock is held by another process
    HeldBy { pid: i32 },
}

/// Lock syscall errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LockError {
    #[error("{op}: operation not supported (errno {errno})")]
    NotSupported { op: &'static str, errno: i32 },

    #[error("{op}: lock held elsewhere (errno {errno})")]
    WouldBlock { op: &'static str, errno: i32 },

    #[error("{op}: query not available on this platform")]
    QueryUnavailable { op: &'static str },

    #[error("{op}: {message} (errno {errno})")]
    Os {
        op: &'static str,
        errno: i32,
        message: String,
    },
}

impl LockError {
    /// Raw OS error code, when the failure came from a syscall
    pub fn errno(&self) -> Option<i32> {
        match self {
            LockError::NotSupported { errno, .. }
            | LockError::WouldBlock { errno, .. }
            | LockError::Os { errno, .. } => Some(*errno),
            LockError::QueryUnavailable { .. } => None,
        }
    }
}

/// Advisory locking primitives
///
/// Implementations:
/// - NixLockBackend: flock(2) and fcntl(2) via nix
/// - mocks::StubLockBackend: scripted outcomes for tests
pub trait LockBackend: Send + Sync {
    /// Take an exclusive whole-file lock
    ///
    /// # Errors
    /// - LockError::WouldBlock if `mode` is NonBlocking and the lock is held elsewhere
    /// - LockError::NotSupported if the filesystem rejects the call
    fn lock_exclusive(&self, file: &File, mode: WaitMode) -> Result<(), LockError>;

    /// Release a whole-file lock
    fn unlock(&self, file: &File) -> Result<(), LockError>;

    /// Place a non-blocking exclusive record lock on `range`
    fn set_record_lock(&self, file: &File, range: ByteRange) -> Result<(), LockError>;

    /// Ask which lock would conflict with an exclusive lock on `range`
    ///
    /// # Errors
    /// - LockError::QueryUnavailable if the backend cannot query lock state
    fn query_record_lock(&self, file: &File, range: ByteRange)
        -> Result<RecordLockState, LockError>;
}

/// Scope-owned exclusive whole-file lock, released on drop
pub struct LockGuard<'a> {
    backend: &'a dyn LockBackend,
    file: &'a File,
}

impl<'a> LockGuard<'a> {
    /// Take an exclusive lock on `file` for the guard's lifetime
    pub fn acquire(
        backend: &'a dyn LockBackend,
        file: &'a File,
        mode: WaitMode,
    ) -> Result<Self, LockError> {
        backend.lock_exclusive(file, mode)?;
        Ok(Self { backend, file })
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        match self.backend.unlock(self.file) {
            Ok(()) => tracing::debug!("Whole-file lock released"),
            Err(e) => tracing::warn!(error = %e, "Failed to release whole-file lock"),
        }
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Scripted outcome for one kind of lock call
    #[derive(Debug, Clone)]
    pub enum StubOutcome {
        /// Call succeeds (never enforces anything)
        Succeed,
        /// Call fails with this error
        Fail(LockError),
    }

    #[derive(Debug, Default)]
    struct Calls {
        blocking: usize,
        non_blocking: usize,
        unlock: usize,
        set_record: usize,
        query_record: usize,
    }

    /// Stub lock provider
    ///
    /// Returns scripted outcomes and counts calls. The default stub accepts
    /// every lock without enforcing exclusion.
    pub struct StubLockBackend {
        blocking: StubOutcome,
        non_blocking: StubOutcome,
        set_record: StubOutcome,
        query_record: StubOutcome,
        calls: Arc<Mutex<Calls>>,
    }

    impl StubLockBackend {
        pub fn always_succeed() -> Self {
            Self {
                blocking: StubOutcome::Succeed,
                non_blocking: StubOutcome::Succeed,
                set_record: StubOutcome::Succeed,
                query_record: StubOutcome::Succeed,
                calls: Arc::new(Mutex::new(Calls::default())),
            }
        }

        /// Every lock call fails with ENOSYS
        pub fn not_implemented() -> Self {
            let enosys = |op| StubOutcome::Fail(LockError::NotSupported { op, errno: 38 });
            Self {
                blocking: enosys("flock"),
                non_blocking: enosys("flock"),
                set_record: enosys("fcntl(F_SETLK)"),
                query_record: enosys("fcntl(F_GETLK)"),
                calls: Arc::new(Mutex::new(Calls::default())),
            }
        }

        pub fn with_blocking(mut self, outcome: StubOutcome) -> Self {
            self.blocking = outcome;
            self
        }

        pub fn with_non_blocking(mut self, outcome: StubOutcome) -> Self {
            self.non_blocking = outcome;
            self
        }

        pub fn with_set_record(mut self, outcome: StubOutcome) -> Self {
            self.set_record = outcome;
            self
        }

        pub fn with_query_record(mut self, outcome: StubOutcome) -> Self {
            self.query_record = outcome;
            self
        }

        pub fn non_blocking_calls(&self) -> usize {
            self.calls.lock().unwrap().non_blocking
        }

        pub fn blocking_calls(&self) -> usize {
            self.calls.lock().unwrap().blocking
        }

        pub fn unlock_calls(&self) -> usize {
            self.calls.lock().unwrap().unlock
        }

        pub fn record_calls(&self) -> (usize, usize) {
            let calls = self.calls.lock().unwrap();
            (calls.set_record, calls.query_record)
        }

        fn resolve(outcome: &StubOutcome) -> Result<(), LockError> {
            match outcome {
                StubOutcome::Succeed => Ok(()),
                StubOutcome::Fail(e) => Err(e.clone()),
            }
        }
    }

    impl LockBackend for StubLockBackend {
        fn lock_exclusive(&self, _file: &File, mode: WaitMode) -> Result<(), LockError> {
            let mut calls = self.calls.lock().unwrap();
            match mode {
                WaitMode::Blocking => {
                    calls.blocking += 1;
                    Self::resolve(&self.blocking)
                }
                WaitMode::NonBlocking => {
                    calls.non_blocking += 1;
                    Self::resolve(&self.non_blocking)
                }
            }
        }

        fn unlock(&self, _file: &File) -> Result<(), LockError> {
            self.calls.lock().unwrap().unlock += 1;
            Ok(())
        }

        fn set_record_lock(&self, _file: &File, _range: ByteRange) -> Result<(), LockError> {
            self.calls.lock().unwrap().set_record += 1;
            Self::resolve(&self.set_record)
        }

        fn query_record_lock(
            &self,
            _file: &File,
            _range: ByteRange,
        ) -> Result<RecordLockState, LockError> {
            self.calls.lock().unwrap().query_record += 1;
            Self::resolve(&self.query_record).map(|_| RecordLockState::Unlocked)
        }
    }
}
