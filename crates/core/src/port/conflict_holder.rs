// Conflict Holder Port
// A second process that holds an exclusive lock while the prober tests for conflict

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// How the holder process ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HolderExit {
    pub pid: Option<u32>,
    pub exit_code: Option<i32>,
}

impl HolderExit {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Holder errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HolderError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Holder could not lock: {message}")]
    LockFailed {
        /// The holder's lock call reported "operation not supported"
        not_supported: bool,
        errno: Option<i32>,
        message: String,
    },

    #[error("Handshake failed: {0}")]
    Handshake(String),

    #[error("Holder not ready after {0}ms")]
    Timeout(u64),

    #[error("IO error: {0}")]
    IoError(String),
}

/// Lock held by another process
///
/// Dropping a handle without calling `release` leaves reaping to the
/// implementation's drop behaviour; the prober always calls `release`.
#[async_trait]
pub trait HeldLock: Send {
    /// Process ID of the holder, if it is a real process
    fn pid(&self) -> Option<u32>;

    /// Whether the holder is still alive (and therefore still holds the lock)
    fn is_holding(&mut self) -> bool;

    /// Ask the holder to release early and reap it
    async fn release(self: Box<Self>) -> Result<HolderExit, HolderError>;
}

/// Spawns lock holders
///
/// Implementations:
/// - ProcessConflictHolder: spawns the `lockprobe-holder` helper binary
/// - mocks::MockConflictHolder: in-memory holder for tests
#[async_trait]
pub trait ConflictHolder: Send + Sync {
    /// Start a holder that takes an exclusive whole-file lock on `path`
    ///
    /// Returns only once the holder reports the lock as held. On any error
    /// the holder has already been reaped.
    ///
    /// # Errors
    /// - HolderError::SpawnFailed if the process cannot be started
    /// - HolderError::LockFailed if the holder's own lock call failed
    /// - HolderError::Timeout if no readiness report arrives in time
    async fn acquire(&self, path: &Path, hold: Duration) -> Result<Box<dyn HeldLock>, HolderError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock holder behavior
    #[derive(Debug, Clone)]
    pub enum MockHolderBehavior {
        /// Holder stays alive until released
        Hold,
        /// Holder reported readiness but exited before the parent's attempt
        ExitEarly,
        /// acquire() fails with this error
        Fail(HolderError),
    }

    /// Mock Conflict Holder for testing
    pub struct MockConflictHolder {
        behavior: Arc<Mutex<MockHolderBehavior>>,
        acquire_count: Arc<Mutex<usize>>,
        release_count: Arc<Mutex<usize>>,
    }

    impl MockConflictHolder {
        pub fn new(behavior: MockHolderBehavior) -> Self {
            Self {
                behavior: Arc::new(Mutex::new(behavior)),
                acquire_count: Arc::new(Mutex::new(0)),
                release_count: Arc::new(Mutex::new(0)),
            }
        }

        pub fn new_holding() -> Self {
            Self::new(MockHolderBehavior::Hold)
        }

        pub fn new_fail(error: HolderError) -> Self {
            Self::new(MockHolderBehavior::Fail(error))
        }

        pub fn acquire_count(&self) -> usize {
            *self.acquire_count.lock().unwrap()
        }

        /// Number of holders released (reaped)
        pub fn release_count(&self) -> usize {
            *self.release_count.lock().unwrap()
        }
    }

    struct MockHeldLock {
        alive: bool,
        release_count: Arc<Mutex<usize>>,
    }

    #[async_trait]
    impl HeldLock for MockHeldLock {
        fn pid(&self) -> Option<u32> {
            None
        }

        fn is_holding(&mut self) -> bool {
            self.alive
        }

        async fn release(self: Box<Self>) -> Result<HolderExit, HolderError> {
            *self.release_count.lock().unwrap() += 1;
            Ok(HolderExit {
                pid: None,
                exit_code: Some(0),
            })
        }
    }

    #[async_trait]
    impl ConflictHolder for MockConflictHolder {
        async fn acquire(
            &self,
            _path: &Path,
            _hold: Duration,
        ) -> Result<Box<dyn HeldLock>, HolderError> {
            *self.acquire_count.lock().unwrap() += 1;

            let behavior = self.behavior.lock().unwrap().clone();
            let alive = match behavior {
                MockHolderBehavior::Hold => true,
                MockHolderBehavior::ExitEarly => false,
                MockHolderBehavior::Fail(e) => return Err(e),
            };

            Ok(Box::new(MockHeldLock {
                alive,
                release_count: Arc::clone(&self.release_count),
            }))
        }
    }
}
