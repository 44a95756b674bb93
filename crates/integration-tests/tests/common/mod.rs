//! Shared helpers for the integration tests

use async_trait::async_trait;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use lockprobe_core::application::{LockProber, ProbeConfig};
use lockprobe_core::port::filesystem_inspector::mocks::FixedFilesystemInspector;
use lockprobe_core::port::id_provider::mocks::SequentialIdProvider;
use lockprobe_core::port::time_provider::SystemTimeProvider;
use lockprobe_core::port::{
    ConflictHolder, HeldLock, HolderError, HolderExit, LockBackend, LockError, WaitMode,
};

/// Holds the conflicting lock on a second open file description in this
/// process. flock locks belong to the description, so this conflicts with the
/// prober exactly like another process would.
pub struct InProcessHolder {
    backend: Arc<dyn LockBackend>,
}

impl InProcessHolder {
    pub fn new(backend: Arc<dyn LockBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl ConflictHolder for InProcessHolder {
    async fn acquire(&self, path: &Path, _hold: Duration) -> Result<Box<dyn HeldLock>, HolderError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|e| HolderError::IoError(e.to_string()))?;

        self.backend
            .lock_exclusive(&file, WaitMode::Blocking)
            .map_err(|e| HolderError::LockFailed {
                not_supported: matches!(e, LockError::NotSupported { .. }),
                errno: e.errno(),
                message: e.to_string(),
            })?;

        Ok(Box::new(InProcessLock {
            backend: self.backend.clone(),
            file,
        }))
    }
}

struct InProcessLock {
    backend: Arc<dyn LockBackend>,
    file: File,
}

#[async_trait]
impl HeldLock for InProcessLock {
    fn pid(&self) -> Option<u32> {
        Some(std::process::id())
    }

    fn is_holding(&mut self) -> bool {
        true
    }

    async fn release(self: Box<Self>) -> Result<HolderExit, HolderError> {
        let _ = self.backend.unlock(&self.file);
        Ok(HolderExit {
            pid: Some(std::process::id()),
            exit_code: Some(0),
        })
    }
}

/// Prober over `backend` with an in-process holder using the same backend
pub fn prober(backend: Arc<dyn LockBackend>) -> LockProber {
    LockProber::new(
        backend.clone(),
        Arc::new(InProcessHolder::new(backend)),
        Arc::new(FixedFilesystemInspector::new("testfs")),
        Arc::new(SystemTimeProvider),
        Arc::new(SequentialIdProvider::default()),
        ProbeConfig {
            hold_duration: Duration::from_secs(5),
        },
    )
}
