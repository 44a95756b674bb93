// Lock Capability Prober - probe use case

pub mod conflict;
pub mod record_lock;
pub mod scratch;
pub mod self_test;


pub use scratch::ScratchFile;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::application::constants::{
    DEFAULT_HOLD_DURATION, FCNTL_SCRATCH_PREFIX, FLOCK_SCRATCH_PREFIX,
};
use crate::domain::{Category, ProbeReport};
use crate::error::{AppError, Result};
use crate::port::{ConflictHolder, FilesystemInspector, IdProvider, LockBackend, TimeProvider};

/// Probe tuning
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// How long the conflict holder keeps its lock at most
    pub hold_duration: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            hold_duration: DEFAULT_HOLD_DURATION,
        }
    }
}

/// Lock Capability Prober
///
/// Runs the self-test, conflict and record-lock phases against a directory.
/// Each phase is isolated: a failing phase is reported, never propagated.
pub struct LockProber {
    backend: Arc<dyn LockBackend>,
    holder: Arc<dyn ConflictHolder>,
    inspector: Arc<dyn FilesystemInspector>,
    time_provider: Arc<dyn TimeProvider>,
    id_provider: Arc<dyn IdProvider>,
    config: ProbeConfig,
}

impl LockProber {
    pub fn new(
        backend: Arc<dyn LockBackend>,
        holder: Arc<dyn ConflictHolder>,
        inspector: Arc<dyn FilesystemInspector>,
        time_provider: Arc<dyn TimeProvider>,
        id_provider: Arc<dyn IdProvider>,
        config: ProbeConfig,
    ) -> Self {
        Self {
            backend,
            holder,
            inspector,
            time_provider,
            id_provider,
            config,
        }
    }

    /// Probe `target`, creating it if absent
    ///
    /// # Errors
    /// Only if the target directory cannot be created. Phase failures are
    /// folded into the report.
    pub async fn probe(&self, target: &Path) -> Result<ProbeReport> {
        std::fs::create_dir_all(target).map_err(|e| {
            AppError::InvalidTarget(format!("cannot create {}: {}", target.display(), e))
        })?;

        let filesystem_type = self.inspector.filesystem_type(target);
        let run_id = self.id_provider.generate_id();
        info!(
            target = %target.display(),
            filesystem_type = %filesystem_type,
            run_id = %run_id,
            "Starting lock probe"
        );

        // Guards remove the scratch files on every exit path
        let flock_scratch = ScratchFile::reserve(target, FLOCK_SCRATCH_PREFIX, &run_id);
        let fcntl_scratch = ScratchFile::reserve(target, FCNTL_SCRATCH_PREFIX, &run_id);

        let self_test = self_test::execute(
            self.backend.as_ref(),
            self.time_provider.as_ref(),
            &flock_scratch,
        );

        let conflict = if self_test.category == Category::Unsupported {
            info!("Whole-file locking unsupported, skipping conflict test");
            None
        } else {
            Some(
                conflict::execute(
                    self.backend.as_ref(),
                    self.holder.as_ref(),
                    self.time_provider.as_ref(),
                    &flock_scratch,
                    self.config.hold_duration,
                )
                .await,
            )
        };

        let record_lock = record_lock::execute(
            self.backend.as_ref(),
            self.time_provider.as_ref(),
            &fcntl_scratch,
        );

        drop(flock_scratch);
        drop(fcntl_scratch);

        let report = ProbeReport::new(
            target.to_path_buf(),
            filesystem_type,
            self_test,
            conflict,
            record_lock,
        );

        info!(
            verdict = %report.verdict,
            whole_file = %report.whole_file().category,
            record_lock = %report.record_lock.category,
            "Lock probe complete"
        );

        Ok(report)
    }
}
