// Scratch files used by the probe phases

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::application::constants::SCRATCH_CONTENT;

/// Scratch file path owned for the duration of a probe
///
/// The file is removed on drop whether or not any phase created it.
/// Removal is best-effort: failures are logged and swallowed.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    /// Reserve `<dir>/<prefix>-<run_id>.tmp` without touching the filesystem
    pub fn reserve(dir: &Path, prefix: &str, run_id: &str) -> Self {
        Self {
            path: dir.join(format!("{}-{}.tmp", prefix, run_id)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create (or truncate) the file and write the test content
    pub fn create(&self) -> std::io::Result<File> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)?;
        file.write_all(SCRATCH_CONTENT)?;
        file.flush()?;
        Ok(file)
    }

    /// Open a second, independent descriptor on the same file
    pub fn open_again(&self) -> std::io::Result<File> {
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Scratch file removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => debug!(path = %self.path.display(), error = %e, "Scratch cleanup failed"),
        }
    }
}
