// flock(2) / fcntl(2) lock backend
// reason: nix for errno-typed syscall wrappers (unix only)
use std::fs::File;
use std::os::fd::AsRawFd;

use nix::errno::Errno;
use nix::fcntl::{fcntl, FcntlArg, FlockArg};
use nix::libc;
use tracing::debug;

use lockprobe_core::port::{ByteRange, LockBackend, LockError, RecordLockState, WaitMode};

/// Real advisory locks via nix
#[derive(Debug, Default, Clone, Copy)]
pub struct NixLockBackend;

impl NixLockBackend {
    pub fn new() -> Self {
        Self
    }
}

/// ENOSYS / EOPNOTSUPP / ENOTSUP: the filesystem does not implement the call
pub fn is_not_supported(errno: Errno) -> bool {
    matches!(errno, Errno::ENOSYS | Errno::EOPNOTSUPP) || errno == Errno::ENOTSUP
}

fn classify(op: &'static str, errno: Errno, would_block: &[Errno]) -> LockError {
    if is_not_supported(errno) {
        LockError::NotSupported {
            op,
            errno: errno as i32,
        }
    } else if would_block.contains(&errno) {
        LockError::WouldBlock {
            op,
            errno: errno as i32,
        }
    } else {
        LockError::Os {
            op,
            errno: errno as i32,
            message: errno.desc().to_string(),
        }
    }
}

/// Build a write-lock description for `range`
fn write_lock(range: ByteRange) -> libc::flock {
    // SAFETY: libc::flock is a plain C struct of integers; all-zero is valid
    let mut lock: libc::flock = unsafe { std::mem::zeroed() };
    lock.l_type = libc::F_WRLCK as _;
    lock.l_whence = libc::SEEK_SET as _;
    lock.l_start = range.start as _;
    lock.l_len = range.len as _;
    lock
}

// nix::fcntl::flock is deprecated in favour of the owning Flock<T> guard;
// this port works on borrowed files, so the plain call is the right fit.
#[allow(deprecated)]
fn flock(file: &File, arg: FlockArg) -> nix::Result<()> {
    nix::fcntl::flock(file.as_raw_fd(), arg)
}

impl LockBackend for NixLockBackend {
    fn lock_exclusive(&self, file: &File, mode: WaitMode) -> Result<(), LockError> {
        let (op, arg) = match mode {
            WaitMode::Blocking => ("flock(LOCK_EX)", FlockArg::LockExclusive),
            WaitMode::NonBlocking => ("flock(LOCK_EX|LOCK_NB)", FlockArg::LockExclusiveNonblock),
        };
        flock(file, arg).map_err(|e| classify(op, e, &[Errno::EWOULDBLOCK]))?;
        debug!(fd = file.as_raw_fd(), op, "Whole-file lock acquired");
        Ok(())
    }

    fn unlock(&self, file: &File) -> Result<(), LockError> {
        flock(file, FlockArg::Unlock).map_err(|e| classify("flock(LOCK_UN)", e, &[]))
    }

    fn set_record_lock(&self, file: &File, range: ByteRange) -> Result<(), LockError> {
        let lock = write_lock(range);
        fcntl(file.as_raw_fd(), FcntlArg::F_SETLK(&lock))
            .map_err(|e| classify("fcntl(F_SETLK)", e, &[Errno::EACCES, Errno::EAGAIN]))?;
        debug!(fd = file.as_raw_fd(), range = %range, "Record lock set");
        Ok(())
    }

    fn query_record_lock(
        &self,
        file: &File,
        range: ByteRange,
    ) -> Result<RecordLockState, LockError> {
        let mut lock = write_lock(range);
        fcntl(file.as_raw_fd(), FcntlArg::F_GETLK(&mut lock))
            .map_err(|e| classify("fcntl(F_GETLK)", e, &[]))?;

        if lock.l_type as i32 == libc::F_UNLCK as i32 {
            Ok(RecordLockState::Unlocked)
        } else {
            Ok(RecordLockState::HeldBy {
                pid: lock.l_pid as i32,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::OpenOptions;

    fn open(path: &std::path::Path) -> File {
        OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .unwrap()
    }

    #[test]
    fn test_flock_conflicts_between_descriptions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lock");
        let backend = NixLockBackend::new();
        let first = open(&path);
        let second = open(&path);

        backend.lock_exclusive(&first, WaitMode::Blocking).unwrap();
        let err = backend
            .lock_exclusive(&second, WaitMode::NonBlocking)
            .unwrap_err();
        assert!(matches!(err, LockError::WouldBlock { .. }));

        backend.unlock(&first).unwrap();
        backend.lock_exclusive(&second, WaitMode::NonBlocking).unwrap();
        backend.unlock(&second).unwrap();
    }

    #[test]
    fn test_record_lock_set_and_query() {
        let dir = tempfile::tempdir().unwrap();
        let file = open(&dir.path().join("record"));
        let backend = NixLockBackend::new();

        backend.set_record_lock(&file, ByteRange::new(0, 10)).unwrap();
        // Own locks never conflict with ourselves
        let state = backend
            .query_record_lock(&file, ByteRange::new(0, 5))
            .unwrap();
        assert_eq!(state, RecordLockState::Unlocked);
    }

    #[test]
    fn test_errno_classification() {
        assert!(matches!(
            classify("flock", Errno::ENOSYS, &[]),
            LockError::NotSupported { .. }
        ));
        assert!(matches!(
            classify("flock", Errno::EOPNOTSUPP, &[]),
            LockError::NotSupported { .. }
        ));
        assert!(matches!(
            classify("flock", Errno::EWOULDBLOCK, &[Errno::EWOULDBLOCK]),
            LockError::WouldBlock { .. }
        ));

        let err = classify("flock", Errno::EBADF, &[Errno::EWOULDBLOCK]);
        assert_eq!(err.errno(), Some(Errno::EBADF as i32));
        assert!(matches!(err, LockError::Os { .. }));
    }
}
