//! The conflict test must not leave zombie holder processes behind
//!
//! Kept in its own test binary: `waitpid(-1)` sees every child of the
//! process, so no other test may spawn children concurrently.

use std::sync::Arc;
use std::time::Duration;

use lockprobe_core::application::{LockProber, ProbeConfig};
use lockprobe_core::domain::{Category, Verdict};
use lockprobe_core::port::id_provider::UuidProvider;
use lockprobe_core::port::time_provider::SystemTimeProvider;
use lockprobe_infra_system::{MountTableInspector, NixLockBackend, ProcessConflictHolder};
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitPidFlag};
use nix::unistd::Pid;

#[tokio::test]
async fn test_probe_reaps_holder_process() {
    let dir = tempfile::tempdir().unwrap();
    let prober = LockProber::new(
        Arc::new(NixLockBackend::new()),
        Arc::new(ProcessConflictHolder::new(
            env!("CARGO_BIN_EXE_lockprobe-holder"),
            Duration::from_secs(10),
        )),
        Arc::new(MountTableInspector::default()),
        Arc::new(SystemTimeProvider),
        Arc::new(UuidProvider),
        ProbeConfig {
            hold_duration: Duration::from_secs(30),
        },
    );

    let report = prober.probe(dir.path()).await.unwrap();

    assert_eq!(report.conflict.as_ref().unwrap().category, Category::Supported);
    assert_eq!(report.verdict, Verdict::RealLocking);
    assert_eq!(
        waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)),
        Err(Errno::ECHILD)
    );
}
