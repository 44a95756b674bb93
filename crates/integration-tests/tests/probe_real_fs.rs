//! Prober wired to the real lock backend on a local directory

mod common;

use std::sync::Arc;

use lockprobe_core::domain::{Category, Verdict};
use lockprobe_core::port::lock_backend::mocks::StubLockBackend;
use lockprobe_infra_system::NixLockBackend;

#[tokio::test]
async fn test_local_directory_reports_real_locking() {
    let dir = tempfile::tempdir().unwrap();

    let report = common::prober(Arc::new(NixLockBackend::new()))
        .probe(dir.path())
        .await
        .unwrap();

    assert_eq!(report.self_test.category, Category::Supported);
    assert_eq!(report.conflict.as_ref().unwrap().category, Category::Supported);
    assert_eq!(report.record_lock.category, Category::Supported);
    assert_eq!(report.verdict, Verdict::RealLocking);
    assert_eq!(report.filesystem_type, "testfs");
}

#[tokio::test]
async fn test_non_enforcing_backend_is_fake_locking() {
    let dir = tempfile::tempdir().unwrap();

    let report = common::prober(Arc::new(StubLockBackend::always_succeed()))
        .probe(dir.path())
        .await
        .unwrap();

    assert_eq!(report.conflict.as_ref().unwrap().category, Category::Simulated);
    assert_eq!(report.verdict, Verdict::FakeLocking);
}

#[tokio::test]
async fn test_unimplemented_backend_is_no_locking() {
    let dir = tempfile::tempdir().unwrap();

    let report = common::prober(Arc::new(StubLockBackend::not_implemented()))
        .probe(dir.path())
        .await
        .unwrap();

    assert_eq!(report.self_test.category, Category::Unsupported);
    assert!(report.conflict.is_none());
    assert_eq!(report.verdict, Verdict::NoLocking);
}

#[tokio::test]
async fn test_scratch_files_removed_and_runs_agree() {
    let dir = tempfile::tempdir().unwrap();
    let prober = common::prober(Arc::new(NixLockBackend::new()));

    let first = prober.probe(dir.path()).await.unwrap();
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    let second = prober.probe(dir.path()).await.unwrap();
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

    let categories = |r: &lockprobe_core::domain::ProbeReport| {
        r.phases().iter().map(|p| p.category).collect::<Vec<_>>()
    };
    assert_eq!(categories(&first), categories(&second));
    assert_eq!(first.verdict, second.verdict);
}

#[tokio::test]
async fn test_report_serializes_for_json_output() {
    let dir = tempfile::tempdir().unwrap();

    let report = common::prober(Arc::new(NixLockBackend::new()))
        .probe(dir.path())
        .await
        .unwrap();
    let value = serde_json::to_value(&report).unwrap();

    assert_eq!(value["verdict"], "REAL_LOCKING");
    assert_eq!(value["self_test"]["phase"], "self_test");
    assert!(value["self_test"].get("errno").is_none());
}
