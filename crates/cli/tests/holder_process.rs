//! Tests of the `lockprobe-holder` helper's stdout/stdin protocol

use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Read};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use lockprobe_core::port::{LockBackend, LockError, WaitMode};
use lockprobe_infra_system::NixLockBackend;

#[test]
fn test_holder_blocks_other_processes_until_stdin_closes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("held");

    let mut child = Command::new(env!("CARGO_BIN_EXE_lockprobe-holder"))
        .arg(&path)
        .args(["--hold-ms", "30000"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();

    let mut line = String::new();
    BufReader::new(child.stdout.take().unwrap())
        .read_line(&mut line)
        .unwrap();
    assert_eq!(line.trim(), "LOCK_ACQUIRED");

    let backend = NixLockBackend::new();
    let file = OpenOptions::new().read(true).write(true).open(&path).unwrap();
    assert!(matches!(
        backend.lock_exclusive(&file, WaitMode::NonBlocking),
        Err(LockError::WouldBlock { .. })
    ));

    let started = Instant::now();
    drop(child.stdin.take());
    let status = child.wait().unwrap();

    assert!(status.success());
    assert!(started.elapsed() < Duration::from_secs(10));
    backend.lock_exclusive(&file, WaitMode::NonBlocking).unwrap();
}

#[test]
fn test_holder_expires_on_its_own() {
    let dir = tempfile::tempdir().unwrap();

    let mut child = Command::new(env!("CARGO_BIN_EXE_lockprobe-holder"))
        .arg(dir.path().join("held"))
        .args(["--hold-ms", "200"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();
    // Stdin stays open, so only the hold duration can end the hold
    let _stdin = child.stdin.take().unwrap();
    let mut stdout = BufReader::new(child.stdout.take().unwrap());

    let mut line = String::new();
    stdout.read_line(&mut line).unwrap();
    assert_eq!(line.trim(), "LOCK_ACQUIRED");

    let started = Instant::now();
    let status = child.wait().unwrap();

    assert!(status.success());
    assert!(started.elapsed() < Duration::from_secs(10));
    let mut rest = String::new();
    stdout.read_to_string(&mut rest).unwrap();
    assert!(rest.is_empty());
}

#[test]
fn test_holder_reports_unopenable_path() {
    let dir = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_lockprobe-holder"))
        .arg(dir.path().join("missing").join("held"))
        .stdin(Stdio::piped())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("LOCK_FAILED 2 0 "));
}
