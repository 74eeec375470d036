use async_logger::rolling_file::{hostname, log_file_name};
use async_logger::{LogError, RollingFile};
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tempfile::tempdir;
use time::macros::datetime;
use time::OffsetDateTime;

const SLOW_FLUSH: Duration = Duration::from_secs(60);

fn log_files(dir: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    paths.sort();
    paths
}

#[test]
fn test_file_name_carries_time_host_and_pid() {
    let name = log_file_name("logs/server", datetime!(1999-12-31 23:59:59 UTC), "db-01", 7);
    assert_eq!(name, "logs/server.19991231-235959(UTC).db-01.7.log");
}

#[test]
fn test_first_file_uses_generated_name() {
    let dir = tempdir().unwrap();
    let basename = dir.path().join("svc");
    let file = RollingFile::new(basename.to_str().unwrap(), 1000, SLOW_FLUSH).unwrap();

    let name = file.current_path().file_name().unwrap().to_str().unwrap().to_string();
    assert!(name.starts_with("svc."));
    assert!(name.contains("(UTC)."));
    assert!(name.ends_with(&format!(".{}.{}.log", hostname(), std::process::id())));
    assert_eq!(log_files(dir.path()), vec![file.current_path()]);
}

#[test]
fn test_no_roll_below_threshold() {
    let dir = tempdir().unwrap();
    let basename = dir.path().join("small");
    let file = RollingFile::new(basename.to_str().unwrap(), 1000, SLOW_FLUSH).unwrap();

    file.append(&[b'x'; 400]);
    file.append(&[b'y'; 400]);
    assert_eq!(file.written_bytes(), 800);
    let path = file.current_path();
    drop(file);

    assert_eq!(log_files(dir.path()), vec![path.clone()]);
    assert_eq!(fs::read(&path).unwrap().len(), 800);
}

#[test]
fn test_rolls_after_threshold() {
    let dir = tempdir().unwrap();
    let basename = dir.path().join("roll");
    let file = RollingFile::new(basename.to_str().unwrap(), 100, SLOW_FLUSH).unwrap();
    let first = file.current_path();

    file.append(&[b'a'; 150]);
    // File names have one-second resolution.
    thread::sleep(Duration::from_millis(1100));
    file.append(b"after\n");

    let second = file.current_path();
    assert_ne!(first, second);
    assert_eq!(file.written_bytes(), 6);
    drop(file);

    assert_eq!(fs::read(&first).unwrap(), vec![b'a'; 150]);
    assert_eq!(fs::read(&second).unwrap(), b"after\n");
    assert_eq!(log_files(dir.path()).len(), 2);
}

#[test]
fn test_roll_waits_for_next_second() {
    let dir = tempdir().unwrap();
    let basename = dir.path().join("burst");
    // Start early in a second so the burst cannot straddle a boundary.
    while OffsetDateTime::now_utc().nanosecond() > 200_000_000 {
        thread::sleep(Duration::from_millis(5));
    }
    let file = RollingFile::new(basename.to_str().unwrap(), 100, SLOW_FLUSH).unwrap();
    let first = file.current_path();

    for _ in 0..20 {
        file.append(&[b'b'; 50]);
    }
    assert_eq!(file.current_path(), first);
    assert_eq!(file.written_bytes(), 1000);

    thread::sleep(Duration::from_millis(1100));
    file.append(b"next\n");
    assert_ne!(file.current_path(), first);
    assert_eq!(file.written_bytes(), 5);
    drop(file);

    assert_eq!(fs::read(&first).unwrap().len(), 1000);
    assert_eq!(log_files(dir.path()).len(), 2);
}

#[test]
fn test_forced_roll() {
    let dir = tempdir().unwrap();
    let basename = dir.path().join("forced");
    let file = RollingFile::new(basename.to_str().unwrap(), 1 << 30, SLOW_FLUSH).unwrap();
    let first = file.current_path();
    file.append(b"before\n");

    thread::sleep(Duration::from_millis(1100));
    assert!(file.roll_file());
    file.append(b"after\n");

    let second = file.current_path();
    assert_ne!(first, second);
    drop(file);

    assert_eq!(fs::read(&first).unwrap(), b"before\n");
    assert_eq!(fs::read(&second).unwrap(), b"after\n");
}

#[test]
fn test_background_flush() {
    let dir = tempdir().unwrap();
    let basename = dir.path().join("flushed");
    let file =
        RollingFile::new(basename.to_str().unwrap(), 1 << 30, Duration::from_millis(50)).unwrap();

    file.append(b"pending in userspace\n");
    thread::sleep(Duration::from_millis(300));

    // Still open: only the flush thread can have pushed the bytes out.
    assert_eq!(fs::read(file.current_path()).unwrap(), b"pending in userspace\n");
}

#[test]
fn test_open_failure_is_reported() {
    let dir = tempdir().unwrap();
    let basename = dir.path().join("no").join("such").join("dir");
    let result = RollingFile::new(basename.to_str().unwrap(), 100, SLOW_FLUSH);
    assert!(matches!(result, Err(LogError::OpenFile { .. })));
}
