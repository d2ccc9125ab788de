// tests/run_scenarios.rs

//! End-to-end scenarios for a guarded, rotated, bracketed run.

use std::fs;
use std::path::Path;

use cronwrap::config::{Config, RawConfigFile};
use cronwrap::guard::{Acquire, RunGuard};
use cronwrap::run_once;
use tempfile::tempdir;

fn test_config(root: &Path, command: &str) -> Config {
    let raw = RawConfigFile {
        root: Some(root.to_path_buf()),
        command: command.to_string(),
        ..RawConfigFile::default()
    };
    Config::try_from(raw).unwrap()
}

fn test_config_with_threshold(root: &Path, command: &str, max_log_bytes: u64) -> Config {
    let raw = RawConfigFile {
        root: Some(root.to_path_buf()),
        command: command.to_string(),
        max_log_bytes,
        ..RawConfigFile::default()
    };
    Config::try_from(raw).unwrap()
}

#[tokio::test]
async fn fresh_directory_brackets_delegate_output_and_cleans_up() {
    let dir = tempdir().unwrap();
    let cfg = test_config(dir.path(), "echo delegate output");

    run_once(&cfg).await.unwrap();

    assert!(!cfg.lock_file.exists(), "lock marker should be released");

    let text = fs::read_to_string(&cfg.log_file).unwrap();
    let start = text.find("started =====").expect("start marker");
    let output = text.find("delegate output").expect("delegate output");
    let end = text.find("finished (exit 0)").expect("end marker");
    assert!(start < output && output < end);
}

#[tokio::test]
async fn stderr_is_merged_into_the_run_log() {
    let dir = tempdir().unwrap();
    let cfg = test_config(dir.path(), "echo to stdout; echo to stderr 1>&2");

    run_once(&cfg).await.unwrap();

    let text = fs::read_to_string(&cfg.log_file).unwrap();
    assert!(text.contains("to stdout"));
    assert!(text.contains("to stderr"));
}

#[tokio::test]
async fn existing_marker_skips_rotation_and_delegate() {
    let dir = tempdir().unwrap();
    let cfg = test_config_with_threshold(dir.path(), "touch delegate_ran", 16);

    // Marker from a run that is (as far as cronwrap knows) still active,
    // plus an oversized log that would rotate if the run proceeded.
    fs::write(&cfg.lock_file, "pid 1 started earlier\n").unwrap();
    fs::create_dir_all(cfg.log_file.parent().unwrap()).unwrap();
    fs::write(&cfg.log_file, vec![b'x'; 17]).unwrap();

    run_once(&cfg).await.unwrap();

    let text = fs::read_to_string(&cfg.log_file).unwrap();
    assert!(text.starts_with("xxx"), "existing log content preserved");
    assert!(text.contains("another run in progress"));
    assert!(!text.contains("started ====="));

    assert!(!dir.path().join("delegate_ran").exists());
    assert!(cfg.lock_file.exists(), "foreign marker must not be removed");

    // No archive was created next to the oversized log.
    let siblings: Vec<_> = fs::read_dir(cfg.log_file.parent().unwrap())
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(siblings.len(), 1);
    assert_eq!(
        siblings[0].as_os_str(),
        cfg.log_file.file_name().unwrap()
    );
}

#[tokio::test]
async fn oversized_log_is_archived_before_the_run() {
    let dir = tempdir().unwrap();
    let cfg = test_config_with_threshold(dir.path(), "echo fresh run", 16);

    fs::create_dir_all(cfg.log_file.parent().unwrap()).unwrap();
    fs::write(&cfg.log_file, vec![b'x'; 17]).unwrap();

    run_once(&cfg).await.unwrap();

    let log_dir = cfg.log_file.parent().unwrap();
    let archives: Vec<_> = fs::read_dir(log_dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| p != &cfg.log_file)
        .collect();
    assert_eq!(archives.len(), 1, "exactly one archive expected");
    assert_eq!(fs::read(&archives[0]).unwrap(), vec![b'x'; 17]);

    let text = fs::read_to_string(&cfg.log_file).unwrap();
    assert!(!text.contains('x'), "new log starts fresh");
    assert!(text.contains("fresh run"));
}

#[tokio::test]
async fn delegate_failure_is_recorded_but_not_propagated() {
    let dir = tempdir().unwrap();
    let cfg = test_config(dir.path(), "exit 3");

    // The wrapper's own result stays Ok; only the end marker knows.
    run_once(&cfg).await.unwrap();

    let text = fs::read_to_string(&cfg.log_file).unwrap();
    assert!(text.contains("finished (exit 3)"));
    assert!(!cfg.lock_file.exists());
}

#[tokio::test]
async fn lock_marker_is_held_while_the_delegate_runs() {
    let dir = tempdir().unwrap();
    // cwd is the root, so the delegate can see the marker directly.
    let cfg = test_config(dir.path(), "test -f cronwrap.lock");

    run_once(&cfg).await.unwrap();

    let text = fs::read_to_string(&cfg.log_file).unwrap();
    assert!(
        text.contains("finished (exit 0)"),
        "delegate should observe the lock marker: {text}"
    );
}

#[tokio::test]
async fn sequential_runs_never_observe_each_other() {
    let dir = tempdir().unwrap();
    let cfg = test_config(dir.path(), "echo run");

    run_once(&cfg).await.unwrap();
    run_once(&cfg).await.unwrap();

    let text = fs::read_to_string(&cfg.log_file).unwrap();
    assert!(!text.contains("another run in progress"));
    assert_eq!(text.matches("started =====").count(), 2);
    assert_eq!(text.matches("finished (exit 0)").count(), 2);
}

#[tokio::test]
async fn dropped_guard_unblocks_the_next_run() {
    let dir = tempdir().unwrap();
    let cfg = test_config(dir.path(), "echo recovered");

    // A run that died mid-flight: guard acquired, no end marker written,
    // then the scope unwound (signal path).
    {
        let _guard = match RunGuard::acquire(&cfg.lock_file).unwrap() {
            Acquire::Acquired(guard) => guard,
            Acquire::AlreadyRunning => panic!("fresh lock path reported AlreadyRunning"),
        };
    }

    run_once(&cfg).await.unwrap();

    let text = fs::read_to_string(&cfg.log_file).unwrap();
    assert!(text.contains("recovered"));
    assert!(!text.contains("another run in progress"));
}

#[tokio::test]
async fn env_table_reaches_the_delegate() {
    let dir = tempdir().unwrap();
    let mut raw = RawConfigFile {
        root: Some(dir.path().to_path_buf()),
        command: "printf '%s %s\\n' \"$SHEET_ID\" \"$TAB_NAME\"".to_string(),
        ..RawConfigFile::default()
    };
    raw.env
        .insert("SHEET_ID".to_string(), "sheet-123".to_string());
    raw.env
        .insert("TAB_NAME".to_string(), "Directory".to_string());
    let cfg = Config::try_from(raw).unwrap();

    run_once(&cfg).await.unwrap();

    let text = fs::read_to_string(&cfg.log_file).unwrap();
    assert!(text.contains("sheet-123 Directory"));
}

#[tokio::test]
async fn venv_bin_leads_the_delegates_path() {
    let dir = tempdir().unwrap();
    let raw = RawConfigFile {
        root: Some(dir.path().to_path_buf()),
        venv: Some(".venv".into()),
        command: "printf '%s\\n' \"$VIRTUAL_ENV\"; printf '%s\\n' \"$PATH\"".to_string(),
        ..RawConfigFile::default()
    };
    let cfg = Config::try_from(raw).unwrap();

    run_once(&cfg).await.unwrap();

    let text = fs::read_to_string(&cfg.log_file).unwrap();
    let venv = dir.path().join(".venv");
    assert!(text.contains(&venv.display().to_string()));
    assert!(text.contains(&venv.join("bin").display().to_string()));
}
