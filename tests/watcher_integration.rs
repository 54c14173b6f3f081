use slideshow_server::SlideshowState;
use slideshow_server::tasks::config_watch::{ConfigWatcher, PollOutcome};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tempfile::tempdir;
use tokio_util::sync::CancellationToken;

fn write_config(cfg_path: &Path, folder: &Path, delay_seconds: u32) {
    fs::write(
        cfg_path,
        format!(
            r#"{{"folder_path": "{}", "delay_seconds": {delay_seconds}}}"#,
            folder.display()
        ),
    )
    .unwrap();
}

/// Push the mtime forward so coarse filesystem timestamps still register a change.
fn bump_mtime(path: &Path, secs: u64) {
    let file = File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(secs))
        .unwrap();
}

fn photos_dir(root: &Path, names: &[&str]) -> PathBuf {
    let photos = root.join("photos");
    fs::create_dir_all(&photos).unwrap();
    for name in names {
        fs::write(photos.join(name), b"x").unwrap();
    }
    photos
}

#[test]
fn prime_loads_without_a_second_reload() {
    let tmp = tempdir().unwrap();
    let photos = photos_dir(tmp.path(), &["a.jpg", "b.jpg"]);
    let cfg_path = tmp.path().join("config.json");
    write_config(&cfg_path, &photos, 1);

    let state = Arc::new(SlideshowState::new());
    let mut watcher = ConfigWatcher::new(cfg_path, state.clone(), Duration::from_secs(1));
    assert_eq!(watcher.prime().unwrap(), 2);
    assert_eq!(watcher.poll_once(), PollOutcome::Unchanged);
    assert_eq!(state.snapshot().images_count, 2);
}

#[test]
fn modification_triggers_reload() {
    let tmp = tempdir().unwrap();
    let photos = photos_dir(tmp.path(), &["a.jpg", "b.jpg"]);
    let cfg_path = tmp.path().join("config.json");
    write_config(&cfg_path, &photos, 1);

    let state = Arc::new(SlideshowState::new());
    let mut watcher = ConfigWatcher::new(cfg_path.clone(), state.clone(), Duration::from_secs(1));
    assert_eq!(watcher.poll_once(), PollOutcome::Reloaded);
    assert_eq!(state.snapshot().delay_ms, 1000);

    write_config(&cfg_path, &photos, 5);
    bump_mtime(&cfg_path, 10);
    assert_eq!(watcher.poll_once(), PollOutcome::Reloaded);
    assert_eq!(state.snapshot().delay_ms, 5000);
    assert_eq!(watcher.poll_once(), PollOutcome::Unchanged);
}

#[test]
fn deleted_config_reports_error_once() {
    let tmp = tempdir().unwrap();
    let photos = photos_dir(tmp.path(), &["a.jpg"]);
    let cfg_path = tmp.path().join("config.json");
    write_config(&cfg_path, &photos, 1);

    let state = Arc::new(SlideshowState::new());
    let mut watcher = ConfigWatcher::new(cfg_path.clone(), state.clone(), Duration::from_secs(1));
    watcher.prime().unwrap();
    state.start().unwrap();

    fs::remove_file(&cfg_path).unwrap();
    assert_eq!(watcher.poll_once(), PollOutcome::Disappeared);
    let snap = state.snapshot();
    assert_eq!(snap.images_count, 0);
    assert!(!snap.is_playing);
    let error = snap.error.unwrap();
    assert!(error.starts_with("config file not found"), "{error}");

    assert_eq!(watcher.poll_once(), PollOutcome::Missing);
    assert_eq!(watcher.poll_once(), PollOutcome::Missing);

    write_config(&cfg_path, &photos, 1);
    assert_eq!(watcher.poll_once(), PollOutcome::Reloaded);
    let snap = state.snapshot();
    assert_eq!(snap.error, None);
    assert_eq!(snap.images_count, 1);
}

#[test]
fn missing_at_startup_is_recorded_by_prime_only() {
    let tmp = tempdir().unwrap();
    let cfg_path = tmp.path().join("config.json");

    let state = Arc::new(SlideshowState::new());
    let mut watcher = ConfigWatcher::new(cfg_path, state.clone(), Duration::from_secs(1));
    assert!(watcher.prime().is_err());
    assert!(state.snapshot().error.is_some());
    assert_eq!(watcher.poll_once(), PollOutcome::Missing);
}

#[test]
fn malformed_config_is_applied_as_error_once_per_change() {
    let tmp = tempdir().unwrap();
    let cfg_path = tmp.path().join("config.json");
    fs::write(&cfg_path, "{broken").unwrap();

    let state = Arc::new(SlideshowState::new());
    let mut watcher = ConfigWatcher::new(cfg_path, state.clone(), Duration::from_secs(1));
    assert_eq!(watcher.poll_once(), PollOutcome::Reloaded);
    assert!(
        state
            .snapshot()
            .error
            .unwrap()
            .starts_with("invalid config file")
    );
    assert_eq!(watcher.poll_once(), PollOutcome::Unchanged);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn run_picks_up_changes_and_honours_cancel() {
    let tmp = tempdir().unwrap();
    let photos = photos_dir(tmp.path(), &["a.jpg", "b.jpg", "c.jpg"]);
    let cfg_path = tmp.path().join("config.json");

    let state = Arc::new(SlideshowState::new());
    let watcher = ConfigWatcher::new(cfg_path.clone(), state.clone(), Duration::from_millis(50));
    let cancel = CancellationToken::new();
    let handle = tokio::spawn(watcher.run(cancel.clone()));

    // Write aside and rename so the poll never sees a half-written file.
    let staged = tmp.path().join("config.json.tmp");
    write_config(&staged, &photos, 2);
    fs::rename(&staged, &cfg_path).unwrap();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while state.snapshot().images_count != 3 {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timeout waiting for reload"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(state.snapshot().delay_ms, 2000);

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("watcher did not stop")
        .unwrap()
        .unwrap();
}
